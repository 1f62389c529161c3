//! Scenarios map a single concentration change to the full set of K, Na and Cl
//! concentration pairs under different assumptions about how charge is balanced.
//!
//! Every scenario starts from baseline concentrations with `cl = k + na` and returns
//! pairs of `[baseline, baseline + change]`. Scenarios are pure and deterministic,
//! the potential and spectral code never needs to know which one produced its ions.
//!
//! ```rust
//! use diffusion_potentials::scenario::{
//!     Baseline, ConcentrationChange, ConcentrationScenario, SodiumExchange,
//! };
//!
//! let concentrations = SodiumExchange
//!     .concentrations(&ConcentrationChange::potassium(4.), &Baseline::default())
//!     .unwrap();
//!
//! assert_eq!(concentrations.k.inside, 7.);
//! assert_eq!(concentrations.na.inside, 145.);
//! assert_eq!(concentrations.cl.inside, 152.);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{IonError, ScenarioError};
use crate::ion::{ConcentrationPair, Ion, IonSpecies};


/// Baseline concentrations (mM), chloride balances both cations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub k: f64,
    pub na: f64,
}

impl Default for Baseline {
    fn default() -> Self {
        Baseline { k: 3., na: 149. }
    }
}

impl Baseline {
    pub fn cl(&self) -> f64 {
        self.k + self.na
    }
}

/// Change in potassium and/or sodium concentration (mM) driving a scenario
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConcentrationChange {
    pub delta_k: Option<f64>,
    pub delta_na: Option<f64>,
}

impl ConcentrationChange {
    pub fn potassium(delta_k: f64) -> Self {
        ConcentrationChange { delta_k: Some(delta_k), delta_na: None }
    }

    pub fn sodium(delta_na: f64) -> Self {
        ConcentrationChange { delta_k: None, delta_na: Some(delta_na) }
    }

    pub fn both(delta_k: f64, delta_na: f64) -> Self {
        ConcentrationChange { delta_k: Some(delta_k), delta_na: Some(delta_na) }
    }
}

/// Concentration pairs for the three species every scenario produces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Concentrations {
    pub k: ConcentrationPair,
    pub na: ConcentrationPair,
    pub cl: ConcentrationPair,
}

impl Concentrations {
    /// Validates each `[outside, inside]` pair
    pub fn new(k: [f64; 2], na: [f64; 2], cl: [f64; 2]) -> Result<Self, IonError> {
        Ok(Concentrations {
            k: ConcentrationPair::new(IonSpecies::K.name(), k[0], k[1])?,
            na: ConcentrationPair::new(IonSpecies::Na.name(), na[0], na[1])?,
            cl: ConcentrationPair::new(IonSpecies::Cl.name(), cl[0], cl[1])?,
        })
    }

    /// Ion records in the order K, Na, Cl
    pub fn to_ions(&self) -> Result<Vec<Ion>, IonError> {
        Ok(vec![
            Ion::new(IonSpecies::K, self.k.outside, self.k.inside)?,
            Ion::new(IonSpecies::Na, self.na.outside, self.na.inside)?,
            Ion::new(IonSpecies::Cl, self.cl.outside, self.cl.inside)?,
        ])
    }

    /// Net change in charge concentration, `dK + dNa - dCl`, zero when electroneutral
    pub fn charge_imbalance(&self) -> f64 {
        self.k.delta() + self.na.delta() - self.cl.delta()
    }
}

/// A policy for distributing a concentration change across K, Na and Cl
pub trait ConcentrationScenario {
    fn name(&self) -> &'static str;

    fn concentrations(
        &self,
        change: &ConcentrationChange,
        baseline: &Baseline,
    ) -> Result<Concentrations, ScenarioError>;
}

fn build(
    baseline: &Baseline,
    delta_k: f64,
    delta_na: f64,
    delta_cl: f64,
) -> Result<Concentrations, ScenarioError> {
    let cl = baseline.cl();

    Ok(Concentrations::new(
        [baseline.k, baseline.k + delta_k],
        [baseline.na, baseline.na + delta_na],
        [cl, cl + delta_cl],
    )?)
}

fn require_potassium(scenario: &'static str, change: &ConcentrationChange) -> Result<f64, ScenarioError> {
    change.delta_k.ok_or(ScenarioError::MissingConcentrationChange { scenario, requires: "delta_k" })
}

/// Potassium enters while sodium leaves (`dK + dNa = dCl`), with a single change
/// chloride stays at baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SodiumExchange;

impl ConcentrationScenario for SodiumExchange {
    fn name(&self) -> &'static str {
        "sodium_exchange"
    }

    fn concentrations(
        &self,
        change: &ConcentrationChange,
        baseline: &Baseline,
    ) -> Result<Concentrations, ScenarioError> {
        match (change.delta_k, change.delta_na) {
            (Some(k), Some(na)) => build(baseline, k, -na, k - na),
            (Some(k), None) => build(baseline, k, -k, 0.),
            (None, Some(na)) => build(baseline, na, -na, 0.),
            (None, None) => Err(ScenarioError::MissingConcentrationChange {
                scenario: self.name(), requires: "delta_k or delta_na"
            }),
        }
    }
}

/// Half of the potassium increase is balanced by sodium loss and half by chloride gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitExchange;

impl ConcentrationScenario for SplitExchange {
    fn name(&self) -> &'static str {
        "split_exchange"
    }

    fn concentrations(
        &self,
        change: &ConcentrationChange,
        baseline: &Baseline,
    ) -> Result<Concentrations, ScenarioError> {
        let k = require_potassium(self.name(), change)?;

        build(baseline, k, -0.5 * k, 0.5 * k)
    }
}

/// Potassium enters together with chloride, sodium stays at baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChlorideCotransport;

impl ConcentrationScenario for ChlorideCotransport {
    fn name(&self) -> &'static str {
        "chloride_cotransport"
    }

    fn concentrations(
        &self,
        change: &ConcentrationChange,
        baseline: &Baseline,
    ) -> Result<Concentrations, ScenarioError> {
        let k = require_potassium(self.name(), change)?;

        build(baseline, k, 0., k)
    }
}

/// Spreading depression, `2 dK = -dNa` and `dK = -dCl`, sodium and chloride
/// leave the extracellular space as potassium accumulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpreadingDepression;

impl ConcentrationScenario for SpreadingDepression {
    fn name(&self) -> &'static str {
        "spreading_depression"
    }

    fn concentrations(
        &self,
        change: &ConcentrationChange,
        baseline: &Baseline,
    ) -> Result<Concentrations, ScenarioError> {
        match (change.delta_k, change.delta_na) {
            (Some(k), _) => build(baseline, k, -2. * k, -k),
            (None, Some(na)) => build(baseline, 0.5 * na, -na, -0.5 * na),
            (None, None) => Err(ScenarioError::MissingConcentrationChange {
                scenario: self.name(), requires: "delta_k or delta_na"
            }),
        }
    }
}

/// The built in scenarios, usable by name in tables and configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    SodiumExchange,
    SplitExchange,
    ChlorideCotransport,
    SpreadingDepression,
}

impl ScenarioKind {
    pub fn all() -> [ScenarioKind; 4] {
        [
            ScenarioKind::SodiumExchange,
            ScenarioKind::SplitExchange,
            ScenarioKind::ChlorideCotransport,
            ScenarioKind::SpreadingDepression,
        ]
    }

    fn policy(&self) -> &'static dyn ConcentrationScenario {
        match self {
            ScenarioKind::SodiumExchange => &SodiumExchange,
            ScenarioKind::SplitExchange => &SplitExchange,
            ScenarioKind::ChlorideCotransport => &ChlorideCotransport,
            ScenarioKind::SpreadingDepression => &SpreadingDepression,
        }
    }
}

impl ConcentrationScenario for ScenarioKind {
    fn name(&self) -> &'static str {
        self.policy().name()
    }

    fn concentrations(
        &self,
        change: &ConcentrationChange,
        baseline: &Baseline,
    ) -> Result<Concentrations, ScenarioError> {
        self.policy().concentrations(change, baseline)
    }
}

impl Display for ScenarioKind {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioKind::all()
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ScenarioError::UnknownScenario(String::from(s)))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn inside(c: &Concentrations) -> [f64; 3] {
        [c.k.inside, c.na.inside, c.cl.inside]
    }

    #[test]
    fn test_sodium_exchange_variants() -> Result<(), ScenarioError> {
        let baseline = Baseline { k: 3., na: 146. };

        let c = SodiumExchange.concentrations(&ConcentrationChange::potassium(4.), &baseline)?;
        assert_eq!(inside(&c), [7., 142., 149.]);
        assert_eq!(c.cl.outside, 149.);

        let c = SodiumExchange.concentrations(&ConcentrationChange::sodium(5.9), &baseline)?;
        assert_eq!(inside(&c), [8.9, 140.1, 149.]);

        let c = SodiumExchange.concentrations(&ConcentrationChange::both(6., 15.), &Baseline::default())?;
        assert_eq!(inside(&c), [9., 134., 143.]);
        assert_eq!(c.charge_imbalance(), 0.);

        Ok(())
    }

    #[test]
    fn test_split_and_cotransport() -> Result<(), ScenarioError> {
        let baseline = Baseline::default();

        let c = SplitExchange.concentrations(&ConcentrationChange::potassium(4.), &baseline)?;
        assert_eq!(inside(&c), [7., 147., 154.]);

        let c = ChlorideCotransport.concentrations(&ConcentrationChange::potassium(4.), &baseline)?;
        assert_eq!(inside(&c), [7., 149., 156.]);
        assert_eq!(c.charge_imbalance(), 0.);

        assert!(matches!(
            SplitExchange.concentrations(&ConcentrationChange::sodium(4.), &baseline),
            Err(ScenarioError::MissingConcentrationChange { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_spreading_depression() -> Result<(), ScenarioError> {
        let baseline = Baseline::default();

        let c = SpreadingDepression.concentrations(&ConcentrationChange::potassium(19.), &baseline)?;
        assert_eq!(inside(&c), [22., 111., 133.]);
        assert_eq!(c.charge_imbalance(), 0.);

        let c = SpreadingDepression.concentrations(&ConcentrationChange::sodium(10.), &baseline)?;
        assert_eq!(inside(&c), [8., 139., 147.]);

        // sodium would become negative
        assert!(matches!(
            SpreadingDepression.concentrations(&ConcentrationChange::potassium(80.), &baseline),
            Err(ScenarioError::IonRelatedError(IonError::InvalidConcentration { .. }))
        ));

        Ok(())
    }

    #[test]
    fn test_scenario_is_deterministic() -> Result<(), ScenarioError> {
        let change = ConcentrationChange::potassium(2.5);
        for kind in ScenarioKind::all() {
            let first = kind.concentrations(&change, &Baseline::default())?;
            let second = kind.concentrations(&change, &Baseline::default())?;
            assert_eq!(first, second);
            assert_eq!(kind.name().parse::<ScenarioKind>()?, kind);
        }

        assert!("scenario5".parse::<ScenarioKind>().is_err());

        Ok(())
    }

    #[test]
    fn test_missing_change() {
        for kind in ScenarioKind::all() {
            assert!(kind.concentrations(&ConcentrationChange::default(), &Baseline::default()).is_err());
        }
    }
}

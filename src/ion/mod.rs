//! Ion species records and the physical constants shared by the potential equations.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::IonError;


/// Gas constant (J / (mol K))
pub const R: f64 = 8.3144598;
/// Faraday's constant (C / mol)
pub const F: f64 = 96485.333;
/// Tortuosity of the extracellular space
pub const TORTUOSITY: f64 = 1.6;
/// Default temperature (K)
pub const DEFAULT_TEMPERATURE: f64 = 310.;

/// Ion species with tabulated free diffusion coefficients and valences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IonSpecies {
    K,
    Na,
    Cl,
    Ca,
    Mg,
    HCO3,
}

impl IonSpecies {
    /// Free diffusion coefficient (m^2 / s)
    pub fn diffusion_coefficient(&self) -> f64 {
        match self {
            IonSpecies::K => 1.96e-9,
            IonSpecies::Na => 1.33e-9,
            IonSpecies::Cl => 2.03e-9,
            IonSpecies::Ca => 0.71e-9,
            IonSpecies::Mg => 0.72e-9,
            IonSpecies::HCO3 => 1.18e-9,
        }
    }

    pub fn valence(&self) -> i32 {
        match self {
            IonSpecies::K | IonSpecies::Na => 1,
            IonSpecies::Ca | IonSpecies::Mg => 2,
            IonSpecies::Cl | IonSpecies::HCO3 => -1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IonSpecies::K => "K",
            IonSpecies::Na => "Na",
            IonSpecies::Cl => "Cl",
            IonSpecies::Ca => "Ca",
            IonSpecies::Mg => "Mg",
            IonSpecies::HCO3 => "HCO3",
        }
    }
}

impl Display for IonSpecies {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IonSpecies {
    type Err = IonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "K" => Ok(IonSpecies::K),
            "Na" => Ok(IonSpecies::Na),
            "Cl" => Ok(IonSpecies::Cl),
            "Ca" => Ok(IonSpecies::Ca),
            "Mg" => Ok(IonSpecies::Mg),
            "HCO3" => Ok(IonSpecies::HCO3),
            _ => Err(IonError::MissingSpecies(String::from(s))),
        }
    }
}

/// Concentration on either side of the gradient (mM), `outside` is the
/// baseline and `inside` the perturbed compartment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PairRecord")]
pub struct ConcentrationPair {
    pub outside: f64,
    pub inside: f64,
}

#[derive(Deserialize)]
struct PairRecord {
    outside: f64,
    inside: f64,
}

impl TryFrom<PairRecord> for ConcentrationPair {
    type Error = IonError;

    fn try_from(record: PairRecord) -> Result<Self, Self::Error> {
        ConcentrationPair::new("concentration pair", record.outside, record.inside)
    }
}

impl ConcentrationPair {
    /// Creates a pair, both concentrations must be positive and finite
    pub fn new(name: &str, outside: f64, inside: f64) -> Result<Self, IonError> {
        for value in [outside, inside] {
            if !(value.is_finite() && value > 0.) {
                return Err(IonError::InvalidConcentration { name: String::from(name), value });
            }
        }

        Ok(ConcentrationPair { outside, inside })
    }

    /// Concentration difference, `inside - outside`
    pub fn delta(&self) -> f64 {
        self.inside - self.outside
    }

    pub fn mean(&self) -> f64 {
        (self.outside + self.inside) / 2.
    }
}

/// A single ion species with its concentration gradient, the diffusion coefficient
/// stored is the effective one in the extracellular space (free coefficient
/// divided by the squared tortuosity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IonRecord")]
pub struct Ion {
    name: String,
    concentrations: ConcentrationPair,
    diffusion_coefficient: f64,
    valence: i32,
}

// serialized form keeps the effective coefficient
#[derive(Deserialize)]
struct IonRecord {
    name: String,
    concentrations: PairRecord,
    diffusion_coefficient: f64,
    valence: i32,
}

impl TryFrom<IonRecord> for Ion {
    type Error = IonError;

    fn try_from(record: IonRecord) -> Result<Self, Self::Error> {
        Ion::with_parameters(
            &record.name,
            record.concentrations.outside,
            record.concentrations.inside,
            record.diffusion_coefficient * TORTUOSITY.powi(2),
            record.valence,
        )
    }
}

impl Ion {
    /// Creates a tabulated species with the given outside and inside concentrations (mM)
    pub fn new(species: IonSpecies, outside: f64, inside: f64) -> Result<Self, IonError> {
        Ion::with_parameters(
            species.name(),
            outside,
            inside,
            species.diffusion_coefficient(),
            species.valence(),
        )
    }

    /// Creates an arbitrary species from its free diffusion coefficient (m^2 / s)
    /// and valence
    pub fn with_parameters(
        name: &str,
        outside: f64,
        inside: f64,
        free_diffusion_coefficient: f64,
        valence: i32,
    ) -> Result<Self, IonError> {
        let concentrations = ConcentrationPair::new(name, outside, inside)?;

        if !(free_diffusion_coefficient.is_finite() && free_diffusion_coefficient > 0.) {
            return Err(IonError::InvalidDiffusionCoefficient {
                name: String::from(name),
                value: free_diffusion_coefficient,
            });
        }

        if valence == 0 {
            return Err(IonError::InvalidValence { name: String::from(name) });
        }

        Ok(Ion {
            name: String::from(name),
            concentrations,
            diffusion_coefficient: free_diffusion_coefficient / TORTUOSITY.powi(2),
            valence,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concentrations(&self) -> ConcentrationPair {
        self.concentrations
    }

    /// Effective diffusion coefficient in the extracellular space (m^2 / s)
    pub fn diffusion_coefficient(&self) -> f64 {
        self.diffusion_coefficient
    }

    pub fn valence(&self) -> i32 {
        self.valence
    }

    pub(crate) fn z(&self) -> f64 {
        self.valence as f64
    }
}

/// Checks that every species name appears once and that the required species are present
pub fn validate_ion_set(ions: &[Ion], required: &[IonSpecies]) -> Result<(), IonError> {
    for (n, ion) in ions.iter().enumerate() {
        if ions[..n].iter().any(|other| other.name == ion.name) {
            return Err(IonError::DuplicateSpecies(ion.name.clone()));
        }
    }

    for species in required {
        if !ions.iter().any(|ion| ion.name == species.name()) {
            return Err(IonError::MissingSpecies(String::from(species.name())));
        }
    }

    Ok(())
}

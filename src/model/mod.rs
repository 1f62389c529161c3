//! A diffusion potential model that owns its ions and fills in the initial potentials,
//! the decay and the power spectral density one explicit call at a time.
//!
//! Calling a stage before the one it depends on returns
//! [`PipelineError::StageOrderViolation`]. Derived values are never recomputed
//! implicitly, after changing the ions or the time constant the stages must be run again.
//! For a pipeline where ordering is checked by the type system see
//! [`InitialPotentials::calculate`], [`InitialPotentials::decay`] and
//! [`ExponentialDecay::power_spectrum`].
//!
//! ```rust
//! use diffusion_potentials::{
//!     model::DiffusionPotential,
//!     potential::Equation,
//!     scenario::{Baseline, ConcentrationChange, ConcentrationScenario, SodiumExchange},
//!     spectrum::PeriodogramConfig,
//! };
//!
//! let concentrations = SodiumExchange
//!     .concentrations(&ConcentrationChange::potassium(4.), &Baseline::default())
//!     .unwrap();
//!
//! let mut model = DiffusionPotential::from_concentrations("K+ = +4", &concentrations)
//!     .unwrap()
//!     .with_time_constant(5.)
//!     .with_time_axis(0.01, 100.);
//!
//! // the spectrum needs a decay first
//! assert!(model.power_spectral_density(&PeriodogramConfig::default()).is_err());
//!
//! model.calculate_everything(Equation::Linear, &PeriodogramConfig::default()).unwrap();
//! assert_eq!(model.decay().unwrap().len(), 10000);
//! assert_eq!(model.spectrum().unwrap().frequencies[5000], 50.);
//! ```

use crate::error::{DiffusionPotentialError, IonError, PipelineError, PotentialError};
use crate::ion::{Ion, IonSpecies, validate_ion_set, DEFAULT_TEMPERATURE};
use crate::potential::{Equation, InitialPotentials};
use crate::decay::{DecayParameters, ExponentialDecay};
use crate::scenario::Concentrations;
use crate::spectrum::{PeriodogramConfig, PowerSpectrum};


/// Species every model needs
pub const REQUIRED_SPECIES: [IonSpecies; 3] = [IonSpecies::K, IonSpecies::Na, IonSpecies::Cl];

/// Mutable diffusion potential model
#[derive(Debug, Clone)]
pub struct DiffusionPotential {
    /// Descriptive label used as the column name in output files
    pub label: String,
    ions: Vec<Ion>,
    /// Temperature (K)
    pub temperature: f64,
    /// Relaxation time constant (s), only needed for the decay
    pub tau: Option<f64>,
    /// Timestep (s) of the decay
    pub dt: Option<f64>,
    /// Duration (s) of the decay
    pub t_end: Option<f64>,
    potentials: Option<InitialPotentials>,
    decay: Option<ExponentialDecay>,
    spectrum: Option<PowerSpectrum>,
}

impl DiffusionPotential {
    /// Creates a model from an ion set containing K, Na and Cl once each
    pub fn new(label: &str, ions: Vec<Ion>) -> Result<Self, IonError> {
        validate_ion_set(&ions, &REQUIRED_SPECIES)?;

        Ok(DiffusionPotential {
            label: String::from(label),
            ions,
            temperature: DEFAULT_TEMPERATURE,
            tau: None,
            dt: None,
            t_end: None,
            potentials: None,
            decay: None,
            spectrum: None,
        })
    }

    pub fn from_concentrations(label: &str, concentrations: &Concentrations) -> Result<Self, IonError> {
        DiffusionPotential::new(label, concentrations.to_ions()?)
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_time_constant(mut self, tau: f64) -> Self {
        self.tau = Some(tau);
        self
    }

    pub fn with_time_axis(mut self, dt: f64, t_end: f64) -> Self {
        self.dt = Some(dt);
        self.t_end = Some(t_end);
        self
    }

    pub fn ions(&self) -> &[Ion] {
        &self.ions
    }

    /// Replaces the ions, previously derived values are kept as they are
    pub fn set_ions(&mut self, ions: Vec<Ion>) -> Result<(), IonError> {
        validate_ion_set(&ions, &REQUIRED_SPECIES)?;
        self.ions = ions;

        Ok(())
    }

    pub fn potentials(&self) -> Option<&InitialPotentials> {
        self.potentials.as_ref()
    }

    pub fn decay(&self) -> Option<&ExponentialDecay> {
        self.decay.as_ref()
    }

    pub fn spectrum(&self) -> Option<&PowerSpectrum> {
        self.spectrum.as_ref()
    }

    /// Runs the Goldman, Henderson and linear equations on the current ions
    pub fn calculate_potentials(&mut self) -> Result<InitialPotentials, PotentialError> {
        let potentials = InitialPotentials::calculate(&self.ions, self.temperature)?;
        self.potentials = Some(potentials);

        Ok(potentials)
    }

    fn decay_parameters(&self) -> Result<DecayParameters, PipelineError> {
        let tau = self.tau.ok_or(PipelineError::InvalidTimeConstant(None))?;
        match (self.dt, self.t_end) {
            (Some(dt), Some(t_end)) => DecayParameters::new(tau, dt, t_end),
            (dt, t_end) => Err(PipelineError::InvalidTimeAxis {
                dt: dt.unwrap_or(f64::NAN),
                t_end: t_end.unwrap_or(f64::NAN),
            }),
        }
    }

    /// Lets the potential from `equation` decay, requires [`Self::calculate_potentials`]
    pub fn exponential_decay(&mut self, equation: Equation) -> Result<&ExponentialDecay, PipelineError> {
        let potentials = self.potentials.ok_or(PipelineError::StageOrderViolation {
            stage: "decay", requires: "potential",
        })?;
        let params = self.decay_parameters()?;

        Ok(&*self.decay.insert(potentials.decay(&params, equation)?))
    }

    /// Estimates the power spectral density of the decay, requires [`Self::exponential_decay`]
    pub fn power_spectral_density(
        &mut self,
        config: &PeriodogramConfig,
    ) -> Result<&PowerSpectrum, DiffusionPotentialError> {
        let decay = self.decay.as_ref().ok_or(PipelineError::StageOrderViolation {
            stage: "spectrum", requires: "decay",
        })?;
        let spectrum = decay.power_spectrum(config)?;

        Ok(&*self.spectrum.insert(spectrum))
    }

    /// Runs all three stages in order
    pub fn calculate_everything(
        &mut self,
        equation: Equation,
        config: &PeriodogramConfig,
    ) -> Result<(), DiffusionPotentialError> {
        self.calculate_potentials()?;
        self.exponential_decay(equation)?;
        self.power_spectral_density(config)?;
        log::debug!("Finished calculating {}", self.label);

        Ok(())
    }

    /// Consumes the model and returns every derived value, all stages must have run
    pub fn into_results(self) -> Result<(InitialPotentials, ExponentialDecay, PowerSpectrum), PipelineError> {
        match (self.potentials, self.decay, self.spectrum) {
            (Some(potentials), Some(decay), Some(spectrum)) => Ok((potentials, decay, spectrum)),
            (None, _, _) => Err(PipelineError::StageOrderViolation { stage: "results", requires: "potential" }),
            (_, None, _) => Err(PipelineError::StageOrderViolation { stage: "results", requires: "decay" }),
            (_, _, None) => Err(PipelineError::StageOrderViolation { stage: "results", requires: "spectrum" }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Baseline, ConcentrationChange, ConcentrationScenario, SpreadingDepression};

    fn model() -> Result<DiffusionPotential, DiffusionPotentialError> {
        let concentrations = SpreadingDepression
            .concentrations(&ConcentrationChange::potassium(20.), &Baseline::default())?;

        Ok(
            DiffusionPotential::from_concentrations("SD", &concentrations)?
                .with_time_constant(5.)
                .with_time_axis(0.1, 50.)
        )
    }

    #[test]
    fn test_spectrum_before_decay_is_stage_violation() -> Result<(), DiffusionPotentialError> {
        let mut model = model()?;
        model.calculate_potentials()?;

        let result = model.power_spectral_density(&PeriodogramConfig::default());
        assert!(matches!(
            result,
            Err(DiffusionPotentialError::PipelineRelatedError(
                PipelineError::StageOrderViolation { stage: "spectrum", requires: "decay" }
            ))
        ));
        assert!(model.spectrum().is_none());

        Ok(())
    }

    #[test]
    fn test_decay_before_potential_is_stage_violation() -> Result<(), DiffusionPotentialError> {
        let mut model = model()?;

        assert_eq!(
            model.exponential_decay(Equation::Goldman).map(|_| ()),
            Err(PipelineError::StageOrderViolation { stage: "decay", requires: "potential" })
        );

        Ok(())
    }

    #[test]
    fn test_decay_requires_time_constant() -> Result<(), DiffusionPotentialError> {
        let concentrations = SpreadingDepression
            .concentrations(&ConcentrationChange::potassium(20.), &Baseline::default())?;
        let mut model = DiffusionPotential::from_concentrations("no tau", &concentrations)?
            .with_time_axis(0.1, 50.);
        model.calculate_potentials()?;

        assert_eq!(
            model.exponential_decay(Equation::Linear).map(|_| ()),
            Err(PipelineError::InvalidTimeConstant(None))
        );

        model.tau = Some(-1.);
        assert_eq!(
            model.exponential_decay(Equation::Linear).map(|_| ()),
            Err(PipelineError::InvalidTimeConstant(Some(-1.)))
        );

        Ok(())
    }

    #[test]
    fn test_full_pipeline_selects_equation() -> Result<(), DiffusionPotentialError> {
        let mut model = model()?;
        model.calculate_everything(Equation::Henderson, &PeriodogramConfig::default())?;

        let potentials = *model.potentials().ok_or(PipelineError::StageOrderViolation {
            stage: "test", requires: "potential"
        })?;
        let decay = model.decay().ok_or(PipelineError::StageOrderViolation {
            stage: "test", requires: "decay"
        })?;

        assert_eq!(decay.len(), 500);
        assert_eq!(decay.potential[0], potentials.henderson.abs());
        assert_eq!(decay.equation, Equation::Henderson);
        assert_eq!(model.spectrum().map(|s| s.len()), Some(251));

        Ok(())
    }

    #[test]
    fn test_derived_values_are_not_recomputed() -> Result<(), DiffusionPotentialError> {
        let mut model = model()?;
        let before = model.calculate_potentials()?;

        let ions = vec![
            Ion::new(IonSpecies::K, 3., 3.)?,
            Ion::new(IonSpecies::Na, 149., 149.)?,
            Ion::new(IonSpecies::Cl, 152., 152.)?,
        ];
        model.set_ions(ions)?;
        assert_eq!(model.potentials(), Some(&before));

        let after = model.calculate_potentials()?;
        assert_eq!(after.goldman, 0.);

        Ok(())
    }

    #[test]
    fn test_requires_chloride() -> Result<(), IonError> {
        let ions = vec![
            Ion::new(IonSpecies::K, 3., 7.)?,
            Ion::new(IonSpecies::Na, 149., 145.)?,
        ];

        assert_eq!(
            DiffusionPotential::new("missing", ions).map(|_| ()),
            Err(IonError::MissingSpecies(String::from("Cl")))
        );

        Ok(())
    }
}

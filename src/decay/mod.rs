//! Exponential relaxation of an initial diffusion potential over a uniform time axis.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use crate::error::{PipelineError, SpectralError};
use crate::potential::Equation;
use crate::spectrum::{PeriodogramConfig, PowerSpectrum, periodogram};


/// Largest number of samples a decay may hold
pub const MAX_SAMPLES: usize = 100_000_000;

/// Time constant and time axis of a decay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DecayRecord")]
pub struct DecayParameters {
    /// Relaxation time constant (s)
    tau: f64,
    /// Timestep (s), the spectrum is sampled at `1 / dt`
    dt: f64,
    /// Duration of the decay (s)
    t_end: f64,
    num_samples: usize,
}

#[derive(Deserialize)]
struct DecayRecord {
    tau: f64,
    dt: f64,
    t_end: f64,
}

impl TryFrom<DecayRecord> for DecayParameters {
    type Error = PipelineError;

    fn try_from(record: DecayRecord) -> Result<Self, Self::Error> {
        DecayParameters::new(record.tau, record.dt, record.t_end)
    }
}

fn check_time_constant(tau: f64) -> Result<(), PipelineError> {
    if !(tau.is_finite() && tau > 0.) {
        return Err(PipelineError::InvalidTimeConstant(Some(tau)));
    }

    Ok(())
}

/// Number of samples on a time axis, `floor(t_end / dt)`, at most [`MAX_SAMPLES`]
pub fn number_of_samples(dt: f64, t_end: f64) -> Result<usize, PipelineError> {
    let valid = dt.is_finite() && dt > 0. && t_end.is_finite() && t_end > 0.;
    let n = if valid { (t_end / dt).floor() } else { 0. };

    if !(n >= 1. && n <= MAX_SAMPLES as f64) {
        return Err(PipelineError::InvalidTimeAxis { dt, t_end });
    }

    Ok(n as usize)
}

impl DecayParameters {
    pub fn new(tau: f64, dt: f64, t_end: f64) -> Result<Self, PipelineError> {
        check_time_constant(tau)?;
        let num_samples = number_of_samples(dt, t_end)?;

        if tau > t_end {
            log::warn!("Time constant {} s exceeds decay duration {} s, decay will be truncated", tau, t_end);
        }

        Ok(DecayParameters { tau, dt, t_end, num_samples })
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn t_end(&self) -> f64 {
        self.t_end
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// `floor(t_end / dt)` evenly spaced samples from `0` to `t_end` inclusive
    pub fn time_axis(&self) -> Array1<f64> {
        Array1::linspace(0., self.t_end, self.num_samples())
    }
}

/// A potential (mV) decaying as `|V0| * exp(-t / tau)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExponentialDecay {
    /// Equation the initial potential was taken from
    pub equation: Equation,
    /// Initial potential as estimated (mV), sign retained
    pub initial_potential: f64,
    pub params: DecayParameters,
    /// Time axis (s)
    pub time: Array1<f64>,
    /// Decaying potential (mV)
    pub potential: Array1<f64>,
}

impl ExponentialDecay {
    /// Projects `initial_potential` onto the time axis of `params`
    pub fn new(
        initial_potential: f64,
        equation: Equation,
        params: &DecayParameters,
    ) -> Result<Self, PipelineError> {
        check_time_constant(params.tau)?;

        let time = params.time_axis();
        let amplitude = initial_potential.abs();
        let potential = time.mapv(|t| amplitude * (-t / params.tau).exp());

        log::debug!(
            "Decay of {} mV ({:?}) over {} samples with tau = {} s",
            amplitude, equation, time.len(), params.tau,
        );

        Ok(ExponentialDecay {
            equation,
            initial_potential,
            params: *params,
            time,
            potential,
        })
    }

    pub fn len(&self) -> usize {
        self.potential.len()
    }

    pub fn is_empty(&self) -> bool {
        self.potential.is_empty()
    }

    /// Sampling rate (Hz), `1 / dt`
    pub fn sampling_rate(&self) -> f64 {
        1. / self.params.dt
    }

    /// Estimates the one sided power spectral density of the decay
    pub fn power_spectrum(&self, config: &PeriodogramConfig) -> Result<PowerSpectrum, SpectralError> {
        periodogram(self.potential.view(), self.sampling_rate(), config)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_count_follows_timestep() -> Result<(), PipelineError> {
        let params = DecayParameters::new(5., 0.01, 100.)?;
        let decay = ExponentialDecay::new(-2.5, Equation::Linear, &params)?;

        assert_eq!(decay.len(), 10000);
        assert_eq!(decay.time[0], 0.);
        assert!((decay.time[decay.len() - 1] - 100.).abs() < 1e-9);
        assert_eq!(decay.sampling_rate(), 100.);

        Ok(())
    }

    #[test]
    fn test_decay_is_monotonic_from_absolute_initial_value() -> Result<(), PipelineError> {
        let params = DecayParameters::new(2., 0.05, 60.)?;
        let decay = ExponentialDecay::new(-3.2, Equation::Goldman, &params)?;

        assert_eq!(decay.potential[0], 3.2);
        assert!(decay.potential.iter().all(|v| *v >= 0.));
        assert!(decay.potential.windows(2).into_iter().all(|w| w[1] < w[0]));
        assert!(decay.potential[decay.len() - 1] < 3.2 * 1e-6);

        Ok(())
    }

    #[test]
    fn test_invalid_parameters() {
        assert_eq!(
            DecayParameters::new(0., 0.01, 100.),
            Err(PipelineError::InvalidTimeConstant(Some(0.)))
        );
        assert!(matches!(
            DecayParameters::new(f64::NAN, 0.01, 100.),
            Err(PipelineError::InvalidTimeConstant(_))
        ));
        assert_eq!(
            DecayParameters::new(5., 1., 0.5),
            Err(PipelineError::InvalidTimeAxis { dt: 1., t_end: 0.5 })
        );
        assert!(DecayParameters::new(5., -0.01, 100.).is_err());
    }

    #[test]
    fn test_rejects_oversized_time_axis() -> Result<(), PipelineError> {
        assert_eq!(
            DecayParameters::new(5., 1e-300, 100.),
            Err(PipelineError::InvalidTimeAxis { dt: 1e-300, t_end: 100. })
        );
        assert!(number_of_samples(1e-7, 100.).is_err());
        assert_eq!(number_of_samples(1e-6, 100.)?, MAX_SAMPLES);

        Ok(())
    }

    #[test]
    fn test_deserialization_validates_parameters() -> Result<(), serde_json::Error> {
        let params: DecayParameters = serde_json::from_str(r#"{"tau": 5.0, "dt": 0.01, "t_end": 100.0}"#)?;
        assert_eq!(params.num_samples(), 10000);

        assert!(serde_json::from_str::<DecayParameters>(r#"{"tau": 5.0, "dt": 0.0, "t_end": 100.0}"#).is_err());
        assert!(serde_json::from_str::<DecayParameters>(r#"{"tau": -1.0, "dt": 0.01, "t_end": 100.0}"#).is_err());
        assert!(serde_json::from_str::<DecayParameters>(r#"{"tau": 5.0, "dt": 1e-300, "t_end": 100.0}"#).is_err());

        let serialized = serde_json::to_string(&params)?;
        assert_eq!(serde_json::from_str::<DecayParameters>(&serialized)?, params);

        Ok(())
    }
}

//! Multi trial local field potential recordings read from CSV, one column per
//! trial and one row per sample, for comparison against modelled spectra.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use ndarray::{Array2, ArrayView1};
use crate::error::{DataError, DiffusionPotentialError, SpectralError};
use crate::spectrum::{mean_power_spectrum, periodogram, PeriodogramConfig, PowerSpectrum};


/// Uniformly sampled trials, stored trial by time
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    samples: Array2<f64>,
    sampling_rate: f64,
}

impl Recording {
    pub fn new(samples: Array2<f64>, sampling_rate: f64) -> Result<Self, DiffusionPotentialError> {
        let (num_trials, num_samples) = samples.dim();
        if num_trials == 0 || num_samples == 0 {
            return Err(SpectralError::EmptySignal.into());
        }
        if !(sampling_rate.is_finite() && sampling_rate > 0.) {
            return Err(SpectralError::InvalidSamplingRate(sampling_rate).into());
        }
        if let Some(value) = samples.iter().find(|value| !value.is_finite()) {
            return Err(DataError::Parse {
                context: String::from("recording sample"),
                value: value.to_string(),
            }.into());
        }

        Ok(Recording { samples, sampling_rate })
    }

    /// Reads a headed CSV where each column is a trial
    pub fn from_csv_reader<R: Read>(reader: R, sampling_rate: f64) -> Result<Self, DiffusionPotentialError> {
        let mut reader = csv::Reader::from_reader(reader);
        let num_trials = reader.headers().map_err(DataError::from)?.len();

        let mut values = Vec::new();
        let mut num_samples = 0;
        for record in reader.records() {
            let record = record.map_err(DataError::from)?;
            for field in record.iter() {
                let value = field.trim().parse::<f64>().map_err(|_| DataError::Parse {
                    context: format!("recording row {}", num_samples + 1),
                    value: String::from(field),
                })?;
                values.push(value);
            }
            num_samples += 1;
        }

        if num_trials == 0 || num_samples == 0 {
            return Err(DataError::EmptyData(String::from("recording")).into());
        }

        // rows are read time by trial
        let found = values.len();
        let samples = Array2::from_shape_vec((num_samples, num_trials), values)
            .map_err(|_| DataError::MismatchedLengths {
                label: String::from("recording"),
                expected: num_samples * num_trials,
                found,
            })?
            .reversed_axes()
            .as_standard_layout()
            .to_owned();

        log::info!("Read recording with {} trials of {} samples", num_trials, num_samples);

        Recording::new(samples, sampling_rate)
    }

    pub fn read_csv<P: AsRef<Path>>(path: P, sampling_rate: f64) -> Result<Self, DiffusionPotentialError> {
        let file = BufReader::new(File::open(path).map_err(DataError::from)?);

        Recording::from_csv_reader(file, sampling_rate)
    }

    pub fn num_trials(&self) -> usize {
        self.samples.nrows()
    }

    pub fn num_samples(&self) -> usize {
        self.samples.ncols()
    }

    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// Length of each trial (s)
    pub fn duration(&self) -> f64 {
        self.num_samples() as f64 / self.sampling_rate
    }

    pub fn trial(&self, index: usize) -> Option<ArrayView1<f64>> {
        (index < self.num_trials()).then(|| self.samples.row(index))
    }

    /// Periodogram averaged over every trial
    pub fn mean_power_spectrum(&self, config: &PeriodogramConfig) -> Result<PowerSpectrum, SpectralError> {
        mean_power_spectrum(self.samples.view(), self.sampling_rate, config)
    }

    pub fn trial_power_spectrum(
        &self,
        index: usize,
        config: &PeriodogramConfig,
    ) -> Result<PowerSpectrum, SpectralError> {
        let trial = self.trial(index).ok_or(SpectralError::EmptySignal)?;

        periodogram(trial, self.sampling_rate, config)
    }
}

//! A set of tools to estimate the one sided power spectral density of a finite,
//! uniformly sampled time series with the periodogram.
//!
//! Two interchangeable implementations are provided, [`fft_power_density`] uses the
//! FFT magnitude formula (normalize by `N`, square, double every bin but DC and Nyquist,
//! divide by the frequency resolution `fs / N`) while [`direct_power_density`] evaluates
//! the discrete Fourier transform sum for every bin. Both return bins from 0 Hz
//! up to and including Nyquist for even lengths and satisfy Parseval's theorem,
//! the sum of the spectrum times the frequency resolution is the mean square of the signal.

use std::f64::consts::PI;
use std::str::FromStr;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use num_complex::Complex;
use rustfft::{FftPlanner, FftDirection};
use serde::{Deserialize, Serialize};
use crate::error::{DataError, SpectralError};


/// Trend removed from the signal before the transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Detrend {
    /// Signal is transformed as is
    #[default]
    None,
    /// Mean of the signal is subtracted first
    Constant,
}

impl FromStr for Detrend {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Detrend::None),
            "constant" => Ok(Detrend::Constant),
            _ => Err(DataError::Parse { context: String::from("detrend"), value: String::from(s) }),
        }
    }
}

/// How the discrete Fourier transform is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpectralMethod {
    #[default]
    Fft,
    Direct,
}

/// Settings for [`periodogram`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodogramConfig {
    pub detrend: Detrend,
    pub method: SpectralMethod,
}

/// One sided power spectral density, `power` is in units of the signal squared per Hz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    /// Frequency of each bin (Hz)
    pub frequencies: Array1<f64>,
    /// Power spectral density of each bin
    pub power: Array1<f64>,
    /// Sampling rate of the signal (Hz)
    pub sampling_rate: f64,
    /// Number of samples in the signal
    pub num_samples: usize,
}

impl PowerSpectrum {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Frequency spacing between bins, `fs / N`
    pub fn frequency_resolution(&self) -> f64 {
        self.sampling_rate / self.num_samples as f64
    }

    /// Integrated power, equal to the mean square of the (detrended) signal
    pub fn total_power(&self) -> f64 {
        self.power.sum() * self.frequency_resolution()
    }

    /// First frequency (Hz) at which the density falls to `fraction` of its DC value,
    /// `None` if the DC bin is not positive or the density never falls that low
    pub fn corner_frequency(&self, fraction: f64) -> Option<f64> {
        let dc = *self.power.get(0)?;
        if !(dc > 0.) {
            return None;
        }

        self.power.iter()
            .position(|p| *p <= fraction * dc)
            .map(|i| self.frequencies[i])
    }
}

/// Single sided amplitude spectrum, `2 |X| / N` for every bin but DC and Nyquist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeSpectrum {
    pub frequencies: Array1<f64>,
    pub amplitude: Array1<f64>,
}

fn check_signal(len: usize, sampling_rate: f64) -> Result<(), SpectralError> {
    if len == 0 {
        return Err(SpectralError::EmptySignal);
    }
    if !(sampling_rate.is_finite() && sampling_rate > 0.) {
        return Err(SpectralError::InvalidSamplingRate(sampling_rate));
    }

    Ok(())
}

fn detrended(x: ArrayView1<f64>, detrend: Detrend) -> Vec<f64> {
    match detrend {
        Detrend::None => x.to_vec(),
        Detrend::Constant => {
            let x_mean = x.sum() / x.len() as f64;
            x.iter().map(|x_i| x_i - x_mean).collect()
        },
    }
}

fn num_one_sided_bins(n: usize) -> usize {
    n / 2 + 1
}

/// Whether bin `k` of an `n` point transform has a mirrored negative frequency bin
fn is_doubled(k: usize, n: usize) -> bool {
    k != 0 && !(n % 2 == 0 && k == n / 2)
}

/// Frequencies (Hz) of the one sided bins of an `n` point transform, `k * fs / n`
pub fn frequency_axis(n: usize, sampling_rate: f64) -> Array1<f64> {
    (0..num_one_sided_bins(n))
        .map(|k| k as f64 * sampling_rate / n as f64)
        .collect()
}

fn fft(x: &[f64]) -> Vec<Complex<f64>> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft(x.len(), FftDirection::Forward);

    let mut x_fft: Vec<Complex<f64>> = x.iter()
        .map(|x_i| Complex::new(*x_i, 0.0))
        .collect();
    fft.process(&mut x_fft);

    x_fft
}

fn dft_bins(x: &[f64], num_bins: usize) -> Vec<Complex<f64>> {
    let n = x.len();
    let twiddles: Vec<Complex<f64>> = (0..n)
        .map(|m| Complex::from_polar(1., -2. * PI * m as f64 / n as f64))
        .collect();

    (0..num_bins)
        .map(|k| {
            let mut index = 0;
            let mut sum = Complex::new(0., 0.);
            for x_i in x {
                sum += twiddles[index] * *x_i;
                index = (index + k) % n;
            }

            sum
        })
        .collect()
}

fn density_from_bins(bins: &[Complex<f64>], n: usize, sampling_rate: f64) -> Array1<f64> {
    let df = sampling_rate / n as f64;

    bins.iter()
        .enumerate()
        .map(|(k, x_k)| {
            let normalized = x_k.norm() / n as f64;
            let power = if is_doubled(k, n) { 2. * normalized.powi(2) } else { normalized.powi(2) };

            power / df
        })
        .collect()
}

/// Calculates the one sided power spectral density through the FFT magnitude formula
pub fn fft_power_density(
    x: ArrayView1<f64>,
    sampling_rate: f64,
    detrend: Detrend,
) -> Result<PowerSpectrum, SpectralError> {
    check_signal(x.len(), sampling_rate)?;

    let n = x.len();
    let x_fft = fft(&detrended(x, detrend));
    let power = density_from_bins(&x_fft[..num_one_sided_bins(n)], n, sampling_rate);

    Ok(PowerSpectrum {
        frequencies: frequency_axis(n, sampling_rate),
        power,
        sampling_rate,
        num_samples: n,
    })
}

/// Calculates the one sided periodogram by evaluating the discrete Fourier transform
/// sum directly for each bin, quadratic in the signal length
pub fn direct_power_density(
    x: ArrayView1<f64>,
    sampling_rate: f64,
    detrend: Detrend,
) -> Result<PowerSpectrum, SpectralError> {
    check_signal(x.len(), sampling_rate)?;

    let n = x.len();
    let bins = dft_bins(&detrended(x, detrend), num_one_sided_bins(n));
    let power = density_from_bins(&bins, n, sampling_rate);

    Ok(PowerSpectrum {
        frequencies: frequency_axis(n, sampling_rate),
        power,
        sampling_rate,
        num_samples: n,
    })
}

/// Estimates the one sided power spectral density with the method in `config`
pub fn periodogram(
    x: ArrayView1<f64>,
    sampling_rate: f64,
    config: &PeriodogramConfig,
) -> Result<PowerSpectrum, SpectralError> {
    match config.method {
        SpectralMethod::Fft => fft_power_density(x, sampling_rate, config.detrend),
        SpectralMethod::Direct => direct_power_density(x, sampling_rate, config.detrend),
    }
}

/// Calculates the single sided amplitude spectrum of the signal
pub fn amplitude_spectrum(x: ArrayView1<f64>, sampling_rate: f64) -> Result<AmplitudeSpectrum, SpectralError> {
    check_signal(x.len(), sampling_rate)?;

    let n = x.len();
    let x_fft = fft(&x.to_vec());
    let amplitude = x_fft[..num_one_sided_bins(n)].iter()
        .enumerate()
        .map(|(k, x_k)| {
            let normalized = x_k.norm() / n as f64;
            if is_doubled(k, n) { 2. * normalized } else { normalized }
        })
        .collect();

    Ok(AmplitudeSpectrum {
        frequencies: frequency_axis(n, sampling_rate),
        amplitude,
    })
}

/// Averages the periodograms of every row of `trials` (trial by time)
pub fn mean_power_spectrum(
    trials: ArrayView2<f64>,
    sampling_rate: f64,
    config: &PeriodogramConfig,
) -> Result<PowerSpectrum, SpectralError> {
    let (num_trials, n) = trials.dim();
    if num_trials == 0 {
        return Err(SpectralError::EmptySignal);
    }
    check_signal(n, sampling_rate)?;

    let mut powers = Array2::<f64>::zeros((num_trials, num_one_sided_bins(n)));
    for (row, trial) in trials.outer_iter().enumerate() {
        let spectrum = periodogram(trial, sampling_rate, config)?;
        powers.row_mut(row).assign(&spectrum.power);
    }

    let power = powers.sum_axis(ndarray::Axis(0)) / num_trials as f64;

    Ok(PowerSpectrum {
        frequencies: frequency_axis(n, sampling_rate),
        power,
        sampling_rate,
        num_samples: n,
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn decay(n: usize, dt: f64, tau: f64) -> Array1<f64> {
        (0..n).map(|i| 2.5 * (-(i as f64 * dt) / tau).exp()).collect()
    }

    fn assert_close(a: &Array1<f64>, b: &Array1<f64>, rtol: f64, atol: f64) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(
                (x - y).abs() <= atol + rtol * x.abs().max(y.abs()),
                "{} and {} differ", x, y
            );
        }
    }

    #[test]
    fn test_fft_and_direct_agree() -> Result<(), SpectralError> {
        for n in [500, 501] {
            let x = decay(n, 0.1, 5.);

            let fast = fft_power_density(x.view(), 10., Detrend::None)?;
            let direct = direct_power_density(x.view(), 10., Detrend::None)?;

            assert_eq!(fast.frequencies, direct.frequencies);
            assert_close(&fast.power, &direct.power, 1e-9, 0.);
        }

        Ok(())
    }

    #[test]
    fn test_fft_and_direct_agree_detrended() -> Result<(), SpectralError> {
        let x = decay(256, 0.05, 1.);

        let fast = fft_power_density(x.view(), 20., Detrend::Constant)?;
        let direct = direct_power_density(x.view(), 20., Detrend::Constant)?;
        let scale = fast.power.iter().cloned().fold(0., f64::max);

        assert_close(&fast.power, &direct.power, 1e-9, 1e-12 * scale);
        assert!(fast.power[0].abs() < 1e-20 * scale.max(1.) + 1e-25);

        Ok(())
    }

    #[test]
    fn test_bins_reach_nyquist() -> Result<(), SpectralError> {
        let x = decay(10000, 0.01, 5.);

        let spectrum = fft_power_density(x.view(), 100., Detrend::None)?;
        assert_eq!(spectrum.len(), 5001);
        assert_eq!(spectrum.frequencies[0], 0.);
        assert_eq!(spectrum.frequencies[5000], 50.);

        let odd = fft_power_density(x.slice(ndarray::s![..999]).view(), 100., Detrend::None)?;
        assert_eq!(odd.len(), 500);
        assert!(odd.frequencies[499] < 50.);

        Ok(())
    }

    #[test]
    fn test_parseval() -> Result<(), SpectralError> {
        for n in [64, 65] {
            let x: Array1<f64> = (0..n).map(|i| (0.3 * i as f64).sin() + 0.1 * i as f64).collect();
            let mean_square = x.mapv(|v| v * v).sum() / n as f64;

            let spectrum = fft_power_density(x.view(), 250., Detrend::None)?;
            assert!((spectrum.total_power() - mean_square).abs() < 1e-9 * mean_square);
        }

        Ok(())
    }

    #[test]
    fn test_amplitude_of_sine_superposition() -> Result<(), SpectralError> {
        let fs = 200.;
        let x: Array1<f64> = (0..200)
            .map(|i| {
                let t = i as f64 / fs;
                (2. * PI * t).sin() + 0.5 * (2. * PI * 5. * t).sin() + 0.2 * (2. * PI * 30. * t).sin()
            })
            .collect();

        let spectrum = amplitude_spectrum(x.view(), fs)?;
        assert!((spectrum.amplitude[1] - 1.).abs() < 1e-9);
        assert!((spectrum.amplitude[5] - 0.5).abs() < 1e-9);
        assert!((spectrum.amplitude[30] - 0.2).abs() < 1e-9);
        assert!(spectrum.amplitude[10].abs() < 1e-9);

        Ok(())
    }

    #[test]
    fn test_mean_of_identical_trials() -> Result<(), SpectralError> {
        let trial = decay(128, 0.01, 0.2);
        let mut trials = Array2::zeros((3, 128));
        for mut row in trials.outer_iter_mut() {
            row.assign(&trial);
        }

        let config = PeriodogramConfig::default();
        let mean = mean_power_spectrum(trials.view(), 100., &config)?;
        let single = periodogram(trial.view(), 100., &config)?;

        assert_close(&mean.power, &single.power, 1e-12, 0.);

        Ok(())
    }

    #[test]
    fn test_invalid_inputs() {
        let empty: Array1<f64> = array![];
        assert_eq!(
            fft_power_density(empty.view(), 1., Detrend::None),
            Err(SpectralError::EmptySignal)
        );
        assert_eq!(
            direct_power_density(array![1., 2.].view(), 0., Detrend::None),
            Err(SpectralError::InvalidSamplingRate(0.))
        );
    }
}

//! Closed form estimates of the diffusion potential (mV) generated by a set of
//! ionic concentration gradients: the Goldman-Hodgkin-Katz equation, the Henderson
//! equation and a linearized approximation weighted by the average conductivity.

use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::{DataError, PipelineError, PotentialError};
use crate::ion::{Ion, R, F};
use crate::decay::{DecayParameters, ExponentialDecay};


fn check_temperature(temperature: f64) -> Result<(), PotentialError> {
    if !(temperature.is_finite() && temperature > 0.) {
        return Err(PotentialError::InvalidTemperature(temperature));
    }

    Ok(())
}

fn has_no_gradient(ions: &[Ion]) -> bool {
    !ions.is_empty() && ions.iter().all(|ion| ion.concentrations().delta() == 0.)
}

fn singular(equation: &'static str, term: &'static str) -> PotentialError {
    PotentialError::SingularPotentialEquation { equation, term }
}

fn finite_or_singular(value: f64, equation: &'static str) -> Result<f64, PotentialError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(singular(equation, "result"))
    }
}

/// Thermal voltage `R * T / F` (V)
pub fn thermal_voltage(temperature: f64) -> f64 {
    R * temperature / F
}

/// Calculates the potential (mV) with the Goldman-Hodgkin-Katz equation, cations
/// contribute their outside concentration to the numerator while anions contribute
/// their inside concentration
pub fn goldman_equation(ions: &[Ion], temperature: f64) -> Result<f64, PotentialError> {
    check_temperature(temperature)?;

    let mut numerator_sum = 0.;
    let mut denominator_sum = 0.;
    for ion in ions {
        let c = ion.concentrations();
        if ion.valence() > 0 {
            numerator_sum += ion.diffusion_coefficient() * c.outside;
            denominator_sum += ion.diffusion_coefficient() * c.inside;
        } else {
            numerator_sum += ion.diffusion_coefficient() * c.inside;
            denominator_sum += ion.diffusion_coefficient() * c.outside;
        }
    }

    if denominator_sum == 0. {
        return Err(singular("Goldman", "denominator sum"));
    }
    let ratio = numerator_sum / denominator_sum;
    if !(ratio > 0.) {
        return Err(singular("Goldman", "logarithm argument"));
    }

    finite_or_singular(thermal_voltage(temperature) * ratio.ln() * 1000., "Goldman")
}

/// Calculates the potential (mV) with the Henderson equation
pub fn henderson_equation(ions: &[Ion], temperature: f64) -> Result<f64, PotentialError> {
    check_temperature(temperature)?;

    // ln(1) = 0 multiplies an undefined 0 / 0 prefactor
    if has_no_gradient(ions) {
        return Ok(0.);
    }

    let mut num_sum = 0.;
    let mut denom_sum = 0.;
    let mut num_ln = 0.;
    let mut denom_ln = 0.;
    for ion in ions {
        let c = ion.concentrations();
        let d = ion.diffusion_coefficient();
        let z = ion.z();

        num_sum += d * z.signum() * c.delta();
        denom_sum += d * z.abs() * c.delta();
        num_ln += d * z.abs() * c.outside;
        denom_ln += d * z.abs() * c.inside;
    }

    if denom_sum == 0. {
        return Err(singular("Henderson", "denominator sum"));
    }
    if denom_ln == 0. {
        return Err(singular("Henderson", "logarithm denominator"));
    }
    let ratio = num_ln / denom_ln;
    if !(ratio > 0.) {
        return Err(singular("Henderson", "logarithm argument"));
    }

    finite_or_singular(
        thermal_voltage(temperature) * (num_sum / denom_sum) * ratio.ln() * 1000.,
        "Henderson",
    )
}

/// Calculates the average conductivity of the extracellular medium from the
/// mean concentration of every species
pub fn average_conductivity(ions: &[Ion], temperature: f64) -> Result<f64, PotentialError> {
    check_temperature(temperature)?;

    let psi = thermal_voltage(temperature);
    let summation: f64 = ions.iter()
        .map(|ion| ion.diffusion_coefficient() * ion.z().powi(2) * ion.concentrations().mean())
        .sum();

    Ok((F / psi) * summation)
}

/// Calculates the potential (mV) with the linear approximation weighted by
/// the average conductivity
pub fn linear_approximation(ions: &[Ion], temperature: f64) -> Result<f64, PotentialError> {
    let sigma = average_conductivity(ions, temperature)?;
    if sigma == 0. {
        return Err(singular("Linear", "average conductivity"));
    }

    let summation: f64 = ions.iter()
        .map(|ion| ion.diffusion_coefficient() * ion.z().powi(2) * ion.concentrations().delta())
        .sum();

    finite_or_singular((F / sigma) * summation * 1000., "Linear")
}

/// Selects which estimate of the initial potential drives the decay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Equation {
    Goldman,
    Henderson,
    #[default]
    Linear,
}

impl FromStr for Equation {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "goldman" => Ok(Equation::Goldman),
            "henderson" => Ok(Equation::Henderson),
            "linear" | "delta_phi" => Ok(Equation::Linear),
            _ => Err(DataError::Parse { context: String::from("equation"), value: String::from(s) }),
        }
    }
}

/// The three potential estimates (mV) for one set of ions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialPotentials {
    pub goldman: f64,
    pub henderson: f64,
    pub linear: f64,
}

impl InitialPotentials {
    /// Runs all three equations, fails on the first singular one
    pub fn calculate(ions: &[Ion], temperature: f64) -> Result<Self, PotentialError> {
        let potentials = InitialPotentials {
            goldman: goldman_equation(ions, temperature)?,
            henderson: henderson_equation(ions, temperature)?,
            linear: linear_approximation(ions, temperature)?,
        };
        log::debug!(
            "Initial potentials (mV): goldman = {}, henderson = {}, linear = {}",
            potentials.goldman, potentials.henderson, potentials.linear,
        );

        Ok(potentials)
    }

    pub fn get(&self, equation: Equation) -> f64 {
        match equation {
            Equation::Goldman => self.goldman,
            Equation::Henderson => self.henderson,
            Equation::Linear => self.linear,
        }
    }

    /// Lets the selected estimate relax exponentially over the time axis in `params`
    pub fn decay(
        &self,
        params: &DecayParameters,
        equation: Equation,
    ) -> Result<ExponentialDecay, PipelineError> {
        ExponentialDecay::new(self.get(equation), equation, params)
    }
}

//! # Diffusion Potentials
//!
//! `diffusion_potentials` is a package for estimating the contribution of ionic
//! diffusion to extracellular potentials. Changes in extracellular K⁺, Na⁺ and Cl⁻
//! concentrations generate a diffusion potential that can be calculated with the
//! Goldman equation, the Henderson equation or a linear approximation. Assuming the
//! gradient relaxes exponentially, the potential over time and its power spectral
//! density can be compared against recorded local field potentials.
//!
//! Concentration changes are built from a scenario describing how a potassium
//! (or sodium) change is balanced by the other species, see [`scenario`]. Tables of
//! changes reported in the literature are provided in [`table`].
//!
//! ## Example Code
//!
//! ### Potassium entering in exchange for sodium
//!
//! ```rust
//! use diffusion_potentials::{
//!     error::DiffusionPotentialError,
//!     decay::DecayParameters,
//!     potential::{Equation, InitialPotentials},
//!     scenario::{Baseline, ConcentrationChange, ConcentrationScenario, SodiumExchange},
//!     spectrum::PeriodogramConfig,
//! };
//!
//! fn main() -> Result<(), DiffusionPotentialError> {
//!     let concentrations = SodiumExchange
//!         .concentrations(&ConcentrationChange::potassium(4.), &Baseline { k: 3., na: 149. })?;
//!     let ions = concentrations.to_ions()?;
//!
//!     // initial potentials (mV) from every equation at body temperature
//!     let potentials = InitialPotentials::calculate(&ions, 310.)?;
//!     assert!(potentials.goldman < 0.);
//!
//!     // 100 seconds sampled every 10 ms relaxing with a 5 second time constant
//!     let params = DecayParameters::new(5., 0.01, 100.)?;
//!     let decay = potentials.decay(&params, Equation::Linear)?;
//!     let spectrum = decay.power_spectrum(&PeriodogramConfig::default())?;
//!
//!     assert_eq!(decay.len(), 10000);
//!     assert_eq!(spectrum.frequencies[spectrum.len() - 1], 50.);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Running a table of published recordings
//!
//! ```rust
//! use diffusion_potentials::{
//!     error::DiffusionPotentialError,
//!     table::{published_spreading_depression, run_table, spectrum_series, TableSettings},
//! };
//!
//! fn main() -> Result<(), DiffusionPotentialError> {
//!     let settings = TableSettings { dt: 0.1, t_end: 50., ..TableSettings::default() };
//!     let outputs = run_table(&published_spreading_depression()[..2], &settings)?;
//!
//!     let mut csv = Vec::new();
//!     spectrum_series(&outputs)?.write_csv(&mut csv)?;
//!     assert!(String::from_utf8_lossy(&csv).starts_with("f,\"EngerFig4F, τ=50\""));
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod decay;
pub mod error;
pub mod ion;
pub mod model;
pub mod output;
pub mod potential;
pub mod recording;
pub mod scenario;
pub mod spectrum;
pub mod table;

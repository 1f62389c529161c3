//! Declarative tables of concentration changes reported in the literature and a
//! driver that runs each of them through the diffusion potential pipeline.

use serde::{Deserialize, Serialize};
use crate::error::{DataError, DiffusionPotentialError, ScenarioError};
use crate::ion::DEFAULT_TEMPERATURE;
use crate::model::DiffusionPotential;
use crate::output::LabeledSeries;
use crate::potential::{Equation, InitialPotentials};
use crate::decay::ExponentialDecay;
use crate::scenario::{Baseline, ConcentrationChange, ConcentrationScenario, Concentrations, ScenarioKind};
use crate::spectrum::{PeriodogramConfig, PowerSpectrum};


/// One row of a scenario table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub label: String,
    pub scenario: ScenarioKind,
    pub change: ConcentrationChange,
    pub baseline: Baseline,
    /// Relaxation time constant (s)
    pub tau: f64,
}

impl ScenarioRecord {
    /// Record on the default baseline
    pub fn new(label: &str, scenario: ScenarioKind, change: ConcentrationChange, tau: f64) -> Self {
        ScenarioRecord {
            label: String::from(label),
            scenario,
            change,
            baseline: Baseline::default(),
            tau,
        }
    }

    pub fn with_baseline(mut self, k: f64, na: f64) -> Self {
        self.baseline = Baseline { k, na };
        self
    }

    /// Label with the time constant appended, used as the output column name
    pub fn display_label(&self) -> String {
        format!("{}, τ={}", self.label, self.tau)
    }

    pub fn concentrations(&self) -> Result<Concentrations, ScenarioError> {
        self.scenario.concentrations(&self.change, &self.baseline)
    }
}

/// Settings shared by every record of a table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    /// Timestep (s)
    pub dt: f64,
    /// Duration (s)
    pub t_end: f64,
    /// Temperature (K)
    pub temperature: f64,
    /// Equation whose potential is left to decay
    pub equation: Equation,
    pub periodogram: PeriodogramConfig,
}

impl Default for TableSettings {
    fn default() -> Self {
        TableSettings {
            dt: 0.01,
            t_end: 100.,
            temperature: DEFAULT_TEMPERATURE,
            equation: Equation::Linear,
            periodogram: PeriodogramConfig::default(),
        }
    }
}

/// Everything derived from one record
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub label: String,
    pub concentrations: Concentrations,
    pub potentials: InitialPotentials,
    pub decay: ExponentialDecay,
    pub spectrum: PowerSpectrum,
}

pub fn run_record(record: &ScenarioRecord, settings: &TableSettings) -> Result<ModelOutput, DiffusionPotentialError> {
    let label = record.display_label();
    let concentrations = record.concentrations()?;

    let mut model = DiffusionPotential::from_concentrations(&label, &concentrations)?
        .with_temperature(settings.temperature)
        .with_time_constant(record.tau)
        .with_time_axis(settings.dt, settings.t_end);
    model.calculate_everything(settings.equation, &settings.periodogram)?;

    let (potentials, decay, spectrum) = model.into_results()?;

    Ok(ModelOutput { label, concentrations, potentials, decay, spectrum })
}

/// Runs every record in order, stopping at the first failure
pub fn run_table(records: &[ScenarioRecord], settings: &TableSettings) -> Result<Vec<ModelOutput>, DiffusionPotentialError> {
    let mut outputs = Vec::with_capacity(records.len());
    for record in records {
        let output = run_record(record, settings)?;
        log::info!(
            "{}: goldman = {:.6}, henderson = {:.6}, linear = {:.6} (mV)",
            output.label,
            output.potentials.goldman,
            output.potentials.henderson,
            output.potentials.linear,
        );
        outputs.push(output);
    }

    Ok(outputs)
}

fn sodium_exchange(label: &str, change: ConcentrationChange, baseline: (f64, f64), tau: f64) -> ScenarioRecord {
    ScenarioRecord::new(label, ScenarioKind::SodiumExchange, change, tau)
        .with_baseline(baseline.0, baseline.1)
}

fn spreading_depression(label: &str, delta_k: f64, k_base: f64, tau: f64) -> ScenarioRecord {
    ScenarioRecord::new(label, ScenarioKind::SpreadingDepression, ConcentrationChange::potassium(delta_k), tau)
        .with_baseline(k_base, Baseline::default().na)
}

/// Concentration changes during normal activity, potassium entering in exchange for sodium
pub fn published_recordings() -> Vec<ScenarioRecord> {
    use ConcentrationChange as Change;

    vec![
        sodium_exchange("DietzelFig3", Change::sodium(5.9), (3., 146.), 10.),
        sodium_exchange("DietzelFig4A100", Change::both(6., 15.), (3., 149.), 10.),
        sodium_exchange("DietzelFig4A1000", Change::both(6., 7.), (3., 149.), 10.),
        sodium_exchange("Haj-YaseinFig2a", Change::potassium(4.75), (3.25, 149.), 5.),
        sodium_exchange("Haj-YaseinFig2b", Change::potassium(9.25), (3.25, 149.), 5.),
        sodium_exchange("CordingleyFig2B", Change::potassium(1.891), (2.735, 149.), 5.),
        sodium_exchange("SykovaFig3A", Change::potassium(6.), (3., 149.), 11.8),
        sodium_exchange("SykovaFig14A", Change::potassium(5.), (3., 149.), 10.),
        sodium_exchange("MccreeryFig2B", Change::potassium(4.), (3., 149.), 30.),
        sodium_exchange("Halnes2016", Change::potassium(5.999), (3., 149.), 30.),
        sodium_exchange("NicholsonFig4", Change::potassium(4.4), (3., 149.), 30.),
        sodium_exchange("OcteauFig1G", Change::potassium(0.9), (4.5, 149.), 6.1),
        sodium_exchange("AmzicaFig3A", Change::potassium(0.6), (3.4, 149.), 20.),
        sodium_exchange("FrolichFig1B", Change::potassium(1.6), (3., 149.), 20.),
    ]
}

/// Potassium changes reported during spreading depression
pub fn published_spreading_depression() -> Vec<ScenarioRecord> {
    vec![
        spreading_depression("EngerFig4F", 19., 3., 50.),
        spreading_depression("EngerFig4G", 23., 3., 50.),
        spreading_depression("EngerFig4H", 28., 3., 50.),
        spreading_depression("HerrerasFig1", 51., 3., 30.),
        spreading_depression("SykovaFig14B", 32., 3., 10.2),
        spreading_depression("SykovaFig24", 40., 3., 300.),
        spreading_depression("HansenFig1", 53., 3., 12.),
        spreading_depression("HansenFig2", 50., 3., 12.),
        spreading_depression("KraigFig4", 38., 3., 240.),
        spreading_depression("AmzicaFig6B", 8.25, 3., 20.),
        spreading_depression("AmzicaFig7", 6.5, 3., 20.),
        spreading_depression("FrolichFig1C", 7., 3., 20.),
        spreading_depression("RaimondoFig1", 11., 4., 20.),
    ]
}

/// Initial potentials from every equation for a single potassium change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquationComparison {
    pub delta_k: f64,
    pub goldman: f64,
    pub henderson: f64,
    pub linear: f64,
}

/// Evaluates the three equations for each potassium change under one scenario
pub fn compare_equations(
    scenario: &dyn ConcentrationScenario,
    deltas_k: &[f64],
    baseline: &Baseline,
    temperature: f64,
) -> Result<Vec<EquationComparison>, DiffusionPotentialError> {
    deltas_k.iter()
        .map(|delta_k| -> Result<EquationComparison, DiffusionPotentialError> {
            let concentrations = scenario.concentrations(&ConcentrationChange::potassium(*delta_k), baseline)?;
            let potentials = InitialPotentials::calculate(&concentrations.to_ions()?, temperature)?;

            Ok(EquationComparison {
                delta_k: *delta_k,
                goldman: potentials.goldman,
                henderson: potentials.henderson,
                linear: potentials.linear,
            })
        })
        .collect()
}

/// Potential of every output over time, keyed by label
pub fn potential_series(outputs: &[ModelOutput]) -> Result<LabeledSeries, DataError> {
    let first = outputs.first().ok_or_else(|| DataError::EmptyData(String::from("potential series")))?;

    let mut series = LabeledSeries::new("t", first.decay.time.to_vec());
    for output in outputs {
        series.push(&output.label, output.decay.potential.to_vec())?;
    }

    Ok(series)
}

/// Power spectral density of every output, keyed by label
pub fn spectrum_series(outputs: &[ModelOutput]) -> Result<LabeledSeries, DataError> {
    let first = outputs.first().ok_or_else(|| DataError::EmptyData(String::from("spectrum series")))?;

    let mut series = LabeledSeries::new("f", first.spectrum.frequencies.to_vec());
    for output in outputs {
        series.push(&output.label, output.spectrum.power.to_vec())?;
    }

    Ok(series)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::SpreadingDepression;

    fn coarse_settings() -> TableSettings {
        TableSettings { dt: 0.1, t_end: 400., ..TableSettings::default() }
    }

    #[test]
    fn test_published_tables_are_valid() -> Result<(), ScenarioError> {
        let records: Vec<ScenarioRecord> = published_recordings().into_iter()
            .chain(published_spreading_depression())
            .collect();
        assert_eq!(records.len(), 27);

        for record in &records {
            let concentrations = record.concentrations()?;
            assert!(concentrations.charge_imbalance().abs() < 1e-9, "{}", record.label);
            assert!(record.tau > 0.);
        }

        Ok(())
    }

    #[test]
    fn test_display_label() {
        let record = ScenarioRecord::new(
            "SykovaFig3A", ScenarioKind::SodiumExchange, ConcentrationChange::potassium(6.), 11.8,
        );

        assert_eq!(record.display_label(), "SykovaFig3A, τ=11.8");
    }

    #[test]
    fn test_corner_frequency_scales_with_time_constant() -> Result<(), DiffusionPotentialError> {
        let records: Vec<ScenarioRecord> = [5., 10., 20.].iter()
            .map(|tau| ScenarioRecord::new(
                "K+ = +4", ScenarioKind::SodiumExchange, ConcentrationChange::potassium(4.), *tau,
            ))
            .collect();
        let outputs = run_table(&records, &coarse_settings())?;

        let corners: Vec<f64> = outputs.iter()
            .map(|output| output.spectrum.corner_frequency(0.5).unwrap_or(f64::NAN))
            .collect();
        for pair in corners.windows(2) {
            let ratio = pair[0] / pair[1];
            assert!(ratio > 1.7 && ratio < 2.3, "corner frequencies {:?}", corners);
        }

        let dc: Vec<f64> = outputs.iter().map(|output| output.spectrum.power[0]).collect();
        assert!(dc[0] < dc[1] && dc[1] < dc[2]);

        Ok(())
    }

    #[test]
    fn test_series_share_axis() -> Result<(), DiffusionPotentialError> {
        let records = &published_spreading_depression()[..3];
        let outputs = run_table(records, &coarse_settings())?;

        let potentials = potential_series(&outputs)?;
        let spectra = spectrum_series(&outputs)?;

        assert_eq!(potentials.axis.len(), 4000);
        assert_eq!(spectra.axis.len(), 2001);
        assert_eq!(spectra.axis.last(), Some(&5.));
        assert_eq!(
            potentials.labels().collect::<Vec<&str>>(),
            vec!["EngerFig4F, τ=50", "EngerFig4G, τ=50", "EngerFig4H, τ=50"]
        );

        assert!(matches!(potential_series(&[]), Err(DataError::EmptyData(_))));

        Ok(())
    }

    #[test]
    fn test_compare_equations() -> Result<(), DiffusionPotentialError> {
        let comparisons = compare_equations(
            &SpreadingDepression, &[0., 10., 40.], &Baseline::default(), DEFAULT_TEMPERATURE,
        )?;

        assert_eq!(comparisons.len(), 3);
        assert_eq!(comparisons[0].goldman, 0.);
        assert_eq!(comparisons[0].henderson, 0.);
        assert_eq!(comparisons[0].linear, 0.);
        assert!(comparisons[2].henderson.abs() > comparisons[1].henderson.abs());

        Ok(())
    }
}

//! Parsing of TOML run files. A run file has an optional `[diffusion_potential]`
//! table describing a scenario table to model and an optional `[recording]` table
//! pointing at recorded trials whose spectrum should be estimated.
//!
//! ```toml
//! [diffusion_potential]
//! tag = "normal"
//! dt = 0.01
//! t_end = 100.0
//! equation = "linear"
//! table = "published"
//!
//! [[diffusion_potential.scenario]]
//! label = "custom"
//! scenario = "sodium_exchange"
//! delta_k = 4.0
//! tau = 5.0
//!
//! [recording]
//! file = "lfp.csv"
//! sampling_rate = 2500.0
//! ```

use std::str::FromStr;
use toml::Value;
use crate::error::{DataError, DiffusionPotentialError};
use crate::ion::DEFAULT_TEMPERATURE;
use crate::potential::Equation;
use crate::scenario::{Baseline, ConcentrationChange, ScenarioKind};
use crate::spectrum::{Detrend, PeriodogramConfig};
use crate::table::{published_recordings, published_spreading_depression, ScenarioRecord, TableSettings};


fn parse_f64(value: &Value, field_name: &str) -> Result<f64, DataError> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Integer(v) => Ok(*v as f64),
        _ => Err(DataError::Config(format!("Cannot parse {} as float", field_name))),
    }
}

fn parse_string(value: &Value, field_name: &str) -> Result<String, DataError> {
    value
        .as_str()
        .ok_or_else(|| DataError::Config(format!("Cannot parse {} as string", field_name)))
        .map(String::from)
}

fn parse_value_with_default<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> Result<T, DataError>,
    default: T,
) -> Result<T, DataError> {
    table
        .get(key)
        .map_or(Ok(default), |value| parser(value, key))
}

fn parse_required<T>(
    table: &Value,
    key: &str,
    parser: impl Fn(&Value, &str) -> Result<T, DataError>,
) -> Result<T, DataError> {
    table
        .get(key)
        .ok_or_else(|| DataError::Config(format!("Missing required field {}", key)))
        .and_then(|value| parser(value, key))
}

fn parse_optional_f64(table: &Value, key: &str) -> Result<Option<f64>, DataError> {
    table.get(key).map(|value| parse_f64(value, key)).transpose()
}

fn parse_from_str<T: FromStr>(value: &Value, field_name: &str) -> Result<T, DataError> {
    let string = parse_string(value, field_name)?;

    string.parse::<T>()
        .map_err(|_| DataError::Parse { context: String::from(field_name), value: string })
}

/// Which built in table a run starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTable {
    Published,
    PublishedSpreadingDepression,
    None,
}

impl FromStr for BuiltinTable {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(BuiltinTable::Published),
            "published_spreading_depression" => Ok(BuiltinTable::PublishedSpreadingDepression),
            "none" => Ok(BuiltinTable::None),
            _ => Err(DataError::Parse { context: String::from("table"), value: String::from(s) }),
        }
    }
}

impl BuiltinTable {
    pub fn records(&self) -> Vec<ScenarioRecord> {
        match self {
            BuiltinTable::Published => published_recordings(),
            BuiltinTable::PublishedSpreadingDepression => published_spreading_depression(),
            BuiltinTable::None => Vec::new(),
        }
    }
}

/// A scenario table to run and where to write it
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Prefix of the output files
    pub tag: String,
    pub settings: TableSettings,
    pub records: Vec<ScenarioRecord>,
}

/// A recording to estimate the spectrum of
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingConfig {
    pub file: String,
    /// Sampling rate (Hz)
    pub sampling_rate: f64,
    pub tag: String,
    pub periodogram: PeriodogramConfig,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub diffusion_potential: Option<RunConfig>,
    pub recording: Option<RecordingConfig>,
}

fn parse_scenario_record(table: &Value) -> Result<ScenarioRecord, DiffusionPotentialError> {
    let label: String = parse_required(table, "label", parse_string)?;
    let scenario: ScenarioKind = parse_string(
        table.get("scenario").unwrap_or(&Value::String(String::from("sodium_exchange"))),
        "scenario",
    )?.parse()?;
    let change = ConcentrationChange {
        delta_k: parse_optional_f64(table, "delta_k")?,
        delta_na: parse_optional_f64(table, "delta_na")?,
    };
    let tau: f64 = parse_required(table, "tau", parse_f64)?;

    let default_baseline = Baseline::default();
    let k_base: f64 = parse_value_with_default(table, "k_base", parse_f64, default_baseline.k)?;
    let na_base: f64 = parse_value_with_default(table, "na_base", parse_f64, default_baseline.na)?;

    Ok(ScenarioRecord::new(&label, scenario, change, tau).with_baseline(k_base, na_base))
}

fn parse_run_config(table: &Value) -> Result<RunConfig, DiffusionPotentialError> {
    let defaults = TableSettings::default();

    let tag: String = parse_value_with_default(table, "tag", parse_string, String::from("diffusion_potential"))?;
    let dt: f64 = parse_value_with_default(table, "dt", parse_f64, defaults.dt)?;
    let t_end: f64 = parse_value_with_default(table, "t_end", parse_f64, defaults.t_end)?;
    let temperature: f64 = parse_value_with_default(table, "temperature", parse_f64, DEFAULT_TEMPERATURE)?;
    let equation: Equation = parse_value_with_default(table, "equation", parse_from_str, defaults.equation)?;
    let detrend: Detrend = parse_value_with_default(table, "detrend", parse_from_str, Detrend::None)?;
    let builtin: BuiltinTable = parse_value_with_default(table, "table", parse_from_str, BuiltinTable::Published)?;

    let mut records = builtin.records();
    if let Some(extra) = table.get("scenario") {
        let extra = extra.as_array()
            .ok_or_else(|| DataError::Config(String::from("Cannot parse scenario as array of tables")))?;
        for record in extra {
            records.push(parse_scenario_record(record)?);
        }
    }

    if records.is_empty() {
        return Err(DataError::EmptyData(String::from("scenario table")).into());
    }

    let settings = TableSettings {
        dt,
        t_end,
        temperature,
        equation,
        periodogram: PeriodogramConfig { detrend, ..PeriodogramConfig::default() },
    };

    Ok(RunConfig { tag, settings, records })
}

fn parse_recording_config(table: &Value) -> Result<RecordingConfig, DataError> {
    let file: String = parse_required(table, "file", parse_string)?;
    let sampling_rate: f64 = parse_required(table, "sampling_rate", parse_f64)?;
    let tag: String = parse_value_with_default(table, "tag", parse_string, String::from("recording"))?;
    // recordings are mean removed unless asked otherwise
    let detrend: Detrend = parse_value_with_default(table, "detrend", parse_from_str, Detrend::Constant)?;

    Ok(RecordingConfig {
        file,
        sampling_rate,
        tag,
        periodogram: PeriodogramConfig { detrend, ..PeriodogramConfig::default() },
    })
}

/// Parses the contents of a run file
pub fn parse_config(content: &str) -> Result<Config, DiffusionPotentialError> {
    let config: Value = toml::from_str(content)
        .map_err(|e| DataError::Config(format!("Cannot parse TOML: {}", e)))?;

    let diffusion_potential = match config.get("diffusion_potential") {
        Some(table) => Some(parse_run_config(table)?),
        None => None,
    };
    let recording = match config.get("recording") {
        Some(table) => Some(parse_recording_config(table)?),
        None => None,
    };

    if diffusion_potential.is_none() && recording.is_none() {
        return Err(
            DataError::Config(String::from("Expected a [diffusion_potential] or [recording] table")).into()
        );
    }

    Ok(Config { diffusion_potential, recording })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScenarioError;

    #[test]
    fn test_defaults() -> Result<(), DiffusionPotentialError> {
        let config = parse_config("[diffusion_potential]\n")?;
        let run = config.diffusion_potential.ok_or(DataError::EmptyData(String::from("run")))?;

        assert_eq!(run.tag, "diffusion_potential");
        assert_eq!(run.settings, TableSettings::default());
        assert_eq!(run.records, published_recordings());
        assert!(config.recording.is_none());

        Ok(())
    }

    #[test]
    fn test_full_config() -> Result<(), DiffusionPotentialError> {
        let content = r#"
            [diffusion_potential]
            tag = "sd"
            dt = 0.1
            t_end = 400
            equation = "henderson"
            detrend = "constant"
            table = "none"

            [[diffusion_potential.scenario]]
            label = "cotransport"
            scenario = "chloride_cotransport"
            delta_k = 4
            tau = 5.0
            k_base = 4.0

            [recording]
            file = "lfp.csv"
            sampling_rate = 2500
        "#;
        let config = parse_config(content)?;

        let run = config.diffusion_potential.ok_or(DataError::EmptyData(String::from("run")))?;
        assert_eq!(run.tag, "sd");
        assert_eq!(run.settings.t_end, 400.);
        assert_eq!(run.settings.equation, Equation::Henderson);
        assert_eq!(run.settings.periodogram.detrend, Detrend::Constant);
        assert_eq!(run.records.len(), 1);
        assert_eq!(run.records[0].scenario, ScenarioKind::ChlorideCotransport);
        assert_eq!(run.records[0].change, ConcentrationChange::potassium(4.));
        assert_eq!(run.records[0].baseline, Baseline { k: 4., na: 149. });

        let recording = config.recording.ok_or(DataError::EmptyData(String::from("recording")))?;
        assert_eq!(recording.sampling_rate, 2500.);
        assert_eq!(recording.tag, "recording");
        assert_eq!(recording.periodogram.detrend, Detrend::Constant);

        let untrended = parse_config("[recording]\nfile = \"lfp.csv\"\nsampling_rate = 100\ndetrend = \"none\"\n")?;
        let recording = untrended.recording.ok_or(DataError::EmptyData(String::from("recording")))?;
        assert_eq!(recording.periodogram.detrend, Detrend::None);

        Ok(())
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            parse_config(""),
            Err(DiffusionPotentialError::DataRelatedError(DataError::Config(_)))
        ));
        assert!(matches!(
            parse_config("[diffusion_potential]\ndt = \"fast\"\n"),
            Err(DiffusionPotentialError::DataRelatedError(DataError::Config(_)))
        ));
        assert!(matches!(
            parse_config("[diffusion_potential]\nequation = \"nernst\"\n"),
            Err(DiffusionPotentialError::DataRelatedError(DataError::Parse { .. }))
        ));
        assert!(matches!(
            parse_config("[diffusion_potential]\ntable = \"none\"\n"),
            Err(DiffusionPotentialError::DataRelatedError(DataError::EmptyData(_)))
        ));
        assert!(matches!(
            parse_config("[recording]\nfile = \"lfp.csv\"\n"),
            Err(DiffusionPotentialError::DataRelatedError(DataError::Config(_)))
        ));

        let unknown_scenario = r#"
            [diffusion_potential]
            [[diffusion_potential.scenario]]
            label = "x"
            scenario = "osmosis"
            tau = 1.0
        "#;
        assert!(matches!(
            parse_config(unknown_scenario),
            Err(DiffusionPotentialError::ScenarioRelatedError(ScenarioError::UnknownScenario(_)))
        ));
    }
}

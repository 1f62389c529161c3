use std::{env, fs::read_to_string};
use tracing_subscriber::EnvFilter;
use diffusion_potentials::{
    config::{parse_config, RecordingConfig, RunConfig},
    error::{DataError, DiffusionPotentialError},
    output::LabeledSeries,
    recording::Recording,
    table::{potential_series, run_table, spectrum_series},
};


fn run_diffusion_potential(run: &RunConfig) -> Result<(), DiffusionPotentialError> {
    log::info!(
        "Running {} scenarios (dt = {} s, t_end = {} s, equation = {:?})",
        run.records.len(), run.settings.dt, run.settings.t_end, run.settings.equation,
    );

    let outputs = run_table(&run.records, &run.settings)?;

    let potential_file = format!("{}_potential.csv", run.tag);
    potential_series(&outputs)?.write_csv_file(&potential_file)?;
    log::info!("Wrote {}", potential_file);

    let psd_file = format!("{}_psd.csv", run.tag);
    spectrum_series(&outputs)?.write_csv_file(&psd_file)?;
    log::info!("Wrote {}", psd_file);

    Ok(())
}

fn run_recording(recording_config: &RecordingConfig) -> Result<(), DiffusionPotentialError> {
    let recording = Recording::read_csv(&recording_config.file, recording_config.sampling_rate)?;
    let spectrum = recording.mean_power_spectrum(&recording_config.periodogram)?;

    let mut series = LabeledSeries::new("f", spectrum.frequencies.to_vec());
    series.push(&recording_config.tag, spectrum.power.to_vec())?;

    let psd_file = format!("{}_psd.csv", recording_config.tag);
    series.write_csv_file(&psd_file)?;
    log::info!("Wrote mean spectrum of {} trials to {}", recording.num_trials(), psd_file);

    Ok(())
}

fn main() -> Result<(), DiffusionPotentialError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        log::error!("Requires .toml argument file");
        return Err(DataError::Config(String::from("Requires .toml argument file")).into());
    }

    let toml_content = read_to_string(&args[1]).map_err(DataError::from)?;
    let config = parse_config(&toml_content)?;

    if let Some(run) = &config.diffusion_potential {
        run_diffusion_potential(run)?;
    }

    if let Some(recording_config) = &config.recording {
        run_recording(recording_config)?;
    }

    Ok(())
}

use std::fmt::{Display, Debug, Formatter, Result};


/// Error set for invalid ion species records
#[derive(Clone, PartialEq)]
pub enum IonError {
    /// Concentration (mM) is not strictly positive and finite
    InvalidConcentration { name: String, value: f64 },
    /// Diffusion coefficient (m^2 / s) is not strictly positive and finite
    InvalidDiffusionCoefficient { name: String, value: f64 },
    /// Valence must be a nonzero integer
    InvalidValence { name: String },
    /// Ion set contains the same species more than once
    DuplicateSpecies(String),
    /// Ion set is missing a required species
    MissingSpecies(String),
}

impl Display for IonError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            IonError::InvalidConcentration { name, value } => write!(
                f, "Invalid concentration for {}: {} mM (must be positive and finite)", name, value
            ),
            IonError::InvalidDiffusionCoefficient { name, value } => write!(
                f, "Invalid diffusion coefficient for {}: {} (must be positive and finite)", name, value
            ),
            IonError::InvalidValence { name } => write!(f, "Valence of {} must be nonzero", name),
            IonError::DuplicateSpecies(name) => write!(f, "Species {} is present more than once", name),
            IonError::MissingSpecies(name) => write!(f, "Species {} is required but missing", name),
        }
    }
}

impl Debug for IonError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for the closed form potential equations
#[derive(Clone, PartialEq)]
pub enum PotentialError {
    /// A denominator is zero, a logarithm argument is non-positive or the result
    /// is not finite, `equation` names the equation and `term` the offending term
    SingularPotentialEquation { equation: &'static str, term: &'static str },
    /// Temperature (K) is not strictly positive and finite
    InvalidTemperature(f64),
}

impl Display for PotentialError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            PotentialError::SingularPotentialEquation { equation, term } => write!(
                f, "{} equation is singular: {} is undefined for the given concentrations", equation, term
            ),
            PotentialError::InvalidTemperature(value) => write!(
                f, "Invalid temperature: {} K (must be positive and finite)", value
            ),
        }
    }
}

impl Debug for PotentialError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for the potential, decay and spectrum stages
#[derive(Clone, PartialEq)]
pub enum PipelineError {
    /// A stage was invoked before the stage it depends on
    StageOrderViolation { stage: &'static str, requires: &'static str },
    /// Time constant is missing, non-positive or not finite
    InvalidTimeConstant(Option<f64>),
    /// Timestep and end time do not describe at least one sample
    InvalidTimeAxis { dt: f64, t_end: f64 },
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            PipelineError::StageOrderViolation { stage, requires } => write!(
                f, "Cannot run {} stage before {} stage", stage, requires
            ),
            PipelineError::InvalidTimeConstant(Some(tau)) => write!(
                f, "Invalid time constant: {} s (must be positive and finite)", tau
            ),
            PipelineError::InvalidTimeConstant(None) => write!(f, "Time constant is required for decay"),
            PipelineError::InvalidTimeAxis { dt, t_end } => write!(
                f, "Invalid time axis: dt = {}, t_end = {} (needs positive values and at least one sample)", dt, t_end
            ),
        }
    }
}

impl Debug for PipelineError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for scenario policies
#[derive(Clone, PartialEq)]
pub enum ScenarioError {
    /// Scenario needs a concentration change it was not given
    MissingConcentrationChange { scenario: &'static str, requires: &'static str },
    /// Scenario name is not recognized
    UnknownScenario(String),
    /// Resulting concentrations are invalid
    IonRelatedError(IonError),
}

impl Display for ScenarioError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ScenarioError::MissingConcentrationChange { scenario, requires } => write!(
                f, "Scenario {} requires {}", scenario, requires
            ),
            ScenarioError::UnknownScenario(name) => write!(f, "Unknown scenario: {}", name),
            ScenarioError::IonRelatedError(err) => write!(f, "{}", err),
        }
    }
}

impl Debug for ScenarioError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl From<IonError> for ScenarioError {
    fn from(err: IonError) -> ScenarioError {
        ScenarioError::IonRelatedError(err)
    }
}

/// Error set for spectral estimation
#[derive(Clone, PartialEq)]
pub enum SpectralError {
    /// Signal has no samples
    EmptySignal,
    /// Sampling rate (Hz) is not strictly positive and finite
    InvalidSamplingRate(f64),
}

impl Display for SpectralError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            SpectralError::EmptySignal => write!(f, "Signal must have at least one sample"),
            SpectralError::InvalidSamplingRate(fs) => write!(
                f, "Invalid sampling rate: {} Hz (must be positive and finite)", fs
            ),
        }
    }
}

impl Debug for SpectralError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

/// Error set for reading and writing data files
pub enum DataError {
    /// Underlying I/O failure
    Io(std::io::Error),
    /// Malformed CSV
    Csv(csv::Error),
    /// Malformed JSON
    Json(serde_json::Error),
    /// Value cannot be parsed, `context` describes where
    Parse { context: String, value: String },
    /// Columns or series have differing lengths
    MismatchedLengths { label: String, expected: usize, found: usize },
    /// File or series contains no data
    EmptyData(String),
    /// Label is used by more than one series
    DuplicateLabel(String),
    /// Configuration value is missing or of the wrong type
    Config(String),
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            DataError::Io(err) => write!(f, "I/O error: {}", err),
            DataError::Csv(err) => write!(f, "CSV error: {}", err),
            DataError::Json(err) => write!(f, "JSON error: {}", err),
            DataError::Parse { context, value } => write!(f, "Cannot parse '{}' in {}", value, context),
            DataError::MismatchedLengths { label, expected, found } => write!(
                f, "Series {} has length {}, expected {}", label, found, expected
            ),
            DataError::EmptyData(context) => write!(f, "No data in {}", context),
            DataError::DuplicateLabel(label) => write!(f, "Label {} is already present", label),
            DataError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Debug for DataError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> DataError {
        DataError::Io(err)
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> DataError {
        DataError::Csv(err)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> DataError {
        DataError::Json(err)
    }
}

/// A set of errors that may occur when using the library
pub enum DiffusionPotentialError {
    /// Errors related to ion species records
    IonRelatedError(IonError),
    /// Errors related to the potential equations
    PotentialRelatedError(PotentialError),
    /// Errors related to stage ordering and decay parameters
    PipelineRelatedError(PipelineError),
    /// Errors related to scenario policies
    ScenarioRelatedError(ScenarioError),
    /// Errors related to spectral estimation
    SpectralRelatedError(SpectralError),
    /// Errors related to data files and configuration
    DataRelatedError(DataError),
}

impl Display for DiffusionPotentialError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            DiffusionPotentialError::IonRelatedError(err) => write!(f, "{}", err),
            DiffusionPotentialError::PotentialRelatedError(err) => write!(f, "{}", err),
            DiffusionPotentialError::PipelineRelatedError(err) => write!(f, "{}", err),
            DiffusionPotentialError::ScenarioRelatedError(err) => write!(f, "{}", err),
            DiffusionPotentialError::SpectralRelatedError(err) => write!(f, "{}", err),
            DiffusionPotentialError::DataRelatedError(err) => write!(f, "{}", err),
        }
    }
}

impl Debug for DiffusionPotentialError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "file: {}, line: {}, error: {}", file!(), line!(), self)
    }
}

impl std::error::Error for IonError {}
impl std::error::Error for PotentialError {}
impl std::error::Error for PipelineError {}
impl std::error::Error for ScenarioError {}
impl std::error::Error for SpectralError {}
impl std::error::Error for DataError {}
impl std::error::Error for DiffusionPotentialError {}

impl From<IonError> for DiffusionPotentialError {
    fn from(err: IonError) -> DiffusionPotentialError {
        DiffusionPotentialError::IonRelatedError(err)
    }
}

impl From<PotentialError> for DiffusionPotentialError {
    fn from(err: PotentialError) -> DiffusionPotentialError {
        DiffusionPotentialError::PotentialRelatedError(err)
    }
}

impl From<PipelineError> for DiffusionPotentialError {
    fn from(err: PipelineError) -> DiffusionPotentialError {
        DiffusionPotentialError::PipelineRelatedError(err)
    }
}

impl From<ScenarioError> for DiffusionPotentialError {
    fn from(err: ScenarioError) -> DiffusionPotentialError {
        DiffusionPotentialError::ScenarioRelatedError(err)
    }
}

impl From<SpectralError> for DiffusionPotentialError {
    fn from(err: SpectralError) -> DiffusionPotentialError {
        DiffusionPotentialError::SpectralRelatedError(err)
    }
}

impl From<DataError> for DiffusionPotentialError {
    fn from(err: DataError) -> DiffusionPotentialError {
        DiffusionPotentialError::DataRelatedError(err)
    }
}

impl From<std::io::Error> for DiffusionPotentialError {
    fn from(err: std::io::Error) -> DiffusionPotentialError {
        DiffusionPotentialError::DataRelatedError(DataError::Io(err))
    }
}

impl From<csv::Error> for DiffusionPotentialError {
    fn from(err: csv::Error) -> DiffusionPotentialError {
        DiffusionPotentialError::DataRelatedError(DataError::Csv(err))
    }
}

impl From<serde_json::Error> for DiffusionPotentialError {
    fn from(err: serde_json::Error) -> DiffusionPotentialError {
        DiffusionPotentialError::DataRelatedError(DataError::Json(err))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_umbrella_display_forwards_message() {
        let err: DiffusionPotentialError = PipelineError::StageOrderViolation {
            stage: "spectrum", requires: "decay"
        }.into();

        assert_eq!(err.to_string(), "Cannot run spectrum stage before decay stage");
        assert!(matches!(
            err,
            DiffusionPotentialError::PipelineRelatedError(PipelineError::StageOrderViolation { .. })
        ));
    }

    #[test]
    fn test_debug_includes_location() {
        let err = SpectralError::EmptySignal;

        let debug = format!("{:?}", err);
        assert!(debug.contains("file:"));
        assert!(debug.contains("Signal must have at least one sample"));
    }

    #[test]
    fn test_scenario_wraps_ion_error() {
        let err: ScenarioError = IonError::InvalidConcentration {
            name: String::from("Na"), value: -1.
        }.into();

        assert!(err.to_string().contains("Na"));
    }
}

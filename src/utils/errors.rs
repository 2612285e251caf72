use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoAssistError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown reference system: {0}")]
    UnknownCrs(String),

    #[error("Zone {0} is outside the valid range 1..=60")]
    InvalidZone(u32),

    #[error("Zone not selected for zoned reference system: {0}")]
    ZoneNotResolved(String),

    #[error("Conversion setup incomplete: missing {}", missing.join(", "))]
    SetupIncomplete { missing: Vec<&'static str> },

    #[error("No coordinates recognized in the input")]
    NoCoordinatesRecognized,

    #[error("Recognized text contains uncertain characters and needs manual correction")]
    RecognitionUncertain,

    #[error("Transform from {source_id} to {dest_id} failed: {message}")]
    TransformFailed {
        source_id: String,
        dest_id: String,
        message: String,
    },

    #[error("Invalid cadastral number: {0}")]
    InvalidCadastralNumber(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Daily request limit of {limit} reached")]
    DailyLimitReached { limit: u32 },

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, GeoAssistError>;

impl GeoAssistError {
    /// Transient conditions the user may simply retry, as opposed to input
    /// that must be corrected first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GeoAssistError::ServiceUnavailable(_))
    }
}

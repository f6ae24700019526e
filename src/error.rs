//! Error types for birdstats.

/// Result type alias for birdstats operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for birdstats.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    /// Dataset not found in configuration.
    #[error("dataset '{name}' not found in configuration")]
    DatasetNotFound {
        /// Short name of the missing dataset.
        name: String,
    },

    /// No datasets configured.
    #[error("no datasets configured (add [[datasets]] entries to the config file)")]
    NoDatasets,

    /// Failed to read a detection corpus archive.
    #[error("failed to read detection corpus '{path}'")]
    CorpusRead {
        /// Path to the corpus archive.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Corpus archive content is malformed.
    #[error("invalid detection corpus '{path}': {message}")]
    InvalidCorpus {
        /// Path to the corpus archive.
        path: std::path::PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// Failed to write a detection corpus archive.
    #[error("failed to write detection corpus '{path}'")]
    CorpusWrite {
        /// Path to the corpus archive.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Corpus archive extension is not recognised.
    #[error("unsupported corpus format: {path} (expected .json or .parquet)")]
    UnsupportedCorpusFormat {
        /// Path to the corpus archive.
        path: std::path::PathBuf,
    },

    /// Failed to parse annotation file.
    #[error("failed to parse annotation file '{path}'")]
    AnnotationParseFailed {
        /// Path to the annotation file.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid annotation file format.
    #[error("invalid annotation file format: {message}")]
    InvalidAnnotationFormat {
        /// Description of the format error.
        message: String,
    },

    /// Failed to read site metadata table.
    #[error("failed to read site metadata '{path}'")]
    SiteInfoRead {
        /// Path to the site metadata table.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Dataset has no site metadata table configured.
    #[error("dataset '{name}' has no site_info table configured")]
    SiteInfoMissing {
        /// Short name of the dataset.
        name: String,
    },

    /// Threshold grid is unusable.
    #[error("invalid threshold grid: {message}")]
    InvalidThresholdGrid {
        /// Description of the problem.
        message: String,
    },

    /// Date window ends before it starts.
    #[error("date window ends ({end}) before it starts ({start})")]
    InvalidDateWindow {
        /// First day of the window.
        start: chrono::NaiveDate,
        /// Last day of the window.
        end: chrono::NaiveDate,
    },

    /// Failed to create output directory.
    #[error("failed to create output directory '{path}'")]
    OutputDirCreateFailed {
        /// Path to the output directory.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a CSV report.
    #[error("failed to write CSV report '{path}'")]
    CsvWrite {
        /// Path to the report file.
        path: std::path::PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to write a JSON report.
    #[error("failed to write JSON report '{path}'")]
    JsonWrite {
        /// Path to the report file.
        path: std::path::PathBuf,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

//! Domain error types.

/// Top-level error type for reinvestor.
#[derive(Debug, thiserror::Error)]
pub enum ReinvestorError {
    #[error("input not found: {path}")]
    NotFound { path: String },

    #[error("required field missing: {field}")]
    Schema { field: String },

    #[error("timestamps must be strictly increasing (row {row})")]
    UnorderedIndex { row: usize },

    #[error("column {column} has {actual} values, index has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid value in {field} at row {row}: {reason}")]
    InvalidValue {
        field: String,
        row: usize,
        reason: String,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReinvestorError {
    pub fn schema(field: &str) -> Self {
        ReinvestorError::Schema {
            field: field.to_string(),
        }
    }

    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        ReinvestorError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for ReinvestorError {
    fn from(err: csv::Error) -> Self {
        ReinvestorError::Csv {
            reason: err.to_string(),
        }
    }
}

impl From<&ReinvestorError> for std::process::ExitCode {
    fn from(err: &ReinvestorError) -> Self {
        let code: u8 = match err {
            ReinvestorError::Io(_) | ReinvestorError::NotFound { .. } => 1,
            ReinvestorError::ConfigParse { .. }
            | ReinvestorError::ConfigMissing { .. }
            | ReinvestorError::ConfigInvalid { .. } => 2,
            ReinvestorError::Schema { .. }
            | ReinvestorError::UnorderedIndex { .. }
            | ReinvestorError::LengthMismatch { .. }
            | ReinvestorError::InvalidValue { .. }
            | ReinvestorError::Csv { .. } => 3,
            ReinvestorError::InvalidParameter { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

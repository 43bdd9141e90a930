use thiserror::Error;

/// Main error type for sweep suggestion
#[derive(Error, Debug)]
pub enum SwError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A sweep description that is well-formed but cannot drive the requested search
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid sweep method for {expected} search: found {found}")]
    WrongMethod { expected: String, found: String },

    #[error("Grid search requires a \"parameters\" section")]
    MissingParameters,

    #[error(
        "Parameters {} are a disallowed type with grid search; grid search requires all parameters to be categorical or constant",
        .names.join(", ")
    )]
    DisallowedParameters { names: Vec<String> },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl SwError {
    pub fn is_validation(&self) -> bool {
        matches!(self, SwError::Validation(_))
    }

    pub fn is_config(&self) -> bool {
        matches!(self, SwError::Config(_))
    }
}

/// Result type alias for sweep operations
pub type SwResult<T> = Result<T, SwError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::SwError::Validation(format!($($arg)*))
    };
}

/// Macro for creating invalid-parameter configuration errors
#[macro_export]
macro_rules! config_error {
    ($name:expr, $($arg:tt)*) => {
        $crate::SwError::Config($crate::ConfigError::InvalidParameter {
            name: ($name).to_string(),
            reason: format!($($arg)*),
        })
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ConfigError::DisallowedParameters {
            names: vec!["v1".to_string(), "v2".to_string()],
        };

        assert!(error.to_string().contains("v1, v2"));
        assert!(error.to_string().contains("categorical or constant"));
    }

    #[test]
    fn test_error_conversion() {
        let sw_error: SwError = ConfigError::MissingParameters.into();

        match sw_error {
            SwError::Config(ConfigError::MissingParameters) => (),
            _ => panic!("Expected Config error"),
        }
        assert!(sw_error.is_config());
        assert!(!sw_error.is_validation());
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("Invalid value: {}", 42);
        assert!(validation_err.is_validation());

        let config_err = config_error!("lr", "missing {}", "values");
        match config_err {
            SwError::Config(ConfigError::InvalidParameter { name, reason }) => {
                assert_eq!(name, "lr");
                assert_eq!(reason, "missing values");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

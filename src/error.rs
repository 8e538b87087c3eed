use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    OutOfRange,
    UnknownLevel,
    UnsupportedStep,
    InvalidField,
    AssignOffsetAmbiguous,
    UnknownAction,
    MissingOption,
    ConfigError,
    TransportError,
    Timeout,
    RuntimeError,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub error_type: ErrorType,
    pub message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}; {}", self.error_type, self.message)
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn new(error_type: ErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
        }
    }

    pub fn out_of_range(message: String) -> Self {
        Self::new(ErrorType::OutOfRange, message)
    }

    pub fn invalid_field(message: String) -> Self {
        Self::new(ErrorType::InvalidField, message)
    }

    pub fn missing_option(name: &str) -> Self {
        Self::new(ErrorType::MissingOption, format!("option '{}' is required", name))
    }

    pub fn config(message: String) -> Self {
        Self::new(ErrorType::ConfigError, message)
    }

    pub fn transport(message: String) -> Self {
        Self::new(ErrorType::TransportError, message)
    }

    pub fn timeout() -> Self {
        Self {
            error_type: ErrorType::Timeout,
            message: "".to_string(),
        }
    }

    pub fn runtime(message: &str) -> Self {
        Self {
            error_type: ErrorType::RuntimeError,
            message: message.to_string(),
        }
    }
}

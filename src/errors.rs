use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DqlError {
    #[error("{0} is required")]
    Validation(String),
    #[error("unsupported field type for {0}")]
    UnsupportedType(String),
    #[error("order field {0} does not exist")]
    InvalidField(String),
    #[error("unsupported filter function {0}")]
    UnsupportedFunction(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record already exists: {0}")]
    AlreadyExists(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("unique field conflicts with an existing record: {0}")]
    Conflict(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl DqlError {
    pub fn validation<T: Into<String>>(field: T) -> Self {
        DqlError::Validation(field.into())
    }

    pub fn unsupported_type<T: Into<String>>(field: T) -> Self {
        DqlError::UnsupportedType(field.into())
    }

    pub fn invalid_field<T: Into<String>>(field: T) -> Self {
        DqlError::InvalidField(field.into())
    }

    pub fn unsupported_function<T: Into<String>>(func: T) -> Self {
        DqlError::UnsupportedFunction(func.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        DqlError::InvalidInput(msg.into())
    }

    pub fn already_exists<T: Into<String>>(msg: T) -> Self {
        DqlError::AlreadyExists(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        DqlError::NotFound(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        DqlError::Conflict(msg.into())
    }

    pub fn transport<T: Into<String>>(msg: T) -> Self {
        DqlError::Transport(msg.into())
    }

    /// True for failures raised while building a query, before any round trip.
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            DqlError::Validation(_)
                | DqlError::UnsupportedType(_)
                | DqlError::InvalidField(_)
                | DqlError::UnsupportedFunction(_)
                | DqlError::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for DqlError {
    fn from(err: serde_json::Error) -> Self {
        DqlError::transport(err.to_string())
    }
}

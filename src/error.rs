/**
 * Library-level error codes. Every error is fatal to the invocation that
 * raised it; nothing is retried internally.
 */
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("model has not been configured")]
    ModelNotConfigured,

    #[error("linear solution unavailable: {0}")]
    SolutionUnavailable(String),

    #[error("non-linear propagation diverged at r={radius:.4} au: {reason}")]
    PropagationDiverged {
        radius: f64,
        reason: String,
    },

    #[error("cannot merge grids of shape {left:?} and {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}




/**
 * Errors raised while resolving user model parameters into `Parameters`.
 */
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SetupError {

    #[error("{0}")]
    Invalid(String),

    #[error("arithmetic error in derived quantity {0}")]
    Arithmetic(String),
}

impl From<SetupError> for Error {
    fn from(error: SetupError) -> Self {
        match error {
            SetupError::Invalid(message) => Error::Configuration(message),
            SetupError::Arithmetic(_) => Error::ModelNotConfigured,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("weight table has no entry for {from} -> {to}")]
    MissingEntry { from: String, to: String },

    #[error("state is not part of the node order: {state}")]
    UnknownState { state: String },

    #[error("duplicate state label in weight table: {state}")]
    DuplicateState { state: String },

    #[error("weight table shape mismatch: expected {expected} values in {axis}, found {found}")]
    Shape {
        axis: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid edge label format {format:?}: {message}")]
    InvalidLabelFormat { format: String, message: String },

    #[error("layout radius must be finite and positive, got {radius}")]
    InvalidRadius { radius: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;

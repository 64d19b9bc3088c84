use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid number in {field}: {raw:?}")]
    InvalidNumber { field: &'static str, raw: String },

    #[error("invalid timestamp in {field}: {raw:?}")]
    InvalidTimestamp { field: &'static str, raw: String },

    #[error("unknown {kind}: {raw:?}")]
    UnknownVariant { kind: &'static str, raw: String },
}

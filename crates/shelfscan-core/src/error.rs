use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// A listing that left the extractor with a field outside its allowed shape.
///
/// This is a data error, not an upstream failure: retrying the fetch would
/// produce the same record.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("listing {identifier:?} has an empty title")]
    EmptyTitle { identifier: String },

    #[error("listing has an empty identifier")]
    EmptyIdentifier,

    #[error("listing {identifier:?} has an invalid {field}: {reason}")]
    InvalidUrl {
        identifier: String,
        field: &'static str,
        reason: String,
    },

    #[error("listing {identifier:?} has rating {rating} outside [0, 5]")]
    RatingOutOfRange { identifier: String, rating: f64 },

    #[error("listing {identifier:?} has negative price {price}")]
    NegativePrice { identifier: String, price: String },
}

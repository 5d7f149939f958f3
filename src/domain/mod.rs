//! Domain layer module root.
//! Pure types and binary constructions with no file or PDF dependencies.

pub mod cms;
pub mod constants;
pub mod der;
pub mod tstoken;
pub mod types;

pub use cms::{CmsSignedData, SignedAttribute, SignedAttributesCanonical};
pub use tstoken::{TimestampResponse, TimestampToken};
pub use types::{
    CertificateBundle, ConformanceLevel, HashAlgorithm, SigningState, ValidationData,
};

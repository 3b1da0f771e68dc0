pub mod types;
pub mod classification;

pub use types::MeisterError;
pub use classification::ErrorClassification;

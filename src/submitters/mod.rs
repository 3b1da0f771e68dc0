pub mod pov;

pub use pov::{PovSubmitter, SubmissionReport};

pub mod target;
pub mod team;
pub mod exploit;
pub mod job;

pub use target::*;
pub use team::*;
pub use exploit::*;
pub use job::*;

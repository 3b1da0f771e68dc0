pub mod connection;
pub mod schema;
pub mod teams;
pub mod binaries;
pub mod exploits;
pub mod jobs;

pub use connection::Database;

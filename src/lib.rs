pub mod cgc;
pub mod cli;
pub mod config;
pub mod creators;
pub mod db;
pub mod errors;
pub mod models;
pub mod scheduler;
pub mod submitters;

pub mod batch;
pub mod config;
pub mod errors;
pub mod logo_sync;
pub mod schedule;
pub mod utils;

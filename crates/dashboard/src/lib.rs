pub mod config;
pub mod constants;
pub mod core;
pub mod errors;
pub mod logging;
pub mod server;
pub mod sources;
pub mod types;

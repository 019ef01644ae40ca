pub mod commands;
pub mod config;

pub use commands::{run, CliCommand};
pub use config::CliConfig;

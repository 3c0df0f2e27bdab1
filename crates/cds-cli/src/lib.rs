//! Terminal frontend, configuration and subcommands behind `cds-survey`.

pub mod commands;
pub mod config;
pub mod frontend;
pub mod logging;

pub use config::SurveyConfig;
pub use frontend::{SessionOutcome, Terminal};

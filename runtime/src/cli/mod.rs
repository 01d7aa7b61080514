//! CLI subcommand implementations for the vacancy-feed binary.

pub mod classify_cmd;
pub mod doctor;
pub mod output;
pub mod run_cmd;

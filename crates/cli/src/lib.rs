//! Command-line front end for the netlease policy engine and lease broker.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

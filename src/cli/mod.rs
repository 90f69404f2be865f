//! CLI Module
//!
//! Provides command-line interface functionality including:
//! - Exit codes for automation
//! - Text/JSON rendering of decoded readings

pub mod exit_codes;
pub mod output;

pub use exit_codes::{
    exit_code_description, io_error_code, print_exit_codes, CliResult, ExitCodes,
};
pub use output::{format_reading, OutputFormat};

//! Output formatting utilities for the CLI.
//!
//! Every command renders through [`CommandOutput`] so human and `--json`
//! output stay in lockstep. Tables go through [`TableFormatter`].

use serde::Serialize;

pub mod table;

pub use table::TableFormatter;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

/// Print a command result to stdout in the requested mode.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}

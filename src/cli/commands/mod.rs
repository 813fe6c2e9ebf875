//! CLI command implementations.

pub mod history;
pub mod init;
pub mod pipeline;
pub mod refresh;
pub mod status;

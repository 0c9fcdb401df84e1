//! Subcommand implementations. Each prints to stdout; logs go to stderr.

pub mod preview;
pub mod retime;
pub mod submit;

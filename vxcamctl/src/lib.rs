//! Library side of `vxcamctl`: argument definitions, layered configuration
//! and the subcommand implementations the binary dispatches to.
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;

//! VoxBridge command-line front end
//!
//! Parses arguments, then drives [`application::ProviderService`] through
//! the handlers in [`commands`].

#![allow(clippy::print_stdout, clippy::print_stderr)]

pub mod cli;
pub mod commands;
pub mod output;

pub use cli::{Cli, Commands, RoutingArgs, log_filter_from_verbosity};

//! Sluice CLI - Command-line interface for the Sluice migration resolver.
//!
//! This crate provides the `sluice` tool, which resolves the migrations of a
//! project into an ordered plan and reports naming problems and conflicts.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;

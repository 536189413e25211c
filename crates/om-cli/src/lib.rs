//! omsx: Command-line interface for openMSX
//!
//! Provides the `omsx` CLI for discovering, driving and launching a local
//! openMSX emulator.

pub mod commands;
pub mod output;

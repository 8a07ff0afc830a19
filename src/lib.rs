//! A step-wise action-resolution engine for Power-to-X energy systems.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod action;
pub mod calculation;
pub mod capability;
pub mod cli;
pub mod commodity;
pub mod component;
pub mod graph;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod project;
pub mod settings;
pub mod simulation;
pub mod system;
pub mod units;
pub mod weather;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// This is a platform-dependent location for program configuration files (e.g. `settings.toml`).
pub fn get_ptxsim_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        panic!("Could not get path to user's config directory");
    };

    config_dir.push("ptxsim");
    config_dir
}

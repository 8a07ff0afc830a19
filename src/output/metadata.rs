//! Records which project was run, with which build of ptxsim and where.
use crate::project::Project;
use crate::units::Money;
use anyhow::{Result, anyhow};
use chrono::Local;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

mod built_info {
    // Generated by build.rs
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunSection<'a>,
    program: ProgramSection,
    platform: PlatformSection,
}

/// The project and its run settings
#[derive(Serialize)]
struct RunSection<'a> {
    project_path: &'a Path,
    project_name: &'a str,
    episodes: u32,
    max_steps: u32,
    starting_budget: Money,
    started: String,
}

/// The build of ptxsim which produced the results
#[derive(Serialize)]
struct ProgramSection {
    version: &'static str,
    /// Short commit hash, suffixed with `-dirty` for uncommitted changes
    commit: String,
}

/// The operating system and architecture
#[derive(Serialize)]
struct PlatformSection {
    os: String,
    release: String,
    machine: String,
}

fn commit() -> String {
    match (built_info::GIT_COMMIT_HASH_SHORT, built_info::GIT_DIRTY) {
        (Some(hash), Some(true)) => format!("{hash}-dirty"),
        (Some(hash), _) => hash.to_string(),
        (None, _) => "unknown".to_string(),
    }
}

fn platform() -> Result<PlatformSection> {
    let info =
        PlatformInfo::new().map_err(|err| anyhow!("Unable to determine platform info: {err}"))?;
    Ok(PlatformSection {
        os: info.osname().to_string_lossy().into(),
        release: info.release().to_string_lossy().into(),
        machine: info.machine().to_string_lossy().into(),
    })
}

/// Write `metadata.toml` for a run of `project` into `output_path`
pub fn write_metadata(output_path: &Path, project_path: &Path, project: &Project) -> Result<()> {
    let metadata = Metadata {
        run: RunSection {
            project_path,
            project_name: &project.parameters.name,
            episodes: project.parameters.episodes,
            max_steps: project.max_steps,
            starting_budget: project.parameters.starting_budget,
            started: Local::now().to_rfc3339(),
        },
        program: ProgramSection {
            version: built_info::PKG_VERSION,
            commit: commit(),
        },
        platform: platform()?,
    };
    fs::write(
        output_path.join(METADATA_FILE_NAME),
        toml::to_string(&metadata)?,
    )?;

    Ok(())
}

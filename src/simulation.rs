//! Functionality for running episodes of a PtX project.
use crate::output::DataWriter;
use crate::project::Project;
use anyhow::Result;
use log::info;
use std::path::Path;

pub mod action_space;
pub use action_space::{ActionSlot, ActionSpace};
pub mod dispatch;
pub use dispatch::{DispatchReport, dispatch_conversions};
pub mod episode;
pub use episode::{Environment, StepReport};
pub mod stage;
pub use stage::{ActionRecord, Stage, StepOutcome, resolve_step};

/// Run every episode of a project, replaying its scheduled actions.
///
/// # Arguments:
///
/// * `project` - The project to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write the state of the system after every step
pub fn run(project: &Project, output_path: &Path, debug_model: bool) -> Result<()> {
    let mut writer = DataWriter::create(output_path, debug_model)?;
    let mut environment = Environment::new(project.system.clone_template(), project.max_steps);

    for episode in 0..project.parameters.episodes {
        info!("Episode {}", episode + 1);
        environment.reset();

        loop {
            let vector = project
                .schedule
                .vector_for(environment.system().current_step());
            let report = environment.act(&vector)?;
            writer.write_step(episode, &report, environment.system())?;
            if report.is_done() {
                let system = environment.system();
                let outcome = if report.terminated {
                    "terminated"
                } else {
                    "completed"
                };
                info!(
                    "Episode {} {outcome} after {} steps with a balance of {} (started with {})",
                    episode + 1,
                    system.current_step(),
                    system.balance(),
                    system.starting_budget()
                );
                break;
            }
        }
    }

    writer.flush()
}

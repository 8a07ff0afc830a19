//! An episode environment which steps a copy of a system through time.
use super::action_space::ActionSpace;
use super::stage::{StepOutcome, resolve_step};
use crate::calculation::Resolution;
use crate::system::PtxSystem;
use crate::units::Money;
use anyhow::{Result, ensure};
use log::{debug, warn};

/// The result of acting on the environment for one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// The index of the step just resolved
    pub step: u32,
    /// What happened to the actions
    pub outcome: StepOutcome,
    /// The change of balance over the step
    pub reward: Money,
    /// Whether the episode ended because the step failed
    pub terminated: bool,
    /// Whether the episode ended because it reached its last step
    pub truncated: bool,
}

impl StepReport {
    /// Whether the episode is over
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Runs episodes on fresh copies of a template system
#[derive(Debug)]
pub struct Environment {
    template: PtxSystem,
    system: PtxSystem,
    action_space: ActionSpace,
    max_steps: u32,
    done: bool,
}

impl Environment {
    /// Create an environment whose episodes last at most `max_steps` steps
    pub fn new(template: PtxSystem, max_steps: u32) -> Self {
        let action_space = ActionSpace::from_system(&template);
        let system = template.clone_template();
        Self {
            template,
            system,
            action_space,
            max_steps,
            done: false,
        }
    }

    /// The action vectors accepted by [`Environment::act`]
    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    /// The system of the current episode
    pub fn system(&self) -> &PtxSystem {
        &self.system
    }

    /// The maximum number of steps in an episode
    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Start a new episode from a fresh copy of the template
    pub fn reset(&mut self) -> &PtxSystem {
        self.system = self.template.clone_template();
        self.done = false;
        &self.system
    }

    /// Resolve one step with the given action vector
    pub fn act(&mut self, vector: &[f64]) -> Result<StepReport> {
        ensure!(
            !self.done,
            "The episode has ended; the environment must be reset before acting again"
        );

        let actions = self.action_space.decode(vector)?;
        let step = self.system.current_step();
        let outcome = resolve_step(&mut self.system, actions);
        let reward = outcome.balance_delta;
        let terminated = !outcome.success;
        let truncated = !terminated && self.system.current_step() >= self.max_steps;
        self.done = terminated || truncated;

        if terminated {
            warn!(
                "Episode terminated at step {step}: {}",
                outcome
                    .records
                    .iter()
                    .filter(|record| record.resolution == Resolution::Infeasible)
                    .map(|record| record.status.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        } else {
            debug!("Step {step} finished with reward {reward}");
        }

        Ok(StepReport {
            step,
            outcome,
            reward,
            terminated,
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, stranded_system, system};
    use crate::units::Flow;
    use rstest::rstest;

    fn zeros(environment: &Environment) -> Vec<f64> {
        vec![0.0; environment.action_space().len()]
    }

    /// Keep the electrolyser idle so that nothing is infeasible
    fn idle(environment: &Environment) -> Vec<f64> {
        let mut vector = zeros(environment);
        let labels = environment.action_space().labels();
        let ramp = labels
            .iter()
            .position(|label| label == "Electrolyser.ramp")
            .unwrap();
        vector[ramp] = -0.5;
        vector
    }

    #[rstest]
    fn test_truncated_after_max_steps(system: PtxSystem) {
        let mut environment = Environment::new(system, 2);
        let vector = idle(&environment);
        let first = environment.act(&vector).unwrap();
        assert_eq!(first.step, 0);
        assert!(!first.is_done());

        let second = environment.act(&vector).unwrap();
        assert_eq!(second.step, 1);
        assert!(second.truncated);
        assert!(!second.terminated);

        assert_error!(
            environment.act(&vector),
            "The episode has ended; the environment must be reset before acting again"
        );
    }

    #[rstest]
    fn test_terminated_on_failure(stranded_system: PtxSystem) {
        let mut environment = Environment::new(stranded_system, 10);
        let vector = zeros(&environment);
        let report = environment.act(&vector).unwrap();
        assert!(report.terminated);
        assert!(!report.truncated);
        assert!(environment.act(&vector).is_err());
    }

    #[rstest]
    fn test_reset_starts_from_template(system: PtxSystem) {
        let mut environment = Environment::new(system, 3);
        let vector = idle(&environment);
        environment.act(&vector).unwrap();
        assert_eq!(environment.system().current_step(), 1);
        assert!(environment.system().available(&"Electricity".into()) > Flow(0.0));

        let system = environment.reset();
        assert_eq!(system.current_step(), 0);
        assert_eq!(system.available(&"Electricity".into()), Flow(0.0));
        assert_eq!(system.balance(), Money(100.0));
    }

    #[rstest]
    fn test_reward_is_balance_change(system: PtxSystem) {
        let mut environment = Environment::new(system, 3);
        let vector = idle(&environment);
        let report = environment.act(&vector).unwrap();
        // Wind generates 2.5 at a cost of 1 per unit
        assert_eq!(report.reward, Money(-2.5));
        assert_eq!(environment.system().balance(), Money(97.5));
    }

    #[rstest]
    fn test_wrong_vector_length(system: PtxSystem) {
        let mut environment = Environment::new(system, 3);
        assert!(environment.act(&[]).is_err());
        assert_eq!(environment.system().current_step(), 0);
    }
}

//! Code for PtX projects: a system together with its run settings and scheduled actions.
use crate::system::PtxSystem;

pub mod parameters;
pub use parameters::ProjectParameters;

/// A project loaded from a project directory
#[derive(Debug)]
pub struct Project {
    /// The contents of `project.toml`
    pub parameters: ProjectParameters,
    /// The system at the start of every episode
    pub system: PtxSystem,
    /// The action vectors to apply, one per step
    pub schedule: ActionSchedule,
    /// The number of steps in an episode
    pub max_steps: u32,
}

/// Action vectors for successive steps.
///
/// Steps beyond the end of the schedule use a vector of zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionSchedule {
    vectors: Vec<Vec<f64>>,
    width: usize,
}

impl ActionSchedule {
    /// Create a schedule of vectors which all have `width` entries
    pub fn new(vectors: Vec<Vec<f64>>, width: usize) -> Self {
        debug_assert!(vectors.iter().all(|vector| vector.len() == width));
        Self { vectors, width }
    }

    /// A schedule of zeros for every step
    pub fn zeros(width: usize) -> Self {
        Self::new(Vec::new(), width)
    }

    /// The number of steps with explicit actions
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no steps have explicit actions
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// The action vector for `step`
    pub fn vector_for(&self, step: u32) -> Vec<f64> {
        usize::try_from(step)
            .ok()
            .and_then(|index| self.vectors.get(index))
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.width])
    }
}

use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing::debug;

use crate::errors::Error;

/// Marker-gated cluster bootstrap steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Registry,
    Route,
    SecureRegistry,
    Templates,
    User,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Registry => "registry",
            Step::Route => "route",
            Step::SecureRegistry => "secure_registry",
            Step::Templates => "templates",
            Step::User => "user",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Done,
}

/// Step state persisted as empty `<step>.configured` files.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    dir: PathBuf,
}

impl MarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        MarkerStore { dir: dir.into() }
    }

    pub fn marker_path(&self, step: Step) -> PathBuf {
        self.dir.join(format!("{}.configured", step.name()))
    }

    pub fn state(&self, step: Step) -> StepState {
        if self.marker_path(step).is_file() {
            StepState::Done
        } else {
            StepState::Pending
        }
    }

    pub fn is_done(&self, step: Step) -> bool {
        self.state(step) == StepState::Done
    }

    pub fn mark_done(&self, step: Step) -> Result<(), Error> {
        fs::create_dir_all(&self.dir)?;
        let path = self.marker_path(step);
        OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(step = %step, marker = %path.display(), "step marked as done");
        Ok(())
    }
}

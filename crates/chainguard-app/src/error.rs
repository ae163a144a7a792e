use chainguard_domain::run::{RunError, TimeoutError};
use chainguard_repo::ResolutionError;
use chainguard_settings::PolicyError;

/// Every way a verification run can abort without a report.
#[derive(Debug, thiserror::Error)]
pub enum ChainguardError {
    #[error("policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("resolution: {0}")]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("verification cancelled")]
    Cancelled,

    #[error("verification run failed: {0}")]
    Run(String),

    #[error("repo root does not exist: {0}")]
    MissingRepoRoot(String),
}

impl From<RunError> for ChainguardError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Cancelled => ChainguardError::Cancelled,
            other => ChainguardError::Run(other.to_string()),
        }
    }
}

impl ChainguardError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ChainguardError::Cancelled)
    }
}

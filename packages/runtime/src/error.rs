use thiserror::Error;
use twig_vdom::ReconcileError;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("render failed: {0}")]
    Render(#[source] anyhow::Error),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error("root container already has children")]
    RootNotEmpty,

    #[error("app is already mounted")]
    AlreadyMounted,

    #[error("app is not mounted")]
    NotMounted,

    #[error("state update issued while a commit is in progress")]
    Reentrant,

    #[error("more than {limit} updates applied in one flush")]
    UpdateLoop { limit: usize },

    #[error("app is busy committing an update")]
    Busy,

    #[error("app has been dropped")]
    Dropped,

    /// The host and baseline were committed but handlers could not be re-synced
    #[error("event registry is borrowed elsewhere; handlers were not re-synced")]
    RegistryBusy,

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// True if the host no longer matches the committed baseline and
    /// `App::remount` is needed
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RuntimeError::Reconcile(ReconcileError::StructuralMismatch { .. })
        )
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

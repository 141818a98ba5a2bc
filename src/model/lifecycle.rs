/// Lifecycle of the hosted extension runtime as seen by the panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// No compatible extension bundle installed.
    #[default]
    ExtensionAbsent,
    /// A selection exists but fails validation.
    ConfigInvalid(String),
    /// The configuration store has not finished its initial read.
    ConfigLoading,
    /// A start sequence is in flight. At most one at a time.
    Starting,
    /// Runtime initialized. `surface_attached` turns true once the surface has
    /// loaded and replaced the placeholder.
    Running { surface_attached: bool },
    /// Last start attempt failed; a retry is allowed.
    Error(String),
}

impl LifecycleState {
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleState::ExtensionAbsent => "ABSENT",
            LifecycleState::ConfigInvalid(_) => "INVALID",
            LifecycleState::ConfigLoading => "LOADING",
            LifecycleState::Starting => "STARTING",
            LifecycleState::Running { .. } => "RUNNING",
            LifecycleState::Error(_) => "ERROR",
        }
    }

    pub fn is_starting(&self) -> bool {
        matches!(self, LifecycleState::Starting)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, LifecycleState::Running { .. })
    }
}

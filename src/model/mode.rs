/// Interaction modes of the panel host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Single-key actions.
    #[default]
    Normal,
    /// Command line (`:` prefix).
    Command,
    /// A modal message is shown and captures input until dismissed.
    Modal,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Command => "COMMAND",
            Mode::Modal => "MODAL",
        }
    }
}

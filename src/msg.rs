use crossterm::event::KeyEvent;
use std::path::PathBuf;

use crate::host::{SurfaceId, SurfaceRef};
use crate::model::theme::Theme;

/// All possible messages that drive state transitions.
///
/// Everything produced off the UI thread arrives here and is consumed only by
/// `PanelController::update`.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Lifecycle inbox
    ConfigChanged(bool),
    SurfaceCreated(SurfaceRef),
    SurfaceLoaded(SurfaceId),
    ThemeChanged(Theme),
    StartupFinished {
        extension_id: String,
        result: Result<(), String>,
    },

    // -- User actions
    RequestStart(Option<String>),
    SelectExtension(String),
    InstallBundle(PathBuf),
    CopySystemInfo,
    ShowDebugInfo,
    ShowConfigHelp,
    ToggleTheme,
    DismissModal,

    // -- System
    Tick,
    Quit,
}

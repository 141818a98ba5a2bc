//! Side-panel controller hosting an extension runtime's surface, with the
//! collaborators it talks to and a terminal host to run it in.

pub mod app;
pub mod bridge;
pub mod error;
pub mod host;
pub mod model;
pub mod msg;
pub mod plugin;
pub mod presenter;
pub mod sysinfo;
pub mod theme_observer;
pub mod watcher;

pub use app::{PanelController, PanelSettings};
pub use msg::Msg;

//! Interfaces of the collaborators the panel controller consumes.
//!
//! The controller never owns these systems. It queries them on the UI thread and
//! receives their notifications through [`UiDispatcher`].

pub mod dispatch;
pub mod scope;
pub mod theme_bus;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Weak};

use crate::error::HostError;
use crate::model::theme::Rgb;

pub use dispatch::UiDispatcher;
pub use scope::DisposalScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Opaque handle of the renderable component backing a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle(pub u64);

pub type PageLoadCallback = Box<dyn FnOnce() + Send>;
pub type CreationCallback = Box<dyn Fn(Arc<dyn Surface>) + Send + Sync>;
/// Receives the host panel background, `None` when the host cannot tell.
pub type ThemeListener = Box<dyn Fn(Option<Rgb>) + Send + Sync>;

/// Embedded view owned by the view manager.
pub trait Surface: Send + Sync {
    fn id(&self) -> SurfaceId;
    fn view_type(&self) -> &str;
    fn component(&self) -> ComponentHandle;
    fn is_page_loaded(&self) -> bool;
    /// Replaces any previously set callback. Invoked on an arbitrary thread.
    fn set_page_load_callback(&self, callback: PageLoadCallback);
}

pub trait ConfigurationManager: Send + Sync {
    fn is_extension_installed(&self) -> Result<bool, HostError>;
    fn is_configuration_loaded(&self) -> bool;
    fn is_configuration_valid(&self) -> bool;
    fn configuration_error(&self) -> Option<String>;
    fn current_extension_id(&self) -> Option<String>;
    fn set_current_extension_id(&self, id: &str) -> Result<(), HostError>;
    /// Where the selection lives, for diagnostics only.
    fn describe_location(&self) -> String {
        String::from("unknown")
    }
}

pub trait ExtensionManager: Send + Sync {
    fn initialize(&self, extension_id: &str) -> Result<(), HostError>;
    fn initialize_current_provider(&self) -> Result<(), HostError>;
    fn is_properly_initialized(&self) -> bool;
    fn dispose(&self);
}

pub trait ViewManager: Send + Sync {
    fn latest_surface(&self) -> Option<Arc<dyn Surface>>;
    /// The callback is dropped when `scope` is disposed.
    fn add_creation_callback(
        &self,
        callback: CreationCallback,
        scope: &DisposalScope,
    ) -> Result<(), HostError>;
}

pub trait ThemeSource: Send + Sync {
    fn current_background(&self) -> Option<Rgb>;
    /// The listener is dropped when `scope` is disposed.
    fn subscribe(&self, listener: ThemeListener, scope: &DisposalScope) -> Result<(), HostError>;
    /// Asks the host to switch between light and dark. Listeners hear about it
    /// like any other theme change.
    fn request_toggle(&self) -> Result<(), HostError> {
        Err(HostError::Unavailable("theme toggle".to_string()))
    }
}

/// User-initiated installation of an extension bundle.
pub trait BundleInstaller: Send + Sync {
    /// Returns the id of the installed extension.
    fn install(&self, source: &Path) -> Result<String, HostError>;
}

/// Everything the controller needs from its host.
#[derive(Clone)]
pub struct HostServices {
    pub config: Arc<dyn ConfigurationManager>,
    pub extensions: Arc<dyn ExtensionManager>,
    pub views: Arc<dyn ViewManager>,
    pub theme: Arc<dyn ThemeSource>,
    pub installer: Arc<dyn BundleInstaller>,
}

/// Non-owning reference to a surface, as carried through the UI queue.
#[derive(Clone)]
pub struct SurfaceRef {
    id: SurfaceId,
    surface: Weak<dyn Surface>,
}

impl SurfaceRef {
    pub fn new(surface: &Arc<dyn Surface>) -> Self {
        Self {
            id: surface.id(),
            surface: Arc::downgrade(surface),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn upgrade(&self) -> Option<Arc<dyn Surface>> {
        self.surface.upgrade()
    }
}

impl fmt::Debug for SurfaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceRef")
            .field("id", &self.id)
            .field("alive", &(self.surface.strong_count() > 0))
            .finish()
    }
}

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::HostError;
use crate::host::ExtensionManager;
use crate::plugin::runtime::{ExtensionRuntime, RuntimeStatus};
use crate::plugin::surface::SurfaceRegistry;

/// Extension manager backed by bundles under a local plugin directory.
pub struct LocalExtensionManager {
    plugins_dir: PathBuf,
    surfaces: Arc<SurfaceRegistry>,
    load_delay: Duration,
    current: Mutex<Option<ExtensionRuntime>>,
    initialized: AtomicBool,
}

impl LocalExtensionManager {
    pub fn new(plugins_dir: PathBuf, surfaces: Arc<SurfaceRegistry>, load_delay: Duration) -> Self {
        Self {
            plugins_dir,
            surfaces,
            load_delay,
            current: Mutex::new(None),
            initialized: AtomicBool::new(false),
        }
    }

    /// One line per provider state, for diagnostics.
    pub fn summary(&self) -> String {
        let current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        match current.as_ref() {
            None => "extensions: no provider selected".to_string(),
            Some(runtime) => {
                let status = match runtime.status() {
                    RuntimeStatus::Discovered => "discovered".to_string(),
                    RuntimeStatus::Loaded => "loaded".to_string(),
                    RuntimeStatus::Error(err) => format!("error: {err}"),
                };
                format!(
                    "extension {} [{status}] ({})",
                    runtime.display_name(),
                    runtime.root_dir.display()
                )
            }
        }
    }
}

impl ExtensionManager for LocalExtensionManager {
    fn initialize(&self, extension_id: &str) -> Result<(), HostError> {
        let runtime =
            ExtensionRuntime::discover(extension_id, self.plugins_dir.join(extension_id));
        let result = match runtime.status() {
            RuntimeStatus::Error(err) => Err(HostError::NotInstalled(format!(
                "{extension_id} ({err})"
            ))),
            _ => Ok(()),
        };

        tracing::info!("extension provider set to {extension_id}");
        self.initialized.store(false, Ordering::Release);
        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = Some(runtime);
        result
    }

    fn initialize_current_provider(&self) -> Result<(), HostError> {
        let view_type = {
            let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
            let runtime = current
                .as_mut()
                .ok_or_else(|| HostError::Unavailable("extension provider".to_string()))?;
            runtime.ensure_loaded()?;
            runtime.view_type()
        };

        tracing::info!("extension runtime loaded, opening {view_type}");
        self.surfaces.open(view_type, self.load_delay);
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn is_properly_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn dispose(&self) {
        tracing::info!("disposing extension runtime");
        self.initialized.store(false, Ordering::Release);
        self.current.lock().unwrap_or_else(|p| p.into_inner()).take();
        self.surfaces.close_all();
    }
}

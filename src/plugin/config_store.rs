use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use crate::error::HostError;
use crate::host::ConfigurationManager;
use crate::plugin::manifest::ExtensionManifest;

/// On-disk extension selection.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SelectionFile {
    #[serde(default)]
    extension_id: Option<String>,
}

#[derive(Debug, Default)]
struct SelectionState {
    loaded: bool,
    extension_id: Option<String>,
    read_error: Option<String>,
    modified: Option<SystemTime>,
}

/// Configuration manager keeping the selected extension id in a TOML file.
///
/// Starts unloaded; [`FileConfigurationManager::reload`] performs the read.
pub struct FileConfigurationManager {
    selection_path: PathBuf,
    plugins_dir: PathBuf,
    default_id: String,
    state: Mutex<SelectionState>,
}

impl FileConfigurationManager {
    pub fn new(selection_path: PathBuf, plugins_dir: PathBuf, default_id: impl Into<String>) -> Self {
        Self {
            selection_path,
            plugins_dir,
            default_id: default_id.into(),
            state: Mutex::new(SelectionState::default()),
        }
    }

    /// Reads the selection file. A missing file selects the default extension.
    pub fn reload(&self) {
        let modified = modified_at(&self.selection_path);
        let (extension_id, read_error) = match fs::read_to_string(&self.selection_path) {
            Ok(raw) => match toml::from_str::<SelectionFile>(&raw) {
                Ok(file) => (file.extension_id.filter(|id| !id.trim().is_empty()), None),
                Err(err) => (
                    None,
                    Some(format!("{}: {err}", self.selection_path.display())),
                ),
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => (None, None),
            Err(err) => (None, Some(HostError::io(&self.selection_path, err).to_string())),
        };

        if let Some(err) = read_error.as_ref() {
            tracing::warn!("extension selection unreadable: {err}");
        }

        let mut state = self.lock();
        state.loaded = true;
        state.extension_id = extension_id;
        state.read_error = read_error;
        state.modified = modified;
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Picks up edits made to the selection file behind our back.
    fn refresh_if_stale(&self) {
        let stale = {
            let state = self.lock();
            state.loaded && state.modified != modified_at(&self.selection_path)
        };
        if stale {
            tracing::debug!("selection file changed, reloading");
            self.reload();
        }
    }

    fn effective_id(&self) -> String {
        self.lock()
            .extension_id
            .clone()
            .unwrap_or_else(|| self.default_id.clone())
    }

    fn validate(&self) -> Result<String, String> {
        {
            let state = self.lock();
            if !state.loaded {
                return Err("configuration not loaded".to_string());
            }
            if let Some(err) = state.read_error.as_ref() {
                return Err(err.clone());
            }
        }

        let id = self.effective_id();
        let manifest =
            ExtensionManifest::read(&self.plugins_dir.join(&id)).map_err(|err| err.to_string())?;
        if manifest.id != id {
            return Err(format!(
                "bundle {id} declares extension id {}",
                manifest.id
            ));
        }
        Ok(id)
    }
}

impl ConfigurationManager for FileConfigurationManager {
    fn is_extension_installed(&self) -> Result<bool, HostError> {
        self.refresh_if_stale();
        let id = self.effective_id();
        Ok(ExtensionManifest::path_in(&self.plugins_dir.join(id)).is_file())
    }

    fn is_configuration_loaded(&self) -> bool {
        self.lock().loaded
    }

    fn is_configuration_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn configuration_error(&self) -> Option<String> {
        self.validate().err()
    }

    fn current_extension_id(&self) -> Option<String> {
        if !self.is_configuration_loaded() {
            return None;
        }
        Some(self.effective_id())
    }

    fn set_current_extension_id(&self, id: &str) -> Result<(), HostError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(HostError::InvalidConfig("empty extension id".to_string()));
        }

        if let Some(parent) = self.selection_path.parent() {
            fs::create_dir_all(parent).map_err(|err| HostError::io(parent, err))?;
        }

        let file = SelectionFile {
            extension_id: Some(id.to_string()),
        };
        let raw = toml::to_string(&file).map_err(|err| HostError::InvalidConfig(err.to_string()))?;
        fs::write(&self.selection_path, raw)
            .map_err(|err| HostError::io(&self.selection_path, err))?;

        tracing::info!("selected extension {id}");
        self.reload();
        Ok(())
    }

    fn describe_location(&self) -> String {
        self.selection_path.display().to_string()
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

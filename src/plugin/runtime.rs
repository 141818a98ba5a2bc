use std::path::PathBuf;

use crate::error::HostError;
use crate::plugin::manifest::ExtensionManifest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeStatus {
    Discovered,
    Loaded,
    Error(String),
}

/// One extension bundle on disk and how far it got towards running.
#[derive(Debug, Clone)]
pub struct ExtensionRuntime {
    pub id: String,
    pub root_dir: PathBuf,
    pub manifest: Option<ExtensionManifest>,
    pub status: RuntimeStatus,
}

impl ExtensionRuntime {
    pub fn discover(id: impl Into<String>, root_dir: PathBuf) -> Self {
        let id = id.into();
        match ExtensionManifest::read(&root_dir) {
            Ok(manifest) => Self {
                id,
                root_dir,
                manifest: Some(manifest),
                status: RuntimeStatus::Discovered,
            },
            Err(err) => Self {
                id,
                root_dir,
                manifest: None,
                status: RuntimeStatus::Error(err.to_string()),
            },
        }
    }

    pub fn status(&self) -> &RuntimeStatus {
        &self.status
    }

    pub fn display_name(&self) -> String {
        self.manifest
            .as_ref()
            .map(|manifest| manifest.name.clone())
            .unwrap_or_else(|| self.id.clone())
    }

    pub fn view_type(&self) -> String {
        let view = self
            .manifest
            .as_ref()
            .map(|manifest| manifest.view_type.as_str())
            .unwrap_or("sidebar");
        format!("{}/{view}", self.id)
    }

    pub fn ensure_loaded(&mut self) -> Result<(), HostError> {
        if matches!(self.status, RuntimeStatus::Loaded) {
            return Ok(());
        }

        let manifest = self
            .manifest
            .as_ref()
            .ok_or_else(|| HostError::Manifest {
                path: ExtensionManifest::path_in(&self.root_dir),
                reason: "missing extension manifest".to_string(),
            })?;

        let entry_path = self.root_dir.join(&manifest.entry);
        if !entry_path.is_file() {
            let err = format!("missing runtime entry: {}", entry_path.display());
            self.status = RuntimeStatus::Error(err.clone());
            return Err(HostError::Unavailable(err));
        }

        self.status = RuntimeStatus::Loaded;
        Ok(())
    }
}

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HostError;

pub const MANIFEST_FILE: &str = "extension.toml";

/// `extension.toml` at the root of an extension bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    /// Runtime entry point, relative to the bundle root.
    pub entry: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default = "default_view_type")]
    pub view_type: String,
}

fn default_view_type() -> String {
    "sidebar".to_string()
}

impl ExtensionManifest {
    pub fn path_in(root_dir: &Path) -> PathBuf {
        root_dir.join(MANIFEST_FILE)
    }

    pub fn read(root_dir: &Path) -> Result<Self, HostError> {
        let manifest_path = Self::path_in(root_dir);
        let raw = fs::read_to_string(&manifest_path)
            .map_err(|err| HostError::io(&manifest_path, err))?;

        let manifest: Self = toml::from_str(&raw).map_err(|err| HostError::Manifest {
            path: manifest_path.clone(),
            reason: err.to_string(),
        })?;

        if manifest.id.trim().is_empty() {
            return Err(HostError::Manifest {
                path: manifest_path,
                reason: "empty extension id".to_string(),
            });
        }

        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_manifest_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            "id = \"codex\"\nname = \"Codex\"\nversion = \"1.2.0\"\nentry = \"dist/extension.js\"\n",
        )
        .unwrap();

        let manifest = ExtensionManifest::read(dir.path()).unwrap();
        assert_eq!(manifest.id, "codex");
        assert_eq!(manifest.view_type, "sidebar");
        assert!(manifest.description.is_none());
    }

    #[test]
    fn missing_and_malformed_manifests_fail() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ExtensionManifest::read(dir.path()),
            Err(HostError::Io { .. })
        ));

        fs::write(dir.path().join(MANIFEST_FILE), "id = \"\"\nname = 3\n").unwrap();
        assert!(matches!(
            ExtensionManifest::read(dir.path()),
            Err(HostError::Manifest { .. })
        ));
    }

    #[test]
    fn blank_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            "id = \" \"\nname = \"x\"\nversion = \"0\"\nentry = \"e\"\n",
        )
        .unwrap();
        let err = ExtensionManifest::read(dir.path()).unwrap_err();
        assert!(err.to_string().contains("empty extension id"));
    }
}

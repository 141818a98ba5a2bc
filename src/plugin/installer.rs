use std::fs;
use std::path::{Path, PathBuf};

use crate::error::HostError;
use crate::host::BundleInstaller;
use crate::plugin::manifest::ExtensionManifest;

/// Installs bundle directories into the plugin directory.
#[derive(Debug)]
pub struct DirectoryInstaller {
    plugins_dir: PathBuf,
}

impl DirectoryInstaller {
    pub fn new(plugins_dir: PathBuf) -> Self {
        Self { plugins_dir }
    }
}

impl BundleInstaller for DirectoryInstaller {
    fn install(&self, source: &Path) -> Result<String, HostError> {
        let manifest = ExtensionManifest::read(source)?;
        let target = self.plugins_dir.join(&manifest.id);

        if target == source {
            return Ok(manifest.id);
        }

        if target.exists() {
            tracing::info!("replacing installed bundle {}", manifest.id);
            fs::remove_dir_all(&target).map_err(|err| HostError::io(&target, err))?;
        }

        copy_dir(source, &target)?;
        tracing::info!(
            "installed {} {} into {}",
            manifest.id,
            manifest.version,
            target.display()
        );
        Ok(manifest.id)
    }
}

fn copy_dir(from: &Path, to: &Path) -> Result<(), HostError> {
    fs::create_dir_all(to).map_err(|err| HostError::io(to, err))?;

    let entries = fs::read_dir(from).map_err(|err| HostError::io(from, err))?;
    for entry in entries {
        let entry = entry.map_err(|err| HostError::io(from, err))?;
        let path = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|err| HostError::io(&path, err))?;

        if file_type.is_dir() {
            copy_dir(&path, &dest)?;
        } else if file_type.is_file() {
            fs::copy(&path, &dest).map_err(|err| HostError::io(&path, err))?;
        }
    }

    Ok(())
}

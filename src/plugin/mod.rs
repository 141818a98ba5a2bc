//! Local collaborators backing the binary: a directory of extension bundles, a
//! TOML selection file, and an in-process surface registry.

pub mod config_store;
pub mod installer;
pub mod manager;
pub mod manifest;
pub mod runtime;
pub mod surface;

pub use config_store::FileConfigurationManager;
pub use installer::DirectoryInstaller;
pub use manager::LocalExtensionManager;
pub use surface::SurfaceRegistry;

//! Engine configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is valid:
//!
//! ```toml
//! [layout]
//! services_dir = "META-INF/services"
//! named_services_dir = "META-INF/namedservices"
//!
//! [store]
//! source_roots = ["src/main/resources"]
//! output_root = "target/classes"
//! depinfo_root = "target/spr-deps"
//! atomic_writes = true
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use spr_accumulator::FsArtifactStore;
use spr_model::ResourcePath;
use std::path::{Path, PathBuf};

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where registry artifacts live inside an output channel
    pub layout: LayoutConfig,
    /// Filesystem store settings
    pub store: StoreConfig,
}

/// Resource path layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Directory of default-group registries
    pub services_dir: String,
    /// Directory of named-group registries
    pub named_services_dir: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            services_dir: "META-INF/services".to_string(),
            named_services_dir: "META-INF/namedservices".to_string(),
        }
    }
}

impl LayoutConfig {
    /// Parsed default-group directory
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidLayout`] if the directory is not a valid
    /// resource path.
    pub fn services_root(&self) -> Result<ResourcePath, ConfigError> {
        self.services_dir
            .parse()
            .map_err(|source| ConfigError::InvalidLayout {
                field: "services_dir",
                source,
            })
    }

    /// Parsed named-group directory
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidLayout`] if the directory is not a valid
    /// resource path.
    pub fn named_services_root(&self) -> Result<ResourcePath, ConfigError> {
        self.named_services_dir
            .parse()
            .map_err(|source| ConfigError::InvalidLayout {
                field: "named_services_dir",
                source,
            })
    }
}

/// Filesystem artifact store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Roots probed, in order, for hand-authored artifacts
    pub source_roots: Vec<PathBuf>,
    /// Root for prior-pass reads and final writes
    pub output_root: PathBuf,
    /// Root for `.deps` provenance files (disabled if unset)
    pub depinfo_root: Option<PathBuf>,
    /// Write through a temp file and rename
    pub atomic_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            output_root: PathBuf::from("target/classes"),
            depinfo_root: None,
            atomic_writes: true,
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or if the
    /// layout is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    /// Check that the layout directories are valid resource paths
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidLayout`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.services_root()?;
        self.layout.named_services_root()?;
        Ok(())
    }

    /// With default-group directory
    #[inline]
    #[must_use]
    pub fn with_services_dir(mut self, dir: impl Into<String>) -> Self {
        self.layout.services_dir = dir.into();
        self
    }

    /// With named-group directory
    #[inline]
    #[must_use]
    pub fn with_named_services_dir(mut self, dir: impl Into<String>) -> Self {
        self.layout.named_services_dir = dir.into();
        self
    }

    /// With an additional source root
    #[inline]
    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.store.source_roots.push(root.into());
        self
    }

    /// With output root
    #[inline]
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.store.output_root = root.into();
        self
    }

    /// With dep-info root
    #[inline]
    #[must_use]
    pub fn with_depinfo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.store.depinfo_root = Some(root.into());
        self
    }

    /// With atomic writes on or off
    #[inline]
    #[must_use]
    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.store.atomic_writes = atomic;
        self
    }

    /// Build the filesystem store described by `store`
    #[must_use]
    pub fn fs_store(&self) -> FsArtifactStore {
        let store = self
            .store
            .source_roots
            .iter()
            .fold(FsArtifactStore::new(&self.store.output_root), |store, root| {
                store.with_source_root(root)
            })
            .with_atomic_writes(self.store.atomic_writes);
        match &self.store.depinfo_root {
            Some(root) => store.with_depinfo_root(root),
            None => store,
        }
    }
}

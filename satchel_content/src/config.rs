use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use satchel_shared::{
    log::{info, trace},
    serde_yaml, ResourceKind,
};
use serde::{Deserialize, Serialize};

use crate::{common::extract_extension_from_path, Error, Result};

/// Manifest that is loaded synchronously before [`AssetManager::initialize`](crate::AssetManager::initialize) returns.
pub const STARTUP_MANIFEST_FILE_NAME: &str = "Startup.asset.txt";

/// Manifest that is loaded on a background thread after the startup manifest.
pub const BACKGROUND_MANIFEST_FILE_NAME: &str = "Background.asset.txt";

/// Configuration for the [`AssetManager`](crate::AssetManager)
///
/// Every field is optional when the configuration is read from YAML:
///
/// ```yaml
/// startup_manifest: "assets/Startup.asset.txt"
/// background_manifest: "assets/Background.asset.txt"
/// extensions:
///   png: texture
///   ogg: music
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManagerConfig {
    pub startup_manifest: PathBuf,
    pub background_manifest: PathBuf,
    /// Maps file extensions (without the dot) to the kind they are decoded as.
    pub extensions: BTreeMap<String, ResourceKind>,
}

impl Default for AssetManagerConfig {
    fn default() -> Self {
        Self {
            startup_manifest: PathBuf::from(STARTUP_MANIFEST_FILE_NAME),
            background_manifest: PathBuf::from(BACKGROUND_MANIFEST_FILE_NAME),
            extensions: KindRegistry::default().into_table(),
        }
    }
}

impl AssetManagerConfig {
    /// Returns the default configuration with both manifests located in `root`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use satchel_content::AssetManagerConfig;
    /// let config = AssetManagerConfig::with_root("assets");
    /// assert_eq!(config.startup_manifest, Path::new("assets/Startup.asset.txt"));
    /// ```
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            startup_manifest: root.join(STARTUP_MANIFEST_FILE_NAME),
            background_manifest: root.join(BACKGROUND_MANIFEST_FILE_NAME),
            ..Default::default()
        }
    }

    /// Reads the configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        trace!("Reading configuration '{}'", path.display());
        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|err| Error::Config {
            path: path.to_owned(),
            reason: err.to_string(),
        })?;
        info!("Configuration '{}': {config:#?}", path.display());
        Ok(config)
    }

    /// Creates the [`KindRegistry`] from the `extensions` table.
    pub fn kind_registry(&self) -> KindRegistry {
        self.extensions.iter().map(|(extension, kind)| (extension.as_str(), *kind)).collect()
    }
}

/// Determines the [`ResourceKind`] of a file from its extension. Extensions are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRegistry {
    kinds: BTreeMap<String, ResourceKind>,
}

impl KindRegistry {
    /// Creates a [`KindRegistry`] that doesn't support any extension.
    pub fn empty() -> Self {
        Self { kinds: BTreeMap::new() }
    }

    /// Registers `extension` as `kind`.
    ///
    /// # Panics
    ///
    /// If the extension is already registered.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use satchel_content::KindRegistry;
    /// use satchel_shared::ResourceKind;
    /// let registry = KindRegistry::empty().register("qoi", ResourceKind::Texture);
    /// assert_eq!(registry.kind_of(Path::new("hero.QOI")).unwrap(), ResourceKind::Texture);
    /// ```
    pub fn register(mut self, extension: impl Into<String>, kind: ResourceKind) -> Self {
        let extension = extension.into().to_lowercase();
        if self.kinds.contains_key(&extension) {
            panic!("kind for extension '{extension}' already registered");
        }
        self.kinds.insert(extension, kind);
        self
    }

    /// Returns the kind that the file at `path` is decoded as.
    pub fn kind_of(&self, path: &Path) -> Result<ResourceKind> {
        let extension = extract_extension_from_path(path);
        self.kinds.get(&extension).copied().ok_or_else(|| Error::UnsupportedKind {
            extension,
            path: path.to_owned(),
        })
    }

    fn into_table(self) -> BTreeMap<String, ResourceKind> {
        self.kinds
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::empty()
            .register("png", ResourceKind::Texture)
            .register("jpg", ResourceKind::Texture)
            .register("jpeg", ResourceKind::Texture)
            .register("bmp", ResourceKind::Texture)
            .register("tga", ResourceKind::Texture)
            .register("ogg", ResourceKind::Music)
            .register("wav", ResourceKind::Music)
            .register("mp3", ResourceKind::Music)
            .register("flac", ResourceKind::Music)
    }
}

impl<'a> FromIterator<(&'a str, ResourceKind)> for KindRegistry {
    /// Later entries overwrite earlier ones when their extensions only differ in case.
    fn from_iter<T: IntoIterator<Item = (&'a str, ResourceKind)>>(iter: T) -> Self {
        let kinds = iter
            .into_iter()
            .map(|(extension, kind)| (extension.trim_start_matches('.').to_lowercase(), kind))
            .collect();
        Self { kinds }
    }
}

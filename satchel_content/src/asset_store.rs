use std::sync::Arc;

use satchel_shared::{
    ahash::HashMap,
    log::{info, trace},
    parking_lot::RwLock,
    Music, Resource, ResourceKind, Texture,
};

use crate::{Error, Result};

/// Map from logical name to one kind of resource.
///
/// Resources are fully constructed before they are inserted behind an [`Arc`], so a
/// reader either sees no entry or a complete one.
struct KindMap<T> {
    kind: ResourceKind,
    entries: RwLock<HashMap<String, Arc<T>>>,
}

impl<T> KindMap<T> {
    fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::default()),
        }
    }

    fn insert(&self, name: String, value: T) -> Arc<T> {
        let value = Arc::new(value);
        if self.entries.write().insert(name.clone(), value.clone()).is_some() {
            info!("Overwrote {} '{name}'", self.kind);
        } else {
            trace!("Inserted {} '{name}'", self.kind);
        }
        value
    }

    fn get(&self, name: &str) -> Result<Arc<T>> {
        self.entries.read().get(name).cloned().ok_or_else(|| Error::NotFound {
            kind: self.kind,
            name: name.to_owned(),
        })
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn names(&self) -> Vec<String> {
        let mut names = self.entries.read().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for satchel_shared::Texture {}
    impl Sealed for satchel_shared::Music {}
}

/// Resource types that have their own map in the [`AssetStore`].
pub trait StoredResource: sealed::Sealed + Send + Sync + Sized + 'static {
    /// Kind of the map that holds this type.
    const KIND: ResourceKind;

    #[doc(hidden)]
    fn get_from(store: &AssetStore, name: &str) -> Result<Arc<Self>>;
}

impl StoredResource for Texture {
    const KIND: ResourceKind = ResourceKind::Texture;

    fn get_from(store: &AssetStore, name: &str) -> Result<Arc<Self>> {
        store.textures.get(name)
    }
}

impl StoredResource for Music {
    const KIND: ResourceKind = ResourceKind::Music;

    fn get_from(store: &AssetStore, name: &str) -> Result<Arc<Self>> {
        store.music.get(name)
    }
}

/// Thread-safe storage of all loaded resources, partitioned by [`ResourceKind`].
///
/// Every kind has its own long-lived lock. Names are unique per kind and a later
/// [`AssetStore::put`] with the same name overwrites the earlier entry.
pub struct AssetStore {
    textures: KindMap<Texture>,
    music: KindMap<Music>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self {
            textures: KindMap::new(ResourceKind::Texture),
            music: KindMap::new(ResourceKind::Music),
        }
    }

    /// Inserts the resource under `name` in the map that matches its kind.
    ///
    /// # Example
    ///
    /// ```
    /// use satchel_content::AssetStore;
    /// use satchel_shared::{Resource, Texture};
    /// let store = AssetStore::new();
    /// store.put("Background", Resource::Texture(Texture::new(1, 1, vec![0; 4])));
    /// assert_eq!(store.get_texture("Background").unwrap().width(), 1);
    /// assert!(store.get_music("Background").is_err());
    /// ```
    pub fn put(&self, name: impl Into<String>, resource: Resource) {
        let name = name.into();
        match resource {
            Resource::Texture(texture) => {
                self.textures.insert(name, texture);
            }
            Resource::Music(music) => {
                self.music.insert(name, music);
            }
        }
    }

    /// Returns the resource of type `T` with the given name or [`Error::NotFound`].
    ///
    /// # Example
    ///
    /// ```
    /// use satchel_content::AssetStore;
    /// use satchel_shared::{Music, Resource, Texture};
    /// let store = AssetStore::new();
    /// store.put("Theme", Resource::Music(Music::new("ogg", vec![1, 2])));
    /// assert_eq!(store.get::<Music>("Theme").unwrap().format(), "ogg");
    /// assert!(store.get::<Texture>("Theme").is_err());
    /// ```
    pub fn get<T: StoredResource>(&self, name: &str) -> Result<Arc<T>> {
        T::get_from(self, name)
    }

    /// Returns the texture with the given name or [`Error::NotFound`].
    pub fn get_texture(&self, name: &str) -> Result<Arc<Texture>> {
        self.get::<Texture>(name)
    }

    /// Returns the music with the given name or [`Error::NotFound`].
    pub fn get_music(&self, name: &str) -> Result<Arc<Music>> {
        self.get::<Music>(name)
    }

    pub fn contains(&self, kind: ResourceKind, name: &str) -> bool {
        match kind {
            ResourceKind::Texture => self.textures.contains(name),
            ResourceKind::Music => self.music.contains(name),
        }
    }

    /// Number of resources of the given kind.
    pub fn len(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Texture => self.textures.len(),
            ResourceKind::Music => self.music.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ResourceKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    /// Sorted names of all resources of the given kind.
    pub fn names(&self, kind: ResourceKind) -> Vec<String> {
        match kind {
            ResourceKind::Texture => self.textures.names(),
            ResourceKind::Music => self.music.names(),
        }
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

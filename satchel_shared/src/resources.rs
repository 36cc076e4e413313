mod music;
mod texture;

pub use music::*;
pub use texture::*;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Category of a decoded asset. Every kind is stored in its own map.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[display(fmt = "texture")]
    Texture,
    #[display(fmt = "music")]
    Music,
}

impl ResourceKind {
    /// All kinds that are known to the loader.
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Texture, ResourceKind::Music];
}

/// A fully decoded asset as it is handed from a decoder to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Texture(Texture),
    Music(Music),
}

impl Resource {
    /// Returns the [`ResourceKind`] of the contained value.
    ///
    /// # Example
    ///
    /// ```
    /// use satchel_shared::{Music, Resource, ResourceKind};
    /// let resource = Resource::Music(Music::new("ogg", vec![0; 16]));
    /// assert_eq!(resource.kind(), ResourceKind::Music);
    /// ```
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Texture(_) => ResourceKind::Texture,
            Resource::Music(_) => ResourceKind::Music,
        }
    }
}

impl From<Texture> for Resource {
    fn from(value: Texture) -> Self {
        Resource::Texture(value)
    }
}

impl From<Music> for Resource {
    fn from(value: Music) -> Self {
        Resource::Music(value)
    }
}

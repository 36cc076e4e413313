use std::{fs, path::Path};

use satchel_shared::{log::trace, Music, Resource, ResourceKind, Texture};

use crate::{common::extract_extension_from_path, Error, Result};

/// Turns the file at `path` into a [`Resource`] of the given kind.
///
/// The loader only decides which kind a file is. Everything format specific happens in
/// the implementation of this trait. Closures with the matching signature implement it.
pub trait Decode: Send + Sync {
    fn decode(&self, path: &Path, kind: ResourceKind) -> Result<Resource>;
}

impl<F> Decode for F
where
    F: Fn(&Path, ResourceKind) -> Result<Resource> + Send + Sync,
{
    fn decode(&self, path: &Path, kind: ResourceKind) -> Result<Resource> {
        self(path, kind)
    }
}

/// Decodes images with the `image` crate into RGBA8 textures and reads music files
/// as encoded streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDecoder;

impl Decode for FileDecoder {
    fn decode(&self, path: &Path, kind: ResourceKind) -> Result<Resource> {
        let decode_error = |reason: String| Error::Decode {
            path: path.to_owned(),
            kind,
            reason,
        };
        match kind {
            ResourceKind::Texture => {
                trace!("Decoding image '{}'", path.display());
                let image = image::open(path).map_err(|err| decode_error(err.to_string()))?.into_rgba8();
                let (width, height) = image.dimensions();
                Ok(Texture::new(width, height, image.into_raw()).into())
            }
            ResourceKind::Music => {
                trace!("Reading music stream '{}'", path.display());
                let data = fs::read(path).map_err(|err| decode_error(err.to_string()))?;
                Ok(Music::new(extract_extension_from_path(path), data).into())
            }
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod scripted {
    use std::{collections::BTreeSet, path::Path};

    use satchel_shared::{
        crossbeam_channel::{self, Receiver, Sender},
        parking_lot::Mutex,
        Music, Resource, ResourceKind, Texture,
    };

    use crate::{Decode, Error, Result};

    /// In-memory [`Decode`] implementation whose outcome is scripted per path.
    ///
    /// Every resource is derived from its path so that tests can check which file ended
    /// up under which name.
    #[derive(Default)]
    pub struct ScriptedDecoder {
        failures: BTreeSet<String>,
        gate: Option<Receiver<()>>,
        decoded: Mutex<Vec<String>>,
    }

    impl ScriptedDecoder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Decoding `path` fails with [`Error::Decode`].
        pub fn fail_on(mut self, path: impl Into<String>) -> Self {
            self.failures.insert(path.into());
            self
        }

        /// Every decode blocks until a message was sent through the returned [`Sender`].
        /// Dropping the [`Sender`] opens the gate for good.
        pub fn gated(mut self) -> (Self, Sender<()>) {
            let (sender, receiver) = crossbeam_channel::unbounded();
            self.gate = Some(receiver);
            (self, sender)
        }

        /// Paths of all successful and failed decodes in the order they happened.
        pub fn decoded_paths(&self) -> Vec<String> {
            self.decoded.lock().clone()
        }

        /// The texture that is produced for `path`.
        pub fn texture_for(path: &str) -> Texture {
            let data = path.bytes().flat_map(|byte| [byte; 4]).collect::<Vec<_>>();
            Texture::new(path.len() as u32, 1, data)
        }

        /// The music that is produced for `path`.
        pub fn music_for(path: &str) -> Music {
            Music::new("scripted", path.as_bytes().to_vec())
        }
    }

    impl Decode for ScriptedDecoder {
        fn decode(&self, path: &Path, kind: ResourceKind) -> Result<Resource> {
            if let Some(gate) = &self.gate {
                // A disconnected channel means the gate is open.
                let _ = gate.recv();
            }
            let path_str = path.to_string_lossy().into_owned();
            self.decoded.lock().push(path_str.clone());
            if self.failures.contains(&path_str) {
                return Err(Error::Decode {
                    path: path.to_owned(),
                    kind,
                    reason: "scripted failure".to_owned(),
                });
            }
            Ok(match kind {
                ResourceKind::Texture => Self::texture_for(&path_str).into(),
                ResourceKind::Music => Self::music_for(&path_str).into(),
            })
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use scripted::ScriptedDecoder;

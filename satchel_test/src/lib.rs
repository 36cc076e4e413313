use std::{
    fs,
    path::{Path, PathBuf},
    sync::Once,
};

use image::{ImageBuffer, Rgba, RgbaImage};
use satchel_shared::log::LevelFilter;
use tempdir::TempDir;

pub use spectral;

/// Creates a new [`Fixture`] whose directory is named after the test function in which the macro is executed.
#[macro_export]
macro_rules! fixture {
    () => {{
        let test_name = satchel_shared::function_name!().replace("::", ".");
        $crate::Fixture::new(&test_name)
    }};
}

/// Installs the logger for tests. Can be called from every test, only the first call has an effect.
pub fn setup_logger() {
    static LOGGER: Once = Once::new();
    LOGGER.call_once(|| {
        simple_logger::SimpleLogger::new()
            .with_level(LevelFilter::Trace)
            .init()
            .expect("failed to initialize the logger");
    });
}

/// Temporary directory that holds manifests and asset files for a test. The
/// directory is removed when the [`Fixture`] is dropped.
pub struct Fixture {
    root: TempDir,
}

impl Fixture {
    /// Creates a new [`Fixture`] in the temp directory of the system.
    pub fn new(test_name: &str) -> Self {
        let root = TempDir::new(test_name).expect("failed to create the temp directory for the fixture");
        Self { root }
    }

    /// Root directory of the fixture.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Returns the absolute path of `relative_path` inside the fixture.
    pub fn join(&self, relative_path: impl AsRef<Path>) -> PathBuf {
        self.root.path().join(relative_path)
    }

    /// Writes `content` to `relative_path` and creates the parent directories.
    pub fn write(&self, relative_path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create the parent directory");
        }
        fs::write(&path, content).unwrap_or_else(|_| panic!("failed to write file \"{}\"", path.display()));
        path
    }

    /// Writes a PNG with the given dimensions in which every pixel has the color `rgba`.
    pub fn write_png(&self, relative_path: impl AsRef<Path>, width: u32, height: u32, rgba: [u8; 4]) -> PathBuf {
        let path = self.join(relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create the parent directory");
        }
        let image: RgbaImage = ImageBuffer::from_pixel(width, height, Rgba(rgba));
        image
            .save(&path)
            .unwrap_or_else(|_| panic!("failed to save image to path \"{}\"", path.display()));
        path
    }

    /// Turns the absolute `path` inside the fixture into a string with forward slashes so
    /// that it can be written into a manifest.
    pub fn manifest_path(&self, path: impl AsRef<Path>) -> String {
        path.as_ref().to_string_lossy().replace('\\', "/")
    }
}

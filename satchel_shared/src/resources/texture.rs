/// Number of bytes per pixel. Textures are always stored as RGBA8.
pub const TEXTURE_BYTES_PER_PIXEL: usize = 4;

/// Decoded image data in RGBA8 layout, row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Texture {
    /// Creates a new [`Texture`].
    ///
    /// # Panics
    ///
    /// If the length of `data` doesn't match `width * height * 4`.
    ///
    /// # Example
    ///
    /// ```
    /// use satchel_shared::Texture;
    /// let texture = Texture::new(2, 1, vec![0; 8]);
    /// assert_eq!(texture.width(), 2);
    /// ```
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize * TEXTURE_BYTES_PER_PIXEL,
            "texture data doesn't match the dimensions {width}x{height}"
        );
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the raw RGBA8 pixels.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

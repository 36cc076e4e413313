/// Encoded audio stream. The bytes are kept as they are in the file so that the
/// audio collaborator can stream and decode them while playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Music {
    format: String,
    data: Vec<u8>,
}

impl Music {
    pub fn new(format: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            format: format.into(),
            data,
        }
    }

    /// Container format of the stream, e.g. `ogg`.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

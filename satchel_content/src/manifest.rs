//! Parser for the plain-text manifests that list the assets to load.
//!
//! ```text
//! # comment
//! BASE_PATH: assets/
//! sprites/hero.png HeroSprite
//! music/theme.ogg ThemeMusic
//! ```
//!
//! Every line is either blank, a comment starting with `#`, a `BASE_PATH:` directive
//! or a `<relative-path> <logical-name>` pair. The base path applies to all following
//! pairs until the next directive. Malformed lines are reported and skipped, they never
//! abort the whole manifest.

use std::{
    fs,
    path::{Path, PathBuf},
};

use satchel_shared::log::{info, trace, warn};

use crate::{Error, LoadQueue, LoadRequest};

/// Directive that sets the base path for all following lines.
pub const BASE_PATH_DIRECTIVE: &str = "BASE_PATH:";

/// Result of parsing a manifest. Diagnostics are collected instead of aborting the parse.
#[derive(Debug, Default)]
pub struct ParsedManifest {
    /// Requests in the order of their lines in the manifest.
    pub requests: Vec<LoadRequest>,
    /// Everything that went wrong, already logged.
    pub diagnostics: Vec<Error>,
}

impl ParsedManifest {
    /// Moves the requests into a [`LoadQueue`].
    pub fn into_queue(self) -> LoadQueue {
        let mut queue = LoadQueue::new();
        let rejected = queue.push_all(self.requests);
        // Tokens never contain whitespace and are never empty
        debug_assert!(rejected.is_empty(), "parsed requests are always complete");
        queue
    }
}

/// Parses the manifest at `path`.
///
/// A manifest that can't be opened results in an empty [`ParsedManifest`] with an
/// [`Error::ManifestOpen`] diagnostic. Lines that aren't valid UTF-8 are reported and
/// skipped like every other malformed line.
pub fn parse_manifest(path: impl AsRef<Path>) -> ParsedManifest {
    let path = path.as_ref();
    trace!("Reading manifest '{}'", path.display());
    match fs::read(path) {
        Ok(content) => parse_manifest_bytes(path, &content),
        Err(source) => {
            let err = Error::ManifestOpen {
                path: path.to_owned(),
                source,
            };
            warn!("{err}");
            ParsedManifest {
                requests: Vec::new(),
                diagnostics: vec![err],
            }
        }
    }
}

/// Parses the `content` of a manifest. `path` is only used for the diagnostics.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use satchel_content::parse_manifest_str;
/// let manifest = parse_manifest_str(Path::new("Startup.asset.txt"), "BASE_PATH: art/\nbg.png Background\n");
/// assert_eq!(manifest.requests[0].resolved_path(), "art/bg.png");
/// assert_eq!(manifest.requests[0].logical_name(), "Background");
/// ```
pub fn parse_manifest_str(path: &Path, content: &str) -> ParsedManifest {
    parse_manifest_bytes(path, content.as_bytes())
}

/// Parses the raw `content` of a manifest. Every line is decoded as UTF-8 on its own so
/// that a single broken line doesn't invalidate the rest of the manifest.
pub fn parse_manifest_bytes(path: &Path, content: &[u8]) -> ParsedManifest {
    let mut parser = LineParser {
        path,
        base_path: String::new(),
        manifest: ParsedManifest::default(),
    };

    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    let content = content.strip_suffix(b"\n").unwrap_or(content);
    if !content.is_empty() {
        for (index, line) in content.split(|byte| *byte == b'\n').enumerate() {
            let line_number = index + 1;
            if line.iter().find(|byte| !byte.is_ascii_whitespace()) == Some(&b'#') {
                continue;
            }
            match std::str::from_utf8(line) {
                Ok(line) => parser.parse_line(line_number, line),
                Err(err) => parser.report(line_number, format!("line is not valid UTF-8: {err}")),
            }
        }
    }

    let manifest = parser.manifest;
    info! {
        "Parsed manifest '{}': {} requests, {} diagnostics",
        path.display(),
        manifest.requests.len(),
        manifest.diagnostics.len()
    };
    manifest
}

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

struct LineParser<'a> {
    path: &'a Path,
    base_path: String,
    manifest: ParsedManifest,
}

impl LineParser<'_> {
    fn parse_line(&mut self, line_number: usize, line: &str) {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            return;
        }

        if let Some(value) = line.strip_prefix(BASE_PATH_DIRECTIVE) {
            let value = value.trim();
            if value.chars().any(char::is_whitespace) {
                self.report(line_number, format!("base path '{value}' contains whitespace"));
                return;
            }
            trace!("Base path in '{}' set to '{value}' in line {line_number}", self.path.display());
            self.base_path = value.to_owned();
            return;
        }

        let tokens = line.split_whitespace().collect::<Vec<_>>();
        let [relative_path, logical_name] = tokens.as_slice() else {
            let reason = format!("expected '<relative-path> <logical-name>' but found {} tokens", tokens.len());
            self.report(line_number, reason);
            return;
        };

        let request = LoadRequest::new(resolve(&self.base_path, relative_path), *logical_name);
        trace!("Queued {request} from line {line_number}");
        self.manifest.requests.push(request);
    }

    fn report(&mut self, line: usize, reason: String) {
        report(&mut self.manifest, self.path, line, reason);
    }
}

fn report(manifest: &mut ParsedManifest, path: &Path, line: usize, reason: String) {
    let err = Error::ManifestLine {
        path: PathBuf::from(path),
        line,
        reason,
    };
    warn!("{err}. Continuing...");
    manifest.diagnostics.push(err);
}

/// Concatenates the base path and the relative path. A separator is only inserted when
/// the base path doesn't already end with one.
fn resolve(base_path: &str, relative_path: &str) -> String {
    if base_path.is_empty() || base_path.ends_with(['/', '\\']) {
        format!("{base_path}{relative_path}")
    } else {
        format!("{base_path}/{relative_path}")
    }
}

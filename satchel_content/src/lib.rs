//! # Overview
//!
//! Crate for loading textures and music that are listed in plain-text manifests.
//!
//! Loading happens in two phases. The assets of the startup manifest are loaded
//! synchronously so they are available before the first frame. The assets of the
//! background manifest are loaded on a separate thread while the application is
//! already running.
//!
//! ```text
//! manifest file ─▶ parse_manifest ─▶ LoadQueue ─▶ LoadWorker ─▶ AssetStore ◀─ get_texture/get_music
//! ```
//!
//! # Components
//!
//! - [`parse_manifest`] turns a manifest into [`LoadRequest`]s.
//! - [`LoadQueue`] holds the requests until a [`LoadWorker`] drains it.
//! - [`AssetStore`] maps the logical names to the decoded resources.
//! - [`LoadWorker`] decodes the requests with a [`Decode`] implementation and publishes the [`LoadState`].
//! - [`AssetManager`] ties everything together and is what the application talks to.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use satchel_content::{AssetManager, AssetManagerConfig, FileDecoder, LoadState};
//!
//! let asset_manager = AssetManager::initialize(AssetManagerConfig::with_root("assets"), Arc::new(FileDecoder)).unwrap();
//! let _background = asset_manager.get_texture("Background").unwrap();
//! if asset_manager.background_load_progress() == LoadState::Finished {
//!     let _theme = asset_manager.get_music("ThemeMusic").unwrap();
//! }
//! ```

mod asset_manager;
mod asset_store;
mod common;
mod config;
mod decode;
mod load_queue;
mod load_state;
mod load_worker;
pub mod manifest;

pub use asset_manager::*;
pub use asset_store::*;
pub use common::{Error, Result};
pub use config::*;
pub use decode::*;
pub use load_queue::*;
pub use load_state::{LoadState, LoadStatus};
pub use load_worker::*;
pub use manifest::{parse_manifest, parse_manifest_bytes, parse_manifest_str, ParsedManifest};

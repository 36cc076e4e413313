use std::{path::Path, sync::Arc, thread::JoinHandle};

use satchel_shared::{
    crossbeam_channel::Receiver,
    log::{error, info, trace},
    parking_lot::Mutex,
    Music, Texture,
};

use crate::{
    manifest::parse_manifest, AssetManagerConfig, AssetStore, Decode, LoadEvent, LoadQueue, LoadReport, LoadRequest, LoadState,
    LoadStatus, LoadWorker, Observers, Result,
};

/// Entry point for loading and reading assets.
///
/// The application creates one [`AssetManager`] at startup and hands it (usually in an
/// [`Arc`]) to everyone who needs assets. [`AssetManager::initialize`] loads the startup
/// manifest before it returns and the background manifest on a separate thread.
pub struct AssetManager {
    config: AssetManagerConfig,
    store: Arc<AssetStore>,
    status: Arc<LoadStatus>,
    observers: Observers,
    worker: LoadWorker,

    /// Requests that are collected until [`AssetManager::dispatch_background`] is called.
    background_queue: Mutex<LoadQueue>,

    /// Background workers that haven't been joined yet.
    workers: Mutex<Vec<JoinHandle<LoadReport>>>,
}

impl AssetManager {
    /// Creates a new [`AssetManager`] without loading anything.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use satchel_content::{AssetManager, AssetManagerConfig, FileDecoder, LoadState};
    /// let asset_manager = AssetManager::new(AssetManagerConfig::default(), Arc::new(FileDecoder));
    /// assert_eq!(asset_manager.background_load_progress(), LoadState::Idle);
    /// assert!(asset_manager.get_texture("Background").is_err());
    /// ```
    pub fn new(config: AssetManagerConfig, decoder: Arc<dyn Decode>) -> Self {
        let store = Arc::new(AssetStore::new());
        let status = Arc::new(LoadStatus::new());
        let observers = Observers::default();
        let worker = LoadWorker::new(store.clone(), status.clone(), decoder, config.kind_registry()).with_observers(observers.clone());
        Self {
            config,
            store,
            status,
            observers,
            worker,
            background_queue: Mutex::new(LoadQueue::new()),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Creates a new [`AssetManager`], loads the startup manifest and dispatches the background manifest.
    ///
    /// Missing manifests are logged and treated as empty. Only a failure to start the
    /// background thread is returned as an error.
    pub fn initialize(config: AssetManagerConfig, decoder: Arc<dyn Decode>) -> Result<Self> {
        let asset_manager = Self::new(config, decoder);
        asset_manager.load_startup_manifest();
        asset_manager.load_background_manifest()?;
        Ok(asset_manager)
    }

    /// Loads all assets of the startup manifest and blocks until they are in the store.
    pub fn load_startup_manifest(&self) -> LoadReport {
        info!("Loading startup manifest '{}'", self.config.startup_manifest.display());
        let queue = parse_manifest(&self.config.startup_manifest).into_queue();
        self.worker.run(queue)
    }

    /// Dispatches all assets of the background manifest on a new thread.
    pub fn load_background_manifest(&self) -> Result<()> {
        let path = self.config.background_manifest.clone();
        self.load_manifest_in_background(path)
    }

    /// Dispatches all assets of the manifest at `path` on a new thread.
    pub fn load_manifest_in_background(&self, path: impl AsRef<Path>) -> Result<()> {
        info!("Loading manifest '{}' in the background", path.as_ref().display());
        let queue = parse_manifest(path).into_queue();
        self.spawn_worker(queue)
    }

    /// Loads a single asset synchronously. Decode errors are logged and reported as skipped.
    pub fn load_asset(&self, path: impl Into<String>, name: impl Into<String>) -> Result<LoadReport> {
        let mut queue = LoadQueue::new();
        queue.push(LoadRequest::new(path, name))?;
        Ok(self.worker.run(queue))
    }

    /// Appends an asset to the queue that is loaded on the next [`AssetManager::dispatch_background`].
    pub fn queue_background_asset(&self, path: impl Into<String>, name: impl Into<String>) -> Result<()> {
        self.background_queue.lock().push(LoadRequest::new(path, name))
    }

    /// Hands a snapshot of the queued background assets to a new thread. The queue is
    /// empty afterwards and can be filled again immediately.
    pub fn dispatch_background(&self) -> Result<()> {
        let queue = self.background_queue.lock().drain();
        if queue.is_empty() {
            trace!("No background assets queued");
            return Ok(());
        }
        self.spawn_worker(queue)
    }

    fn spawn_worker(&self, queue: LoadQueue) -> Result<()> {
        // The lock is held until the new handle is pushed so that `wait_for_background` can't miss it
        let mut workers = self.workers.lock();
        let (finished, running) = std::mem::take(&mut *workers)
            .into_iter()
            .partition::<Vec<_>, _>(|handle| handle.is_finished());
        *workers = running;
        for handle in finished {
            join_worker(handle);
        }
        workers.push(self.worker.spawn(queue)?);
        Ok(())
    }

    /// Returns the [`LoadState`] without blocking.
    pub fn background_load_progress(&self) -> LoadState {
        self.status.state()
    }

    /// Blocks until all background threads are done and returns their reports in dispatch order.
    ///
    /// Reports of workers that were already reaped by a later dispatch are not included.
    pub fn wait_for_background(&self) -> Vec<LoadReport> {
        let workers = std::mem::take(&mut *self.workers.lock());
        workers.into_iter().filter_map(join_worker).collect()
    }

    /// Returns the texture or [`Error::NotFound`](crate::Error::NotFound) when it isn't loaded (yet).
    pub fn get_texture(&self, name: &str) -> Result<Arc<Texture>> {
        self.store.get_texture(name)
    }

    /// Returns the music or [`Error::NotFound`](crate::Error::NotFound) when it isn't loaded (yet).
    pub fn get_music(&self, name: &str) -> Result<Arc<Music>> {
        self.store.get_music(name)
    }

    /// Returns a channel that receives a [`LoadEvent`] for every handled request and finished batch.
    pub fn observe(&self) -> Receiver<LoadEvent> {
        self.observers.observe()
    }

    pub fn store(&self) -> &Arc<AssetStore> {
        &self.store
    }

    pub fn config(&self) -> &AssetManagerConfig {
        &self.config
    }
}

fn join_worker(handle: JoinHandle<LoadReport>) -> Option<LoadReport> {
    let thread_name = handle.thread().name().unwrap_or("unnamed").to_owned();
    match handle.join() {
        Ok(report) => Some(report),
        Err(_) => {
            error!("Background load worker '{thread_name}' panicked");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use satchel_shared::{indoc::indoc, Resource, ResourceKind};
    use satchel_test::{fixture, setup_logger, Fixture};

    use super::*;
    use crate::{Error, FileDecoder, ScriptedDecoder};

    fn config(fixture: &Fixture) -> AssetManagerConfig {
        AssetManagerConfig::with_root(fixture.path())
    }

    #[test]
    fn smoke() {
        setup_logger();
        let fixture = fixture!();
        fixture.write(
            "Startup.asset.txt",
            indoc! {"
                # Needed for the first frame
                BASE_PATH: art/
                bg.png Background
            "},
        );
        fixture.write(
            "Background.asset.txt",
            indoc! {"
                BASE_PATH: art/
                hero.png Hero
                icon.png
                BASE_PATH: music/
                theme.ogg Theme
                level.fbx Level
            "},
        );

        let decoder = Arc::new(ScriptedDecoder::new());
        let asset_manager = AssetManager::initialize(config(&fixture), decoder).unwrap();

        // The startup manifest is loaded when `initialize` returns
        let background = asset_manager.get_texture("Background").unwrap();
        assert_eq!(*background, ScriptedDecoder::texture_for("art/bg.png"));

        let reports = asset_manager.wait_for_background();
        assert_eq!(reports, vec![LoadReport { loaded: 2, skipped: 1 }]);
        assert_eq!(asset_manager.background_load_progress(), LoadState::Finished);
        assert_eq!(*asset_manager.get_texture("Hero").unwrap(), ScriptedDecoder::texture_for("art/hero.png"));
        assert_eq!(*asset_manager.get_music("Theme").unwrap(), ScriptedDecoder::music_for("music/theme.ogg"));
        assert!(matches!(asset_manager.get_texture("Level"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn missing_manifests_are_not_fatal() {
        setup_logger();
        let fixture = fixture!();
        let asset_manager = AssetManager::initialize(config(&fixture), Arc::new(ScriptedDecoder::new())).unwrap();
        assert_eq!(asset_manager.wait_for_background(), vec![LoadReport::default()]);
        assert_eq!(asset_manager.background_load_progress(), LoadState::Finished);
        assert!(asset_manager.store().is_empty());
    }

    #[test]
    fn background_assets_are_not_found_while_loading() {
        setup_logger();
        let fixture = fixture!();
        fixture.write("Background.asset.txt", "hero.png Hero\n");

        let (decoder, gate) = ScriptedDecoder::new().gated();
        let asset_manager = AssetManager::new(config(&fixture), Arc::new(decoder));
        asset_manager.load_background_manifest().unwrap();

        assert_eq!(asset_manager.background_load_progress(), LoadState::Loading);
        assert!(matches!(
            asset_manager.get_texture("Hero"),
            Err(Error::NotFound {
                kind: ResourceKind::Texture,
                ..
            })
        ));

        drop(gate);
        asset_manager.wait_for_background();
        assert_eq!(asset_manager.background_load_progress(), LoadState::Finished);
        assert!(asset_manager.get_texture("Hero").is_ok());
    }

    #[test]
    fn load_asset() {
        setup_logger();
        let fixture = fixture!();
        let asset_manager = AssetManager::new(config(&fixture), Arc::new(ScriptedDecoder::new()));

        let report = asset_manager.load_asset("art/bg.png", "Background").unwrap();
        assert_eq!(report, LoadReport { loaded: 1, skipped: 0 });
        assert!(asset_manager.get_texture("Background").is_ok());
        assert_eq!(asset_manager.background_load_progress(), LoadState::Finished);

        assert!(matches!(asset_manager.load_asset("", "Empty"), Err(Error::InvalidRequest { .. })));
        assert_eq!(asset_manager.load_asset("notes.txt", "Notes").unwrap().skipped, 1);
    }

    #[test]
    fn never_queued_name() {
        let fixture = fixture!();
        let asset_manager = AssetManager::new(config(&fixture), Arc::new(ScriptedDecoder::new()));
        assert!(matches!(asset_manager.get_music("Nope"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn dispatch_takes_a_snapshot() {
        setup_logger();
        let fixture = fixture!();
        let (decoder, gate) = ScriptedDecoder::new().gated();
        let decoder = Arc::new(decoder);
        let asset_manager = AssetManager::new(config(&fixture), decoder.clone());

        asset_manager.queue_background_asset("a.png", "A").unwrap();
        asset_manager.queue_background_asset("b.png", "B").unwrap();
        asset_manager.dispatch_background().unwrap();

        // The producer keeps building a fresh queue while the first batch is still blocked
        asset_manager.queue_background_asset("c.png", "C").unwrap();
        assert!(asset_manager.queue_background_asset("c.png", "").is_err());

        drop(gate);
        assert_eq!(asset_manager.wait_for_background(), vec![LoadReport { loaded: 2, skipped: 0 }]);
        assert!(asset_manager.get_texture("C").is_err());

        asset_manager.dispatch_background().unwrap();
        assert_eq!(asset_manager.wait_for_background(), vec![LoadReport { loaded: 1, skipped: 0 }]);
        assert!(asset_manager.get_texture("C").is_ok());
        assert_eq!(decoder.decoded_paths(), vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn empty_dispatch_does_nothing() {
        let fixture = fixture!();
        let asset_manager = AssetManager::new(config(&fixture), Arc::new(ScriptedDecoder::new()));
        asset_manager.dispatch_background().unwrap();
        assert_eq!(asset_manager.background_load_progress(), LoadState::Idle);
        assert!(asset_manager.wait_for_background().is_empty());
    }

    #[test]
    fn overlapping_batches() {
        setup_logger();
        let fixture = fixture!();
        fixture.write("First.asset.txt", "a.png A\nshared.png Shared\n");
        fixture.write("Second.asset.txt", "b.png B\nshared.png Shared\n");

        let asset_manager = AssetManager::new(config(&fixture), Arc::new(ScriptedDecoder::new()));
        asset_manager.load_manifest_in_background(fixture.join("First.asset.txt")).unwrap();
        asset_manager.load_manifest_in_background(fixture.join("Second.asset.txt")).unwrap();
        asset_manager.wait_for_background();

        assert_eq!(asset_manager.background_load_progress(), LoadState::Finished);
        assert_eq!(asset_manager.store().names(ResourceKind::Texture), vec!["A", "B", "Shared"]);
    }

    #[test]
    fn observe_background_batch() {
        setup_logger();
        let fixture = fixture!();
        fixture.write("Background.asset.txt", "hero.png Hero\n");
        let asset_manager = AssetManager::new(config(&fixture), Arc::new(ScriptedDecoder::new()));
        let receiver = asset_manager.observe();
        asset_manager.load_background_manifest().unwrap();

        let mut finished = None;
        while finished.is_none() {
            match receiver.recv_timeout(Duration::from_secs(5)).unwrap() {
                LoadEvent::BatchFinished { report, .. } => finished = Some(report),
                event => trace!("Received {event:?}"),
            }
        }
        assert_eq!(finished, Some(LoadReport { loaded: 1, skipped: 0 }));
        assert_eq!(asset_manager.background_load_progress(), LoadState::Finished);
    }

    #[test]
    fn concurrent_readers_during_background_load() {
        setup_logger();
        let fixture = fixture!();
        let manifest = (0..100).map(|index| format!("t{index}.png T{index}\n")).collect::<String>();
        fixture.write("Background.asset.txt", manifest);

        let asset_manager = Arc::new(AssetManager::new(config(&fixture), Arc::new(ScriptedDecoder::new())));
        asset_manager.load_background_manifest().unwrap();

        let readers = (0..4)
            .map(|_| {
                let asset_manager = asset_manager.clone();
                thread::spawn(move || {
                    for index in (0..100).cycle().take(1000) {
                        match asset_manager.get_texture(&format!("T{index}")) {
                            Ok(texture) => assert_eq!(*texture, ScriptedDecoder::texture_for(&format!("t{index}.png"))),
                            Err(Error::NotFound { .. }) => {}
                            Err(err) => panic!("unexpected error: {err}"),
                        }
                    }
                })
            })
            .collect::<Vec<_>>();
        for reader in readers {
            reader.join().unwrap();
        }

        asset_manager.wait_for_background();
        assert_eq!(asset_manager.store().len(ResourceKind::Texture), 100);
    }

    #[test]
    fn file_decoder_end_to_end() {
        setup_logger();
        let fixture = fixture!();
        fixture.write_png("assets/art/bg.png", 2, 2, [255, 0, 0, 255]);
        fixture.write("assets/music/theme.ogg", [0u8; 8]);
        let base_path = fixture.manifest_path(fixture.join("assets"));
        fixture.write("Startup.asset.txt", format!("BASE_PATH: {base_path}\nart/bg.png Background\n"));
        fixture.write("Background.asset.txt", format!("BASE_PATH: {base_path}/music/\ntheme.ogg Theme\n"));

        let asset_manager = AssetManager::initialize(config(&fixture), Arc::new(FileDecoder)).unwrap();
        let texture = asset_manager.get_texture("Background").unwrap();
        assert_eq!((texture.width(), texture.height()), (2, 2));

        asset_manager.wait_for_background();
        assert_eq!(asset_manager.get_music("Theme").unwrap().format(), "ogg");
    }

    #[test]
    fn panicked_workers_are_reaped_on_dispatch() {
        setup_logger();
        let fixture = fixture!();
        let decoder = |path: &Path, _kind: ResourceKind| -> Result<Resource> {
            if path.ends_with("broken.png") {
                panic!("decoder crashed");
            }
            Ok(ScriptedDecoder::texture_for(&path.to_string_lossy()).into())
        };
        let asset_manager = AssetManager::new(config(&fixture), Arc::new(decoder));

        asset_manager.queue_background_asset("broken.png", "Broken").unwrap();
        asset_manager.dispatch_background().unwrap();
        while !asset_manager.workers.lock().iter().all(JoinHandle::is_finished) {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(asset_manager.background_load_progress(), LoadState::Finished);

        asset_manager.queue_background_asset("hero.png", "Hero").unwrap();
        asset_manager.dispatch_background().unwrap();
        assert_eq!(asset_manager.workers.lock().len(), 1);

        assert_eq!(asset_manager.wait_for_background(), vec![LoadReport { loaded: 1, skipped: 0 }]);
        assert_eq!(asset_manager.background_load_progress(), LoadState::Finished);
        assert!(asset_manager.get_texture("Hero").is_ok());
        assert!(matches!(asset_manager.get_texture("Broken"), Err(Error::NotFound { .. })));
    }
}

use std::{
    path::PathBuf,
    sync::Arc,
    thread::{self, JoinHandle},
};

use satchel_shared::{
    crossbeam_channel::{self, Receiver, Sender},
    log::{error, info, trace, warn},
    parking_lot::Mutex,
    ResourceKind,
};

use crate::{AssetStore, Decode, Error, KindRegistry, LoadQueue, LoadRequest, LoadStatus, Result};

/// Outcome of draining one queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Requests that are now in the [`AssetStore`].
    pub loaded: usize,
    /// Requests that were skipped because of an unsupported kind or a decode error.
    pub skipped: usize,
}

/// Events that are sent to the observers while queues are drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadEvent {
    Loaded { kind: ResourceKind, name: String },
    Skipped { path: PathBuf, name: String, reason: String },
    BatchFinished { batch: usize, report: LoadReport },
}

/// Channels of everyone who observes the [`LoadEvent`]s.
#[derive(Debug, Default, Clone)]
pub struct Observers {
    senders: Arc<Mutex<Vec<Sender<LoadEvent>>>>,
}

impl Observers {
    /// Returns a channel that receives all following [`LoadEvent`]s.
    pub fn observe(&self) -> Receiver<LoadEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.senders.lock().push(sender);
        receiver
    }

    /// Sends the event to all observers and removes the channels that are no longer active.
    fn broadcast(&self, event: LoadEvent) {
        self.senders.lock().retain(|sender| match sender.send(event.clone()) {
            Ok(()) => true,
            Err(err) => {
                trace!("Failed to send {:?}: \"{err}\". Channel will be removed.", err.0);
                false
            }
        });
    }
}

/// Drains [`LoadQueue`]s into the [`AssetStore`].
///
/// [`LoadWorker::run`] blocks the calling thread until the queue is drained,
/// [`LoadWorker::spawn`] does the same on a dedicated thread. The queue is moved into
/// the worker in both cases so nobody else can touch it while it is drained.
#[derive(Clone)]
pub struct LoadWorker {
    store: Arc<AssetStore>,
    status: Arc<LoadStatus>,
    decoder: Arc<dyn Decode>,
    kinds: Arc<KindRegistry>,
    observers: Observers,
}

impl LoadWorker {
    /// Creates a new [`LoadWorker`].
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use satchel_content::{AssetStore, FileDecoder, KindRegistry, LoadQueue, LoadStatus, LoadWorker};
    /// let store = Arc::new(AssetStore::new());
    /// let status = Arc::new(LoadStatus::new());
    /// let worker = LoadWorker::new(store, status, Arc::new(FileDecoder), KindRegistry::default());
    /// let report = worker.run(LoadQueue::new());
    /// assert_eq!(report.loaded, 0);
    /// ```
    pub fn new(store: Arc<AssetStore>, status: Arc<LoadStatus>, decoder: Arc<dyn Decode>, kinds: KindRegistry) -> Self {
        Self {
            store,
            status,
            decoder,
            kinds: Arc::new(kinds),
            observers: Observers::default(),
        }
    }

    /// Sends the [`LoadEvent`]s to the given observers.
    pub fn with_observers(mut self, observers: Observers) -> Self {
        self.observers = observers;
        self
    }

    /// Drains the queue on the calling thread and returns when all requests are handled.
    pub fn run(&self, queue: LoadQueue) -> LoadReport {
        let guard = self.status.begin();
        let batch = guard.batch();
        info!("Loading batch {batch} with {} requests synchronously", queue.len());
        let report = self.load_all(queue);
        drop(guard);
        self.finish(batch, report);
        report
    }

    /// Drains the queue on a new thread. [`LoadState::Loading`](crate::LoadState::Loading) is
    /// published before this function returns.
    pub fn spawn(&self, queue: LoadQueue) -> Result<JoinHandle<LoadReport>> {
        let guard = self.status.begin();
        let batch = guard.batch();
        let worker = self.clone();
        let thread_name = format!("LoadWorker batch {batch}");
        thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                info!("Starting '{thread_name}' with {} requests", queue.len());
                let report = worker.load_all(queue);
                drop(guard);
                worker.finish(batch, report);
                report
            })
            .map_err(|_| Error::FailedToStartThread)
    }

    fn finish(&self, batch: usize, report: LoadReport) {
        info!("Finished batch {batch}: {} loaded, {} skipped", report.loaded, report.skipped);
        self.observers.broadcast(LoadEvent::BatchFinished { batch, report });
    }

    fn load_all(&self, queue: LoadQueue) -> LoadReport {
        let mut report = LoadReport::default();
        for request in queue {
            match self.load(&request) {
                Ok(kind) => {
                    report.loaded += 1;
                    info!("Loaded {kind}: {}", request.logical_name());
                    self.observers.broadcast(LoadEvent::Loaded {
                        kind,
                        name: request.logical_name().to_owned(),
                    });
                }
                Err(err) => {
                    report.skipped += 1;
                    match &err {
                        Error::UnsupportedKind { .. } => warn!("Skipping {request}: {err}"),
                        _ => error!("Skipping {request}: {err}"),
                    }
                    self.observers.broadcast(LoadEvent::Skipped {
                        path: request.path().to_owned(),
                        name: request.logical_name().to_owned(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        report
    }

    fn load(&self, request: &LoadRequest) -> Result<ResourceKind> {
        trace!("Determining the kind of '{}'", request.resolved_path());
        let kind = self.kinds.kind_of(request.path())?;

        trace!("Decoding '{}' as {kind}", request.resolved_path());
        let resource = self.decoder.decode(request.path(), kind)?;
        if resource.kind() != kind {
            return Err(Error::Decode {
                path: request.path().to_owned(),
                kind,
                reason: format!("decoder returned a {} instead", resource.kind()),
            });
        }

        self.store.put(request.logical_name(), resource);
        Ok(kind)
    }
}

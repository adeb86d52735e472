//! Background folder loading.
//!
//! Album selections are served on a worker thread so the UI keeps drawing
//! while a folder is fetched. Every request carries an id; the controller
//! only accepts the result matching its latest request.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::error::CatalogError;

use super::model::Track;
use super::source::CatalogSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRequest {
    pub id: u64,
    pub folder: String,
    /// Whether the first track should start playing once loaded.
    pub autoplay: bool,
}

#[derive(Debug)]
pub struct FolderLoaded {
    pub request: FolderRequest,
    pub result: Result<Vec<Track>, CatalogError>,
}

pub struct FolderLoader {
    tx: Sender<FolderRequest>,
    rx: Receiver<FolderLoaded>,
    _worker: JoinHandle<()>,
}

impl FolderLoader {
    pub fn spawn(source: Arc<dyn CatalogSource>) -> Self {
        let (tx, req_rx) = mpsc::channel::<FolderRequest>();
        let (done_tx, rx) = mpsc::channel::<FolderLoaded>();

        let worker = thread::spawn(move || {
            while let Ok(mut request) = req_rx.recv() {
                // Collapse a burst of selections into the most recent one.
                loop {
                    match req_rx.try_recv() {
                        Ok(newer) => {
                            debug!(skipped = %request.folder, "superseded folder request");
                            request = newer;
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => return,
                    }
                }

                // A panicking source must still answer, or the request never clears.
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    source.load_folder(&request.folder)
                }))
                .unwrap_or_else(|_| {
                    warn!(folder = %request.folder, "folder load panicked");
                    Err(CatalogError::Aborted(request.folder.clone()))
                });
                if done_tx.send(FolderLoaded { request, result }).is_err() {
                    break;
                }
            }
        });

        Self {
            tx,
            rx,
            _worker: worker,
        }
    }

    pub fn request(&self, request: FolderRequest) {
        if let Err(e) = self.tx.send(request) {
            warn!(folder = %e.0.folder, "folder loader has stopped");
        }
    }

    /// A finished load, if any is waiting.
    pub fn try_recv(&self) -> Option<FolderLoaded> {
        self.rx.try_recv().ok()
    }
}

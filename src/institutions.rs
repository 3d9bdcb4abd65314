//! Institution names fetched once from the service in the background.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::service::{PredictionService, ServiceError};

/// Institution list with its loading flag.
///
/// A failed fetch is logged and leaves the list empty; the form stays usable
/// with whatever institution name the user types.
#[derive(Debug, Default)]
pub struct InstitutionDirectory {
    names: Vec<String>,
    loading: bool,
    pending: Option<Receiver<Result<Vec<String>, ServiceError>>>,
}

impl InstitutionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start fetching in the background. Ignored while a fetch is running.
    pub fn begin_fetch(&mut self, service: Arc<dyn PredictionService>) {
        if self.loading {
            return;
        }
        self.loading = true;
        let (tx, rx) = mpsc::channel();
        self.pending = Some(rx);
        thread::spawn(move || {
            let _ = tx.send(service.fetch_institutions());
        });
    }

    /// Apply a finished fetch without blocking. Returns true if it finished.
    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.finish(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.finish(Err(ServiceError::Transport(
                    "institution fetch worker exited".to_string(),
                )));
                true
            }
        }
    }

    /// Block until a running fetch finishes.
    pub fn wait(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        let result = rx.recv().unwrap_or_else(|_| {
            Err(ServiceError::Transport(
                "institution fetch worker exited".to_string(),
            ))
        });
        self.finish(result);
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    fn finish(&mut self, result: Result<Vec<String>, ServiceError>) {
        self.pending = None;
        self.loading = false;
        match result {
            Ok(names) => {
                tracing::info!("Loaded {} institutions", names.len());
                self.names = names;
            }
            Err(err) => {
                tracing::error!("Error fetching institutions: {err}");
            }
        }
    }
}

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, Sender, TryRecvError};
use std::thread;

use crate::model::{InputRecord, PredictionResult};
use crate::service::{PredictionService, ServiceError};

/// Identifies the input generation a background request was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct RequestToken(u64);

pub(crate) enum PanelJobMessage {
    PredictionFinished(PredictionJobResult),
    AnalysisFinished(AnalysisJobResult),
}

#[derive(Debug)]
pub(crate) struct PredictionJobResult {
    pub(crate) token: RequestToken,
    pub(crate) result: Result<PredictionResult, ServiceError>,
}

#[derive(Debug)]
pub(crate) struct AnalysisJobResult {
    pub(crate) token: RequestToken,
    pub(crate) result: Result<String, ServiceError>,
}

/// Worker threads and the completion channel owned by one panel.
pub(crate) struct PanelJobs {
    service: Arc<dyn PredictionService>,
    message_tx: Sender<PanelJobMessage>,
    message_rx: Receiver<PanelJobMessage>,
    current: RequestToken,
}

impl PanelJobs {
    pub(crate) fn new(service: Arc<dyn PredictionService>) -> Self {
        let (message_tx, message_rx) = std::sync::mpsc::channel::<PanelJobMessage>();
        Self {
            service,
            message_tx,
            message_rx,
            current: RequestToken(0),
        }
    }

    pub(crate) fn current_token(&self) -> RequestToken {
        self.current
    }

    /// Invalidate every request issued so far and return the new token.
    pub(crate) fn advance(&mut self) -> RequestToken {
        self.current = RequestToken(self.current.0 + 1);
        self.current
    }

    pub(crate) fn is_current(&self, token: RequestToken) -> bool {
        token == self.current
    }

    pub(crate) fn begin_prediction(&self, token: RequestToken, input: InputRecord) {
        let tx = self.message_tx.clone();
        let service = Arc::clone(&self.service);
        thread::spawn(move || {
            let result = guarded(|| service.predict(&input));
            let _ = tx.send(PanelJobMessage::PredictionFinished(PredictionJobResult {
                token,
                result,
            }));
        });
    }

    pub(crate) fn begin_analysis(
        &self,
        token: RequestToken,
        input: InputRecord,
        prediction: PredictionResult,
    ) {
        let tx = self.message_tx.clone();
        let service = Arc::clone(&self.service);
        thread::spawn(move || {
            let result = guarded(|| service.analyze(&input, &prediction));
            let _ = tx.send(PanelJobMessage::AnalysisFinished(AnalysisJobResult {
                token,
                result,
            }));
        });
    }

    pub(crate) fn try_recv_message(&self) -> Result<PanelJobMessage, TryRecvError> {
        self.message_rx.try_recv()
    }

    /// Block until a worker reports back.
    ///
    /// The panel keeps its own sender alive, so only call this while a
    /// request is known to be in flight.
    pub(crate) fn recv_message(&self) -> Result<PanelJobMessage, RecvError> {
        self.message_rx.recv()
    }
}

/// Run a service call, turning a panic into a transport error so the worker
/// always reports back and the panel leaves its busy state.
fn guarded<T>(call: impl FnOnce() -> Result<T, ServiceError>) -> Result<T, ServiceError> {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        let message = panic_to_string(payload);
        tracing::error!("Service worker panicked: {message}");
        Err(ServiceError::Transport(format!("worker panicked: {message}")))
    })
}

fn panic_to_string(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarded_maps_panic_to_transport_error() {
        let result: Result<(), ServiceError> = guarded(|| panic!("socket exploded"));
        match result {
            Err(ServiceError::Transport(message)) => {
                assert!(message.contains("socket exploded"), "{message}");
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[test]
    fn guarded_passes_results_through() {
        assert_eq!(guarded(|| Ok::<_, ServiceError>(7)).unwrap(), 7);
        let err = guarded(|| {
            Err::<(), _>(ServiceError::Decode("bad".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }
}

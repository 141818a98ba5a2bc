use std::sync::mpsc;

use crate::msg::Msg;

/// Sender side of the UI queue. Every producer off the UI thread goes through here.
#[derive(Debug, Clone)]
pub struct UiDispatcher {
    tx: mpsc::Sender<Msg>,
}

impl UiDispatcher {
    pub fn new(tx: mpsc::Sender<Msg>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::Receiver<Msg>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    /// Returns false once the UI loop is gone.
    pub fn dispatch(&self, msg: Msg) -> bool {
        match self.tx.send(msg) {
            Ok(()) => true,
            Err(mpsc::SendError(msg)) => {
                tracing::debug!("ui queue closed, dropping {msg:?}");
                false
            }
        }
    }
}

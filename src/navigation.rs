use tokio::sync::mpsc;

use crate::models::{SessionStatus, SessionSummary};

/// Told once per session that playback is over, so the caller can leave the
/// player screen.
pub trait Navigator: Send + Sync {
    /// The routine reached `Finished`, normally or because of a fault.
    fn routine_finished(&self, summary: &SessionSummary);

    /// The session was left before the routine finished.
    fn routine_abandoned(&self, _summary: &SessionSummary) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    Finished(SessionSummary),
    Abandoned(SessionSummary),
}

impl NavigationEvent {
    pub fn summary(&self) -> &SessionSummary {
        match self {
            NavigationEvent::Finished(summary) | NavigationEvent::Abandoned(summary) => summary,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, NavigationEvent::Finished(s) if s.status == SessionStatus::Completed)
    }
}

/// Forwards navigation signals onto a channel, for an event loop to await.
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<NavigationEvent>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: NavigationEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Navigation receiver dropped; signal discarded");
        }
    }
}

impl Navigator for ChannelNavigator {
    fn routine_finished(&self, summary: &SessionSummary) {
        self.send(NavigationEvent::Finished(summary.clone()));
    }

    fn routine_abandoned(&self, summary: &SessionSummary) {
        self.send(NavigationEvent::Abandoned(summary.clone()));
    }
}

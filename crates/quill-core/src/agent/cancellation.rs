//! At-most-one active generation

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Handle for one generation started through [`AgentCancellation::begin`]
#[derive(Debug, Clone)]
pub struct Generation {
    pub id: u64,
    pub token: CancellationToken,
}

#[derive(Debug, Default)]
struct Slot {
    next_id: u64,
    active: Option<Generation>,
}

/// Tracks the cancellation token of the generation in flight
#[derive(Debug, Default)]
pub struct AgentCancellation {
    slot: Mutex<Slot>,
}

impl AgentCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any generation in flight and start a new one
    pub fn begin(&self) -> Generation {
        let mut slot = self.slot.lock();
        if let Some(previous) = slot.active.take() {
            if !previous.token.is_cancelled() {
                tracing::info!(generation = previous.id, "Cancelling previous generation");
                previous.token.cancel();
            }
        }
        slot.next_id += 1;
        let generation = Generation {
            id: slot.next_id,
            token: CancellationToken::new(),
        };
        slot.active = Some(generation.clone());
        generation
    }

    /// Cancel the active generation. Returns false when none was running.
    pub fn cancel(&self) -> bool {
        match self.slot.lock().active.take() {
            Some(generation) if !generation.token.is_cancelled() => {
                generation.token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Release the slot if `generation` is still the active one
    pub fn finish(&self, generation: &Generation) {
        let mut slot = self.slot.lock();
        if slot.active.as_ref().map(|g| g.id) == Some(generation.id) {
            slot.active = None;
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot.lock().active.is_some()
    }
}

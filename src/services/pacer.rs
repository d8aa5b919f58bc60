use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Hands out call start slots at least `spacing` apart, shared by concurrent probes.
pub struct Pacer {
    spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(spacing: Duration) -> Self {
        Self { spacing, next_slot: Mutex::new(None) }
    }

    /// Waits until this caller's slot. Slots are granted in call order.
    pub async fn wait(&self) {
        let mut next = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next {
            Some(t) if t > now => t,
            _ => now,
        };
        *next = Some(slot + self.spacing);
        drop(next);
        if slot > now {
            sleep_until(slot).await;
        }
    }
}

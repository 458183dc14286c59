//! RC-006: Cancellable periodic tick task for the cook-mode countdown.
//!
//! The task sends one [`Tick`] per period on an unbounded channel until its
//! `CancellationToken` fires or the receiver is dropped. Each spawn carries a
//! generation number so the receiver can discard ticks from a cancelled task
//! that were already queued.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A single tick from the ticker of `generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Sending half handed to ticker tasks.
pub type TickSender = mpsc::UnboundedSender<Tick>;

/// Receiving half polled by the owner of the session.
pub type TickReceiver = mpsc::UnboundedReceiver<Tick>;

/// Create a tick channel.
pub fn tick_channel() -> (TickSender, TickReceiver) {
    mpsc::unbounded_channel()
}

/// Handle to a running ticker task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TickerHandle {
    cancel: CancellationToken,
    generation: u64,
}

impl TickerHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn a ticker on the current tokio runtime.
///
/// Returns `None` outside a runtime; callers then drive ticks by hand.
pub fn spawn_ticker(period: Duration, generation: u64, tx: TickSender) -> Option<TickerHandle> {
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    runtime.spawn(async move {
        run_ticker_loop(period, generation, tx, cancel_clone).await;
    });

    Some(TickerHandle { cancel, generation })
}

async fn run_ticker_loop(
    period: Duration,
    generation: u64,
    tx: TickSender,
    cancel: CancellationToken,
) {
    // First tick one full period after start; interval() would fire immediately.
    let mut ticker = interval_at(Instant::now() + period, period);

    info!(generation, period_ms = period.as_millis() as u64, "ticker started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(generation, "ticker cancelled");
                break;
            }
            _ = ticker.tick() => {
                if tx.send(Tick { generation }).is_err() {
                    debug!(generation, "tick receiver dropped");
                    break;
                }
            }
        }
    }
}

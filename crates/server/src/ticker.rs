use std::{sync::Arc, time::Duration};

use heating::HeatingController;
use shared::protocol::ServerEvent;
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::info;

/// Drives the session clock and pushes the resulting snapshot every period.
///
/// A late tick is skipped rather than replayed, so the countdown may lag
/// wall time but never decrements twice for one period.
pub(crate) fn spawn_ticker(
    controller: Arc<HeatingController>,
    events: broadcast::Sender<ServerEvent>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; the first second starts after it.
        tick.tick().await;

        info!(?period, "heating ticker started");

        loop {
            tick.tick().await;
            let snapshot = controller.advance_one_second().await;
            let _ = events.send(ServerEvent::status(snapshot));
        }
    })
}

#[cfg(test)]
#[path = "tests/ticker_tests.rs"]
mod tests;

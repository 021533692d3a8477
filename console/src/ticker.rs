//! Fixed-period tick loop with cooperative shutdown.

use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::broadcast;

/// Why a ticker loop returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickerExit {
    /// Shutdown was signalled (or every sender was dropped).
    Shutdown,
    /// The tick callback asked to stop.
    Finished,
}

/// Call `on_tick` with an increasing tick number every `period`, starting
/// immediately, until it returns [`ControlFlow::Break`] or shutdown arrives.
///
/// Missed ticks are skipped rather than replayed in a burst.
pub async fn run_ticker<F>(
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
    mut on_tick: F,
) -> TickerExit
where
    F: FnMut(u64) -> ControlFlow<()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut tick = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::debug!(ticks = tick, "ticker shutting down");
                return TickerExit::Shutdown;
            }
            _ = interval.tick() => {
                if on_tick(tick).is_break() {
                    return TickerExit::Finished;
                }
                tick += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShutdownController;

    #[tokio::test]
    async fn stops_when_callback_breaks() {
        let controller = ShutdownController::new();
        let mut seen = Vec::new();
        let exit = run_ticker(Duration::from_millis(5), controller.subscribe(), |tick| {
            seen.push(tick);
            if tick == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await;
        assert_eq!(exit, TickerExit::Finished);
        assert_eq!(seen, [0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let controller = ShutdownController::new();
        let rx = controller.subscribe();
        controller.shutdown();
        let exit = run_ticker(Duration::from_millis(5), rx, |_| ControlFlow::Continue(())).await;
        assert_eq!(exit, TickerExit::Shutdown);
    }

    #[tokio::test]
    async fn dropped_controller_counts_as_shutdown() {
        let controller = ShutdownController::new();
        let rx = controller.subscribe();
        drop(controller);
        let exit = run_ticker(Duration::from_millis(5), rx, |_| ControlFlow::Continue(())).await;
        assert_eq!(exit, TickerExit::Shutdown);
    }
}

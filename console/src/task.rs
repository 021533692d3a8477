//! Task progress polling.

use metis_client::BuildBackend;
use metis_types::{BuildAction, TaskState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::config::ConsoleConfig;
use crate::error::ConsoleError;

/// Consecutive failed polls after which a watch gives up.
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Follows one build task until it settles.
pub struct TaskMonitor {
    backend: Arc<dyn BuildBackend>,
    poll_interval: Duration,
}

impl TaskMonitor {
    pub fn new(backend: Arc<dyn BuildBackend>, config: &ConsoleConfig) -> Self {
        Self::with_interval(backend, config.task_poll_interval())
    }

    pub fn with_interval(backend: Arc<dyn BuildBackend>, poll_interval: Duration) -> Self {
        Self {
            backend,
            poll_interval,
        }
    }

    pub async fn snapshot(&self, deploy_id: &str) -> Result<TaskState, ConsoleError> {
        Ok(self.backend.task_state(deploy_id).await?)
    }

    /// Poll until the task reaches a terminal state or shutdown is signalled.
    ///
    /// `on_update` sees the first snapshot and every one that differs from
    /// the previous. Failed polls are logged and retried; the watch gives up
    /// with the last error after several in a row. Returns the terminal
    /// snapshot, or `None` on shutdown.
    pub async fn watch<F>(
        &self,
        deploy_id: &str,
        mut shutdown: broadcast::Receiver<()>,
        mut on_update: F,
    ) -> Result<Option<TaskState>, ConsoleError>
    where
        F: FnMut(&TaskState),
    {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last: Option<TaskState> = None;
        let mut failures = 0u32;

        loop {
            // Shutdown is honoured both between polls and while a poll is in flight.
            let polled = tokio::select! {
                biased;
                _ = shutdown.recv() => None,
                polled = async {
                    interval.tick().await;
                    self.backend.task_state(deploy_id).await
                } => Some(polled),
            };
            let Some(polled) = polled else {
                tracing::debug!(deploy_id, "task watch cancelled");
                return Ok(None);
            };

            match polled {
                Ok(state) => {
                    failures = 0;
                    if last.as_ref() != Some(&state) {
                        tracing::debug!(
                            deploy_id,
                            step = %state.step,
                            state = %state.state,
                            "task update"
                        );
                        on_update(&state);
                    }
                    if state.state.is_terminal() {
                        tracing::info!(deploy_id, state = %state.state, "task settled");
                        return Ok(Some(state));
                    }
                    last = Some(state);
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        deploy_id,
                        failures,
                        error = %e,
                        "failed to poll task state"
                    );
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        return Err(e.into());
                    }
                }
            }
        }
    }

    /// Revoke the build's running task.
    pub async fn stop(&self, deploy_id: &str) -> Result<(), ConsoleError> {
        self.backend
            .build_action(BuildAction::Revoke, deploy_id)
            .await?;
        tracing::info!(deploy_id, "task revoked");
        Ok(())
    }
}

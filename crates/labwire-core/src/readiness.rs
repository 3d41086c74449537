// ── Lab readiness polling ──
//
// After a lab start, nodes boot at their own pace. The poller samples every
// node's state on a fixed interval until all of them report STARTED or the
// caller's deadline passes. Running out of time is a result, not an error.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use labwire_api::{Identifier, STATE_STARTED, Session};

use crate::error::CoreError;

/// Pause between two sampling ticks unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Shortest pause the poller accepts; smaller intervals are raised to this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What a single node looked like on one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SampleState {
    /// State string reported by the node detail endpoint.
    Observed(String),
    /// The node could not be fetched this tick.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessSample {
    pub node: Identifier,
    pub label: Option<String>,
    pub state: SampleState,
}

impl ReadinessSample {
    pub fn is_ready(&self) -> bool {
        matches!(&self.state, SampleState::Observed(s) if s == STATE_STARTED)
    }
}

/// Outcome of [`ReadinessPoller::wait_until_ready`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Readiness {
    /// The lab itself was not started; no node was polled.
    NotStarted { state: String },
    /// Every node reported STARTED.
    Ready {
        nodes: Vec<ReadinessSample>,
        elapsed: Duration,
        ticks: u32,
    },
    /// The deadline passed with some nodes still initializing.
    TimedOut {
        pending: Vec<ReadinessSample>,
        ready: Vec<ReadinessSample>,
        elapsed: Duration,
        ticks: u32,
    },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadinessPoller<'a> {
    session: &'a Session,
    interval: Duration,
}

impl<'a> ReadinessPoller<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the pause between ticks, never below [`MIN_POLL_INTERVAL`].
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until every node in `lab` reports STARTED, or `timeout` elapses.
    ///
    /// Returns [`Readiness::NotStarted`] without polling nodes when the lab
    /// is not started. The node set is fetched once up front. Per-node fetch
    /// errors become [`SampleState::Failed`] samples and the loop carries on;
    /// authentication failures abort. A final tick runs at the deadline, so
    /// the call returns roughly `timeout` after it began. A `timeout` too
    /// large to represent as an instant means no deadline.
    pub async fn wait_until_ready(
        &self,
        lab: &Identifier,
        timeout: Duration,
    ) -> Result<Readiness, CoreError> {
        let detail = self.session.get_lab(lab).await?;
        if !detail.is_started() {
            debug!(%lab, state = %detail.state, "lab not started, skipping readiness poll");
            return Ok(Readiness::NotStarted {
                state: detail.state,
            });
        }

        let nodes = self.session.list_nodes(lab).await?;
        let started = Instant::now();
        let deadline = started.checked_add(timeout);
        let mut ticks = 0u32;

        loop {
            ticks = ticks.saturating_add(1);
            let samples = self.sample(lab, &nodes).await?;
            let (ready, pending): (Vec<_>, Vec<_>) =
                samples.into_iter().partition(ReadinessSample::is_ready);

            if pending.is_empty() {
                let elapsed = started.elapsed();
                info!(%lab, nodes = ready.len(), ?elapsed, "all nodes started");
                return Ok(Readiness::Ready {
                    nodes: ready,
                    elapsed,
                    ticks,
                });
            }

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => self.interval,
            };
            if remaining.is_zero() {
                warn!(%lab, pending = pending.len(), ready = ready.len(), "readiness deadline passed");
                return Ok(Readiness::TimedOut {
                    pending,
                    ready,
                    elapsed: started.elapsed(),
                    ticks,
                });
            }

            debug!(%lab, tick = ticks, pending = pending.len(), "nodes still initializing");
            sleep(self.interval.min(remaining)).await;
        }
    }

    async fn sample(
        &self,
        lab: &Identifier,
        nodes: &[Identifier],
    ) -> Result<Vec<ReadinessSample>, CoreError> {
        let mut samples = Vec::with_capacity(nodes.len());
        for node in nodes {
            let sample = match self.session.get_node(lab, node).await {
                Ok(detail) => ReadinessSample {
                    node: node.clone(),
                    label: detail.label,
                    state: SampleState::Observed(detail.state),
                },
                Err(e) if e.is_auth_failure() => return Err(e.into()),
                Err(e) => {
                    warn!(%lab, %node, error = %e, "node state sample failed");
                    ReadinessSample {
                        node: node.clone(),
                        label: None,
                        state: SampleState::Failed(e.to_string()),
                    }
                }
            };
            samples.push(sample);
        }
        Ok(samples)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample(state: SampleState) -> ReadinessSample {
        ReadinessSample {
            node: Identifier::from("n"),
            label: None,
            state,
        }
    }

    #[test]
    fn only_started_counts_as_ready() {
        assert!(sample(SampleState::Observed("STARTED".into())).is_ready());
        assert!(!sample(SampleState::Observed("BOOTED".into())).is_ready());
        assert!(!sample(SampleState::Observed("QUEUED".into())).is_ready());
        assert!(!sample(SampleState::Failed("HTTP 500".into())).is_ready());
    }

    #[test]
    fn zero_interval_is_raised_to_floor() {
        let session = Session::new(
            url::Url::parse("https://lab.example").unwrap(),
            labwire_api::Credentials::new("u", "p"),
            &labwire_api::TransportConfig::default(),
        )
        .unwrap();
        let poller = ReadinessPoller::new(&session).with_interval(Duration::ZERO);
        assert_eq!(poller.interval(), MIN_POLL_INTERVAL);
        let poller = poller.with_interval(Duration::from_secs(2));
        assert_eq!(poller.interval(), Duration::from_secs(2));
    }
}

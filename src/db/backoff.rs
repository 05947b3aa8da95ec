use backon::BackoffBuilder;
use std::time::Duration;

/// Reconnection tuning for the remote backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Connection attempts per reconnection sequence.
    pub max_retries: usize,
    /// Delay after a failed attempt, indexed by attempt; the last value repeats.
    pub backoff: Vec<Duration>,
    /// Bound on a single connect + probe.
    pub connect_timeout: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: vec![
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(5),
            ],
            connect_timeout: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    pub(crate) fn backoff(&self) -> ScheduleBuilder {
        ScheduleBuilder {
            schedule: self.backoff.clone(),
            // The first attempt is immediate; each later one waits for a delay.
            max_times: self.max_retries.saturating_sub(1),
        }
    }
}

/// A fixed delay schedule for backon.
#[derive(Debug, Clone)]
pub(crate) struct ScheduleBuilder {
    schedule: Vec<Duration>,
    max_times: usize,
}

impl BackoffBuilder for ScheduleBuilder {
    type Backoff = ScheduleBackoff;

    fn build(self) -> Self::Backoff {
        ScheduleBackoff {
            schedule: self.schedule,
            index: 0,
            remaining: self.max_times,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScheduleBackoff {
    schedule: Vec<Duration>,
    index: usize,
    remaining: usize,
}

impl Iterator for ScheduleBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let delay = self
            .schedule
            .get(self.index)
            .or_else(|| self.schedule.last())
            .copied()
            .unwrap_or(Duration::ZERO);
        self.index += 1;
        Some(delay)
    }
}

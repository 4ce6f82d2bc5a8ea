//! Bounded snapshot history.

use super::FeedError;
use crate::camera::Snapshot;

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};

/// How much history to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Points older than this, relative to the newest point, are dropped.
    pub max_age_secs: u64,
    pub max_points: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age_secs: 60,
            max_points: 1800,
        }
    }
}

impl RetentionPolicy {
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.max_age_secs == 0 {
            return Err(FeedError::InvalidPolicy(
                "max age must be positive".to_string(),
            ));
        }
        if self.max_points == 0 {
            return Err(FeedError::InvalidPolicy(
                "max points must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn max_age_ms(&self) -> i64 {
        i64::try_from(self.max_age_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }
}

/// First and last retained timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TimeRange {
    pub min: i64,
    pub max: i64,
}

/// Time-ordered snapshots within a retention policy.
#[derive(Debug)]
pub struct History {
    policy: RetentionPolicy,
    points: VecDeque<Arc<Snapshot>>,
}

impl History {
    pub fn new(policy: RetentionPolicy) -> Result<Self, FeedError> {
        policy.validate()?;
        Ok(Self {
            policy,
            points: VecDeque::new(),
        })
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Store a snapshot and evict whatever falls outside the policy.
    ///
    /// Snapshots older than the newest retained one are ignored.
    pub fn record(&mut self, snapshot: Arc<Snapshot>) {
        if let Some(last) = self.points.back() {
            if snapshot.timestamp < last.timestamp {
                tracing::warn!(
                    "Dropping out-of-order snapshot at {} (newest is {})",
                    snapshot.timestamp,
                    last.timestamp
                );
                return;
            }
        }

        let cutoff = snapshot.timestamp.saturating_sub(self.policy.max_age_ms());
        self.points.push_back(snapshot);

        while self.points.front().is_some_and(|p| p.timestamp < cutoff) {
            self.points.pop_front();
        }
        while self.points.len() > self.policy.max_points {
            self.points.pop_front();
        }
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.points.back().cloned()
    }

    /// Snapshot for playback at `timestamp`.
    ///
    /// Exact match first, then the latest point at or before `timestamp`,
    /// then the earliest point.
    pub fn snapshot_at(&self, timestamp: i64) -> Option<Arc<Snapshot>> {
        let after = self.points.partition_point(|p| p.timestamp <= timestamp);
        if after > 0 {
            return self.points.get(after - 1).cloned();
        }
        self.points.front().cloned()
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        let first = self.points.front()?;
        let last = self.points.back()?;
        Some(TimeRange {
            min: first.timestamp,
            max: last.timestamp,
        })
    }

    /// Every retained snapshot, oldest first.
    pub fn window(&self) -> Vec<Arc<Snapshot>> {
        self.points.iter().cloned().collect()
    }
}

/// Store snapshots as they arrive and fan them out to live subscribers.
///
/// Runs until every sender is dropped.
pub async fn run_history_writer(
    mut rx: mpsc::Receiver<Arc<Snapshot>>,
    history: Arc<RwLock<History>>,
    live: broadcast::Sender<Arc<Snapshot>>,
) {
    while let Some(snapshot) = rx.recv().await {
        {
            let mut history = history.write().await;
            history.record(snapshot.clone());
        }

        // No subscribers is fine.
        let _ = live.send(snapshot);
    }

    tracing::info!("History writer stopped");
}

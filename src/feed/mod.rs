//! Telemetry feed: simulated camera readings published as snapshots.

mod retention;
mod seed;

pub use retention::*;
pub use seed::*;

use crate::camera::{CameraReading, Snapshot};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, Mutex};

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("seed contains no cameras")]
    EmptySeed,
    #[error("invalid retention policy: {0}")]
    InvalidPolicy(String),
}

const WATER_JITTER: f64 = 0.02;
const LIGHT_JITTER: f64 = 0.05;

/// Owns the live fleet state and advances it one tick at a time.
pub struct Simulator {
    readings: Vec<CameraReading>,
    // Readings seeded with an ordinal code above 1 keep it. A seeded 1.0
    // is read as full brightness and jitters like any continuous value.
    coded: Vec<bool>,
    rng: StdRng,
}

impl Simulator {
    pub fn new(readings: Vec<CameraReading>, rng: StdRng) -> Self {
        let coded = readings
            .iter()
            .map(|r| r.light.code().is_some() && r.light.raw() > 1.0)
            .collect();
        Self { readings, coded, rng }
    }

    pub fn from_entropy(readings: Vec<CameraReading>) -> Self {
        Self::new(readings, StdRng::from_entropy())
    }

    pub fn readings(&self) -> &[CameraReading] {
        &self.readings
    }

    /// Jitter every reading and re-derive its status.
    pub fn step(&mut self) {
        for (reading, &coded) in self.readings.iter_mut().zip(&self.coded) {
            let water = reading.water + self.rng.gen_range(-WATER_JITTER..=WATER_JITTER);
            reading.water = water.clamp(0.0, 1.0);

            if coded {
                continue;
            }

            let light = reading.light.raw() + self.rng.gen_range(-LIGHT_JITTER..=LIGHT_JITTER);
            reading.light = light.clamp(0.0, 1.0).into();
            reading.status = derive_status(reading.light.raw(), reading.water);
        }
    }

    pub fn snapshot(&self, timestamp: i64) -> Snapshot {
        Snapshot::new(timestamp, self.readings.clone())
    }
}

/// Runs the simulator on a fixed tick and sends each snapshot downstream.
pub struct Feed {
    tick: Duration,
    stop: Arc<Mutex<Option<broadcast::Sender<()>>>>,
}

impl Feed {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            stop: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawn the feed task. The first snapshot is sent immediately.
    pub async fn start(&self, simulator: Simulator, tx: mpsc::Sender<Arc<Snapshot>>) {
        let (stop_tx, stop_rx) = broadcast::channel(1);
        {
            let mut guard = self.stop.lock().await;
            *guard = Some(stop_tx);
        }

        tracing::info!(
            "Starting feed with {} segments every {:?}",
            simulator.readings().len(),
            self.tick
        );
        tokio::spawn(run_feed_loop(simulator, self.tick, tx, stop_rx));
    }

    pub async fn stop(&self) {
        let stop = self.stop.lock().await;
        if let Some(tx) = stop.as_ref() {
            let _ = tx.send(());
        }
    }
}

async fn run_feed_loop(
    mut simulator: Simulator,
    tick: Duration,
    tx: mpsc::Sender<Arc<Snapshot>>,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut first = true;

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                tracing::info!("Feed stopped");
                break;
            }
            _ = interval.tick() => {
                if !first {
                    simulator.step();
                }
                first = false;

                let snapshot = Arc::new(simulator.snapshot(Utc::now().timestamp_millis()));
                if tx.send(snapshot).await.is_err() {
                    tracing::error!("History writer is gone, stopping feed");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraStatus;

    fn seeded(readings: Vec<CameraReading>) -> Simulator {
        Simulator::new(readings, StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_step_clamps_and_rederives_status() {
        let mut sim = seeded(vec![
            CameraReading::new(1, 0.995, 0.99, CameraStatus::Ok),
            CameraReading::new(2, 0.005, 0.01, CameraStatus::Ok),
        ]);

        for _ in 0..200 {
            sim.step();
            for r in sim.readings() {
                assert!((0.0..=1.0).contains(&r.water));
                assert!((0.0..=1.0).contains(&r.light.raw()));
                assert_eq!(r.status, derive_status(r.light.raw(), r.water));
            }
        }
    }

    #[test]
    fn test_step_is_bounded() {
        let mut sim = seeded(vec![CameraReading::new(1, 0.5, 0.5, CameraStatus::Ok)]);
        sim.step();
        let r = &sim.readings()[0];
        assert!((r.water - 0.5).abs() <= WATER_JITTER + 1e-12);
        assert!((r.light.raw() - 0.5).abs() <= LIGHT_JITTER + 1e-12);
    }

    #[test]
    fn test_light_codes_are_held() {
        let mut sim = seeded(vec![CameraReading::new(1, 0.3, 4.0, CameraStatus::Warning)]);
        for _ in 0..20 {
            sim.step();
        }
        let r = &sim.readings()[0];
        assert_eq!(r.light.raw(), 4.0);
        assert_eq!(r.status, CameraStatus::Warning);
    }

    #[test]
    fn test_full_brightness_is_not_held() {
        let mut sim = seeded(vec![CameraReading::new(1, 0.5, 1.0, CameraStatus::Ok)]);
        let mut moved = false;
        for _ in 0..20 {
            sim.step();
            let r = &sim.readings()[0];
            assert!((0.0..=1.0).contains(&r.light.raw()));
            assert_eq!(r.status, derive_status(r.light.raw(), r.water));
            moved |= r.light.raw() != 1.0;
        }
        assert!(moved);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let fleet = vec![CameraReading::new(1, 0.5, 0.5, CameraStatus::Ok)];
        let mut a = seeded(fleet.clone());
        let mut b = seeded(fleet);
        a.step();
        b.step();
        assert_eq!(a.readings(), b.readings());
    }

    #[tokio::test]
    async fn test_feed_sends_until_stopped() {
        let sim = seeded(vec![CameraReading::new(1, 0.5, 0.5, CameraStatus::Ok)]);
        let (tx, mut rx) = mpsc::channel(16);
        let feed = Feed::new(Duration::from_millis(10));

        feed.start(sim, tx).await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.readings[0].water, 0.5);

        let second = rx.recv().await.unwrap();
        assert_eq!(second.readings.len(), 1);
        assert!(second.timestamp >= first.timestamp);

        feed.stop().await;
        // The loop exits and drops its sender.
        while rx.recv().await.is_some() {}
    }
}

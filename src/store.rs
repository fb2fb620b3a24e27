//! Track history source

use crate::models::TrackPoint;
use anyhow::{Context, Result};
use chrono::Duration;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supplies the recent observation history of a storm
pub trait TrackStore: Send + Sync {
    /// Observations of `storm_id` within the lookback window, oldest first
    fn history(
        &self,
        storm_id: &str,
        lookback_hours: u32,
    ) -> impl Future<Output = Result<Vec<TrackPoint>>> + Send;
}

/// Reads `<dir>/<storm_id>.json`, each file a JSON array of track points
#[derive(Debug, Clone)]
pub struct JsonTrackStore {
    dir: PathBuf,
}

impl JsonTrackStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn track_path(&self, storm_id: &str) -> Result<PathBuf> {
        if storm_id.is_empty()
            || !storm_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            anyhow::bail!("Invalid storm id '{storm_id}'");
        }
        Ok(self.dir.join(format!("{storm_id}.json")))
    }
}

/// Keep points within `lookback_hours` of the newest one, sorted ascending
fn within_lookback(mut points: Vec<TrackPoint>, lookback_hours: u32) -> Vec<TrackPoint> {
    points.sort_by_key(|p| p.timestamp);
    let Some(newest) = points.last().map(|p| p.timestamp) else {
        return points;
    };
    let cutoff = newest - Duration::hours(i64::from(lookback_hours));
    points.retain(|p| p.timestamp >= cutoff);
    points
}

impl TrackStore for JsonTrackStore {
    async fn history(&self, storm_id: &str, lookback_hours: u32) -> Result<Vec<TrackPoint>> {
        let path = self.track_path(storm_id)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read track file {}", path.display()))?;
        let points: Vec<TrackPoint> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse track file {}", path.display()))?;

        let total = points.len();
        let points = within_lookback(points, lookback_hours);
        debug!(
            "Loaded {} of {} observations for {} ({}h lookback)",
            points.len(),
            total,
            storm_id,
            lookback_hours
        );
        Ok(points)
    }
}

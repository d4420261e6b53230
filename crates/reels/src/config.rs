use std::env;
use std::time::Duration;

use openings::DEFAULT_MAX_GROUP_SIZE;
use playback::PlaybackConfig;

#[derive(Clone, Debug)]
pub struct ReelsConfig {
    /// JSON export, a single lichess TSV file, or a directory of TSV files
    pub openings_path: String,
    pub max_group_size: usize,
    /// Longest time a slide stays active before the feed scrolls on
    pub slide_dwell: Duration,
    pub playback: PlaybackConfig,
}

impl ReelsConfig {
    pub fn from_env() -> Self {
        Self {
            openings_path: env::var("OPENINGS_PATH")
                .unwrap_or_else(|_| "data/openings.json".to_string()),
            max_group_size: env::var("MAX_GROUP_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_GROUP_SIZE),
            slide_dwell: env::var("SLIDE_DWELL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_secs(30)),
            playback: PlaybackConfig::from_env(),
        }
    }
}

//! Playback configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Delay between two moves of a run.
pub const DEFAULT_MOVE_DELAY_MS: u64 = 500;

/// What happens to a run in flight when its slide stops being the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeactivationPolicy {
    /// The run plays to the end regardless of the signal.
    #[default]
    FinishRun,
    /// The run stops before its next move and the board resets.
    CancelRun,
}

impl FromStr for DeactivationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "finish" | "finish_run" => Ok(Self::FinishRun),
            "cancel" | "cancel_run" => Ok(Self::CancelRun),
            other => Err(format!("unknown deactivation policy: {other}")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PlaybackConfig {
    /// Pause after each applied move
    pub move_delay: Duration,

    pub deactivation: DeactivationPolicy,

    /// Publish the initial position once a run completes instead of leaving
    /// the final frame of the opening on the board
    pub publish_reset: bool,

    /// Buffer size of each controller's event channel
    pub event_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            move_delay: Duration::from_millis(DEFAULT_MOVE_DELAY_MS),
            deactivation: DeactivationPolicy::default(),
            publish_reset: false,
            event_capacity: 64,
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let move_delay = env::var("MOVE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.move_delay);

        let deactivation = match env::var("DEACTIVATION_POLICY") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!("{e}, using {:?}", defaults.deactivation);
                defaults.deactivation
            }),
            Err(_) => defaults.deactivation,
        };

        let publish_reset = env::var("PUBLISH_RESET")
            .ok()
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.publish_reset);

        let event_capacity = env::var("EVENT_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.event_capacity);

        Self {
            move_delay,
            deactivation,
            publish_reset,
            event_capacity,
        }
    }
}

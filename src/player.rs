//! Playback transport state for one audio summary.
//!
//! The controller owns no audio device; it models the transport as the media
//! layer reports it. Inputs are user commands (play, pause, seek, skip) plus
//! exactly two external notifications: metadata-loaded and playback-ended.
//! While playing, the position is anchored to a monotonic clock.

use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Seconds moved by one skip-forward or skip-back press.
pub const SKIP_SECONDS: f64 = 10.0;

/// Transport phases; one media source per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
}

/// Externally meaningful transitions the controller reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Playback reached the natural end of the media. Reported at most once
    /// per bound source.
    Completed,
}

/// Flat view of the transport for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackSnapshot {
    pub phase: PlaybackPhase,
    pub position: f64,
    pub duration: Option<f64>,
    pub position_label: String,
    pub duration_label: String,
}

pub struct PlaybackController {
    phase: PlaybackPhase,
    source: Option<String>,
    duration: Option<f64>,
    /// Anchored position in seconds; while playing, the live position is
    /// this plus the time since `started_at`.
    position: f64,
    started_at: Option<Instant>,
    completed: bool,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        PlaybackController {
            phase: PlaybackPhase::Idle,
            source: None,
            duration: None,
            position: 0.0,
            started_at: None,
            completed: false,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, PlaybackPhase::Playing)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, PlaybackPhase::Ended)
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Current position in seconds, clamped to the media bounds. Unknown
    /// media reads as zero.
    pub fn position(&self) -> f64 {
        let Some(duration) = self.duration else {
            return 0.0;
        };
        let advanced = match (self.phase, self.started_at) {
            (PlaybackPhase::Playing, Some(started)) => {
                self.position + Instant::now().saturating_duration_since(started).as_secs_f64()
            }
            _ => self.position,
        };
        advanced.min(duration)
    }

    /// Bind a media source and wait for metadata.
    pub fn load(&mut self, source: impl Into<String>) {
        let source = source.into();
        debug!(%source, "Binding media source");
        self.source = Some(source);
        self.duration = None;
        self.position = 0.0;
        self.started_at = None;
        self.completed = false;
        self.phase = PlaybackPhase::Loading;
    }

    /// Media notification: metadata arrived and the duration is known.
    pub fn metadata_loaded(&mut self, duration: f64) {
        if self.phase != PlaybackPhase::Loading {
            return;
        }
        if !duration.is_finite() || duration < 0.0 {
            warn!(duration, "Ignoring unusable media duration");
            return;
        }
        self.duration = Some(duration);
        self.phase = PlaybackPhase::Ready;
        debug!(duration, "Media ready");
    }

    /// Ready/Paused to Playing; a no-op everywhere else, including Ended
    /// (scrub back first).
    pub fn play(&mut self) {
        match self.phase {
            PlaybackPhase::Ready | PlaybackPhase::Paused => {
                self.started_at = Some(Instant::now());
                self.phase = PlaybackPhase::Playing;
                debug!(position = self.position, "Playing");
            }
            _ => {}
        }
    }

    /// Playing to Paused, folding the clock into the anchored position.
    pub fn pause(&mut self) {
        if self.phase != PlaybackPhase::Playing {
            return;
        }
        if let Some(started) = self.started_at.take() {
            self.position += Instant::now().saturating_duration_since(started).as_secs_f64();
        }
        if let Some(duration) = self.duration {
            self.position = self.position.min(duration);
        }
        self.phase = PlaybackPhase::Paused;
        debug!(position = self.position, "Paused");
    }

    /// Jump to `target` seconds, clamped to the media bounds. Ignored until
    /// metadata is known; from Ended it lands in Paused.
    pub fn seek(&mut self, target: f64) {
        let Some(duration) = self.duration else {
            return;
        };
        let clamped = if target.is_finite() {
            target.clamp(0.0, duration)
        } else {
            0.0
        };
        self.position = clamped;
        match self.phase {
            PlaybackPhase::Playing => self.started_at = Some(Instant::now()),
            PlaybackPhase::Ended => self.phase = PlaybackPhase::Paused,
            _ => {}
        }
        debug!(position = clamped, "Seeked");
    }

    /// Relative seek; the player view passes plus or minus [`SKIP_SECONDS`].
    pub fn skip(&mut self, delta: f64) {
        if self.duration.is_none() {
            return;
        }
        self.seek(self.position() + delta);
    }

    /// Media notification: playback reached the natural end.
    pub fn ended(&mut self) -> Option<PlaybackEvent> {
        match self.phase {
            PlaybackPhase::Ready | PlaybackPhase::Playing | PlaybackPhase::Paused => self.finish(),
            _ => None,
        }
    }

    /// Observe the clock; a play-through past the end becomes the same
    /// transition as an ended notification.
    pub fn poll(&mut self) -> Option<PlaybackEvent> {
        let Some(duration) = self.duration else {
            return None;
        };
        if self.phase == PlaybackPhase::Playing && self.position() >= duration {
            return self.finish();
        }
        None
    }

    fn finish(&mut self) -> Option<PlaybackEvent> {
        if let Some(duration) = self.duration {
            self.position = duration;
        }
        self.started_at = None;
        self.phase = PlaybackPhase::Ended;
        if self.completed {
            return None;
        }
        self.completed = true;
        info!("Playback finished");
        Some(PlaybackEvent::Completed)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let position = self.position();
        PlaybackSnapshot {
            phase: self.phase,
            position,
            duration: self.duration,
            position_label: format_time(position),
            duration_label: format_time(self.duration.unwrap_or(f64::NAN)),
        }
    }
}

/// Clock label for a second count: minutes, colon, zero-padded seconds.
/// Non-finite or negative input reads as the zero placeholder.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn build_ready_controller(duration: f64) -> PlaybackController {
        let mut controller = PlaybackController::new();
        controller.load("https://example.com/audio.mp3");
        controller.metadata_loaded(duration);
        controller
    }

    fn backdate_clock(controller: &mut PlaybackController, seconds: u64) {
        controller.started_at = Instant::now().checked_sub(Duration::from_secs(seconds));
    }

    #[test]
    fn seek_clamps_to_media_bounds() {
        let mut controller = build_ready_controller(120.0);
        controller.seek(-5.0);
        assert_eq!(controller.position(), 0.0);
        controller.seek(500.0);
        assert_eq!(controller.position(), 120.0);
        controller.seek(64.5);
        assert_eq!(controller.position(), 64.5);
    }

    #[test]
    fn formats_positions_as_minutes_and_seconds() {
        assert_eq!(format_time(125.0), "2:05");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn commands_are_ignored_until_metadata_arrives() {
        let mut controller = PlaybackController::new();
        controller.load("https://example.com/audio.mp3");
        controller.play();
        assert_eq!(controller.phase(), PlaybackPhase::Loading);
        controller.seek(30.0);
        controller.skip(SKIP_SECONDS);
        assert_eq!(controller.position(), 0.0);
        assert!(controller.duration().is_none());
    }

    #[test]
    fn unusable_duration_keeps_the_transport_loading() {
        let mut controller = PlaybackController::new();
        controller.load("https://example.com/audio.mp3");
        controller.metadata_loaded(f64::NAN);
        assert_eq!(controller.phase(), PlaybackPhase::Loading);
        controller.metadata_loaded(-1.0);
        assert_eq!(controller.phase(), PlaybackPhase::Loading);
    }

    #[test]
    fn metadata_is_ignored_without_a_source() {
        let mut controller = PlaybackController::new();
        controller.metadata_loaded(120.0);
        assert_eq!(controller.phase(), PlaybackPhase::Idle);
        assert!(controller.duration().is_none());
    }

    #[test]
    fn pause_folds_elapsed_time_into_the_position() {
        let mut controller = build_ready_controller(120.0);
        controller.play();
        backdate_clock(&mut controller, 5);
        controller.pause();
        assert_eq!(controller.phase(), PlaybackPhase::Paused);
        let position = controller.position();
        assert!(position >= 5.0 && position < 6.0, "position was {position}");
    }

    #[test]
    fn seek_while_playing_reanchors_the_clock() {
        let mut controller = build_ready_controller(120.0);
        controller.play();
        backdate_clock(&mut controller, 5);
        controller.seek(50.0);
        assert!(controller.is_playing());
        let position = controller.position();
        assert!(position >= 50.0 && position < 51.0, "position was {position}");
    }

    #[test]
    fn playing_past_the_end_reports_completion_once() {
        let mut controller = build_ready_controller(10.0);
        controller.play();
        backdate_clock(&mut controller, 60);
        assert_eq!(controller.poll(), Some(PlaybackEvent::Completed));
        assert_eq!(controller.phase(), PlaybackPhase::Ended);
        assert_eq!(controller.position(), 10.0);
        assert_eq!(controller.poll(), None);
        assert_eq!(controller.ended(), None);
    }

    #[test]
    fn repeated_ended_notifications_report_one_completion() {
        let mut controller = build_ready_controller(120.0);
        controller.play();
        assert_eq!(controller.ended(), Some(PlaybackEvent::Completed));
        assert_eq!(controller.ended(), None);
        assert_eq!(controller.position(), 120.0);
    }

    #[test]
    fn ended_transport_stays_seekable() {
        let mut controller = build_ready_controller(120.0);
        controller.play();
        controller.ended();
        controller.seek(30.0);
        assert_eq!(controller.phase(), PlaybackPhase::Paused);
        assert_eq!(controller.position(), 30.0);
        controller.play();
        assert!(controller.is_playing());
    }

    #[test]
    fn play_from_ended_without_a_seek_is_ignored() {
        let mut controller = build_ready_controller(120.0);
        controller.play();
        controller.ended();
        controller.play();
        assert_eq!(controller.phase(), PlaybackPhase::Ended);
    }

    #[test]
    fn skip_moves_relative_to_the_position_and_clamps() {
        let mut controller = build_ready_controller(120.0);
        controller.seek(100.0);
        controller.skip(30.0);
        assert_eq!(controller.position(), 120.0);
        controller.skip(-500.0);
        assert_eq!(controller.position(), 0.0);
        controller.seek(60.0);
        controller.skip(-SKIP_SECONDS);
        assert_eq!(controller.position(), 50.0);
    }

    #[test]
    fn loading_duration_reads_as_the_placeholder() {
        let mut controller = PlaybackController::new();
        controller.load("https://example.com/audio.mp3");
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.duration_label, "0:00");
        assert!(snapshot.duration.is_none());
        assert_eq!(snapshot.phase, PlaybackPhase::Loading);
    }

    #[test]
    fn snapshot_labels_track_the_transport() {
        let mut controller = build_ready_controller(125.0);
        controller.seek(65.0);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.position_label, "1:05");
        assert_eq!(snapshot.duration_label, "2:05");
    }
}

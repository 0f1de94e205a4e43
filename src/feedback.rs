//! Audio and analytics collaborators.
//!
//! Both are fire-and-forget: the dispatcher logs failures and carries on, so
//! a broken speaker or tracker never interrupts play.

use thiserror::Error;

use crate::game::events::{AnalyticsEvent, Cue, GameEvent};

pub const ANALYTICS_TARGET: &str = "heartmatch::analytics";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("sound sample {0} is unavailable")]
    MissingSample(String),
    #[error("audio backend failed: {0}")]
    Audio(String),
    #[error("failed to encode analytics event: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait AudioSink {
    fn play(&mut self, cue: Cue) -> Result<(), FeedbackError>;

    fn set_enabled(&mut self, enabled: bool);

    fn is_enabled(&self) -> bool;
}

pub trait AnalyticsSink {
    fn track(&mut self, event: &AnalyticsEvent) -> Result<(), FeedbackError>;
}

/// Silent audio, used headless and when sound support is compiled out.
#[derive(Debug, Default)]
pub struct NullAudio {
    enabled: bool,
}

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: Cue) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Writes each event as one JSON line on the analytics tracing target.
#[derive(Debug, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn track(&mut self, event: &AnalyticsEvent) -> Result<(), FeedbackError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(target: ANALYTICS_TARGET, event = event.name(), "{payload}");
        Ok(())
    }
}

/// Fans game events out to the sound and analytics sinks.
pub struct Feedback {
    audio: Box<dyn AudioSink>,
    analytics: Box<dyn AnalyticsSink>,
}

impl Feedback {
    pub fn new(audio: Box<dyn AudioSink>, analytics: Box<dyn AnalyticsSink>) -> Self {
        Self { audio, analytics }
    }

    pub fn headless() -> Self {
        Self::new(Box::new(NullAudio::default()), Box::new(TracingAnalytics))
    }

    pub fn sound_enabled(&self) -> bool {
        self.audio.is_enabled()
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        tracing::debug!("sound {}", if enabled { "on" } else { "off" });
        self.audio.set_enabled(enabled);
    }

    pub fn play(&mut self, cue: Cue) {
        if let Err(err) = self.audio.play(cue) {
            tracing::debug!("cue {:?} not played: {err}", cue);
        }
    }

    pub fn track(&mut self, event: &AnalyticsEvent) {
        if let Err(err) = self.analytics.track(event) {
            tracing::debug!("analytics {} dropped: {err}", event.name());
        }
    }

    /// Handles the events this dispatcher cares about and ignores the rest.
    pub fn dispatch(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Cue(cue) => self.play(*cue),
            GameEvent::Analytics(analytics) => self.track(analytics),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        cues: Rc<RefCell<Vec<Cue>>>,
        fail: bool,
    }

    impl AudioSink for Recorder {
        fn play(&mut self, cue: Cue) -> Result<(), FeedbackError> {
            if self.fail {
                return Err(FeedbackError::Audio("device gone".into()));
            }
            self.cues.borrow_mut().push(cue);
            Ok(())
        }

        fn set_enabled(&mut self, _enabled: bool) {}

        fn is_enabled(&self) -> bool {
            true
        }
    }

    struct FailingAnalytics;

    impl AnalyticsSink for FailingAnalytics {
        fn track(&mut self, _event: &AnalyticsEvent) -> Result<(), FeedbackError> {
            Err(FeedbackError::MissingSample("x".into()))
        }
    }

    #[test]
    fn cues_reach_the_audio_sink() {
        let cues = Rc::new(RefCell::new(Vec::new()));
        let recorder = Recorder {
            cues: cues.clone(),
            fail: false,
        };
        let mut feedback = Feedback::new(Box::new(recorder), Box::new(TracingAnalytics));
        feedback.dispatch(&GameEvent::Cue(Cue::Match));
        feedback.dispatch(&GameEvent::ScoreChanged(10));
        assert_eq!(*cues.borrow(), vec![Cue::Match]);
    }

    #[test]
    fn sink_failures_are_swallowed() {
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let mut feedback = Feedback::new(Box::new(recorder), Box::new(FailingAnalytics));
        feedback.dispatch(&GameEvent::Cue(Cue::Flip));
        feedback.dispatch(&GameEvent::Analytics(AnalyticsEvent::GameComplete));
    }

    #[test]
    fn analytics_payload_is_tagged_json() {
        let event = AnalyticsEvent::LevelWin {
            level: 2,
            mode: crate::game::levels::Mode::Story,
            score: None,
            time_remaining: 7,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["event"], "level_win");
        assert_eq!(json["mode"], "story");
        assert_eq!(json["time_remaining"], 7);
        assert!(json.get("score").is_none());
    }
}

//! Temporal de-duplication of classifier output.
//!
//! After a gesture is emitted, all classifier output is ignored for a fixed cooldown period. Once
//! the cooldown has elapsed, the remembered gesture is forgotten, so holding the same sign emits it
//! again. A frame that matches no sign forgets the remembered gesture immediately.
//!
//! The state machine never reads the clock itself; callers pass the current [`Instant`].

use std::time::{Duration, Instant};

use crate::gesture::Gesture;

/// Result of feeding one classification into [`Cooldown::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new gesture was accepted. The cooldown has been (re)started.
    Emitted(Gesture),
    /// Still cooling down from the last emission; the classification was dropped.
    Suppressed { remaining: Duration },
    /// The classifier repeated the remembered gesture.
    Sustained(Gesture),
    /// The classifier matched nothing; the remembered gesture was forgotten.
    Cleared,
}

/// State of the cooldown countdown, as reported by [`Cooldown::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// No cooldown is running.
    Idle,
    Remaining(Duration),
    /// The cooldown ran out since the previous call.
    Expired,
}

#[derive(Debug, Clone)]
pub struct Cooldown {
    duration: Duration,
    repeat_after_expiry: bool,
    current: Option<Gesture>,
    emitted_at: Option<Instant>,
}

impl Cooldown {
    pub const DEFAULT_DURATION: Duration = Duration::from_millis(2000);

    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            repeat_after_expiry: true,
            current: None,
            emitted_at: None,
        }
    }

    /// Sets whether the remembered gesture is forgotten when the cooldown expires.
    ///
    /// If `true` (the default), a gesture that is held through the whole cooldown is emitted
    /// again afterwards. If `false`, only a different gesture (or a frame matching nothing) ends
    /// the repetition.
    pub fn set_repeat_after_expiry(&mut self, repeat: bool) {
        self.repeat_after_expiry = repeat;
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// The most recently emitted gesture that has not been forgotten yet.
    pub fn current(&self) -> Option<Gesture> {
        self.current
    }

    /// Returns whether a cooldown has been started and not yet expired.
    ///
    /// Unlike [`Cooldown::remaining`], this stays `true` after the cooldown has run out until
    /// [`Cooldown::observe`] or [`Cooldown::tick`] notices the expiry.
    pub fn is_running(&self) -> bool {
        self.emitted_at.is_some()
    }

    /// Returns the time left in the running cooldown, or `None` if none is running.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let emitted_at = self.emitted_at?;
        let elapsed = now.saturating_duration_since(emitted_at);
        if elapsed < self.duration {
            Some(self.duration - elapsed)
        } else {
            None
        }
    }

    /// Feeds one classifier result into the state machine.
    pub fn observe(&mut self, label: Option<Gesture>, now: Instant) -> Transition {
        self.expire(now);
        if let Some(remaining) = self.remaining(now) {
            return Transition::Suppressed { remaining };
        }

        match label {
            Some(gesture) if self.current == Some(gesture) => Transition::Sustained(gesture),
            Some(gesture) => {
                self.current = Some(gesture);
                self.emitted_at = Some(now);
                Transition::Emitted(gesture)
            }
            None => {
                self.current = None;
                Transition::Cleared
            }
        }
    }

    /// Advances the countdown without a new classification.
    pub fn tick(&mut self, now: Instant) -> Countdown {
        if !self.is_running() {
            return Countdown::Idle;
        }
        match self.remaining(now) {
            Some(remaining) => Countdown::Remaining(remaining),
            None => {
                self.expire(now);
                Countdown::Expired
            }
        }
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.emitted_at = None;
    }

    fn expire(&mut self, now: Instant) {
        if self.emitted_at.is_some() && self.remaining(now).is_none() {
            self.emitted_at = None;
            if self.repeat_after_expiry {
                self.current = None;
            }
        }
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DURATION)
    }
}

//! A running gesture recognition session.
//!
//! A [`Session`] connects a [`LandmarkSource`] (the hand and pose perception models) to a
//! [`PresentationSink`]. All classification happens on a single consumer thread, which waits on
//! the two landmark streams, the cooldown ticker, alert outcomes and the shutdown signal, and
//! handles one event at a time.
//!
//! ```text
//! LandmarkSource ─┬─ hands ─┐
//!                 └─ pose ──┴─> FusionBuffer -> classify -> Cooldown ─┬─> PresentationSink
//!                                                                     └─> AlertDispatcher
//! ```

use std::{
    env, fmt,
    panic::resume_unwind,
    thread::{self, JoinHandle},
    time::{Duration, Instant, SystemTime},
};

use anyhow::Context;
use crossbeam::{
    channel::{self, Receiver, Sender},
    select,
};

use crate::{
    alert::{AlertDispatcher, AlertOutcome, AlertSink, Locator},
    body::landmark::PoseLandmarks,
    cooldown::{Cooldown, Countdown, Transition},
    fusion::{FusionBuffer, StreamEvent},
    gesture::{classify, Gesture, RuleSet},
    hand::landmark::HandLandmarks,
    history::GestureHistory,
    overlay::Overlay,
    timer::{FpsCounter, Timer},
};

/// Capacity of each landmark stream channel. A source that runs ahead of the consumer blocks.
const STREAM_CAPACITY: usize = 4;

const CAMERA_ERROR: &str = "Error: Could not access camera";
const WAITING: &str = "Waiting for gesture...";
const ALERT_SENT: &str = " - Alert sent to volunteers";
const ALERT_FAILED: &str = " - Error sending alert";

/// Error returned when sending landmarks to a session that has been stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

impl fmt::Display for Disconnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("session has been stopped")
    }
}

impl std::error::Error for Disconnected {}

/// Sending half of the hand landmark stream.
#[derive(Debug, Clone)]
pub struct HandsSender(Sender<Vec<HandLandmarks>>);

impl HandsSender {
    /// Delivers all hands found in one camera frame (at most two, possibly none).
    pub fn send(&self, hands: Vec<HandLandmarks>) -> Result<(), Disconnected> {
        self.0.send(hands).map_err(|_| Disconnected)
    }
}

/// Sending half of the pose landmark stream.
#[derive(Debug, Clone)]
pub struct PoseSender(Sender<Option<PoseLandmarks>>);

impl PoseSender {
    /// Delivers the pose found in one camera frame, or `None` if no person was found.
    pub fn send(&self, pose: Option<PoseLandmarks>) -> Result<(), Disconnected> {
        self.0.send(pose).map_err(|_| Disconnected)
    }
}

/// The two stream subscriptions handed to a [`LandmarkSource`].
#[derive(Debug, Clone)]
pub struct Subscriptions {
    pub hands: HandsSender,
    pub pose: PoseSender,
}

/// Producer of hand and pose landmarks, typically a camera feeding two perception networks.
pub trait LandmarkSource: Send + 'static {
    /// Starts producing landmarks into `subscriptions`.
    ///
    /// An error here is fatal to the session.
    fn start(&mut self, subscriptions: Subscriptions) -> anyhow::Result<()>;

    /// Stops producing landmarks and drops the subscriptions. Must be idempotent.
    fn stop(&mut self);
}

/// Receives everything the session wants to display.
pub trait PresentationSink: Send + 'static {
    /// Replaces the current status line.
    fn show_status(&mut self, status: &str);

    /// Replaces the list of gestures recognized so far.
    fn show_history(&mut self, history: &GestureHistory);

    /// Draws the skeleton overlay of the latest fused frame.
    fn draw_overlay(&mut self, overlay: &Overlay) {
        let _ = overlay;
    }
}

/// Configuration of a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    cooldown: Duration,
    tick_interval: Duration,
    rules: RuleSet,
    user_id: String,
    repeat_after_expiry: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cooldown: Cooldown::DEFAULT_DURATION,
            tick_interval: Duration::from_millis(100),
            rules: RuleSet::default(),
            user_id: "anonymous".into(),
            repeat_after_expiry: true,
        }
    }
}

impl SessionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the default options, overridden by `SRISHTI_RULES` and `SRISHTI_COOLDOWN_MS`.
    pub fn from_env() -> Self {
        let mut options = Self {
            rules: RuleSet::from_env(),
            ..Self::default()
        };
        if let Ok(value) = env::var("SRISHTI_COOLDOWN_MS") {
            match value.trim().parse::<u64>() {
                Ok(ms) => options.cooldown = Duration::from_millis(ms),
                Err(e) => log::warn!("ignoring invalid SRISHTI_COOLDOWN_MS '{value}': {e}"),
            }
        }
        options
    }

    /// Sets how long classifier output is ignored after a gesture was emitted.
    pub fn cooldown(self, cooldown: Duration) -> Self {
        Self { cooldown, ..self }
    }

    /// Sets how often the remaining cooldown is reported to the [`PresentationSink`].
    pub fn tick_interval(self, tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            ..self
        }
    }

    pub fn rules(self, rules: RuleSet) -> Self {
        Self { rules, ..self }
    }

    /// Sets the user the alerts are raised for.
    pub fn user_id<U: Into<String>>(self, user_id: U) -> Self {
        Self {
            user_id: user_id.into(),
            ..self
        }
    }

    /// See [`Cooldown::set_repeat_after_expiry`].
    pub fn repeat_after_expiry(self, repeat: bool) -> Self {
        Self {
            repeat_after_expiry: repeat,
            ..self
        }
    }
}

/// A running recognition session.
///
/// Dropping the session stops it.
pub struct Session {
    source: Box<dyn LandmarkSource>,
    shutdown: Option<Sender<()>>,
    consumer: Option<JoinHandle<()>>,
}

impl Session {
    /// Starts `source` and the consumer thread.
    ///
    /// If the source fails to start, the failure is shown on `sink` and returned.
    pub fn start<L, P, A, G>(
        mut source: L,
        mut sink: P,
        alert_sink: A,
        locator: G,
        options: SessionOptions,
    ) -> anyhow::Result<Self>
    where
        L: LandmarkSource,
        P: PresentationSink,
        A: AlertSink,
        G: Locator,
    {
        let (hands_tx, hands_rx) = channel::bounded(STREAM_CAPACITY);
        let (pose_tx, pose_rx) = channel::bounded(STREAM_CAPACITY);
        let subscriptions = Subscriptions {
            hands: HandsSender(hands_tx),
            pose: PoseSender(pose_tx),
        };

        if let Err(e) = source.start(subscriptions) {
            log::error!("failed to start landmark source: {e:#}");
            sink.show_status(CAMERA_ERROR);
            return Err(e.context("failed to start landmark source"));
        }

        let dispatcher = AlertDispatcher::spawn(alert_sink, locator, options.user_id.clone())
            .context("failed to spawn alert dispatcher");
        let dispatcher = match dispatcher {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                source.stop();
                return Err(e);
            }
        };

        let (shutdown_tx, shutdown_rx) = channel::bounded(0);
        let consumer = Consumer::new(sink, dispatcher, &options);
        let spawned = thread::Builder::new()
            .name("srishti session".into())
            .spawn(move || consumer.run(hands_rx, pose_rx, shutdown_rx));
        let consumer = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                source.stop();
                return Err(e).context("failed to spawn session thread");
            }
        };

        log::debug!("session started with options {options:?}");
        Ok(Self {
            source: Box::new(source),
            shutdown: Some(shutdown_tx),
            consumer: Some(consumer),
        })
    }

    /// Stops the landmark source, the cooldown ticker and the alert dispatcher.
    ///
    /// Alerts that were queued but not yet sent are discarded. No classification happens after
    /// this returns. Calling `stop` more than once has no effect.
    pub fn stop(&mut self) {
        let Some(consumer) = self.consumer.take() else {
            return;
        };
        self.source.stop();
        drop(self.shutdown.take());
        if let Err(payload) = consumer.join() {
            if !thread::panicking() {
                resume_unwind(payload);
            }
        }
        log::debug!("session stopped");
    }

    pub fn is_running(&self) -> bool {
        self.consumer.is_some()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the consumer thread.
struct Consumer<P> {
    sink: P,
    dispatcher: AlertDispatcher,
    fusion: FusionBuffer,
    cooldown: Cooldown,
    history: GestureHistory,
    rules: RuleSet,
    tick_interval: Duration,
    ticker: Receiver<Instant>,
    status: String,
    classify_timer: Timer,
    fps: FpsCounter,
}

impl<P: PresentationSink> Consumer<P> {
    fn new(sink: P, dispatcher: AlertDispatcher, options: &SessionOptions) -> Self {
        let mut cooldown = Cooldown::new(options.cooldown);
        cooldown.set_repeat_after_expiry(options.repeat_after_expiry);
        Self {
            sink,
            dispatcher,
            fusion: FusionBuffer::new(),
            cooldown,
            history: GestureHistory::new(),
            rules: options.rules.clone(),
            tick_interval: options.tick_interval,
            ticker: channel::never(),
            status: String::new(),
            classify_timer: Timer::new("classify"),
            fps: FpsCounter::new("fused frames"),
        }
    }

    fn run(
        mut self,
        mut hands: Receiver<Vec<HandLandmarks>>,
        mut pose: Receiver<Option<PoseLandmarks>>,
        shutdown: Receiver<()>,
    ) {
        self.set_status(WAITING);
        loop {
            // Receivers are cloned so that the handlers below can replace them.
            let (hands_rx, pose_rx) = (hands.clone(), pose.clone());
            let ticker = self.ticker.clone();
            let outcomes = self.dispatcher.outcomes().clone();
            select! {
                recv(hands_rx) -> msg => match msg {
                    Ok(msg) => self.on_stream(StreamEvent::Hands(msg)),
                    Err(_) => {
                        log::debug!("hand stream closed");
                        hands = channel::never();
                    }
                },
                recv(pose_rx) -> msg => match msg {
                    Ok(msg) => self.on_stream(StreamEvent::Pose(msg)),
                    Err(_) => {
                        log::debug!("pose stream closed");
                        pose = channel::never();
                    }
                },
                recv(ticker) -> msg => {
                    if let Ok(now) = msg {
                        self.on_tick(now);
                    }
                },
                recv(outcomes) -> msg => {
                    if let Ok(outcome) = msg {
                        self.on_alert(outcome);
                    }
                },
                recv(shutdown) -> _ => break,
            }
        }
    }

    fn on_stream(&mut self, event: StreamEvent) {
        let Some(frame) = self.fusion.push(event) else {
            return;
        };

        self.sink.draw_overlay(&Overlay::from_frame(&frame));

        let rules = &self.rules;
        let label = self
            .classify_timer
            .time(|| classify(frame.hands, frame.pose, rules));
        self.fps.tick_with([&self.classify_timer]);
        log::trace!("classified {} hand(s) as {label:?}", frame.hands.len());

        let was_running = self.cooldown.is_running();
        let transition = self.cooldown.observe(label, Instant::now());
        if was_running && !self.cooldown.is_running() {
            // The cooldown ran out between two ticks.
            self.ticker = channel::never();
            self.show_waiting();
        }

        match transition {
            Transition::Emitted(gesture) => self.on_emit(gesture),
            Transition::Cleared => {
                log::trace!("no gesture matched");
                self.show_waiting();
            }
            Transition::Suppressed { .. } | Transition::Sustained(_) => {}
        }
    }

    fn on_emit(&mut self, gesture: Gesture) {
        log::debug!("detected gesture '{gesture}'");
        self.set_status(&format!("Detected: {gesture}"));
        self.history.record(gesture);
        self.sink.show_history(&self.history);
        self.dispatcher.dispatch(gesture, SystemTime::now());

        // Restart the countdown display for the new cooldown.
        self.ticker = channel::tick(self.tick_interval);
    }

    fn on_tick(&mut self, now: Instant) {
        match self.cooldown.tick(now) {
            Countdown::Remaining(remaining) => {
                self.set_status(&format!("Cooldown: {:.1}s", remaining.as_secs_f32()));
            }
            Countdown::Expired => {
                self.ticker = channel::never();
                self.show_waiting();
            }
            Countdown::Idle => self.ticker = channel::never(),
        }
    }

    /// Appends the alert result to the status, if the alert's gesture is still the one shown.
    fn on_alert(&mut self, outcome: AlertOutcome) {
        let (gesture, suffix) = match outcome {
            AlertOutcome::Sent { gesture, .. } => (gesture, ALERT_SENT),
            AlertOutcome::Failed { gesture, .. } => (gesture, ALERT_FAILED),
        };
        let detected = format!("Detected: {gesture}");
        if self.status == detected {
            self.set_status(&format!("{detected}{suffix}"));
        } else {
            log::debug!("alert for '{gesture}' finished after the status moved on");
        }
    }

    /// Shows the idle status, unless it is already shown.
    fn show_waiting(&mut self) {
        if self.status != WAITING {
            self.set_status(WAITING);
        }
    }

    fn set_status(&mut self, status: &str) {
        self.status.clear();
        self.status.push_str(status);
        self.sink.show_status(status);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;

    use super::*;
    use crate::alert::{MemoryAlertStore, NoLocation};

    struct BrokenCamera;

    impl LandmarkSource for BrokenCamera {
        fn start(&mut self, _: Subscriptions) -> anyhow::Result<()> {
            Err(anyhow!("permission denied"))
        }

        fn stop(&mut self) {}
    }

    #[derive(Default)]
    struct Handoff(Arc<Mutex<Option<Subscriptions>>>);

    impl LandmarkSource for Handoff {
        fn start(&mut self, subscriptions: Subscriptions) -> anyhow::Result<()> {
            *self.0.lock().unwrap() = Some(subscriptions);
            Ok(())
        }

        fn stop(&mut self) {
            self.0.lock().unwrap().take();
        }
    }

    #[derive(Clone, Default)]
    struct StatusLog(Arc<Mutex<Vec<String>>>);

    impl PresentationSink for StatusLog {
        fn show_status(&mut self, status: &str) {
            self.0.lock().unwrap().push(status.to_string());
        }

        fn show_history(&mut self, _: &GestureHistory) {}
    }

    #[test]
    fn camera_failure_is_shown() {
        let log = StatusLog::default();
        let result = Session::start(
            BrokenCamera,
            log.clone(),
            MemoryAlertStore::new(),
            NoLocation,
            SessionOptions::new(),
        );
        let err = result.err().unwrap();
        assert!(format!("{err:#}").contains("permission denied"));
        assert_eq!(*log.0.lock().unwrap(), [CAMERA_ERROR]);
    }

    #[test]
    fn senders_disconnect_after_stop() {
        let handoff = Handoff::default();
        let slot = handoff.0.clone();
        let mut session = Session::start(
            handoff,
            StatusLog::default(),
            MemoryAlertStore::new(),
            NoLocation,
            SessionOptions::new(),
        )
        .unwrap();

        let subs = slot.lock().unwrap().clone().unwrap();
        subs.pose.send(None).unwrap();
        assert!(session.is_running());

        session.stop();
        assert!(!session.is_running());
        assert_eq!(subs.hands.send(Vec::new()), Err(Disconnected));
        assert_eq!(subs.pose.send(None), Err(Disconnected));
        session.stop();
    }

    #[test]
    fn options_builder() {
        let options = SessionOptions::new()
            .cooldown(Duration::from_millis(50))
            .tick_interval(Duration::from_millis(10))
            .rules(RuleSet::standalone())
            .user_id("u1")
            .repeat_after_expiry(false);
        assert_eq!(options.cooldown, Duration::from_millis(50));
        assert_eq!(options.tick_interval, Duration::from_millis(10));
        assert_eq!(options.rules, RuleSet::standalone());
        assert_eq!(options.user_id, "u1");
        assert!(!options.repeat_after_expiry);
    }
}

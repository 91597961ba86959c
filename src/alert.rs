//! Alerts raised for emergency signs.
//!
//! When an emergency gesture is emitted, an [`AlertRecord`] is written to an external
//! [`AlertSink`] so that volunteers can pick it up. The write happens on a background worker and
//! never blocks classification. Each alert is attempted exactly once; failures are reported through
//! [`AlertDispatcher::outcomes`] and not retried.

use std::{
    collections::BTreeMap,
    fmt, io,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::SystemTime,
};

use anyhow::bail;
use crossbeam::channel::{self, Receiver};

use crate::{gesture::Gesture, worker::Worker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Identifier assigned to an alert by the [`AlertSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertId(pub u64);

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolunteerId(pub String);

/// Lifecycle of an alert: `Pending` → `Assigned` → `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertStatus {
    Pending,
    Assigned,
    Completed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Pending => "pending",
            AlertStatus::Assigned => "assigned",
            AlertStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for a status change that skips or reverses a lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: AlertStatus,
    pub to: AlertStatus,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot move alert from '{}' to '{}'", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub user_id: String,
    pub gesture: Gesture,
    pub status: AlertStatus,
    pub location: Option<Location>,
    pub created_at: SystemTime,
    pub assigned_to: Option<VolunteerId>,
    pub notes: Option<String>,
}

impl AlertRecord {
    /// Creates a new, pending alert.
    pub fn new(
        user_id: impl Into<String>,
        gesture: Gesture,
        location: Option<Location>,
        created_at: SystemTime,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            gesture,
            status: AlertStatus::Pending,
            location,
            created_at,
            assigned_to: None,
            notes: None,
        }
    }

    /// A volunteer accepts the alert.
    pub fn assign(&mut self, volunteer: VolunteerId) -> Result<(), TransitionError> {
        self.transition(AlertStatus::Pending, AlertStatus::Assigned)?;
        self.assigned_to = Some(volunteer);
        Ok(())
    }

    /// The assigned volunteer has handled the alert.
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        self.transition(AlertStatus::Assigned, AlertStatus::Completed)
    }

    /// Returns whether the alert still needs attention (pending or assigned).
    pub fn is_open(&self) -> bool {
        self.status != AlertStatus::Completed
    }

    fn transition(&mut self, from: AlertStatus, to: AlertStatus) -> Result<(), TransitionError> {
        if self.status != from {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Persistent storage accepting alert records.
pub trait AlertSink: Send + 'static {
    /// Writes `record`, returning the identifier the store assigned to it.
    fn store(&self, record: &AlertRecord) -> anyhow::Result<AlertId>;
}

/// Source of the user's current location.
pub trait Locator: Send + 'static {
    fn locate(&self) -> anyhow::Result<Location>;
}

/// A [`Locator`] for platforms without geolocation. Always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl Locator for NoLocation {
    fn locate(&self) -> anyhow::Result<Location> {
        bail!("geolocation is not available")
    }
}

/// A fixed location, for kiosks and tests.
impl Locator for Location {
    fn locate(&self) -> anyhow::Result<Location> {
        Ok(*self)
    }
}

/// In-memory [`AlertSink`] implementing the volunteer workflow.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryAlertStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    next_id: u64,
    records: BTreeMap<AlertId, AlertRecord>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: AlertId) -> Option<AlertRecord> {
        self.lock().records.get(&id).cloned()
    }

    /// Returns all pending and assigned alerts, oldest first.
    pub fn open(&self) -> Vec<(AlertId, AlertRecord)> {
        self.lock()
            .records
            .iter()
            .filter(|(_, rec)| rec.is_open())
            .map(|(id, rec)| (*id, rec.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn assign(&self, id: AlertId, volunteer: VolunteerId) -> anyhow::Result<()> {
        self.update(id, |rec| rec.assign(volunteer))
    }

    pub fn complete(&self, id: AlertId) -> anyhow::Result<()> {
        self.update(id, AlertRecord::complete)
    }

    /// Locks the store, ignoring poisoning. Every update is a single insert or status change.
    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(
        &self,
        id: AlertId,
        f: impl FnOnce(&mut AlertRecord) -> Result<(), TransitionError>,
    ) -> anyhow::Result<()> {
        let mut inner = self.lock();
        match inner.records.get_mut(&id) {
            Some(rec) => Ok(f(rec)?),
            None => bail!("no alert with id {id}"),
        }
    }
}

impl AlertSink for MemoryAlertStore {
    fn store(&self, record: &AlertRecord) -> anyhow::Result<AlertId> {
        let mut inner = self.lock();
        let id = AlertId(inner.next_id);
        inner.next_id += 1;
        inner.records.insert(id, record.clone());
        Ok(id)
    }
}

/// Result of one alert write, reported back to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertOutcome {
    Sent { gesture: Gesture, id: AlertId },
    Failed { gesture: Gesture, error: String },
}

struct Job {
    gesture: Gesture,
    created_at: SystemTime,
}

/// Writes alerts for emergency gestures on a background worker.
pub struct AlertDispatcher {
    // Declared before `worker`: the cancel flag is set in `Drop::drop`, before the worker is
    // joined.
    cancelled: Arc<AtomicBool>,
    worker: Worker<Job>,
    outcomes: Receiver<AlertOutcome>,
}

impl AlertDispatcher {
    pub fn spawn<S, L>(sink: S, locator: L, user_id: impl Into<String>) -> io::Result<Self>
    where
        S: AlertSink,
        L: Locator,
    {
        let user_id = user_id.into();
        let cancelled = Arc::new(AtomicBool::new(false));
        let (outcome_tx, outcomes) = channel::unbounded();

        let flag = cancelled.clone();
        let worker = Worker::builder().name("alert dispatcher").spawn(move |job: Job| {
            if flag.load(Ordering::Acquire) {
                log::debug!("discarding queued alert for '{}'", job.gesture);
                return;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                send_alert(&sink, &locator, &user_id, &job)
            }))
            .unwrap_or_else(|_| {
                log::error!("alert writer panicked while sending '{}'", job.gesture);
                AlertOutcome::Failed {
                    gesture: job.gesture,
                    error: "alert writer panicked".into(),
                }
            });
            outcome_tx.send(outcome).ok();
        })?;

        Ok(Self {
            cancelled,
            worker,
            outcomes,
        })
    }

    /// Queues an alert for `gesture` if it is an emergency sign.
    ///
    /// Returns whether an alert was queued. Never blocks.
    pub fn dispatch(&mut self, gesture: Gesture, created_at: SystemTime) -> bool {
        if !gesture.is_emergency() {
            return false;
        }
        self.worker.send(Job {
            gesture,
            created_at,
        });
        true
    }

    /// Receiver for the outcome of every alert that was attempted.
    pub fn outcomes(&self) -> &Receiver<AlertOutcome> {
        &self.outcomes
    }
}

fn send_alert<S: AlertSink, L: Locator>(
    sink: &S,
    locator: &L,
    user_id: &str,
    job: &Job,
) -> AlertOutcome {
    let location = match locator.locate() {
        Ok(location) => Some(location),
        Err(e) => {
            log::debug!("sending alert without location: {e:#}");
            None
        }
    };
    let record = AlertRecord::new(user_id, job.gesture, location, job.created_at);
    match sink.store(&record) {
        Ok(id) => {
            log::info!("alert {id} sent for '{}'", job.gesture);
            AlertOutcome::Sent {
                gesture: job.gesture,
                id,
            }
        }
        Err(e) => {
            log::warn!("failed to send alert for '{}': {e:#}", job.gesture);
            AlertOutcome::Failed {
                gesture: job.gesture,
                error: format!("{e:#}"),
            }
        }
    }
}

/// Queued alerts that have not started yet are discarded; an in-flight write is waited for.
impl Drop for AlertDispatcher {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct FailingSink;

    impl AlertSink for FailingSink {
        fn store(&self, _: &AlertRecord) -> anyhow::Result<AlertId> {
            Err(anyhow!("permission denied"))
        }
    }

    struct PanickingSink;

    impl AlertSink for PanickingSink {
        fn store(&self, _: &AlertRecord) -> anyhow::Result<AlertId> {
            panic!("sink exploded");
        }
    }

    #[test]
    fn lifecycle_is_linear() {
        let mut rec = AlertRecord::new("anonymous", Gesture::Fever, None, SystemTime::now());
        assert_eq!(rec.status, AlertStatus::Pending);
        assert_eq!(
            rec.complete(),
            Err(TransitionError {
                from: AlertStatus::Pending,
                to: AlertStatus::Completed
            })
        );

        rec.assign(VolunteerId("v1".into())).unwrap();
        assert_eq!(rec.assigned_to, Some(VolunteerId("v1".into())));
        assert!(rec.assign(VolunteerId("v2".into())).is_err());
        rec.complete().unwrap();
        assert!(!rec.is_open());
    }

    #[test]
    fn store_lists_open_alerts() {
        let store = MemoryAlertStore::new();
        let now = SystemTime::now();
        let a = store
            .store(&AlertRecord::new("u", Gesture::Fever, None, now))
            .unwrap();
        let b = store
            .store(&AlertRecord::new("u", Gesture::Headache, None, now))
            .unwrap();
        assert_ne!(a, b);

        store.assign(a, VolunteerId("v".into())).unwrap();
        store.complete(a).unwrap();
        let open = store.open();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].0, b);

        assert!(store.complete(b).is_err());
        assert!(store.assign(AlertId(99), VolunteerId("v".into())).is_err());
    }

    #[test]
    fn only_emergencies_are_dispatched() {
        let store = MemoryAlertStore::new();
        let here = Location {
            latitude: 12.97,
            longitude: 77.59,
        };
        let mut dispatcher = AlertDispatcher::spawn(store.clone(), here, "anonymous").unwrap();

        for g in [Gesture::Yes, Gesture::No, Gesture::Doctor, Gesture::NoGesture] {
            assert!(!dispatcher.dispatch(g, SystemTime::now()));
        }
        assert!(dispatcher.dispatch(Gesture::ChestPain, SystemTime::now()));

        let outcome = dispatcher.outcomes().recv_timeout(TIMEOUT).unwrap();
        let AlertOutcome::Sent { gesture, id } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(gesture, Gesture::ChestPain);
        let rec = store.get(id).unwrap();
        assert_eq!(rec.status, AlertStatus::Pending);
        assert_eq!(rec.location, Some(here));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_location_is_not_an_error() {
        let store = MemoryAlertStore::new();
        let mut dispatcher = AlertDispatcher::spawn(store.clone(), NoLocation, "u").unwrap();
        dispatcher.dispatch(Gesture::Fever, SystemTime::now());
        let outcome = dispatcher.outcomes().recv_timeout(TIMEOUT).unwrap();
        let AlertOutcome::Sent { id, .. } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(store.get(id).unwrap().location, None);
    }

    #[test]
    fn write_failure_is_reported() {
        let mut dispatcher = AlertDispatcher::spawn(FailingSink, NoLocation, "u").unwrap();
        dispatcher.dispatch(Gesture::Headache, SystemTime::now());
        match dispatcher.outcomes().recv_timeout(TIMEOUT).unwrap() {
            AlertOutcome::Failed { gesture, error } => {
                assert_eq!(gesture, Gesture::Headache);
                assert!(error.contains("permission denied"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn sink_panic_is_reported_as_failure() {
        let mut dispatcher = AlertDispatcher::spawn(PanickingSink, NoLocation, "u").unwrap();
        for gesture in [Gesture::Fever, Gesture::ChestPain] {
            assert!(dispatcher.dispatch(gesture, SystemTime::now()));
            match dispatcher.outcomes().recv_timeout(TIMEOUT).unwrap() {
                AlertOutcome::Failed { gesture: failed, error } => {
                    assert_eq!(failed, gesture);
                    assert!(error.contains("panicked"));
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        // The worker survived, so dropping the dispatcher does not re-raise the panic.
        drop(dispatcher);
    }

    #[test]
    fn poisoned_store_stays_usable() {
        let store = MemoryAlertStore::new();
        let poisoner = store.clone();
        std::thread::spawn(move || {
            let _guard = poisoner.inner.lock().unwrap();
            panic!("poison the lock");
        })
        .join()
        .unwrap_err();

        let id = store
            .store(&AlertRecord::new("u", Gesture::Fever, None, SystemTime::now()))
            .unwrap();
        assert_eq!(store.open().len(), 1);
        store.assign(id, VolunteerId("v".into())).unwrap();
    }
}

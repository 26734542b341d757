//! In-memory fakes for the app ports, shared by the unit tests.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sensebridge_domain::driver::{DriverEvent, ScanResult, SensorType, StateReport};
use sensebridge_domain::entity::{EntityIndexKey, EntityState};
use sensebridge_domain::error::BridgeError;
use sensebridge_domain::id::DeviceIdentifier;
use sensebridge_domain::notification::Notification;
use sensebridge_domain::sensor::SensorEntity;

use crate::ports::{
    Driver, DriverError, DriverSession, EventCallback, HostPlatform, IdentityStore,
};

pub fn mac(raw: &str) -> DeviceIdentifier {
    DeviceIdentifier::parse(raw).unwrap()
}

pub fn state_event(raw_mac: &str, code: u8, state: &str, battery: u8, signal: i32) -> DriverEvent {
    DriverEvent::state(
        raw_mac,
        StateReport {
            sensor_type: SensorType::Code(code),
            state: state.into(),
            battery,
            signal,
        },
    )
}

fn boom(what: &str) -> BridgeError {
    BridgeError::Storage(what.to_string().into())
}

#[derive(Default)]
struct HostInner {
    added: Vec<SensorEntity>,
    updates: Vec<SensorEntity>,
    notifications: Vec<Notification>,
    snapshots: HashMap<DeviceIdentifier, EntityState>,
    indexed: HashSet<DeviceIdentifier>,
    fail_add: bool,
}

#[derive(Clone, Default)]
pub struct FakeHost {
    inner: Arc<Mutex<HostInner>>,
}

impl FakeHost {
    pub fn set_snapshot(&self, mac: DeviceIdentifier, state: EntityState) {
        self.inner.lock().unwrap().snapshots.insert(mac, state);
    }

    pub fn set_indexed(&self, mac: DeviceIdentifier) {
        self.inner.lock().unwrap().indexed.insert(mac);
    }

    pub fn fail_add(&self, fail: bool) {
        self.inner.lock().unwrap().fail_add = fail;
    }

    pub fn added(&self) -> Vec<SensorEntity> {
        self.inner.lock().unwrap().added.clone()
    }

    pub fn updates(&self) -> Vec<SensorEntity> {
        self.inner.lock().unwrap().updates.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().unwrap().notifications.clone()
    }
}

impl HostPlatform for FakeHost {
    async fn add_entities(&self, entities: Vec<SensorEntity>) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_add {
            return Err(boom("host unavailable"));
        }
        inner.added.extend(entities);
        Ok(())
    }

    async fn schedule_update(&self, entity: SensorEntity) -> Result<(), BridgeError> {
        self.inner.lock().unwrap().updates.push(entity);
        Ok(())
    }

    async fn last_state(
        &self,
        unique_id: &DeviceIdentifier,
    ) -> Result<Option<EntityState>, BridgeError> {
        Ok(self.inner.lock().unwrap().snapshots.get(unique_id).cloned())
    }

    async fn lookup_entity(&self, key: &EntityIndexKey) -> Result<Option<String>, BridgeError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .indexed
            .contains(&key.unique_id)
            .then(|| format!("binary_sensor.sensebridge_{}", key.unique_id.slug())))
    }

    async fn notify(&self, notification: Notification) -> Result<(), BridgeError> {
        self.inner.lock().unwrap().notifications.push(notification);
        Ok(())
    }
}

#[derive(Default)]
struct StoreInner {
    ids: BTreeSet<DeviceIdentifier>,
    saves: usize,
    fail_load: bool,
    fail_save: bool,
}

#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl FakeStore {
    pub fn with_ids(ids: &[&str]) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().ids = ids.iter().map(|raw| mac(raw)).collect();
        store
    }

    pub fn fail_load(&self, fail: bool) {
        self.inner.lock().unwrap().fail_load = fail;
    }

    pub fn fail_save(&self, fail: bool) {
        self.inner.lock().unwrap().fail_save = fail;
    }

    pub fn ids(&self) -> BTreeSet<DeviceIdentifier> {
        self.inner.lock().unwrap().ids.clone()
    }

    pub fn saves(&self) -> usize {
        self.inner.lock().unwrap().saves
    }
}

impl IdentityStore for FakeStore {
    fn load(&self) -> impl Future<Output = Result<BTreeSet<DeviceIdentifier>, BridgeError>> + Send {
        let inner = self.inner.lock().unwrap();
        let result = if inner.fail_load {
            Err(boom("store unreadable"))
        } else {
            Ok(inner.ids.clone())
        };
        async move { result }
    }

    fn save(
        &self,
        identifiers: &BTreeSet<DeviceIdentifier>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let mut inner = self.inner.lock().unwrap();
        let result = if inner.fail_save {
            Err(boom("store read-only"))
        } else {
            inner.ids.clone_from(identifiers);
            inner.saves += 1;
            Ok(())
        };
        async move { result }
    }
}

/// Scripted driver session. Each scan pops the next result, after `delay`.
pub struct FakeSession {
    script: Mutex<VecDeque<Result<Option<ScanResult>, DriverError>>>,
    delay: Duration,
    scans: AtomicUsize,
    stops: AtomicUsize,
}

impl FakeSession {
    pub fn new(delay: Duration) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            delay,
            scans: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn push_found(&self, raw_mac: &str, code: u8) {
        self.script.lock().unwrap().push_back(Ok(Some(ScanResult::new(
            raw_mac,
            SensorType::Code(code),
            "1.0",
        ))));
    }

    pub fn push_nothing(&self) {
        self.script.lock().unwrap().push_back(Ok(None));
    }

    pub fn push_error(&self) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(DriverError::Closed));
    }

    pub fn scans(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl DriverSession for FakeSession {
    fn scan(&self) -> Result<Option<ScanResult>, DriverError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Driver handing out one shared [`FakeSession`] and keeping the callback.
pub struct FakeDriver {
    session: Arc<FakeSession>,
    callback: Mutex<Option<EventCallback>>,
    opened: Mutex<Option<PathBuf>>,
    fail_open: bool,
}

impl FakeDriver {
    pub fn new(session: Arc<FakeSession>) -> Self {
        Self {
            session,
            callback: Mutex::new(None),
            opened: Mutex::new(None),
            fail_open: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Arc::new(FakeSession::new(Duration::ZERO)))
        }
    }

    /// Fire an event as the driver's reader thread would.
    pub fn emit(&self, event: DriverEvent) {
        let callback = self.callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }

    pub fn opened(&self) -> Option<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl Driver for FakeDriver {
    fn open(
        &self,
        target: &Path,
        callback: EventCallback,
    ) -> Result<Arc<dyn DriverSession>, DriverError> {
        if self.fail_open {
            return Err(DriverError::Open {
                path: target.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        *self.callback.lock().unwrap() = Some(callback);
        *self.opened.lock().unwrap() = Some(target.to_path_buf());
        Ok(self.session.clone())
    }
}

/// Warnings emitted on the current thread while the guard is alive.
///
/// Tasks spawned on a current-thread runtime are polled on the same thread,
/// so the coordinator's warnings are captured too.
#[derive(Clone, Default)]
pub struct Warnings(Arc<Mutex<Vec<String>>>);

impl Warnings {
    pub fn capture() -> (Self, tracing::subscriber::DefaultGuard) {
        use tracing_subscriber::layer::SubscriberExt;

        let warnings = Self::default();
        let subscriber = tracing_subscriber::registry().with(warnings.clone());
        (warnings, tracing::subscriber::set_default(subscriber))
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Warnings {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() != tracing::Level::WARN {
            return;
        }
        let mut message = MessageVisitor(String::new());
        event.record(&mut message);
        self.0.lock().unwrap().push(message.0);
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

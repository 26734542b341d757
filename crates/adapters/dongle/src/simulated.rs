//! Simulated dongle — a [`Driver`] that needs no hardware.
//!
//! A reporter thread plays the role of the real driver's reader thread: every
//! interval it emits one state event per paired sensor, alternating between
//! active and idle. Scans hand out the configured pairable sensors in order,
//! which then start reporting too.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use sensebridge_app::ports::{Driver, DriverError, DriverSession, EventCallback};
use sensebridge_domain::driver::{DriverEvent, ScanResult, SensorType, StateReport};

use crate::config::{SimulatedConfig, SimulatedSensor};

const FIRMWARE_VERSION: &str = "sim-1";

impl SimulatedSensor {
    fn sensor_type(&self) -> SensorType {
        SensorType::Code(self.sensor_type)
    }

    fn report(&self, active: bool) -> DriverEvent {
        let sensor_type = self.sensor_type();
        let state = match (sensor_type.is_motion(), active) {
            (true, true) => "active",
            (true, false) => "inactive",
            (false, true) => "open",
            (false, false) => "close",
        };
        DriverEvent::state(
            self.mac.as_str(),
            StateReport {
                sensor_type,
                state: state.into(),
                battery: self.battery,
                signal: self.signal,
            },
        )
    }
}

pub struct SimulatedDongle {
    sensors: Vec<SimulatedSensor>,
    pairable: Vec<SimulatedSensor>,
    report_interval: Duration,
    scan_delay: Duration,
}

impl SimulatedDongle {
    #[must_use]
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            sensors: config.sensors,
            pairable: config.pairable,
            report_interval: Duration::from_secs(u64::from(config.report_interval_secs.max(1))),
            scan_delay: Duration::from_secs(u64::from(config.scan_delay_secs)),
        }
    }

    /// Override the configured timings, for sub-second runs.
    #[must_use]
    pub fn with_timing(mut self, report_interval: Duration, scan_delay: Duration) -> Self {
        self.report_interval = report_interval;
        self.scan_delay = scan_delay;
        self
    }
}

impl Driver for SimulatedDongle {
    fn open(
        &self,
        target: &Path,
        callback: EventCallback,
    ) -> Result<Arc<dyn DriverSession>, DriverError> {
        tracing::info!(
            device = %target.display(),
            sensors = self.sensors.len(),
            pairable = self.pairable.len(),
            "opening simulated dongle"
        );

        let paired = Arc::new(Mutex::new(self.sensors.clone()));
        let (stop, stopped) = mpsc::channel::<()>();
        let interval = self.report_interval;
        let reporting = Arc::clone(&paired);

        let reporter = std::thread::Builder::new()
            .name("simulated-dongle".to_string())
            .spawn(move || {
                let mut active = true;
                while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(interval) {
                    let Ok(sensors) = reporting.lock().map(|s| s.clone()) else {
                        break;
                    };
                    for sensor in &sensors {
                        callback(sensor.report(active));
                    }
                    active = !active;
                }
                tracing::debug!("simulated dongle reporter stopped");
            })?;

        Ok(Arc::new(SimulatedSession {
            paired,
            pairable: Mutex::new(self.pairable.iter().cloned().collect()),
            scan_delay: self.scan_delay,
            closed: AtomicBool::new(false),
            stop: Mutex::new(Some(stop)),
            reporter: Mutex::new(Some(reporter)),
        }))
    }
}

struct SimulatedSession {
    paired: Arc<Mutex<Vec<SimulatedSensor>>>,
    pairable: Mutex<VecDeque<SimulatedSensor>>,
    scan_delay: Duration,
    closed: AtomicBool,
    stop: Mutex<Option<mpsc::Sender<()>>>,
    reporter: Mutex<Option<JoinHandle<()>>>,
}

impl DriverSession for SimulatedSession {
    fn scan(&self) -> Result<Option<ScanResult>, DriverError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DriverError::Closed);
        }
        std::thread::sleep(self.scan_delay);

        let next = self
            .pairable
            .lock()
            .map_err(|_| DriverError::Closed)?
            .pop_front();
        let Some(sensor) = next else {
            return Ok(None);
        };

        let result = ScanResult::new(sensor.mac.as_str(), sensor.sensor_type(), FIRMWARE_VERSION);
        self.paired
            .lock()
            .map_err(|_| DriverError::Closed)?
            .push(sensor);
        Ok(Some(result))
    }

    fn stop(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // dropping the sender wakes the reporter
        if let Ok(mut stop) = self.stop.lock() {
            stop.take();
        }
        let reporter = self.reporter.lock().ok().and_then(|mut r| r.take());
        if let Some(reporter) = reporter
            && reporter.join().is_err()
        {
            tracing::error!("simulated dongle reporter panicked");
        }
    }
}

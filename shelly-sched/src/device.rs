//! Blocking HTTP control of a dimmer's light channel.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::command::{LightCommand, Turn, MAX_BRIGHTNESS};
use crate::error::ScheduleError;
use crate::status::{LightStatus, Status};
use crate::trigger::Action;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How often a [`StatusPoller`] refreshes by default.
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(1000);

/// Percent added or removed by one brightness step.
pub const BRIGHTNESS_STEP: u8 = 10;

/// A dimmer on the local network, addressed by host or IP.
#[derive(Clone)]
pub struct Dimmer {
    host: String,
    agent: ureq::Agent,
}

impl fmt::Debug for Dimmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dimmer").field("host", &self.host).finish()
    }
}

impl Dimmer {
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_timeout(host, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(host: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn light_url(&self) -> String {
        format!("http://{}/light/0", self.host)
    }

    pub fn status_url(&self) -> String {
        format!("http://{}/status", self.host)
    }

    /// Send a state change. The response body is not inspected.
    pub fn apply(&self, command: &LightCommand) -> Result<(), ScheduleError> {
        let url = self.light_url();
        debug!(host = %self.host, %command, "changing light state");
        let mut request = self.agent.put(&url);
        for (key, value) in command.query_pairs() {
            request = request.query(key, &value);
        }
        request.call().map_err(|e| {
            warn!(host = %self.host, error = %e, "light state change failed");
            ScheduleError::device(format!("PUT {url}: {e}"))
        })?;
        Ok(())
    }

    /// Poll the device's status document.
    pub fn status(&self) -> Result<Status, ScheduleError> {
        let url = self.status_url();
        debug!(host = %self.host, "refreshing status");
        let body = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| {
                warn!(host = %self.host, error = %e, "status request failed");
                ScheduleError::device(format!("GET {url}: {e}"))
            })?
            .into_string()
            .map_err(|e| ScheduleError::device(format!("reading {url}: {e}")))?;
        let status: Status = serde_json::from_str(&body)
            .map_err(|e| ScheduleError::device(format!("decoding {url}: {e}")))?;
        if let Some(watts) = status.power() {
            debug!(device = status.device_id(), watts, "power");
        }
        for fault in status.faults() {
            warn!(device = status.device_id(), fault, "device reports a fault");
        }
        Ok(status)
    }

    pub fn on(&self) -> Result<(), ScheduleError> {
        self.apply(&LightCommand::new().turn(Turn::On))
    }

    pub fn off(&self) -> Result<(), ScheduleError> {
        self.apply(&LightCommand::new().turn(Turn::Off))
    }

    pub fn toggle(&self) -> Result<(), ScheduleError> {
        self.apply(&LightCommand::new().turn(Turn::Toggle))
    }

    /// Values above 100 are clamped.
    pub fn set_brightness(&self, percent: u8) -> Result<(), ScheduleError> {
        self.apply(&LightCommand::new().brightness(percent))
    }

    /// Start refreshing this device's status in the background.
    pub fn poll_status(&self, refresh: Duration) -> Result<StatusPoller, ScheduleError> {
        StatusPoller::spawn(self.clone(), refresh)
    }

    /// One step brighter than the current status. Returns the new level.
    pub fn brightness_up(&self) -> Result<u8, ScheduleError> {
        let target = step_brightness(self.status()?.brightness(), true);
        self.set_brightness(target)?;
        Ok(target)
    }

    /// One step dimmer than the current status. Returns the new level.
    pub fn brightness_down(&self) -> Result<u8, ScheduleError> {
        let target = step_brightness(self.status()?.brightness(), false);
        self.set_brightness(target)?;
        Ok(target)
    }
}

fn step_brightness(current: u8, up: bool) -> u8 {
    if up {
        current.saturating_add(BRIGHTNESS_STEP).min(MAX_BRIGHTNESS)
    } else {
        current.saturating_sub(BRIGHTNESS_STEP)
    }
}

/// Background refresh of a dimmer's status document.
///
/// The worker polls immediately, then once per refresh interval. A failed
/// poll is logged and the previous snapshot is kept. Dropping the poller
/// stops the worker and waits for it.
#[derive(Debug)]
pub struct StatusPoller {
    latest: Arc<RwLock<Option<Status>>>,
    stop: Option<mpsc::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn spawn(dimmer: Dimmer, refresh: Duration) -> Result<Self, ScheduleError> {
        let latest = Arc::new(RwLock::new(None));
        let (stop, stopped) = mpsc::channel::<()>();
        let snapshot = Arc::clone(&latest);
        let worker = thread::Builder::new()
            .name(format!("status-{}", dimmer.host()))
            .spawn(move || loop {
                match dimmer.status() {
                    Ok(status) => {
                        *snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(status);
                    }
                    Err(e) => warn!(host = %dimmer.host(), error = %e, "status refresh failed"),
                }
                match stopped.recv_timeout(refresh) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
            })
            .map_err(|e| ScheduleError::device(format!("starting status poller: {e}")))?;
        Ok(Self {
            latest,
            stop: Some(stop),
            worker: Some(worker),
        })
    }

    /// The most recent status, if any poll has succeeded yet.
    pub fn latest(&self) -> Option<Status> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The light channel of the most recent status.
    pub fn light_status(&self) -> Option<LightStatus> {
        self.latest()?.light().cloned()
    }

    /// Stop refreshing and wait for the worker to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // A closed channel wakes the worker out of its wait.
        drop(self.stop.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("status poller panicked");
            }
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Applies a fixed command to a dimmer when its trigger fires.
#[derive(Debug, Clone)]
pub struct LightAction {
    dimmer: Dimmer,
    command: LightCommand,
}

impl LightAction {
    pub fn new(dimmer: Dimmer, command: LightCommand) -> Self {
        Self { dimmer, command }
    }

    pub fn dimmer(&self) -> &Dimmer {
        &self.dimmer
    }

    pub fn command(&self) -> &LightCommand {
        &self.command
    }
}

impl Action for LightAction {
    fn fire(&self) -> Result<(), ScheduleError> {
        self.dimmer.apply(&self.command)
    }
}

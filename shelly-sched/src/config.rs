//! JSON trigger files.
//!
//! ```json
//! {
//!   "timezone": "Europe/Oslo",
//!   "device": { "host": "192.168.1.99" },
//!   "triggers": [
//!     { "name": "wake", "at": "6:45 AM", "pattern": "every monday",
//!       "action": { "turn": "on", "brightness": 60 } }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use jiff::tz::TimeZone;
use jiff::Zoned;
use serde::{Deserialize, Serialize};

use crate::command::LightCommand;
use crate::error::ScheduleError;
use crate::parser::{parse_instant, parse_time_of_day};
use crate::pattern::Pattern;
use crate::repeater::Repeater;
use crate::trigger::ScheduledTrigger;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleFile {
    /// IANA name; overrides the zone passed to [`ScheduleFile::build`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceConfig>,
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub host: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub name: String,
    /// Time of day on each matching date. Ignored by duration patterns.
    #[serde(default = "default_at")]
    pub at: String,
    pub pattern: String,
    /// Defaults to the `now` passed at build time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
    #[serde(default)]
    pub action: LightCommand,
}

fn default_at() -> String {
    "00:00".to_string()
}

impl ScheduleFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScheduleError::config(format!("reading {}: {e}", path.display())))?;
        Self::from_json(&text)
            .map_err(|e| ScheduleError::config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> Result<Self, ScheduleError> {
        serde_json::from_str(text).map_err(|e| ScheduleError::config(e.to_string()))
    }

    /// The file's zone, or `fallback` when it names none.
    pub fn time_zone(&self, fallback: &TimeZone) -> Result<TimeZone, ScheduleError> {
        match &self.timezone {
            Some(name) => TimeZone::get(name)
                .map_err(|e| ScheduleError::config(format!("time zone '{name}': {e}"))),
            None => Ok(fallback.clone()),
        }
    }

    pub fn trigger(&self, name: &str) -> Option<&TriggerConfig> {
        self.triggers.iter().find(|t| t.name == name)
    }

    /// Build every trigger. Trigger names must be unique.
    ///
    /// Errors name the offending trigger.
    pub fn build(
        &self,
        zone: &TimeZone,
        now: &Zoned,
    ) -> Result<Vec<ScheduledTrigger<LightCommand>>, ScheduleError> {
        let tz = self.time_zone(zone)?;
        let mut seen = HashSet::new();
        let mut triggers = Vec::with_capacity(self.triggers.len());
        for config in &self.triggers {
            if !seen.insert(config.name.as_str()) {
                return Err(ScheduleError::config(format!(
                    "duplicate trigger name '{}'",
                    config.name
                )));
            }
            let trigger = config.build(&tz, now).map_err(|e| {
                ScheduleError::config(format!("trigger '{}': {e}", config.name))
            })?;
            triggers.push(trigger);
        }
        Ok(triggers)
    }

    #[cfg(feature = "device")]
    pub fn dimmer(&self) -> Result<crate::device::Dimmer, ScheduleError> {
        let device = self
            .device
            .as_ref()
            .ok_or_else(|| ScheduleError::config("no device configured"))?;
        Ok(crate::device::Dimmer::with_timeout(
            device.host.clone(),
            std::time::Duration::from_millis(device.timeout_ms),
        ))
    }
}

impl TriggerConfig {
    /// Build one trigger evaluated in `tz`.
    ///
    /// Duration patterns without a recorded last run are anchored at their
    /// start.
    pub fn build(
        &self,
        tz: &TimeZone,
        now: &Zoned,
    ) -> Result<ScheduledTrigger<LightCommand>, ScheduleError> {
        let time_of_day = parse_time_of_day(&self.at)?;
        let pattern = Pattern::parse(&self.pattern)?;
        let start = match &self.start {
            Some(text) => parse_instant(text, tz)?,
            None => now.with_time_zone(tz.clone()),
        };
        let mut repeater = Repeater::new(pattern, start.clone()).in_time_zone(tz.clone());
        if let Some(text) = &self.expires {
            repeater = repeater.expiring(parse_instant(text, tz)?);
        }
        match &self.last_run {
            Some(text) => repeater = repeater.with_last_run(parse_instant(text, tz)?),
            None if pattern.is_duration() => repeater = repeater.with_last_run(start),
            None => {}
        }
        Ok(ScheduledTrigger::new(
            self.name.clone(),
            time_of_day,
            repeater,
            self.action,
        ))
    }
}

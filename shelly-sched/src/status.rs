//! Models of a dimmer's `/status` document.
//!
//! Every field is optional on the wire; unknown fields are ignored so that
//! firmware updates adding telemetry do not break decoding.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    #[serde(rename = "wifi_sta")]
    pub wifi: WifiStatus,
    pub cloud: CloudStatus,
    /// Device-local wall clock, "HH:MM".
    pub time: String,
    pub unixtime: i64,
    pub has_update: bool,
    pub mac: String,
    #[serde(rename = "cfg_changed_cnt")]
    pub config_change_count: u32,
    pub lights: Vec<LightStatus>,
    pub meters: Vec<MeterStatus>,
    pub inputs: Vec<InputStatus>,
    #[serde(rename = "tmp")]
    pub temperature: Option<TempStatus>,
    pub calibrated: bool,
    /// 0: LO mode, 1: LN mode.
    pub wire_mode: u8,
    pub forced_neutral: bool,
    #[serde(rename = "overtemperature")]
    pub over_temperature: bool,
    #[serde(rename = "overpower")]
    pub over_power: bool,
    #[serde(rename = "loaderror")]
    pub load_error: i64,
    pub update: Option<UpdateStatus>,
    pub ram_total: u64,
    pub ram_free: u64,
    pub fs_size: u64,
    pub fs_free: u64,
    /// Seconds since boot.
    pub uptime: u64,
}

impl Status {
    /// The dimmer's only light channel.
    pub fn light(&self) -> Option<&LightStatus> {
        self.lights.first()
    }

    pub fn is_on(&self) -> bool {
        self.light().is_some_and(|l| l.is_on)
    }

    /// Current brightness, 0 when no light is reported.
    pub fn brightness(&self) -> u8 {
        self.light().map_or(0, |l| l.brightness)
    }

    /// Instantaneous power draw in watts.
    pub fn power(&self) -> Option<f64> {
        self.meters.first().map(|m| m.power)
    }

    /// Devices identify themselves by MAC address.
    pub fn device_id(&self) -> &str {
        &self.mac
    }

    /// Conditions that need attention: overheating, overload, load faults.
    pub fn faults(&self) -> Vec<&'static str> {
        let mut faults = Vec::new();
        if self.over_temperature {
            faults.push("overtemperature");
        }
        if self.over_power {
            faults.push("overpower");
        }
        if self.load_error != 0 {
            faults.push("load error");
        }
        faults
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightStatus {
    #[serde(rename = "ison")]
    pub is_on: bool,
    /// What last changed the light: "http", "cloud", "input", ...
    pub source: String,
    pub has_timer: bool,
    pub timer_started: i64,
    pub timer_duration: i64,
    pub timer_remaining: i64,
    pub mode: String,
    pub brightness: u8,
    /// Milliseconds.
    pub transition: u32,
}

impl Default for LightStatus {
    fn default() -> Self {
        Self {
            is_on: false,
            source: String::new(),
            has_timer: false,
            timer_started: 0,
            timer_duration: 0,
            timer_remaining: 0,
            mode: "white".to_string(),
            brightness: 100,
            transition: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterStatus {
    /// Watts.
    pub power: f64,
    /// Threshold in watts at which overpower trips.
    pub overpower: f64,
    pub is_valid: bool,
    pub timestamp: i64,
    pub counters: Vec<f64>,
    /// Watt-minutes since boot.
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TempStatus {
    #[serde(rename = "tC")]
    pub celsius: f64,
    #[serde(rename = "tF")]
    pub fahrenheit: f64,
    pub is_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiStatus {
    pub connected: bool,
    pub ssid: String,
    pub ip: Option<IpAddr>,
    pub rssi: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudStatus {
    pub enabled: bool,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputStatus {
    pub input: u8,
    pub event: String,
    #[serde(rename = "event_cnt")]
    pub event_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateStatus {
    pub status: String,
    pub has_update: bool,
    pub new_version: String,
    pub old_version: String,
    pub beta_version: String,
}

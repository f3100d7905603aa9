/// Switch state requested from a light channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Turn {
    On,
    Off,
    Toggle,
}

impl Turn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Toggle => "toggle",
        }
    }
}

/// Highest brightness a dimmer accepts, in percent.
pub const MAX_BRIGHTNESS: u8 = 100;

/// A partial light state change. Absent parameters are left to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LightCommand {
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub turn: Option<Turn>,
    /// Percent, 0 through 100.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub brightness: Option<u8>,
    /// Fade time in milliseconds.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub transition: Option<u32>,
}

impl LightCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turn(mut self, turn: Turn) -> Self {
        self.turn = Some(turn);
        self
    }

    /// Values above 100 are clamped.
    pub fn brightness(mut self, percent: u8) -> Self {
        self.brightness = Some(percent.min(MAX_BRIGHTNESS));
        self
    }

    pub fn transition(mut self, millis: u32) -> Self {
        self.transition = Some(millis);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.turn.is_none() && self.brightness.is_none() && self.transition.is_none()
    }

    /// Query parameters for the device, omitting absent ones.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(turn) = self.turn {
            pairs.push(("turn", turn.as_str().to_string()));
        }
        if let Some(brightness) = self.brightness {
            pairs.push(("brightness", brightness.min(MAX_BRIGHTNESS).to_string()));
        }
        if let Some(transition) = self.transition {
            pairs.push(("transition", transition.to_string()));
        }
        pairs
    }
}

impl std::fmt::Display for LightCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("(no change)");
        }
        let parts: Vec<String> = self
            .query_pairs()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

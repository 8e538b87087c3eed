use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{
    avantis::{AVANTIS_TCP_PORT, MIDI_MAX_DATA, assign::AssignPolicy, profile::parse_u8},
    error::AppError,
};

type Result<T> = std::result::Result<T, AppError>;

/// Highest base channel the console accepts in Utility / Control / MIDI
pub const MAX_MIDI_CHANNEL: u8 = 12;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub host: String,
    pub port: u16,
    /// MIDI base channel as shown on the console, 1-based
    pub midi_channel: u8,
    pub profile: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            host: "192.168.1.70".to_string(),
            port: AVANTIS_TCP_PORT,
            midi_channel: 1,
            profile: "avantis".to_string(),
        }
    }
}

/// Assign offset policy: a named revision, optionally patched entry by entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssignSettings {
    pub revision: String,
    pub dca_on: Option<String>,
    pub dca_off: Option<String>,
    pub mute_on: Option<String>,
    pub mute_off: Option<String>,
}

impl Default for AssignSettings {
    fn default() -> Self {
        Self {
            revision: "legacy".to_string(),
            dca_on: None,
            dca_off: None,
            mute_on: None,
            mute_off: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub console: ConsoleSettings,
    pub profiles_dir: String,
    /// operator session listen address
    pub listen: String,
    pub assign: AssignSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: ConsoleSettings::default(),
            profiles_dir: "profiles".to_string(),
            listen: "127.0.0.1:9999".to_string(),
            assign: AssignSettings::default(),
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("cannot read settings {:?}: {}", path, e))
        })?;
        return Self::from_yaml(&content);
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings = serde_yaml::from_str::<Settings>(content)
            .map_err(|e| AppError::config(format!("settings parse error: {}", e)))?;
        settings.validate()?;
        return Ok(settings);
    }

    fn validate(&self) -> Result<()> {
        let channel = self.console.midi_channel;
        if channel < 1 || channel > MAX_MIDI_CHANNEL {
            return Err(AppError::config(format!(
                "midi_channel {} is out of range 1..={}",
                channel, MAX_MIDI_CHANNEL
            )));
        }
        self.assign_policy()?;
        return Ok(());
    }

    /// Zero-based MIDI channel used on the wire
    pub fn midi_base(&self) -> u8 {
        self.console.midi_channel - 1
    }

    pub fn console_address(&self) -> String {
        format!("{}:{}", self.console.host, self.console.port)
    }

    pub fn assign_policy(&self) -> Result<AssignPolicy> {
        let assign = &self.assign;
        let Some(mut policy) = AssignPolicy::revision(&assign.revision) else {
            return Err(AppError::config(format!(
                "unknown assign revision '{}', expected one of {:?} or none",
                assign.revision,
                AssignPolicy::REVISIONS
            )));
        };
        override_offset(&mut policy.dca_on, &assign.dca_on, "dca_on")?;
        override_offset(&mut policy.dca_off, &assign.dca_off, "dca_off")?;
        override_offset(&mut policy.mute_on, &assign.mute_on, "mute_on")?;
        override_offset(&mut policy.mute_off, &assign.mute_off, "mute_off")?;
        return Ok(policy);
    }
}

fn override_offset(entry: &mut Option<u8>, value: &Option<String>, name: &str) -> Result<()> {
    let Some(src) = value else {
        return Ok(());
    };
    match parse_u8(src) {
        Ok(offset) if offset <= MIDI_MAX_DATA => {
            *entry = Some(offset);
            return Ok(());
        }
        _ => {
            return Err(AppError::config(format!(
                "assign.{} '{}' is not a 7-bit value",
                name, src
            )));
        }
    }
}

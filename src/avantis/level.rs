use crate::error::{AppError, ErrorType};

use super::profile::{Profile, parse_u8};

type Result<T> = std::result::Result<T, AppError>;

/// Fader level as chosen by the operator
#[derive(Debug, Clone, PartialEq)]
pub enum LevelSelection {
    /// dB label from the fader table, e.g. "-10", "+5 dB", "-inf"
    Label(String),
    /// raw level code; must be one of the table values
    Code(u8),
    /// +1 dB relative to the last known level
    StepUp,
    /// -1 dB relative to the last known level
    StepDown,
    /// 0-based position in the send level steps, -inf first
    Index(u8),
}

impl LevelSelection {
    pub fn parse(src: &str) -> Self {
        let trimmed = src.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "up" => return LevelSelection::StepUp,
            "down" => return LevelSelection::StepDown,
            _ => {}
        }
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            if let Ok(code) = parse_u8(trimmed) {
                return LevelSelection::Code(code);
            }
        }
        return LevelSelection::Label(trimmed.to_string());
    }
}

#[derive(Debug, Clone)]
struct LevelEntry {
    label: String,
    key: String,
    code: u8,
    db: f32,
}

/// Resolves fader level selections to wire codes
#[derive(Debug, Clone)]
pub struct LevelCodec {
    entries: Vec<LevelEntry>,
    steps: Vec<u8>,
}

impl LevelCodec {
    pub fn new(profile: &Profile) -> Result<Self> {
        let mut entries = Vec::new();
        for (label, code) in &profile.fader_levels {
            let key = normalize(label);
            let db = if key == "-inf" {
                f32::NEG_INFINITY
            } else {
                key.parse::<f32>().map_err(|_| {
                    AppError::config(format!("fader label '{}' is not a dB value", label))
                })?
            };
            entries.push(LevelEntry {
                label: label.clone(),
                key,
                code: *code,
                db,
            });
        }
        if entries.is_empty() {
            return Err(AppError::config("fader level table is empty".to_string()));
        }
        let steps = profile
            .send_level_steps
            .iter()
            .map(|(_, code)| *code)
            .collect();
        return Ok(Self { entries, steps });
    }

    /// (label, code) pairs in table order
    pub fn levels(&self) -> impl Iterator<Item = (&str, u8)> {
        self.entries.iter().map(|e| (e.label.as_str(), e.code))
    }

    pub fn resolve(&self, selection: &LevelSelection, last_level: Option<u8>) -> Result<u8> {
        return match selection {
            LevelSelection::Label(label) => {
                let key = normalize(label);
                match self.entries.iter().find(|e| e.key == key) {
                    Some(entry) => Ok(entry.code),
                    None => Err(unknown_level(label)),
                }
            }
            LevelSelection::Code(code) => {
                if self.entries.iter().any(|e| e.code == *code) || self.steps.contains(code) {
                    Ok(*code)
                } else {
                    Err(unknown_level(&format!("{:#04x}", code)))
                }
            }
            LevelSelection::Index(index) => match self.steps.get(*index as usize) {
                Some(code) => Ok(*code),
                None => Err(AppError::out_of_range(format!(
                    "send level {} is out of range 0..{}",
                    index,
                    self.steps.len()
                ))),
            },
            LevelSelection::StepUp | LevelSelection::StepDown => {
                let Some(last) = last_level else {
                    return Err(AppError::new(
                        ErrorType::UnsupportedStep,
                        "step requires the last known fader level".to_string(),
                    ));
                };
                Ok(self.step(last, *selection == LevelSelection::StepUp))
            }
        };
    }

    fn step(&self, last: u8, up: bool) -> u8 {
        let current = self.position_of(last);
        let db = current.db;
        let next = if up {
            self.entries
                .iter()
                .filter(|e| e.db > db && e.db >= db + 1.0)
                .min_by(|a, b| a.db.total_cmp(&b.db))
        } else {
            self.entries
                .iter()
                .filter(|e| e.db < db && e.db <= db - 1.0)
                .max_by(|a, b| a.db.total_cmp(&b.db))
        };
        // clamp at the ends of the table
        return next.unwrap_or(current).code;
    }

    /// Entry with exactly this code, else the nearest one below it.
    fn position_of(&self, code: u8) -> &LevelEntry {
        if let Some(entry) = self.entries.iter().find(|e| e.code == code) {
            return entry;
        }
        let below = self
            .entries
            .iter()
            .filter(|e| e.code < code)
            .max_by_key(|e| e.code);
        return match below {
            Some(entry) => entry,
            None => self
                .entries
                .iter()
                .min_by_key(|e| e.code)
                .unwrap_or(&self.entries[0]),
        };
    }
}

fn unknown_level(label: &str) -> AppError {
    AppError::new(
        ErrorType::UnknownLevel,
        format!("no fader level '{}'", label),
    )
}

/// "+5 dB" -> "5", "-INF" -> "-inf"
fn normalize(label: &str) -> String {
    let lower = label.trim().to_ascii_lowercase();
    let without_unit = lower.strip_suffix("db").unwrap_or(&lower).trim();
    let without_sign = without_unit.strip_prefix('+').unwrap_or(without_unit);
    return without_sign.to_string();
}

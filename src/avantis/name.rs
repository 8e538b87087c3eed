use std::collections::BTreeMap;
use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::profile::{Profile, parse_u8};

/// Maps channel names to the console character set.
#[derive(Debug, Clone)]
pub struct NameCodec {
    chars: BTreeMap<char, u8>,
}

impl NameCodec {
    pub fn new(profile: &Profile) -> Self {
        Self {
            chars: profile.name_chars.clone(),
        }
    }

    /// Characters missing from the table are dropped.
    pub fn encode(&self, name: &str) -> Vec<u8> {
        name.chars()
            .filter_map(|c| {
                let code = self.chars.get(&c).copied();
                if code.is_none() {
                    log::debug!("skipping unsupported name character {:?}", c);
                }
                code
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Color {
    Off = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Purple = 5,
    LtBlue = 6,
    White = 7,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Off,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Purple,
        Color::LtBlue,
        Color::White,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Color::Off => "Off",
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Yellow => "Yellow",
            Color::Blue => "Blue",
            Color::Purple => "Purple",
            Color::LtBlue => "Lt Blue",
            Color::White => "White",
        }
    }

    /// Accepts a color label (spaces optional, any case) or its number.
    pub fn parse(src: &str) -> Option<Self> {
        if let Ok(value) = parse_u8(src) {
            return Color::try_from(value).ok();
        }
        let key: String = src
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        return Color::ALL.into_iter().find(|color| {
            color.label().replace(' ', "").to_ascii_lowercase() == key
        });
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

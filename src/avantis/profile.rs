use std::collections::BTreeMap;
use std::fs;
use std::num::ParseIntError;
use std::path::Path;

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::AppError;

use super::{MIDI_MAX_DATA, section::Section};

#[cfg(not(test))]
use log::error;

type Result<T> = std::result::Result<T, AppError>;

/// Section entry as written in a profile yaml file
#[derive(Debug, Clone, Deserialize)]
struct SectionDesc {
    pub count: u8,
    pub first_code: String,
}

/// Console description that is used tentatively during profile loading.
/// Profile yaml files use this schema
#[derive(Debug, Clone, Deserialize)]
struct ProfileDesc {
    pub model: String,
    pub scene_count: u16,
    pub sections: BTreeMap<Section, SectionDesc>,
    pub fader_levels: Vec<(String, String)>,
    #[serde(default)]
    pub send_level_steps: Vec<(String, String)>,
    pub name_chars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDef {
    pub count: u8,
    pub first_code: u8,
}

impl SectionDef {
    /// Wire code of a 1-based channel number.
    pub fn channel_code(&self, section: Section, number: u8) -> Result<u8> {
        if number < 1 || number > self.count {
            return Err(AppError::out_of_range(format!(
                "{} {} is out of range 1..={}",
                section, number, self.count
            )));
        }
        let code = self.first_code as u16 + (number - 1) as u16;
        if code > MIDI_MAX_DATA as u16 {
            return Err(AppError::invalid_field(format!(
                "channel code {:#04x} for {} {} exceeds 0x7f",
                code, section, number
            )));
        }
        return Ok(code as u8);
    }
}

/// Device capabilities of a console model, immutable once loaded
#[derive(Debug, Clone)]
pub struct Profile {
    pub model: String,
    pub scene_count: u16,
    pub sections: BTreeMap<Section, SectionDef>,
    /// (dB label, level code) in declared order
    pub fader_levels: Vec<(String, u8)>,
    /// (dB label, level code) picked by 0-based index
    pub send_level_steps: Vec<(String, u8)>,
    pub name_chars: BTreeMap<char, u8>,
}

impl Profile {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let desc = serde_yaml::from_str::<ProfileDesc>(content)
            .map_err(|e| AppError::config(format!("profile parse error: {}", e)))?;
        return Self::from_desc(desc);
    }

    fn from_desc(desc: ProfileDesc) -> Result<Self> {
        let mut sections = BTreeMap::new();
        for (section, section_desc) in desc.sections {
            let first_code = parse_code(&section_desc.first_code)?;
            sections.insert(
                section,
                SectionDef {
                    count: section_desc.count,
                    first_code,
                },
            );
        }

        for section in Section::ALL {
            if !sections.contains_key(&section) {
                log::warn!("profile {} has no {} section", desc.model, section);
            }
        }

        let mut fader_levels = Vec::new();
        for (label, code) in desc.fader_levels {
            fader_levels.push((label, parse_code(&code)?));
        }

        let mut send_level_steps = Vec::new();
        for (label, code) in desc.send_level_steps {
            send_level_steps.push((label, parse_code(&code)?));
        }

        let mut name_chars = BTreeMap::new();
        for (key, code) in desc.name_chars {
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                return Err(AppError::config(format!(
                    "name table key '{}' must be a single character",
                    key
                )));
            };
            name_chars.insert(c, parse_code(&code)?);
        }

        return Ok(Self {
            model: desc.model,
            scene_count: desc.scene_count,
            sections,
            fader_levels,
            send_level_steps,
            name_chars,
        });
    }

    pub fn section(&self, section: Section) -> Result<&SectionDef> {
        return self.sections.get(&section).ok_or_else(|| {
            AppError::config(format!("profile {} has no {} section", self.model, section))
        });
    }

    pub fn channel_code(&self, section: Section, number: u8) -> Result<u8> {
        return self.section(section)?.channel_code(section, number);
    }
}

/// Data byte written as hex or decimal text; must fit in 7 bits.
fn parse_code(src: &str) -> Result<u8> {
    let Ok(value) = parse_u8(src) else {
        return Err(AppError::config(format!("invalid code '{}'", src)));
    };
    if value > MIDI_MAX_DATA {
        return Err(AppError::config(format!("code '{}' exceeds 0x7f", src)));
    }
    return Ok(value);
}

/// profile loader
pub fn load_profiles<P: AsRef<Path>>(directory: P) -> BTreeMap<String, Profile> {
    let mut profiles = BTreeMap::new();

    for entry in WalkDir::new(directory) {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if entry.file_type().is_file() {
            let path = entry.path();
            if let Some(ext) = path.extension() {
                if ext == "yaml" || ext == "yml" {
                    match fs::read_to_string(path) {
                        Ok(content) => match Profile::from_yaml(&content) {
                            Ok(profile) => {
                                profiles.insert(profile.model.clone(), profile);
                            }
                            Err(e) => error!("Profile error in {:?}: {}", path, e),
                        },
                        Err(e) => error!("File read error in {:?}: {}", path, e),
                    }
                }
            }
        }
    }

    return profiles;
}

#[cfg(test)]
use std::eprintln as error;

#[cfg(test)]
pub fn avantis_profile() -> Profile {
    let mut profiles = load_profiles("profiles");
    let Some(profile) = profiles.remove("avantis") else {
        panic!("the avantis profile must be found");
    };
    profile
}

// primitive parsers ///////////////////////////////////////////

fn parse_uint<T>(
    src: &str,
    from_str_radix: fn(&str, u32) -> core::result::Result<T, ParseIntError>,
) -> core::result::Result<T, ParseIntError> {
    let s = src.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        from_str_radix(hex, 16)
    } else {
        from_str_radix(s, 10)
    }
}

pub fn parse_u8(src: &str) -> core::result::Result<u8, ParseIntError> {
    parse_uint(src, u8::from_str_radix)
}

pub fn parse_u16(src: &str) -> core::result::Result<u16, ParseIntError> {
    parse_uint(src, u16::from_str_radix)
}

use std::fmt;

use crate::avantis::{
    level::LevelSelection,
    name::Color,
    profile::{parse_u8, parse_u16},
};

#[derive(Debug, Clone)]
pub struct TypeError {}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid value type")
    }
}

impl std::error::Error for TypeError {}

/// Parsed session parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    Bool(bool),
    Text(String),
    ListU8(Vec<u8>),
    Level(LevelSelection),
    Color(Color),
}

impl Value {
    pub fn as_u8(&self) -> Result<u8, TypeError> {
        let Value::U8(value) = self else {
            return Err(TypeError {});
        };
        return Ok(*value);
    }

    pub fn as_u16(&self) -> Result<u16, TypeError> {
        let Value::U16(value) = self else {
            return Err(TypeError {});
        };
        return Ok(*value);
    }

    pub fn as_bool(&self) -> Result<bool, TypeError> {
        let Value::Bool(value) = self else {
            return Err(TypeError {});
        };
        return Ok(*value);
    }

    pub fn as_text(&self) -> Result<String, TypeError> {
        let Value::Text(value) = self else {
            return Err(TypeError {});
        };
        return Ok(value.clone());
    }

    pub fn as_list_u8(&self) -> Result<Vec<u8>, TypeError> {
        let Value::ListU8(value) = self else {
            return Err(TypeError {});
        };
        return Ok(value.clone());
    }

    pub fn as_level(&self) -> Result<LevelSelection, TypeError> {
        let Value::Level(value) = self else {
            return Err(TypeError {});
        };
        return Ok(value.clone());
    }

    pub fn as_color(&self) -> Result<Color, TypeError> {
        let Value::Color(value) = self else {
            return Err(TypeError {});
        };
        return Ok(*value);
    }
}

pub struct ParseParamError {}

pub struct Spec {
    pub name: String,
    pub required: bool,
    pub parse: fn(&str) -> Result<Value, ParseParamError>,
}

impl Spec {
    pub fn u8(name: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            required,
            parse: |src| match parse_u8(src) {
                Ok(value) => Ok(Value::U8(value)),
                Err(_) => Err(ParseParamError {}),
            },
        }
    }

    pub fn u16(name: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            required,
            parse: |src| match parse_u16(src) {
                Ok(value) => Ok(Value::U16(value)),
                Err(_) => Err(ParseParamError {}),
            },
        }
    }

    /// true/false or on/off
    pub fn bool(name: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            required,
            parse: |src| {
                return match src.trim().to_ascii_lowercase().as_str() {
                    "true" | "on" => Ok(Value::Bool(true)),
                    "false" | "off" => Ok(Value::Bool(false)),
                    _ => Err(ParseParamError {}),
                };
            },
        }
    }

    pub fn text(name: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            required,
            parse: |src| Ok(Value::Text(src.to_string())),
        }
    }

    /// Comma separated numbers, e.g. "2,4"
    pub fn list_u8(name: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            required,
            parse: |src| {
                let mut values = Vec::new();
                for item in src.split(',').filter(|item| !item.trim().is_empty()) {
                    let Ok(value) = parse_u8(item) else {
                        return Err(ParseParamError {});
                    };
                    values.push(value);
                }
                return Ok(Value::ListU8(values));
            },
        }
    }

    pub fn level(name: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            required,
            parse: |src| Ok(Value::Level(LevelSelection::parse(src))),
        }
    }

    pub fn color(name: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            required,
            parse: |src| match Color::parse(src) {
                Some(color) => Ok(Value::Color(color)),
                None => Err(ParseParamError {}),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(spec: &Spec, src: &str) -> Option<Value> {
        (spec.parse)(src).ok()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse(&Spec::u8("ch", true), "0x10"), Some(Value::U8(16)));
        assert_eq!(parse(&Spec::u8("ch", true), "256"), None);
        assert_eq!(parse(&Spec::u16("scene", true), "500"), Some(Value::U16(500)));
    }

    #[test]
    fn test_bool() {
        let spec = Spec::bool("mute", false);
        assert_eq!(parse(&spec, "on"), Some(Value::Bool(true)));
        assert_eq!(parse(&spec, "FALSE"), Some(Value::Bool(false)));
        assert_eq!(parse(&spec, "1"), None);
    }

    #[test]
    fn test_list() {
        let spec = Spec::list_u8("groups", true);
        assert_eq!(parse(&spec, "2,4"), Some(Value::ListU8(vec![2, 4])));
        assert_eq!(parse(&spec, "7"), Some(Value::ListU8(vec![7])));
        assert_eq!(parse(&spec, "2,x"), None);
    }

    #[test]
    fn test_level_and_color() {
        assert_eq!(
            parse(&Spec::level("level", true), "up"),
            Some(Value::Level(LevelSelection::StepUp))
        );
        assert_eq!(
            parse(&Spec::color("color", true), "lt blue"),
            Some(Value::Color(Color::LtBlue))
        );
        assert_eq!(parse(&Spec::color("color", true), "pink"), None);
    }
}

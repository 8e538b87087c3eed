use std::fmt;

use serde::Deserialize;

use crate::error::AppError;

use super::MIDI_MAX_NIBBLE;

/// Mixer function groups. Each occupies a MIDI channel offset from the
/// configured base channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Input,
    MonoGroup,
    StereoGroup,
    MonoAux,
    StereoAux,
    MonoMatrix,
    StereoMatrix,
    MonoFxSend,
    StereoFxSend,
    FxReturn,
    Dca,
    MuteGroup,
    Main,
}

impl Section {
    pub const ALL: [Section; 13] = [
        Section::Input,
        Section::MonoGroup,
        Section::StereoGroup,
        Section::MonoAux,
        Section::StereoAux,
        Section::MonoMatrix,
        Section::StereoMatrix,
        Section::MonoFxSend,
        Section::StereoFxSend,
        Section::FxReturn,
        Section::Dca,
        Section::MuteGroup,
        Section::Main,
    ];

    pub fn index(&self) -> u8 {
        return match self {
            Section::Input => 0,
            Section::MonoGroup | Section::StereoGroup => 1,
            Section::MonoAux | Section::StereoAux => 2,
            Section::MonoMatrix | Section::StereoMatrix => 3,
            Section::MonoFxSend
            | Section::StereoFxSend
            | Section::FxReturn
            | Section::Dca
            | Section::MuteGroup
            | Section::Main => 4,
        };
    }

    /// Status byte low nibble for this section.
    ///
    /// `midi_base` is the zero-based base channel. A sum above 15 would spill
    /// into the status class nibble, so it is rejected.
    pub fn midi_offset(&self, midi_base: u8) -> Result<u8, AppError> {
        let offset = midi_base as u16 + self.index() as u16;
        if offset > MIDI_MAX_NIBBLE as u16 {
            return Err(AppError::invalid_field(format!(
                "MIDI channel offset {} for {} exceeds 0x0f",
                offset, self
            )));
        }
        return Ok(offset as u8);
    }

    pub fn label(&self) -> &'static str {
        return match self {
            Section::Input => "Input Channel",
            Section::MonoGroup => "Mono Group",
            Section::StereoGroup => "Stereo Group",
            Section::MonoAux => "Mono Aux",
            Section::StereoAux => "Stereo Aux",
            Section::MonoMatrix => "Mono Matrix",
            Section::StereoMatrix => "Stereo Matrix",
            Section::MonoFxSend => "Mono FX Send",
            Section::StereoFxSend => "Stereo FX Send",
            Section::FxReturn => "FX Return",
            Section::Dca => "DCA",
            Section::MuteGroup => "Mute Group",
            Section::Main => "Main Mix",
        };
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

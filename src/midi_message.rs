use crate::{
    avantis::{self as av, SysExCommand, name::Color, scene::SceneAddress},
    error::AppError,
};

type Result<T> = std::result::Result<T, AppError>;

/// One wire-format message
pub type Buffer = Vec<u8>;

/// Collects message bytes, refusing anything that would not be a legal
/// status nibble or 7-bit data byte.
pub struct MidiMessage {
    bytes: Vec<u8>,
}

impl MidiMessage {
    pub fn new() -> Self {
        return Self { bytes: Vec::new() };
    }

    pub fn sysex(command: SysExCommand, midi_offset: u8) -> Result<Self> {
        let mut message = Self::new();
        message.bytes.extend_from_slice(&av::SYSEX_HEADER);
        message.nibble(midi_offset)?;
        message.data(command.into())?;
        return Ok(message);
    }

    pub fn status(&mut self, class: u8, midi_offset: u8) -> Result<()> {
        check_nibble(midi_offset)?;
        self.bytes.push(class | midi_offset);
        return Ok(());
    }

    /// Channel nibble carried as a data byte, as in SysEx payloads.
    pub fn nibble(&mut self, midi_offset: u8) -> Result<()> {
        check_nibble(midi_offset)?;
        self.bytes.push(midi_offset);
        return Ok(());
    }

    pub fn data(&mut self, value: u8) -> Result<()> {
        if value > av::MIDI_MAX_DATA {
            return Err(AppError::invalid_field(format!(
                "data byte {:#04x} exceeds 0x7f",
                value
            )));
        }
        self.bytes.push(value);
        return Ok(());
    }

    pub fn end_sysex(mut self) -> Buffer {
        self.bytes.push(av::SYSEX_END);
        return self.bytes;
    }

    pub fn into_buffer(self) -> Buffer {
        return self.bytes;
    }
}

fn check_nibble(midi_offset: u8) -> Result<()> {
    if midi_offset > av::MIDI_MAX_NIBBLE {
        return Err(AppError::invalid_field(format!(
            "MIDI channel offset {:#04x} exceeds 0x0f",
            midi_offset
        )));
    }
    return Ok(());
}

// templates ////////////////////////////////////////////////////

/// 9N, CH, 7F(3F), 9N, CH, 00
pub fn mute(midi_offset: u8, channel: u8, mute: bool) -> Result<Buffer> {
    let mut message = MidiMessage::new();
    message.status(av::MIDI_NOTE_ON, midi_offset)?;
    message.data(channel)?;
    message.data(if mute { av::MUTE_ON } else { av::MUTE_OFF })?;
    message.status(av::MIDI_NOTE_ON, midi_offset)?;
    message.data(channel)?;
    message.data(av::NOTE_RELEASE)?;
    return Ok(message.into_buffer());
}

/// BN, 63, CH, BN, 62, PARAM, BN, 06, VALUE
pub fn nrpn(midi_offset: u8, channel: u8, param: u8, value: u8) -> Result<Buffer> {
    let mut message = MidiMessage::new();
    message.status(av::MIDI_CONTROL_CHANGE, midi_offset)?;
    message.data(av::NRPN_PARAM_MSB)?;
    message.data(channel)?;
    message.status(av::MIDI_CONTROL_CHANGE, midi_offset)?;
    message.data(av::NRPN_PARAM_LSB)?;
    message.data(param)?;
    message.status(av::MIDI_CONTROL_CHANGE, midi_offset)?;
    message.data(av::NRPN_DATA_ENTRY)?;
    message.data(value)?;
    return Ok(message.into_buffer());
}

pub fn fader_level(midi_offset: u8, channel: u8, level: u8) -> Result<Buffer> {
    return nrpn(midi_offset, channel, av::NRPN_FADER_LEVEL, level);
}

pub fn main_assign(midi_offset: u8, channel: u8, assign: bool) -> Result<Buffer> {
    let value = if assign { av::ASSIGN_ON } else { av::ASSIGN_OFF };
    return nrpn(midi_offset, channel, av::NRPN_MAIN_ASSIGN, value);
}

pub fn group_assign(midi_offset: u8, channel: u8, group_code: u8) -> Result<Buffer> {
    return nrpn(midi_offset, channel, av::NRPN_GROUP_ASSIGN, group_code);
}

/// BN, 00, Bank, CN, SS
pub fn scene_recall(midi_offset: u8, address: &SceneAddress) -> Result<Buffer> {
    let mut message = MidiMessage::new();
    message.status(av::MIDI_CONTROL_CHANGE, midi_offset)?;
    message.data(av::CC_BANK_SELECT)?;
    message.data(address.bank)?;
    message.status(av::MIDI_PROGRAM_CHANGE, midi_offset)?;
    message.data(address.sub_index)?;
    return Ok(message.into_buffer());
}

/// SysEx Header, 0N, 03, CH, Name, F7
pub fn channel_name(midi_offset: u8, channel: u8, name: &[u8]) -> Result<Buffer> {
    let mut message = MidiMessage::sysex(SysExCommand::ChannelName, midi_offset)?;
    message.data(channel)?;
    for code in name {
        message.data(*code)?;
    }
    return Ok(message.end_sysex());
}

/// SysEx Header, 0N, 06, CH, Col, F7
pub fn channel_color(midi_offset: u8, channel: u8, color: Color) -> Result<Buffer> {
    let mut message = MidiMessage::sysex(SysExCommand::ChannelColor, midi_offset)?;
    message.data(channel)?;
    message.data(color.into())?;
    return Ok(message.end_sysex());
}

/// SysEx Header, 0N, 0D, CH, SndN, SndCH, LV, F7
pub fn send_level(
    src_offset: u8,
    src_channel: u8,
    dest_offset: u8,
    dest_channel: u8,
    level: u8,
) -> Result<Buffer> {
    let mut message = MidiMessage::sysex(SysExCommand::SendLevel, src_offset)?;
    message.data(src_channel)?;
    message.nibble(dest_offset)?;
    message.data(dest_channel)?;
    message.data(level)?;
    return Ok(message.end_sysex());
}

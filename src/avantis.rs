pub mod assign;
pub mod level;
pub mod name;
pub mod profile;
pub mod scene;
pub mod section;

use num_enum::{IntoPrimitive, TryFromPrimitive};

// Transport //////////////////////////////////////

pub const AVANTIS_TCP_PORT: u16 = 51325;

// Status byte classes ////////////////////////////

pub const MIDI_NOTE_ON: u8 = 0x90;
pub const MIDI_CONTROL_CHANGE: u8 = 0xB0;
pub const MIDI_PROGRAM_CHANGE: u8 = 0xC0;

pub const MIDI_MAX_NIBBLE: u8 = 0x0F;
pub const MIDI_MAX_DATA: u8 = 0x7F;

/* note velocities used by the mute message */
pub const MUTE_ON: u8 = 0x7F;
pub const MUTE_OFF: u8 = 0x3F;
pub const NOTE_RELEASE: u8 = 0x00;

/* NRPN framing */
pub const NRPN_PARAM_MSB: u8 = 0x63;
pub const NRPN_PARAM_LSB: u8 = 0x62;
pub const NRPN_DATA_ENTRY: u8 = 0x06;

pub const NRPN_FADER_LEVEL: u8 = 0x17;
pub const NRPN_MAIN_ASSIGN: u8 = 0x18;
pub const NRPN_GROUP_ASSIGN: u8 = 0x40;

pub const ASSIGN_ON: u8 = 0x7F;
pub const ASSIGN_OFF: u8 = 0x3F;

/* scene recall */
pub const CC_BANK_SELECT: u8 = 0x00;
pub const SCENE_BANK_SIZE: u16 = 128;
pub const SCENE_MAX_BANK: u8 = 3;

// System exclusive ///////////////////////////////

pub const SYSEX_HEADER: [u8; 8] = [0xF0, 0x00, 0x00, 0x1A, 0x50, 0x10, 0x01, 0x00];
pub const SYSEX_END: u8 = 0xF7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SysExCommand {
    ChannelName = 0x03,
    ChannelColor = 0x06,
    SendLevel = 0x0D,
}

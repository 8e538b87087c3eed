use crate::{
    avantis::MIDI_MAX_DATA,
    error::{AppError, ErrorType},
    midi_message::{self, Buffer},
};

/// Target of a group assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Dca,
    MuteGroup,
}

/// Offsets added to a group index to form the assign data byte.
///
/// Known firmware revisions disagree on these values, so every entry is
/// configurable and a missing one is an error rather than a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssignPolicy {
    pub dca_on: Option<u8>,
    pub dca_off: Option<u8>,
    pub mute_on: Option<u8>,
    pub mute_off: Option<u8>,
}

impl AssignPolicy {
    pub const REVISIONS: [&'static str; 2] = ["legacy", "inverted"];

    pub fn legacy() -> Self {
        Self {
            dca_on: Some(0x40),
            dca_off: Some(0x00),
            mute_on: Some(0x50),
            mute_off: Some(0x10),
        }
    }

    /// Same as legacy with the mute group on/off offsets swapped.
    pub fn inverted() -> Self {
        Self {
            mute_on: Some(0x10),
            mute_off: Some(0x50),
            ..Self::legacy()
        }
    }

    pub fn revision(name: &str) -> Option<Self> {
        return match name {
            "legacy" => Some(Self::legacy()),
            "inverted" => Some(Self::inverted()),
            "none" => Some(Self::default()),
            _ => None,
        };
    }

    pub fn offset(&self, kind: GroupKind, assign: bool) -> Result<u8, AppError> {
        let entry = match (kind, assign) {
            (GroupKind::Dca, true) => self.dca_on,
            (GroupKind::Dca, false) => self.dca_off,
            (GroupKind::MuteGroup, true) => self.mute_on,
            (GroupKind::MuteGroup, false) => self.mute_off,
        };
        return entry.ok_or_else(|| {
            AppError::new(
                ErrorType::AssignOffsetAmbiguous,
                format!(
                    "no assign offset configured for {:?} assign={}",
                    kind, assign
                ),
            )
        });
    }
}

pub struct AssignEncoder {
    policy: AssignPolicy,
}

impl AssignEncoder {
    pub fn new(policy: AssignPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AssignPolicy {
        &self.policy
    }

    /// One message per group index, in the order given.
    pub fn encode(
        &self,
        midi_offset: u8,
        channel: u8,
        group_indices: &[u8],
        assign: bool,
        kind: GroupKind,
    ) -> Result<Vec<Buffer>, AppError> {
        let offset = self.policy.offset(kind, assign)?;
        let mut buffers = Vec::with_capacity(group_indices.len());
        for index in group_indices {
            let group_code = offset as u16 + *index as u16;
            if group_code > MIDI_MAX_DATA as u16 {
                return Err(AppError::invalid_field(format!(
                    "group code {:#x} exceeds 0x7f",
                    group_code
                )));
            }
            buffers.push(midi_message::group_assign(
                midi_offset,
                channel,
                group_code as u8,
            )?);
        }
        return Ok(buffers);
    }
}

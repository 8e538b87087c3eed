use crate::error::AppError;

use super::{SCENE_BANK_SIZE, SCENE_MAX_BANK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneAddress {
    pub bank: u8,
    pub sub_index: u8,
}

impl SceneAddress {
    /// Address of a 1-based scene ordinal. Banks past the last one are
    /// folded into it.
    fn of(ordinal: u16) -> Self {
        let position = ordinal - 1;
        let bank = (position / SCENE_BANK_SIZE).min(SCENE_MAX_BANK as u16) as u8;
        let sub_index = (position % SCENE_BANK_SIZE) as u8;
        Self { bank, sub_index }
    }
}

/// Precomputed scene addresses for 1..=scene_count
#[derive(Debug, Clone)]
pub struct SceneTable {
    addresses: Vec<SceneAddress>,
}

impl SceneTable {
    pub fn new(scene_count: u16) -> Self {
        let addresses = (1..=scene_count).map(SceneAddress::of).collect();
        Self { addresses }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn resolve(&self, ordinal: u16) -> Result<SceneAddress, AppError> {
        if ordinal < 1 {
            return Err(AppError::out_of_range(format!(
                "scene {} is out of range 1..={}",
                ordinal,
                self.len()
            )));
        }
        return match self.addresses.get(ordinal as usize - 1) {
            Some(address) => Ok(*address),
            None => Err(AppError::out_of_range(format!(
                "scene {} is out of range 1..={}",
                ordinal,
                self.len()
            ))),
        };
    }
}

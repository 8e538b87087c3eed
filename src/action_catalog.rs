use std::collections::BTreeMap;

use lazy_static::lazy_static;

use crate::avantis::{assign::GroupKind, section::Section};

/// Encoder a catalog action is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Mute,
    Fader,
    MainAssign,
    GroupAssign(GroupKind),
    SceneRecall,
    ChannelName,
    ChannelColor,
    SendLevel { dest: Section },
    /// send level picked from the numbered send level steps
    SendLevelIndex { dest: Section },
}

/// Operator-selectable action. `section` is where the channel option is
/// looked up.
#[derive(Debug, Clone)]
pub struct ActionDef {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: ActionKind,
    pub section: Section,
}

impl ActionDef {
    const fn new(
        id: &'static str,
        label: &'static str,
        kind: ActionKind,
        section: Section,
    ) -> Self {
        Self {
            id,
            label,
            kind,
            section,
        }
    }
}

static ACTIONS: [ActionDef; 40] = [
    // mute
    ActionDef::new("mute_input", "Mute Input", ActionKind::Mute, Section::Input),
    ActionDef::new("mute_master", "Mute Main", ActionKind::Mute, Section::Main),
    ActionDef::new("mute_mono_group", "Mute Mono Group", ActionKind::Mute, Section::MonoGroup),
    ActionDef::new("mute_stereo_group", "Mute Stereo Group", ActionKind::Mute, Section::StereoGroup),
    ActionDef::new("mute_mono_aux", "Mute Mono Aux", ActionKind::Mute, Section::MonoAux),
    ActionDef::new("mute_stereo_aux", "Mute Stereo Aux", ActionKind::Mute, Section::StereoAux),
    ActionDef::new("mute_mono_matrix", "Mute Mono Matrix", ActionKind::Mute, Section::MonoMatrix),
    ActionDef::new("mute_stereo_matrix", "Mute Stereo Matrix", ActionKind::Mute, Section::StereoMatrix),
    ActionDef::new("mute_mono_fx_send", "Mute Mono FX Send", ActionKind::Mute, Section::MonoFxSend),
    ActionDef::new("mute_stereo_fx_send", "Mute Stereo FX Send", ActionKind::Mute, Section::StereoFxSend),
    ActionDef::new("mute_fx_return", "Mute FX Return", ActionKind::Mute, Section::FxReturn),
    ActionDef::new("mute_group", "Mute Group", ActionKind::Mute, Section::MuteGroup),
    ActionDef::new("mute_dca", "Mute DCA", ActionKind::Mute, Section::Dca),
    // fader
    ActionDef::new("fader_input", "Set Input Fader to Level", ActionKind::Fader, Section::Input),
    ActionDef::new("fader_mono_group", "Set Mono Group Master Fader to Level", ActionKind::Fader, Section::MonoGroup),
    ActionDef::new("fader_stereo_group", "Set Stereo Group Master Fader to Level", ActionKind::Fader, Section::StereoGroup),
    ActionDef::new("fader_mono_aux", "Set Mono Aux Master Fader to Level", ActionKind::Fader, Section::MonoAux),
    ActionDef::new("fader_stereo_aux", "Set Stereo Aux Master Fader to Level", ActionKind::Fader, Section::StereoAux),
    ActionDef::new("fader_mono_matrix", "Set Mono Matrix Master Fader to Level", ActionKind::Fader, Section::MonoMatrix),
    ActionDef::new("fader_stereo_matrix", "Set Stereo Matrix Master Fader to Level", ActionKind::Fader, Section::StereoMatrix),
    ActionDef::new("fader_mono_fx_send", "Set Mono FX Send Master Fader to Level", ActionKind::Fader, Section::MonoFxSend),
    ActionDef::new("fader_stereo_fx_send", "Set Stereo FX Send Master Fader to Level", ActionKind::Fader, Section::StereoFxSend),
    ActionDef::new("fader_master", "Set Main Master Fader to Level", ActionKind::Fader, Section::Main),
    ActionDef::new("fader_fx_return", "Set FX Return Fader to Level", ActionKind::Fader, Section::FxReturn),
    ActionDef::new("fader_dca", "Set DCA Fader to Level", ActionKind::Fader, Section::Dca),
    // routing
    ActionDef::new("dca_assign", "Assign DCA Groups for channel", ActionKind::GroupAssign(GroupKind::Dca), Section::Input),
    ActionDef::new("mute_group_assign", "Assign Mute Groups for channel", ActionKind::GroupAssign(GroupKind::MuteGroup), Section::Input),
    ActionDef::new("channel_main_assign", "Assign Channel to Main Mix", ActionKind::MainAssign, Section::Input),
    // scenes and channel setup
    ActionDef::new("scene_recall", "Scene recall", ActionKind::SceneRecall, Section::Input),
    ActionDef::new("channel_name", "Set Channel Name", ActionKind::ChannelName, Section::Input),
    ActionDef::new("channel_color", "Set Channel Color", ActionKind::ChannelColor, Section::Input),
    // sends
    ActionDef::new("send_input_to_mono_aux", "Send Input to Mono Aux", ActionKind::SendLevel { dest: Section::MonoAux }, Section::Input),
    ActionDef::new("send_input_to_mono_aux_number", "Send Input to Mono Aux (Number)", ActionKind::SendLevelIndex { dest: Section::MonoAux }, Section::Input),
    ActionDef::new("send_input_to_stereo_aux", "Send Input to Stereo Aux", ActionKind::SendLevel { dest: Section::StereoAux }, Section::Input),
    ActionDef::new("send_input_to_mono_matrix", "Send Input to Mono Matrix", ActionKind::SendLevel { dest: Section::MonoMatrix }, Section::Input),
    ActionDef::new("send_input_to_stereo_matrix", "Send Input to Stereo Matrix", ActionKind::SendLevel { dest: Section::StereoMatrix }, Section::Input),
    ActionDef::new("send_input_to_fx_return", "Send Input to FX Return", ActionKind::SendLevel { dest: Section::FxReturn }, Section::Input),
    ActionDef::new("send_input_to_mono_fx_return", "Send Input to Mono FX Return", ActionKind::SendLevel { dest: Section::MonoFxSend }, Section::Input),
    ActionDef::new("send_input_to_stereo_fx_return", "Send Input to Stereo FX Return", ActionKind::SendLevel { dest: Section::StereoFxSend }, Section::Input),
    ActionDef::new("send_input_to", "Send Input to", ActionKind::SendLevel { dest: Section::Main }, Section::Input),
];

/// Alternative ids, mapped to the catalog id
const ALIASES: [(&str, &str); 1] = [("fader_DCA", "fader_dca")];

lazy_static! {
    pub static ref ACTION_DEFS: BTreeMap<&'static str, ActionDef> = {
        let mut defs = BTreeMap::new();
        for def in ACTIONS.iter() {
            defs.insert(def.id, def.clone());
        }
        for (alias, id) in ALIASES {
            if let Some(def) = defs.get(id).cloned() {
                defs.insert(alias, def);
            }
        }
        defs
    };
}

pub fn get(action_id: &str) -> Option<&'static ActionDef> {
    ACTION_DEFS.get(action_id)
}

/// All actions in catalog order
pub fn all() -> impl Iterator<Item = &'static ActionDef> {
    ACTIONS.iter()
}

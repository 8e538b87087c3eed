use std::sync::Arc;

use crate::{
    action_catalog::{self, ActionKind},
    avantis::{
        assign::{AssignEncoder, AssignPolicy, GroupKind},
        level::{LevelCodec, LevelSelection},
        name::{Color, NameCodec},
        profile::Profile,
        scene::SceneTable,
        section::Section,
    },
    error::{AppError, ErrorType},
    midi_message::{self, Buffer},
};

type Result<T> = std::result::Result<T, AppError>;

/// Option values of one action invocation. Channel and group numbers are
/// 1-based as the operator sees them.
#[derive(Debug, Clone, Default)]
pub struct ActionOptions {
    pub channel: Option<u8>,
    pub mute: Option<bool>,
    pub assign: Option<bool>,
    pub groups: Vec<u8>,
    pub level: Option<LevelSelection>,
    /// last level code sent for the target, needed by step levels
    pub last_level: Option<u8>,
    pub scene: Option<u16>,
    pub name: Option<String>,
    pub color: Option<Color>,
    pub dest_channel: Option<u8>,
}

fn require<T: Clone>(value: &Option<T>, name: &str) -> Result<T> {
    return value.clone().ok_or_else(|| AppError::missing_option(name));
}

/// Turns actions into wire buffers. Holds only read-only tables, so the
/// same inputs always give the same output.
pub struct CommandEncoder {
    profile: Arc<Profile>,
    midi_base: u8,
    scenes: SceneTable,
    levels: LevelCodec,
    names: NameCodec,
    assign: AssignEncoder,
}

impl CommandEncoder {
    /// `midi_base` is the zero-based MIDI channel the console listens on.
    pub fn new(profile: Arc<Profile>, midi_base: u8, policy: AssignPolicy) -> Result<Self> {
        let scenes = SceneTable::new(profile.scene_count);
        let levels = LevelCodec::new(&profile)?;
        let names = NameCodec::new(&profile);
        return Ok(Self {
            profile,
            midi_base,
            scenes,
            levels,
            names,
            assign: AssignEncoder::new(policy),
        });
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn levels(&self) -> &LevelCodec {
        &self.levels
    }

    pub fn scenes(&self) -> &SceneTable {
        &self.scenes
    }

    pub fn assign_policy(&self) -> &AssignPolicy {
        self.assign.policy()
    }

    /// Encode a catalog action by id.
    pub fn encode_action(&self, action_id: &str, options: &ActionOptions) -> Result<Vec<Buffer>> {
        let Some(def) = action_catalog::get(action_id) else {
            return Err(AppError::new(
                ErrorType::UnknownAction,
                format!("no such action: {}", action_id),
            ));
        };
        return self.encode(def.kind, def.section, options);
    }

    pub fn encode(
        &self,
        kind: ActionKind,
        section: Section,
        options: &ActionOptions,
    ) -> Result<Vec<Buffer>> {
        let buffers = match kind {
            ActionKind::Mute => vec![self.encode_mute(section, options)?],
            ActionKind::Fader => vec![self.encode_fader(section, options)?],
            ActionKind::MainAssign => vec![self.encode_main_assign(section, options)?],
            ActionKind::GroupAssign(group_kind) => {
                self.encode_group_assign(section, group_kind, options)?
            }
            ActionKind::SceneRecall => vec![self.encode_scene(section, options)?],
            ActionKind::ChannelName => vec![self.encode_name(section, options)?],
            ActionKind::ChannelColor => vec![self.encode_color(section, options)?],
            ActionKind::SendLevel { dest } | ActionKind::SendLevelIndex { dest } => {
                vec![self.encode_send_level(section, dest, options)?]
            }
        };
        for (i, buffer) in buffers.iter().enumerate() {
            log::debug!(
                "encoded {:?} {} [{}/{}]: {}",
                kind,
                section,
                i + 1,
                buffers.len(),
                hex::encode(buffer)
            );
        }
        return Ok(buffers);
    }

    fn channel(&self, section: Section, number: &Option<u8>) -> Result<u8> {
        let number = require(number, "channel")?;
        return self.profile.channel_code(section, number);
    }

    fn encode_mute(&self, section: Section, options: &ActionOptions) -> Result<Buffer> {
        let midi_offset = section.midi_offset(self.midi_base)?;
        let channel = self.channel(section, &options.channel)?;
        let mute = require(&options.mute, "mute")?;
        return midi_message::mute(midi_offset, channel, mute);
    }

    fn encode_fader(&self, section: Section, options: &ActionOptions) -> Result<Buffer> {
        let midi_offset = section.midi_offset(self.midi_base)?;
        let channel = self.channel(section, &options.channel)?;
        let selection = require(&options.level, "level")?;
        let level = self.levels.resolve(&selection, options.last_level)?;
        return midi_message::fader_level(midi_offset, channel, level);
    }

    fn encode_main_assign(&self, section: Section, options: &ActionOptions) -> Result<Buffer> {
        let midi_offset = section.midi_offset(self.midi_base)?;
        let channel = self.channel(section, &options.channel)?;
        let assign = require(&options.assign, "assign")?;
        return midi_message::main_assign(midi_offset, channel, assign);
    }

    fn encode_group_assign(
        &self,
        section: Section,
        group_kind: GroupKind,
        options: &ActionOptions,
    ) -> Result<Vec<Buffer>> {
        let target = match group_kind {
            GroupKind::Dca => Section::Dca,
            GroupKind::MuteGroup => Section::MuteGroup,
        };
        // the message travels on the group section's channel
        let midi_offset = target.midi_offset(self.midi_base)?;
        let channel = self.channel(section, &options.channel)?;
        let assign = require(&options.assign, "assign")?;

        let count = self.profile.section(target)?.count;
        let mut indices = Vec::with_capacity(options.groups.len());
        for number in &options.groups {
            if *number < 1 || *number > count {
                return Err(AppError::out_of_range(format!(
                    "{} {} is out of range 1..={}",
                    target, number, count
                )));
            }
            indices.push(number - 1);
        }
        return self
            .assign
            .encode(midi_offset, channel, &indices, assign, group_kind);
    }

    fn encode_scene(&self, section: Section, options: &ActionOptions) -> Result<Buffer> {
        let midi_offset = section.midi_offset(self.midi_base)?;
        let scene = require(&options.scene, "scene")?;
        let address = self.scenes.resolve(scene)?;
        return midi_message::scene_recall(midi_offset, &address);
    }

    fn encode_name(&self, section: Section, options: &ActionOptions) -> Result<Buffer> {
        let midi_offset = section.midi_offset(self.midi_base)?;
        let channel = self.channel(section, &options.channel)?;
        let name = require(&options.name, "name")?;
        let codes = self.names.encode(&name);
        return midi_message::channel_name(midi_offset, channel, &codes);
    }

    fn encode_color(&self, section: Section, options: &ActionOptions) -> Result<Buffer> {
        let midi_offset = section.midi_offset(self.midi_base)?;
        let channel = self.channel(section, &options.channel)?;
        let color = require(&options.color, "color")?;
        return midi_message::channel_color(midi_offset, channel, color);
    }

    fn encode_send_level(
        &self,
        section: Section,
        dest: Section,
        options: &ActionOptions,
    ) -> Result<Buffer> {
        let src_offset = section.midi_offset(self.midi_base)?;
        let dest_offset = dest.midi_offset(self.midi_base)?;
        let src_channel = self.channel(section, &options.channel)?;
        let dest_channel = self.channel(dest, &options.dest_channel)?;
        let selection = require(&options.level, "level")?;
        let level = self.levels.resolve(&selection, options.last_level)?;
        return midi_message::send_level(src_offset, src_channel, dest_offset, dest_channel, level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avantis::profile::avantis_profile;

    fn encoder(midi_base: u8) -> CommandEncoder {
        CommandEncoder::new(Arc::new(avantis_profile()), midi_base, AssignPolicy::legacy())
            .unwrap()
    }

    fn channel(number: u8) -> ActionOptions {
        ActionOptions {
            channel: Some(number),
            ..ActionOptions::default()
        }
    }

    #[test]
    fn test_scene_recall_end_to_end() {
        let encoder = encoder(0);
        let options = ActionOptions {
            scene: Some(129),
            ..ActionOptions::default()
        };
        let buffers = encoder.encode_action("scene_recall", &options).unwrap();
        assert_eq!(buffers, vec![vec![0xb0, 0x00, 0x01, 0xc0, 0x00]]);
    }

    #[test]
    fn test_mute_per_section() {
        let encoder = encoder(0);
        let options = ActionOptions {
            mute: Some(true),
            ..channel(1)
        };
        let cases = [
            ("mute_input", 0x90, 0x00),
            ("mute_mono_group", 0x91, 0x00),
            ("mute_stereo_aux", 0x92, 0x40),
            ("mute_mono_matrix", 0x93, 0x00),
            ("mute_stereo_fx_send", 0x94, 0x10),
            ("mute_fx_return", 0x94, 0x20),
            ("mute_dca", 0x94, 0x36),
            ("mute_group", 0x94, 0x46),
            ("mute_master", 0x94, 0x30),
        ];
        for (action_id, status, code) in cases {
            let buffers = encoder.encode_action(action_id, &options).unwrap();
            assert_eq!(buffers.len(), 1, "{}", action_id);
            assert_eq!(
                buffers[0],
                vec![status, code, 0x7f, status, code, 0x00],
                "{}",
                action_id
            );
        }

        let unmute = ActionOptions {
            mute: Some(false),
            ..channel(3)
        };
        let buffers = encoder.encode_action("mute_input", &unmute).unwrap();
        assert_eq!(buffers[0], vec![0x90, 0x02, 0x3f, 0x90, 0x02, 0x00]);
    }

    #[test]
    fn test_fader_level() {
        let encoder = encoder(0);
        let options = ActionOptions {
            level: Some(LevelSelection::parse("0")),
            ..channel(2)
        };
        let buffers = encoder.encode_action("fader_dca", &options).unwrap();
        assert_eq!(
            buffers[0],
            vec![0xb4, 0x63, 0x37, 0xb4, 0x62, 0x17, 0xb4, 0x06, 0x6b]
        );

        let step = ActionOptions {
            level: Some(LevelSelection::StepDown),
            ..channel(2)
        };
        let Err(e) = encoder.encode_action("fader_dca", &step) else {
            panic!("step without last level must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::UnsupportedStep);

        let step = ActionOptions {
            last_level: Some(0x6b),
            ..step
        };
        let buffers = encoder.encode_action("fader_dca", &step).unwrap();
        assert_eq!(buffers[0][8], 0x69);
    }

    #[test]
    fn test_group_assign() {
        let encoder = encoder(0);
        let options = ActionOptions {
            groups: vec![3, 5],
            assign: Some(true),
            ..channel(6)
        };
        let buffers = encoder.encode_action("dca_assign", &options).unwrap();
        assert_eq!(
            buffers,
            vec![
                vec![0xb4, 0x63, 0x05, 0xb4, 0x62, 0x40, 0xb4, 0x06, 0x42],
                vec![0xb4, 0x63, 0x05, 0xb4, 0x62, 0x40, 0xb4, 0x06, 0x44],
            ]
        );

        let off = ActionOptions {
            groups: vec![1],
            assign: Some(false),
            ..channel(1)
        };
        let buffers = encoder.encode_action("mute_group_assign", &off).unwrap();
        assert_eq!(buffers[0][8], 0x10);

        let beyond = ActionOptions {
            groups: vec![1, 9],
            assign: Some(true),
            ..channel(1)
        };
        let Err(e) = encoder.encode_action("mute_group_assign", &beyond) else {
            panic!("mute group 9 must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::OutOfRange);
    }

    #[test]
    fn test_main_assign() {
        let encoder = encoder(1);
        let options = ActionOptions {
            assign: Some(true),
            ..channel(1)
        };
        let buffers = encoder
            .encode_action("channel_main_assign", &options)
            .unwrap();
        assert_eq!(
            buffers[0],
            vec![0xb1, 0x63, 0x00, 0xb1, 0x62, 0x18, 0xb1, 0x06, 0x7f]
        );
    }

    #[test]
    fn test_channel_name_and_color() {
        let encoder = encoder(0);
        let options = ActionOptions {
            name: Some("Gtr\u{00e9}".to_string()),
            ..channel(10)
        };
        let buffers = encoder.encode_action("channel_name", &options).unwrap();
        assert_eq!(
            buffers[0],
            vec![0xf0, 0x00, 0x00, 0x1a, 0x50, 0x10, 0x01, 0x00, 0x00, 0x03, 0x09, 0x47, 0x74, 0x72, 0xf7]
        );

        let options = ActionOptions {
            color: Some(Color::White),
            ..channel(10)
        };
        let buffers = encoder.encode_action("channel_color", &options).unwrap();
        assert_eq!(
            buffers[0],
            vec![0xf0, 0x00, 0x00, 0x1a, 0x50, 0x10, 0x01, 0x00, 0x00, 0x06, 0x09, 0x07, 0xf7]
        );
    }

    #[test]
    fn test_send_level() {
        let encoder = encoder(0);
        let options = ActionOptions {
            dest_channel: Some(2),
            level: Some(LevelSelection::parse("-10")),
            ..channel(1)
        };
        let buffers = encoder
            .encode_action("send_input_to_stereo_aux", &options)
            .unwrap();
        assert_eq!(
            buffers[0],
            vec![
                0xf0, 0x00, 0x00, 0x1a, 0x50, 0x10, 0x01, 0x00, 0x00, 0x0d, 0x00, 0x02, 0x41,
                0x57, 0xf7
            ]
        );

        let buffers = encoder.encode_action("send_input_to", &options).unwrap();
        assert_eq!(&buffers[0][8..], &[0x00, 0x0d, 0x00, 0x04, 0x31, 0x57, 0xf7]);
    }

    #[test]
    fn test_send_level_by_number() {
        let encoder = encoder(0);
        let options = ActionOptions {
            dest_channel: Some(2),
            level: Some(LevelSelection::Index(9)),
            ..channel(1)
        };
        let buffers = encoder
            .encode_action("send_input_to_mono_aux_number", &options)
            .unwrap();
        assert_eq!(
            buffers[0],
            vec![
                0xf0, 0x00, 0x00, 0x1a, 0x50, 0x10, 0x01, 0x00, 0x00, 0x0d, 0x00, 0x02, 0x01,
                0x57, 0xf7
            ]
        );

        let options = ActionOptions {
            level: Some(LevelSelection::Index(20)),
            ..options
        };
        let Err(e) = encoder.encode_action("send_input_to_mono_aux_number", &options) else {
            panic!("send level 20 must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::OutOfRange);
    }

    #[test]
    fn test_fader_dca_alias() {
        let encoder = encoder(0);
        let options = ActionOptions {
            level: Some(LevelSelection::parse("0")),
            ..channel(1)
        };
        assert_eq!(
            encoder.encode_action("fader_DCA", &options).unwrap(),
            encoder.encode_action("fader_dca", &options).unwrap()
        );
    }

    #[test]
    fn test_midi_base_boundary() {
        let options = ActionOptions {
            mute: Some(true),
            ..channel(1)
        };
        let buffers = encoder(11).encode_action("mute_master", &options).unwrap();
        assert_eq!(buffers[0][0], 0x9f);

        let Err(e) = encoder(12).encode_action("mute_master", &options) else {
            panic!("offset 16 must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::InvalidField);

        // the source channel fits but the destination does not
        let send = ActionOptions {
            dest_channel: Some(1),
            level: Some(LevelSelection::parse("0")),
            ..channel(1)
        };
        let Err(e) = encoder(12).encode_action("send_input_to", &send) else {
            panic!("destination offset 16 must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::InvalidField);
    }

    #[test]
    fn test_idempotence() {
        let encoder = encoder(3);
        let options = ActionOptions {
            groups: vec![1, 2, 16],
            assign: Some(true),
            ..channel(64)
        };
        let first = encoder.encode_action("dca_assign", &options).unwrap();
        let second = encoder.encode_action("dca_assign", &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejections() {
        let encoder = encoder(0);
        let Err(e) = encoder.encode_action("fader_vca", &channel(1)) else {
            panic!("unknown action must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::UnknownAction);

        let Err(e) = encoder.encode_action("mute_input", &channel(1)) else {
            panic!("missing mute flag must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::MissingOption);

        let options = ActionOptions {
            mute: Some(true),
            ..channel(4)
        };
        let Err(e) = encoder.encode_action("mute_master", &options) else {
            panic!("main 4 must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::OutOfRange);

        let options = ActionOptions {
            scene: Some(501),
            ..ActionOptions::default()
        };
        let Err(e) = encoder.encode_action("scene_recall", &options) else {
            panic!("scene 501 must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::OutOfRange);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{
    mpsc::{Receiver, Sender, channel},
    oneshot,
};

use crate::{
    action_catalog::{self, ActionDef, ActionKind},
    avantis::{level::LevelSelection, section::Section},
    command::Command,
    encoder::{ActionOptions, CommandEncoder},
    error::{AppError, ErrorType},
    midi_message::Buffer,
    transport::Burst,
};

type Result<T> = std::result::Result<T, AppError>;

/// Where a level value lives on the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LevelKey {
    Fader(Section, u8),
    Send {
        channel: u8,
        dest: Section,
        dest_channel: u8,
    },
}

impl LevelKey {
    fn of(def: &ActionDef, options: &ActionOptions) -> Option<Self> {
        let channel = options.channel?;
        return match def.kind {
            ActionKind::Fader => Some(LevelKey::Fader(def.section, channel)),
            ActionKind::SendLevel { dest } | ActionKind::SendLevelIndex { dest } => {
                Some(LevelKey::Send {
                    channel,
                    dest,
                    dest_channel: options.dest_channel?,
                })
            }
            _ => None,
        };
    }
}

/// Serializes operator actions onto the console link.
pub struct ConsoleControl {
    encoder: Arc<CommandEncoder>,
    burst_tx: Sender<Burst>,
    /// levels the console acknowledged
    last_levels: HashMap<LevelKey, u8>,
    confirmed_tx: Sender<(LevelKey, u8)>,
    confirmed_rx: Receiver<(LevelKey, u8)>,
}

impl ConsoleControl {
    pub fn new(encoder: Arc<CommandEncoder>, burst_tx: Sender<Burst>) -> Self {
        let (confirmed_tx, confirmed_rx) = channel(64);
        Self {
            encoder,
            burst_tx,
            last_levels: HashMap::new(),
            confirmed_tx,
            confirmed_rx,
        }
    }

    pub async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Hi { resp } => {
                reply(resp, Ok(format!("hello from {}", self.encoder.profile().model)))
            }
            Command::Action {
                action_id,
                options,
                resp,
            } => self.action(&action_id, options, resp).await,
            Command::ListActions { resp } => {
                let actions = action_catalog::all()
                    .map(|def| (def.id.to_string(), def.label.to_string()))
                    .collect();
                reply(resp, Ok(actions));
            }
            Command::ListLevels { resp } => {
                let levels = self
                    .encoder
                    .levels()
                    .levels()
                    .map(|(label, code)| (label.to_string(), code))
                    .collect();
                reply(resp, Ok(levels));
            }
            Command::SceneCount { resp } => {
                reply(resp, Ok(self.encoder.scenes().len() as u16));
            }
        }
    }

    async fn action(
        &mut self,
        action_id: &str,
        options: ActionOptions,
        resp: oneshot::Sender<Result<Vec<Buffer>>>,
    ) {
        self.apply_confirmed_levels();
        let (buffers, level_update) = match self.encode(action_id, options) {
            Ok(encoded) => encoded,
            Err(e) => {
                reply(resp, Err(e));
                return;
            }
        };
        log::info!("{}: sending {} buffer(s)", action_id, buffers.len());

        let (burst_resp_tx, burst_resp_rx) = oneshot::channel();
        let burst = Burst {
            buffers: buffers.clone(),
            resp: burst_resp_tx,
        };
        if self.burst_tx.send(burst).await.is_err() {
            reply(resp, Err(AppError::runtime("transport is not running")));
            return;
        }

        // the link may be slow; keep accepting commands meanwhile
        let confirmed_tx = self.confirmed_tx.clone();
        tokio::spawn(async move {
            let result = match burst_resp_rx.await {
                Ok(Ok(())) => Ok(buffers),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(AppError::runtime("transport dropped the burst")),
            };
            // a level is remembered only once the console has it
            if let (Ok(_), Some(update)) = (&result, level_update) {
                if confirmed_tx.send(update).await.is_err() {
                    log::debug!("Controller has gone before the level confirmation");
                }
            }
            reply(resp, result);
        });
    }

    fn apply_confirmed_levels(&mut self) {
        while let Ok((key, level)) = self.confirmed_rx.try_recv() {
            self.last_levels.insert(key, level);
        }
    }

    /// Encodes an action. Step levels are resolved against the last level the
    /// console acknowledged for the same target unless the caller gave one.
    fn encode(
        &self,
        action_id: &str,
        mut options: ActionOptions,
    ) -> Result<(Vec<Buffer>, Option<(LevelKey, u8)>)> {
        let Some(def) = action_catalog::get(action_id) else {
            return Err(AppError::new(
                ErrorType::UnknownAction,
                format!("no such action: {}", action_id),
            ));
        };

        let mut level_update = None;
        if let (Some(key), Some(selection)) = (LevelKey::of(def, &options), options.level.clone())
        {
            let last_level = options
                .last_level
                .or_else(|| self.last_levels.get(&key).copied());
            let level = self.encoder.levels().resolve(&selection, last_level)?;
            options.level = Some(LevelSelection::Code(level));
            level_update = Some((key, level));
        }

        let buffers = self.encoder.encode(def.kind, def.section, &options)?;
        return Ok((buffers, level_update));
    }
}

fn reply<T>(resp: oneshot::Sender<Result<T>>, result: Result<T>) {
    if resp.send(result).is_err() {
        log::warn!("Requester has gone before the reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avantis::{assign::AssignPolicy, profile::avantis_profile};

    fn controller() -> (ConsoleControl, Receiver<Burst>) {
        let encoder =
            CommandEncoder::new(Arc::new(avantis_profile()), 0, AssignPolicy::legacy()).unwrap();
        let (burst_tx, burst_rx) = channel(4);
        (ConsoleControl::new(Arc::new(encoder), burst_tx), burst_rx)
    }

    /// Acknowledges every burst and hands its buffers back to the test.
    fn fake_console(mut burst_rx: Receiver<Burst>) -> Receiver<Vec<Buffer>> {
        let (sent_tx, sent_rx) = channel(16);
        tokio::spawn(async move {
            while let Some(burst) = burst_rx.recv().await {
                sent_tx.send(burst.buffers).await.unwrap();
                burst.resp.send(Ok(())).unwrap();
            }
        });
        sent_rx
    }

    /// Fails every burst the way a dropped link does.
    fn broken_console(mut burst_rx: Receiver<Burst>) {
        tokio::spawn(async move {
            while let Some(burst) = burst_rx.recv().await {
                let error = AppError::transport("write failed: broken pipe".to_string());
                burst.resp.send(Err(error)).unwrap();
            }
        });
    }

    async fn act(
        controller: &mut ConsoleControl,
        action_id: &str,
        options: ActionOptions,
    ) -> Result<Vec<Buffer>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        controller
            .handle_command(Command::Action {
                action_id: action_id.to_string(),
                options,
                resp: resp_tx,
            })
            .await;
        resp_rx.await.unwrap()
    }

    fn fader(channel: u8, level: &str) -> ActionOptions {
        ActionOptions {
            channel: Some(channel),
            level: Some(LevelSelection::parse(level)),
            ..ActionOptions::default()
        }
    }

    #[tokio::test]
    async fn test_action_is_sent() {
        let (mut controller, burst_rx) = controller();
        let mut sent_rx = fake_console(burst_rx);

        let options = ActionOptions {
            scene: Some(129),
            ..ActionOptions::default()
        };
        let buffers = act(&mut controller, "scene_recall", options).await.unwrap();
        assert_eq!(buffers, vec![vec![0xb0, 0x00, 0x01, 0xc0, 0x00]]);
        assert_eq!(sent_rx.recv().await.unwrap(), buffers);
    }

    #[tokio::test]
    async fn test_step_uses_last_sent_level() {
        let (mut controller, burst_rx) = controller();
        let _sent_rx = fake_console(burst_rx);

        let Err(e) = act(&mut controller, "fader_input", fader(1, "up")).await else {
            panic!("step before any level must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::UnsupportedStep);

        act(&mut controller, "fader_input", fader(1, "0")).await.unwrap();
        let buffers = act(&mut controller, "fader_input", fader(1, "up")).await.unwrap();
        assert_eq!(buffers[0][8], 0x6d);
        let buffers = act(&mut controller, "fader_input", fader(1, "up")).await.unwrap();
        assert_eq!(buffers[0][8], 0x6f);

        // other channels keep their own level
        let Err(_) = act(&mut controller, "fader_input", fader(2, "down")).await else {
            panic!("channel 2 has no level yet");
        };

        // an explicit last level wins
        let options = ActionOptions {
            last_level: Some(0x1b),
            ..fader(1, "down")
        };
        let buffers = act(&mut controller, "fader_input", options).await.unwrap();
        assert_eq!(buffers[0][8], 0x00);
    }

    #[tokio::test]
    async fn test_failed_level_is_not_remembered() {
        let (mut controller, burst_rx) = controller();
        broken_console(burst_rx);

        let Err(e) = act(&mut controller, "fader_input", fader(1, "+10")).await else {
            panic!("the broken link must fail the action");
        };
        assert_eq!(e.error_type, ErrorType::TransportError);

        // nothing reached the console, so there is nothing to step from
        let Err(e) = act(&mut controller, "fader_input", fader(1, "down")).await else {
            panic!("step after a failed level must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::UnsupportedStep);
        assert!(controller.last_levels.is_empty());
    }

    #[tokio::test]
    async fn test_send_level_memory() {
        let (mut controller, burst_rx) = controller();
        let _sent_rx = fake_console(burst_rx);

        let send = |level: &str| ActionOptions {
            dest_channel: Some(3),
            ..fader(1, level)
        };
        act(&mut controller, "send_input_to_mono_aux", send("-10"))
            .await
            .unwrap();
        let buffers = act(&mut controller, "send_input_to_mono_aux", send("down"))
            .await
            .unwrap();
        assert_eq!(buffers[0][13], 0x55);
    }

    #[tokio::test]
    async fn test_rejected_action_sends_nothing() {
        let (mut controller, mut burst_rx) = controller();

        let Err(e) = act(&mut controller, "fader_vca", fader(1, "0")).await else {
            panic!("unknown action must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::UnknownAction);

        let options = ActionOptions {
            groups: vec![1, 17],
            assign: Some(true),
            channel: Some(1),
            ..ActionOptions::default()
        };
        let Err(e) = act(&mut controller, "dca_assign", options).await else {
            panic!("DCA 17 must be rejected");
        };
        assert_eq!(e.error_type, ErrorType::OutOfRange);

        assert!(burst_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_catalog_queries() {
        let (mut controller, _burst_rx) = controller();

        let (resp_tx, resp_rx) = oneshot::channel();
        controller
            .handle_command(Command::ListActions { resp: resp_tx })
            .await;
        let actions = resp_rx.await.unwrap().unwrap();
        assert_eq!(actions.len(), 40);
        assert_eq!(actions[0].0, "mute_input");

        let (resp_tx, resp_rx) = oneshot::channel();
        controller
            .handle_command(Command::SceneCount { resp: resp_tx })
            .await;
        assert_eq!(resp_rx.await.unwrap().unwrap(), 500);
    }
}

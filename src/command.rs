use tokio::sync::oneshot;

use crate::{encoder::ActionOptions, error::AppError, midi_message::Buffer};

#[derive(Debug)]
pub enum Command {
    /// Encode an action and send it to the console. Replies with the
    /// buffers that went out.
    Action {
        action_id: String,
        options: ActionOptions,
        resp: oneshot::Sender<Result<Vec<Buffer>, AppError>>,
    },
    /// (id, label) of every action
    ListActions {
        resp: oneshot::Sender<Result<Vec<(String, String)>, AppError>>,
    },
    /// (label, code) of the fader level table
    ListLevels {
        resp: oneshot::Sender<Result<Vec<(String, u8)>, AppError>>,
    },
    SceneCount {
        resp: oneshot::Sender<Result<u16, AppError>>,
    },
    Hi {
        resp: oneshot::Sender<Result<String, AppError>>,
    },
}

mod spec;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::mpsc::{Receiver, Sender, channel},
    sync::oneshot,
    task::JoinHandle,
};

use crate::{
    action_catalog::{self, ActionDef, ActionKind},
    avantis::level::LevelSelection,
    command::Command,
    encoder::ActionOptions,
    error::{AppError, ErrorType},
    user_session::spec::{Spec, TypeError, Value},
};

pub async fn start(listen: &str) -> std::io::Result<(Receiver<Command>, JoinHandle<()>)> {
    let listener = TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listen);
    return Ok(serve(listener));
}

fn serve(listener: TcpListener) -> (Receiver<Command>, JoinHandle<()>) {
    let (command_tx, command_rx) = channel(8);
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    log::info!("Operator connected from {}", peer);
                    start_session(stream, command_tx.clone());
                }
                Err(e) => log::error!("User connection accept error: {:?}", e),
            }
        }
    });
    return (command_rx, handle);
}

fn start_session(stream: TcpStream, command_tx: Sender<Command>) {
    tokio::spawn(async move {
        let mut session = Session::new(stream, command_tx);
        if let Err(e) = session.run().await {
            log::warn!("Session ended with an error: {:?}", e);
        }
    });
}

/// Positional parameters of each action class
fn action_specs(kind: ActionKind) -> Vec<Spec> {
    return match kind {
        ActionKind::Mute => vec![Spec::u8("channel", true), Spec::bool("mute", false)],
        ActionKind::Fader => vec![Spec::u8("channel", true), Spec::level("level", true)],
        ActionKind::MainAssign => vec![Spec::u8("channel", true), Spec::bool("assign", true)],
        ActionKind::GroupAssign(_) => vec![
            Spec::u8("channel", true),
            Spec::list_u8("groups", true),
            Spec::bool("assign", false),
        ],
        ActionKind::SceneRecall => vec![Spec::u16("scene", true)],
        ActionKind::ChannelName => vec![Spec::u8("channel", true), Spec::text("name", true)],
        ActionKind::ChannelColor => vec![Spec::u8("channel", true), Spec::color("color", true)],
        ActionKind::SendLevel { .. } => vec![
            Spec::u8("channel", true),
            Spec::u8("dest", true),
            Spec::level("level", true),
        ],
        ActionKind::SendLevelIndex { .. } => vec![
            Spec::u8("channel", true),
            Spec::u8("dest", true),
            Spec::u8("level", true),
        ],
    };
}

/// Mute and assign flags default to on when omitted.
fn build_options(kind: ActionKind, params: &[Value]) -> Result<ActionOptions, TypeError> {
    let flag = |index: usize| -> Result<bool, TypeError> {
        return match params.get(index) {
            Some(value) => value.as_bool(),
            None => Ok(true),
        };
    };
    let param = |index: usize| params.get(index).ok_or(TypeError {});

    let mut options = ActionOptions::default();
    match kind {
        ActionKind::SceneRecall => {
            options.scene = Some(param(0)?.as_u16()?);
            return Ok(options);
        }
        _ => options.channel = Some(param(0)?.as_u8()?),
    }
    match kind {
        ActionKind::Mute => options.mute = Some(flag(1)?),
        ActionKind::Fader => options.level = Some(param(1)?.as_level()?),
        ActionKind::MainAssign => options.assign = Some(param(1)?.as_bool()?),
        ActionKind::GroupAssign(_) => {
            options.groups = param(1)?.as_list_u8()?;
            options.assign = Some(flag(2)?);
        }
        ActionKind::ChannelName => options.name = Some(param(1)?.as_text()?),
        ActionKind::ChannelColor => options.color = Some(param(1)?.as_color()?),
        ActionKind::SendLevel { .. } => {
            options.dest_channel = Some(param(1)?.as_u8()?);
            options.level = Some(param(2)?.as_level()?);
        }
        ActionKind::SendLevelIndex { .. } => {
            options.dest_channel = Some(param(1)?.as_u8()?);
            options.level = Some(LevelSelection::Index(param(2)?.as_u8()?));
        }
        ActionKind::SceneRecall => {}
    }
    return Ok(options);
}

struct Session {
    stream: BufReader<TcpStream>,
    command_tx: Sender<Command>,
}

impl Session {
    pub fn new(stream: TcpStream, command_tx: Sender<Command>) -> Self {
        Self {
            stream: BufReader::new(stream),
            command_tx,
        }
    }

    pub async fn run(&mut self) -> std::io::Result<()> {
        self.stream
            .write_all(b"\r\n============================\r\n welcome to avantis control\r\n============================\r\n\r\n")
            .await?;

        loop {
            self.stream.write_all(b"avantis> ").await?;
            let mut line = String::new();
            if self.stream.read_line(&mut line).await? == 0 {
                log::debug!("Connection closed");
                return Ok(());
            }
            let trimmed = line.trim().to_string();
            log::debug!("Received: {}", trimmed);
            let tokens: Vec<String> = Self::tokenize(&trimmed);
            if tokens.is_empty() {
                continue;
            }
            let command = tokens[0].as_str();
            match command {
                "hello" => self.stream.write_all(b"hi\r\n").await?,
                "hi" => self.hi().await?,
                "actions" => self.actions().await?,
                "levels" => self.levels().await?,
                "scenes" => self.scenes().await?,
                "help" => self.help(&tokens).await?,
                "quit" => {
                    self.stream.write_all(b"bye!\r\n").await?;
                    return Ok(());
                }
                _ => match action_catalog::get(command) {
                    Some(def) => self.action(def, &tokens).await?,
                    None => {
                        self.stream
                            .write_all(format!("{}: Unknown command\r\n", command).as_bytes())
                            .await?;
                    }
                },
            }
        }
    }

    async fn hi(&mut self) -> std::io::Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        if !self.send_command(Command::Hi { resp: resp_tx }).await? {
            return Ok(());
        }
        return self.wait_and_handle_response(resp_rx, |r| r).await;
    }

    async fn actions(&mut self) -> std::io::Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        if !self
            .send_command(Command::ListActions { resp: resp_tx })
            .await?
        {
            return Ok(());
        }
        return self
            .wait_and_handle_response(resp_rx, |actions| {
                let longest = actions.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
                return actions
                    .iter()
                    .map(|(id, label)| format!("  {:width$}  {}", id, label, width = longest))
                    .collect::<Vec<_>>()
                    .join("\r\n");
            })
            .await;
    }

    async fn levels(&mut self) -> std::io::Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        if !self
            .send_command(Command::ListLevels { resp: resp_tx })
            .await?
        {
            return Ok(());
        }
        return self
            .wait_and_handle_response(resp_rx, |levels| {
                let mut lines: Vec<String> = levels
                    .iter()
                    .map(|(label, code)| format!("  {:>6} dB  {:#04x}", label, code))
                    .collect();
                lines.push("  up / down steps 1 dB from the last level sent".to_string());
                return lines.join("\r\n");
            })
            .await;
    }

    async fn scenes(&mut self) -> std::io::Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        if !self
            .send_command(Command::SceneCount { resp: resp_tx })
            .await?
        {
            return Ok(());
        }
        return self
            .wait_and_handle_response(resp_rx, |count| format!("scenes 1..{}", count))
            .await;
    }

    async fn help(&mut self, tokens: &Vec<String>) -> std::io::Result<()> {
        let Some(def) = tokens.get(1).and_then(|id| action_catalog::get(id)) else {
            self.stream
                .write_all(b"Usage help <action>; 'actions' lists them\r\n")
                .await?;
            return Ok(());
        };
        self.stream
            .write_all(format!("{}\r\n", def.label).as_bytes())
            .await?;
        return self.usage(def.id, &action_specs(def.kind)).await;
    }

    async fn action(&mut self, def: &ActionDef, tokens: &Vec<String>) -> std::io::Result<()> {
        let specs = action_specs(def.kind);
        let Some(params) = self.parse_params(def.id, tokens, &specs).await? else {
            return Ok(());
        };
        let options = match build_options(def.kind, &params) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("{}: parameter conversion failed: {}", def.id, e);
                return self.usage(def.id, &specs).await;
            }
        };

        let (resp_tx, resp_rx) = oneshot::channel();
        let command = Command::Action {
            action_id: def.id.to_string(),
            options,
            resp: resp_tx,
        };
        if !self.send_command(command).await? {
            return Ok(());
        }
        return self
            .wait_and_handle_response(resp_rx, |buffers| {
                buffers
                    .iter()
                    .map(hex::encode)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .await;
    }

    // Utilities ////////////////////////////////////////////////////////////////

    fn tokenize(input: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_quotes: Option<char> = None;

        for c in input.chars() {
            match c {
                '\'' | '"' => {
                    if in_quotes == Some(c) {
                        in_quotes = None;
                    } else if in_quotes.is_none() {
                        in_quotes = Some(c);
                    } else {
                        // the other quote kind is literal inside quotes
                        current.push(c);
                    }
                }
                c if c.is_whitespace() && in_quotes.is_none() => {
                    if !current.is_empty() {
                        tokens.push(current.clone());
                        current.clear();
                    }
                }
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }

    async fn parse_params(
        &mut self,
        command: &str,
        tokens: &Vec<String>,
        specs: &Vec<Spec>,
    ) -> std::io::Result<Option<Vec<Value>>> {
        let mut params = Vec::new();
        for (i, spec) in specs.iter().enumerate() {
            if tokens.len() <= i + 1 {
                if spec.required {
                    self.usage(command, specs).await?;
                    return Ok(None);
                }
                break;
            }
            if let Ok(param) = (spec.parse)(&tokens[i + 1]) {
                params.push(param);
            } else {
                self.stream
                    .write_all(format!("Invalid {}\r\n", spec.name).as_bytes())
                    .await?;
                return Ok(None);
            }
        }
        return Ok(Some(params));
    }

    async fn usage(&mut self, command: &str, specs: &Vec<Spec>) -> std::io::Result<()> {
        let mut out = String::new();
        out += format!("Usage {}", command).as_str();
        for spec in specs {
            if spec.required {
                out += format!(" <{}>", spec.name).as_str();
            } else {
                out += format!(" [{}]", spec.name).as_str();
            }
        }
        out += "\r\n";
        self.stream.write_all(out.as_bytes()).await?;
        return Ok(());
    }

    /// Returns false when the controller is gone.
    async fn send_command(&mut self, command: Command) -> std::io::Result<bool> {
        if self.command_tx.send(command).await.is_err() {
            log::error!("Console controller is not running");
            self.stream
                .write_all(b"Error: controller is not running\r\n")
                .await?;
            return Ok(false);
        }
        return Ok(true);
    }

    async fn wait_and_handle_response<T, F>(
        &mut self,
        resp_rx: oneshot::Receiver<Result<T, AppError>>,
        stringify: F,
    ) -> std::io::Result<()>
    where
        F: Fn(T) -> String,
    {
        let result = match resp_rx.await {
            Ok(result) => result,
            Err(_) => Err(AppError::runtime("no response from the controller")),
        };
        match result {
            Ok(response) => {
                let reply = stringify(response);
                self.stream
                    .write_all(format!("{}\r\n", reply).as_bytes())
                    .await?;
            }
            Err(e) => {
                log::warn!("Operation failed: {:?}", e);
                let error_message = match e.error_type {
                    ErrorType::Timeout => "timeout\r\n".to_string(),
                    _ => format!("Error: {:?}: {}\r\n", e.error_type, e.message),
                };
                self.stream.write_all(error_message.as_bytes()).await?;
            }
        }
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avantis::name::Color;
    use std::time::Duration;
    use tokio::time::timeout;

    fn parse_all(kind: ActionKind, tokens: &[&str]) -> Vec<Value> {
        let specs = action_specs(kind);
        tokens
            .iter()
            .zip(specs.iter())
            .map(|(token, spec)| match (spec.parse)(token) {
                Ok(value) => value,
                Err(_) => panic!("{} must parse as {}", token, spec.name),
            })
            .collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            Session::tokenize(r#"channel_name 1 "Lead Vox""#),
            vec!["channel_name", "1", "Lead Vox"]
        );
        assert_eq!(
            Session::tokenize("channel_name  2 'Bob\"s'  "),
            vec!["channel_name", "2", "Bob\"s"]
        );
        assert!(Session::tokenize("   ").is_empty());
    }

    #[test]
    fn test_build_options() {
        let params = parse_all(ActionKind::Mute, &["3"]);
        let options = build_options(ActionKind::Mute, &params).unwrap();
        assert_eq!(options.channel, Some(3));
        assert_eq!(options.mute, Some(true));

        let kind = ActionKind::GroupAssign(crate::avantis::assign::GroupKind::Dca);
        let params = parse_all(kind, &["5", "2,4", "off"]);
        let options = build_options(kind, &params).unwrap();
        assert_eq!(options.groups, vec![2, 4]);
        assert_eq!(options.assign, Some(false));

        let kind = ActionKind::SendLevel {
            dest: crate::avantis::section::Section::MonoAux,
        };
        let params = parse_all(kind, &["1", "2", "-10"]);
        let options = build_options(kind, &params).unwrap();
        assert_eq!(options.dest_channel, Some(2));
        assert_eq!(options.level, Some(LevelSelection::Label("-10".to_string())));

        let kind = ActionKind::SendLevelIndex {
            dest: crate::avantis::section::Section::MonoAux,
        };
        let params = parse_all(kind, &["1", "2", "19"]);
        let options = build_options(kind, &params).unwrap();
        assert_eq!(options.level, Some(LevelSelection::Index(19)));

        let params = parse_all(ActionKind::ChannelColor, &["1", "red"]);
        let options = build_options(ActionKind::ChannelColor, &params).unwrap();
        assert_eq!(options.color, Some(Color::Red));

        let params = parse_all(ActionKind::SceneRecall, &["129"]);
        let options = build_options(ActionKind::SceneRecall, &params).unwrap();
        assert_eq!(options.scene, Some(129));
        assert_eq!(options.channel, None);
    }

    async fn read_until(stream: &mut BufReader<TcpStream>, needle: &str) -> String {
        loop {
            let mut line = String::new();
            let read = timeout(Duration::from_secs(5), stream.read_line(&mut line))
                .await
                .unwrap()
                .unwrap();
            assert!(read > 0, "session closed before '{}'", needle);
            if line.contains(needle) {
                return line;
            }
        }
    }

    #[tokio::test]
    async fn test_session_sends_action() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (mut command_rx, _handle) = serve(listener);

        // stands in for the console controller
        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let Command::Action {
                    action_id,
                    options,
                    resp,
                } = command
                else {
                    panic!("only actions are expected");
                };
                assert_eq!(action_id, "mute_input");
                assert_eq!(options.channel, Some(1));
                assert_eq!(options.mute, Some(true));
                resp.send(Ok(vec![vec![0x90, 0x00, 0x7f, 0x90, 0x00, 0x00]]))
                    .unwrap();
            }
        });

        let mut client = BufReader::new(TcpStream::connect(address).await.unwrap());
        client.write_all(b"mute_input 1 on\r\n").await.unwrap();
        read_until(&mut client, "90007f900000").await;

        client.write_all(b"mute_input\r\n").await.unwrap();
        read_until(&mut client, "Usage mute_input <channel> [mute]").await;

        client.write_all(b"fader_vca 1 0\r\n").await.unwrap();
        read_until(&mut client, "fader_vca: Unknown command").await;

        client.write_all(b"quit\r\n").await.unwrap();
        read_until(&mut client, "bye!").await;
    }
}

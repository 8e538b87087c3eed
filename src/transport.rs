use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::{
        mpsc::{Receiver, Sender, channel},
        oneshot,
    },
    task::JoinHandle,
    time::{Instant, timeout},
};

use crate::{error::AppError, midi_message::Buffer};

type Result<T> = std::result::Result<T, AppError>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Buffers of one action. They are written back to back, never interleaved
/// with another burst.
#[derive(Debug)]
pub struct Burst {
    pub buffers: Vec<Buffer>,
    pub resp: oneshot::Sender<Result<()>>,
}

pub fn start(address: String) -> (Sender<Burst>, JoinHandle<()>) {
    let (burst_tx, burst_rx) = channel(16);
    let handle = tokio::spawn(async move {
        run(Link::new(address), burst_rx).await;
    });
    return (burst_tx, handle);
}

async fn run(mut link: Link, mut burst_rx: Receiver<Burst>) {
    if let Err(e) = link.connect().await {
        log::warn!("Console is not reachable yet: {}", e);
    }
    let mut buf = [0u8; 256];
    loop {
        tokio::select! {
            burst = burst_rx.recv() => {
                let Some(burst) = burst else {
                    log::debug!("Transport closed");
                    return;
                };
                let result = link.send(&burst.buffers).await;
                if let Err(e) = burst.resp.send(result) {
                    log::error!("Error in sending back the transport result: {:?}", e);
                }
            }
            result = link.read(&mut buf) => link.handle_read(result, &buf),
        }
    }
}

/// The single connection to the console
struct Link {
    address: String,
    stream: Option<TcpStream>,
    backoff: Duration,
    next_attempt: Option<Instant>,
}

impl Link {
    fn new(address: String) -> Self {
        Self {
            address,
            stream: None,
            backoff: INITIAL_BACKOFF,
            next_attempt: None,
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if let Some(next_attempt) = self.next_attempt {
            let now = Instant::now();
            if now < next_attempt {
                return Err(AppError::transport(format!(
                    "console link to {} is down, next attempt in {}ms",
                    self.address,
                    (next_attempt - now).as_millis()
                )));
            }
        }
        log::info!("Connecting to console at {}", self.address);
        let result = match timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.address)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(AppError::transport(format!(
                "connect to {} failed: {}",
                self.address, e
            ))),
            Err(_) => Err(AppError::timeout()),
        };
        match result {
            Ok(stream) => {
                if let Err(e) = stream.set_nodelay(true) {
                    log::debug!("set_nodelay failed: {}", e);
                }
                log::info!("Connected to console at {}", self.address);
                self.stream = Some(stream);
                self.backoff = INITIAL_BACKOFF;
                self.next_attempt = None;
                return Ok(());
            }
            Err(e) => {
                self.schedule_retry();
                return Err(e);
            }
        }
    }

    fn schedule_retry(&mut self) {
        self.next_attempt = Some(Instant::now() + self.backoff);
        log::debug!("Next connection attempt in {:?}", self.backoff);
        self.backoff = std::cmp::min(self.backoff * 2, MAX_BACKOFF);
    }

    fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            log::warn!("Console link to {} closed", self.address);
        }
    }

    async fn send(&mut self, buffers: &[Buffer]) -> Result<()> {
        if self.stream.is_none() {
            self.connect().await?;
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(AppError::transport("console link is down".to_string()));
        };
        let mut result = Ok(());
        for buffer in buffers {
            log::debug!("tx {}", hex::encode(buffer));
            if let Err(e) = stream.write_all(buffer).await {
                result = Err(e);
                break;
            }
        }
        if result.is_ok() {
            result = stream.flush().await;
        }
        if let Err(e) = result {
            log::error!("Write to console failed: {:?}", e);
            self.disconnect();
            self.schedule_retry();
            return Err(AppError::transport(format!("write failed: {}", e)));
        }
        return Ok(());
    }

    /// Pending forever while disconnected.
    async fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.read(buf).await,
            None => std::future::pending().await,
        }
    }

    /// Inbound data is only checked for presence.
    fn handle_read(&mut self, result: std::io::Result<usize>, buf: &[u8]) {
        match result {
            Ok(0) => self.disconnect(),
            Ok(size) => log::debug!("rx {}", hex::encode(&buf[..size])),
            Err(e) => {
                log::error!("Read from console failed: {:?}", e);
                self.disconnect();
            }
        }
    }
}

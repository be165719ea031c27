use crate::controller::{ControlError, Fleet};
use crate::types::ControlInput;
use futures::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::{accept_async, tungstenite::Message};

/// One joystick frame from the browser: which camera, and where the stick is.
/// Axis values may exceed [-1, 1]; they are clamped downstream.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ControlMessage {
    pub camera: usize,
    pub pan: f64,
    pub tilt: f64,
    pub roll: f64,
}

impl ControlMessage {
    pub fn input(&self) -> ControlInput {
        ControlInput::new(self.pan, self.tilt, self.roll)
    }
}

#[derive(Debug)]
pub enum MessageError {
    Parse(serde_json::Error),
    Control(ControlError),
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::Parse(e) => write!(f, "Bad control message: {}", e),
            MessageError::Control(e) => write!(f, "{}", e),
        }
    }
}

impl Error for MessageError {}

impl From<ControlError> for MessageError {
    fn from(e: ControlError) -> Self {
        MessageError::Control(e)
    }
}

/// Accept loop for the joystick websocket. Each client gets its own task;
/// commands funnel through the shared fleet lock, so one command is in
/// flight per device at a time.
pub async fn serve(
    listen_addr: &str,
    fleet: Arc<Mutex<Fleet>>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = TcpListener::bind(listen_addr).await?;
    println!("Listening on ws://{}/", listen_addr);

    let active: Arc<RwLock<usize>> = Arc::new(RwLock::new(0));
    loop {
        let (stream, peer) = listener.accept().await?;
        let fleet = fleet.clone();
        let active = active.clone();
        tokio::spawn(async move {
            *active.write() += 1;
            println!("{}: Client connected ({} active)", peer, active.read());
            if let Err(e) = handle_client(stream, peer, fleet).await {
                eprintln!("{}: Client error: {}", peer, e);
            }
            *active.write() -= 1;
            println!("{}: Client disconnected ({} active)", peer, active.read());
        });
    }
}

async fn handle_client(
    stream: TcpStream,
    peer: SocketAddr,
    fleet: Arc<Mutex<Fleet>>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let ws = accept_async(stream).await?;
    let (mut outbound, mut inbound) = ws.split();

    while let Some(message) = inbound.next().await {
        match message? {
            Message::Text(text) => match handle_message(&text, &fleet).await {
                // echo the frame back so the UI can confirm delivery
                Ok(()) => outbound.send(Message::Text(text)).await?,
                // a bad frame is dropped, not fatal to the connection
                Err(e) => eprintln!("{}: Rejected message: {}", peer, e),
            },
            Message::Ping(payload) => outbound.send(Message::Pong(payload)).await?,
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

async fn handle_message(text: &str, fleet: &Mutex<Fleet>) -> Result<(), MessageError> {
    let message: ControlMessage = serde_json::from_str(text).map_err(MessageError::Parse)?;
    let mut fleet = fleet.lock().await;
    fleet.dispatch(message.camera, &message.input()).await?;
    Ok(())
}

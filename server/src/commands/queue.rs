// Command Queue
// Serializes every command onto a single worker thread in arrival order

use std::io;
use std::thread::{self, JoinHandle};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::{Command, CommandBoundary, CommandError, Delivery};
use crate::models::InvokeResponse;

enum Envelope {
    Request {
        command: Command,
        reply: oneshot::Sender<Result<Value, CommandError>>,
    },
    Notify(Command),
    Shutdown,
}

/// Cloneable handle used by transports to submit commands
#[derive(Clone)]
pub struct CommandQueue {
    sender: mpsc::UnboundedSender<Envelope>,
}

pub struct CommandWorker {
    handle: JoinHandle<()>,
}

impl CommandQueue {
    /// Move the boundary onto a dedicated thread and return a handle to it
    pub fn spawn(mut boundary: CommandBoundary) -> io::Result<(CommandQueue, CommandWorker)> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Envelope>();

        let handle = thread::Builder::new()
            .name("candela-commands".to_string())
            .spawn(move || {
                while let Some(envelope) = receiver.blocking_recv() {
                    match envelope {
                        Envelope::Request { command, reply } => {
                            let result = boundary.dispatch(command);
                            // The caller may have gone away; the command still ran.
                            let _ = reply.send(result);
                        }
                        Envelope::Notify(command) => boundary.deliver(command),
                        Envelope::Shutdown => break,
                    }
                }
                boundary.shutdown();
            })?;

        Ok((CommandQueue { sender }, CommandWorker { handle }))
    }

    /// Submit a command and wait for its result
    pub async fn request(&self, command: Command) -> Result<Value, CommandError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope::Request { command, reply })
            .map_err(|_| CommandError::Unavailable)?;
        response.await.map_err(|_| CommandError::Unavailable)?
    }

    /// Submit a command without waiting
    pub fn notify(&self, command: Command) -> Result<(), CommandError> {
        self.sender
            .send(Envelope::Notify(command))
            .map_err(|_| CommandError::Unavailable)
    }

    /// Parse a wire command and route it by its delivery mode
    pub async fn invoke(&self, name: &str, payload: &Value) -> InvokeResponse {
        let command = match Command::parse(name, payload) {
            Ok(command) => command,
            Err(e) => return InvokeResponse::failure(e.to_string()),
        };

        let result = match command.delivery() {
            Delivery::Request => self.request(command).await,
            Delivery::FireAndForget => self.notify(command).map(|_| Value::Null),
        };

        match result {
            Ok(data) => InvokeResponse::success(data),
            Err(e) => InvokeResponse::failure(e.to_string()),
        }
    }

    /// Ask the worker to stop after the commands already queued
    pub fn shutdown(&self) {
        let _ = self.sender.send(Envelope::Shutdown);
    }
}

impl CommandWorker {
    pub fn join(self) {
        if self.handle.join().is_err() {
            log::error!("Command worker panicked");
        }
    }
}

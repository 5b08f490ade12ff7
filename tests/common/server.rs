//! Scripted IRC server for client runtime tests.

#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec};

/// One scripted step.
pub enum Step {
    /// Wait for a line starting with this text; fails the script otherwise.
    Expect(&'static str),
    /// Send a line to the client.
    Send(&'static str),
}

/// A server that accepts a single client, plays a script and closes.
pub struct ScriptedServer {
    address: String,
    task: JoinHandle<Result<Vec<String>, String>>,
}

impl ScriptedServer {
    pub async fn spawn(script: Vec<Step>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?.to_string();

        let task = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.map_err(|e| e.to_string())?;
            let mut framed = Framed::new(stream, LinesCodec::new());
            let mut received = Vec::new();

            for step in script {
                match step {
                    Step::Expect(prefix) => loop {
                        let line = framed
                            .next()
                            .await
                            .ok_or_else(|| format!("client closed before {prefix:?}"))?
                            .map_err(|e| e.to_string())?;
                        received.push(line.clone());
                        if line.starts_with(prefix) {
                            break;
                        }
                    },
                    Step::Send(line) => framed.send(line).await.map_err(|e| e.to_string())?,
                }
            }
            Ok(received)
        });

        Ok(Self { address, task })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Wait for the script to finish, returning every line received.
    pub async fn finish(self) -> Result<Vec<String>, String> {
        self.task.await.map_err(|e| e.to_string())?
    }
}

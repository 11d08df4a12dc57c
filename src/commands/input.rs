//! Shared operator console.
//!
//! Both publishers prompt on the same terminal. Instead of two readers racing for
//! stdin, a single queue serves prompt requests in arrival order: the publisher that
//! asked first gets the next line typed. Stdin itself is read on a plain thread
//! because a blocking read would otherwise hold up runtime shutdown.

use std::io::BufRead;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct PromptRequest {
    prompt: String,
    reply: oneshot::Sender<Option<String>>,
}

/// Cloneable handle publishers use to ask for a line.
#[derive(Clone, Debug)]
pub struct PromptClient {
    tx: mpsc::Sender<PromptRequest>,
}

impl PromptClient {
    /// Returns `None` once the console is closed (EOF or shutdown).
    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        let (reply, response) = oneshot::channel();
        let request = PromptRequest {
            prompt: prompt.to_string(),
            reply,
        };
        self.tx.send(request).await.ok()?;
        response.await.ok().flatten()
    }
}

pub fn prompt_channel(capacity: usize) -> (PromptClient, mpsc::Receiver<PromptRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (PromptClient { tx }, rx)
}

/// Forwards stdin lines into a channel from a dedicated thread. The channel closes on EOF.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut handle = stdin.lock();
        loop {
            let mut line = String::new();
            match handle.read_line(&mut line) {
                Ok(0) => {
                    debug!("stdin reached EOF");
                    break;
                }
                Ok(_) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Serves prompt requests one at a time until the lines run out or `cancel` fires.
pub async fn serve_prompts<W>(
    mut requests: mpsc::Receiver<PromptRequest>,
    mut lines: mpsc::Receiver<String>,
    mut console: W,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let request = tokio::select! {
            _ = cancel.cancelled() => break,
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        let prompt = format!("\n{}", request.prompt);
        if let Err(e) = console.write_all(prompt.as_bytes()).await {
            warn!("Failed to write prompt: {}", e);
        }
        let _ = console.flush().await;

        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.recv() => line,
        };

        let closed = line.is_none();
        if request.reply.send(line).is_err() {
            debug!("Prompt requester went away before its answer");
        }
        if closed {
            info!("Operator input closed, no more commands will be read");
            break;
        }
    }
}

//! Terminal confirmation.

use std::io::{self, BufRead, BufReader, Stdin};
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use mirror_interface::{ConfirmationGate, ConfirmationOutcome};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Prints the preview and reads a y/n answer.
///
/// Anything other than `y` or `yes` (case-insensitive) cancels, including
/// end of input. The line is read on a detached OS thread, so a prompt left
/// unanswered after a timeout does not hold up runtime shutdown.
pub struct TerminalConfirmation<R> {
    input: Arc<Mutex<R>>,
}

impl TerminalConfirmation<BufReader<Stdin>> {
    /// Answer from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R> TerminalConfirmation<R>
where
    R: BufRead + Send + 'static,
{
    /// Answer from `input`.
    pub fn new(input: R) -> Self {
        Self {
            input: Arc::new(Mutex::new(input)),
        }
    }

    /// Read one line; `None` at end of input.
    async fn read_answer(&self) -> io::Result<Option<String>> {
        let input = Arc::clone(&self.input);
        let (tx, rx) = oneshot::channel();
        thread::Builder::new()
            .name("confirmation-input".to_string())
            .spawn(move || {
                let mut answer = String::new();
                let read = input
                    .lock()
                    .read_line(&mut answer)
                    .map(|n| (n > 0).then_some(answer));
                // The prompt may have been abandoned already.
                let _ = tx.send(read);
            })?;

        rx.await
            .unwrap_or_else(|_| Err(io::Error::other("input reader stopped")))
    }
}

/// Whether a typed answer accepts.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl<R> ConfirmationGate for TerminalConfirmation<R>
where
    R: BufRead + Send + 'static,
{
    async fn confirm(&self, preview: &str) -> ConfirmationOutcome {
        println!("{}\n", preview);
        println!("Apply these changes? [y/N]");

        match self.read_answer().await {
            Ok(None) => {
                debug!("Input closed before an answer");
                ConfirmationOutcome::Rejected
            }
            Ok(Some(answer)) if is_yes(&answer) => ConfirmationOutcome::Confirmed,
            Ok(Some(_)) => ConfirmationOutcome::Rejected,
            Err(e) => {
                warn!(error = %e, "Failed to read confirmation");
                ConfirmationOutcome::Rejected
            }
        }
    }
}

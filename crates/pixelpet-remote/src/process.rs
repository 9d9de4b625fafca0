use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use pixelpet_config::GeneratorSettings;
use pixelpet_core::error::GenerationError;
use pixelpet_core::generate::{require_image, require_text, Generator};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::protocol::{
    GenerateImageParams, GenerateImageResult, GenerateTextParams, GenerateTextResult,
    RequestEnvelope, RequestId, ResponseEnvelope, GENERATE_IMAGE_METHOD, GENERATE_TEXT_METHOD,
};

/// How to launch the backend command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Where the backend is asked to write images.
    pub scratch_dir: PathBuf,
}

impl ProcessConfig {
    /// `None` when no command is configured.
    pub fn from_settings(settings: &GeneratorSettings) -> Option<Self> {
        let command = settings.command.as_ref()?.trim();
        if command.is_empty() {
            return None;
        }
        Some(Self {
            command: command.to_string(),
            args: settings.args.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            scratch_dir: std::env::temp_dir(),
        })
    }
}

/// Generator backed by a long-lived child process speaking JSON-RPC.
///
/// The process is started on first use. When it dies, times out or breaks
/// protocol, the failing call returns an error and the process is discarded;
/// the next call starts a fresh one.
pub struct ProcessGenerator {
    config: ProcessConfig,
    session: Option<BackendSession>,
    next_id: i64,
}

impl ProcessGenerator {
    pub fn new(config: ProcessConfig) -> Self {
        Self {
            config,
            session: None,
            next_id: 1,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    fn call<P: Serialize, R: DeserializeOwned>(
        &mut self,
        method: &str,
        params: &P,
    ) -> Result<R, GenerationError> {
        let id = self.next_id;
        self.next_id += 1;
        let request = RequestEnvelope::new(id, method, params)?;

        if self.session.is_none() {
            self.session = Some(BackendSession::spawn(&self.config)?);
        }
        let Some(session) = self.session.as_mut() else {
            return Err(GenerationError::Unavailable("backend not started".into()));
        };

        let outcome = session
            .send(&request)
            .and_then(|()| session.await_response(id, self.config.timeout));
        match outcome {
            Ok(response) => response.into_result(method),
            Err(err) => {
                tracing::warn!(method, error = %err, "discarding generator process");
                self.session = None;
                Err(err)
            }
        }
    }
}

impl Generator for ProcessGenerator {
    fn generate_text(&mut self, prompt: &str) -> Result<String, GenerationError> {
        let result: GenerateTextResult = self.call(
            GENERATE_TEXT_METHOD,
            &GenerateTextParams {
                prompt: prompt.to_string(),
            },
        )?;
        require_text(&result.text)
    }

    fn generate_image(&mut self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let output_path = self.config.scratch_dir.join(format!(
            "pixelpet-image-{}-{}.png",
            std::process::id(),
            self.next_id
        ));
        let outcome: Result<GenerateImageResult, _> = self.call(
            GENERATE_IMAGE_METHOD,
            &GenerateImageParams {
                prompt: prompt.to_string(),
                output_path: output_path.clone(),
            },
        );
        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                // The backend may have written part of the image before failing.
                let _ = std::fs::remove_file(&output_path);
                return Err(err);
            }
        };

        let bytes = std::fs::read(&result.path).map_err(|err| {
            tracing::warn!(path = %result.path.display(), error = %err, "image file unreadable");
            GenerationError::MissingImage
        })?;
        let _ = std::fs::remove_file(&result.path);
        require_image(bytes)
    }

    fn name(&self) -> &str {
        "process"
    }
}

struct BackendSession {
    child: Child,
    stdin: ChildStdin,
    reader_rx: Receiver<ReaderEvent>,
}

enum ReaderEvent {
    Response(ResponseEnvelope),
    ProtocolError(String),
    IoError(String),
    Eof,
}

impl BackendSession {
    fn spawn(config: &ProcessConfig) -> Result<Self, GenerationError> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                GenerationError::Unavailable(format!("failed to spawn {}: {err}", config.command))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            GenerationError::Unavailable("failed to capture backend stdin pipe".into())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            GenerationError::Unavailable("failed to capture backend stdout pipe".into())
        })?;
        if let Some(stderr) = child.stderr.take() {
            forward_stderr(stderr);
        }

        tracing::info!(command = %config.command, pid = child.id(), "started generator process");
        Ok(Self {
            child,
            stdin,
            reader_rx: spawn_reader(stdout),
        })
    }

    fn send(&mut self, request: &RequestEnvelope) -> Result<(), GenerationError> {
        let encoded = serde_json::to_string(request).map_err(|err| {
            GenerationError::Backend(format!("failed to encode JSON-RPC request: {err}"))
        })?;
        let written = self
            .stdin
            .write_all(encoded.as_bytes())
            .and_then(|()| self.stdin.write_all(b"\n"))
            .and_then(|()| self.stdin.flush());
        written.map_err(|err| self.exited_or(format!("backend stdin write failed: {err}")))
    }

    /// Wait for the response to request `id`, skipping stale replies to
    /// requests that already timed out.
    fn await_response(
        &mut self,
        id: i64,
        timeout: Duration,
    ) -> Result<ResponseEnvelope, GenerationError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.reader_rx.recv_timeout(remaining) {
                Ok(ReaderEvent::Response(response)) if response.id == RequestId::Number(id) => {
                    return Ok(response);
                }
                Ok(ReaderEvent::Response(response)) => {
                    tracing::debug!(id = ?response.id, expected = id, "ignoring stale response");
                }
                Ok(ReaderEvent::ProtocolError(message)) => {
                    return Err(GenerationError::Backend(message));
                }
                Ok(ReaderEvent::IoError(message)) => {
                    return Err(self.exited_or(format!("backend stdout read failed: {message}")));
                }
                Ok(ReaderEvent::Eof) | Err(RecvTimeoutError::Disconnected) => {
                    return Err(self.exited_or("backend closed its output".into()));
                }
                Err(RecvTimeoutError::Timeout) => {
                    if let Ok(Some(status)) = self.child.try_wait() {
                        return Err(exited(status.code()));
                    }
                    return Err(GenerationError::Timeout(timeout));
                }
            }
        }
    }

    /// Prefer reporting a dead process over the symptom that revealed it.
    fn exited_or(&mut self, message: String) -> GenerationError {
        match self.child.try_wait() {
            Ok(Some(status)) => exited(status.code()),
            Ok(None) | Err(_) => GenerationError::Unavailable(message),
        }
    }
}

fn exited(code: Option<i32>) -> GenerationError {
    GenerationError::Unavailable(format!("backend process exited (code={code:?})"))
}

impl Drop for BackendSession {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn spawn_reader(stdout: ChildStdout) -> Receiver<ReaderEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let event = match line {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                    Ok(response) => ReaderEvent::Response(response),
                    Err(err) => {
                        let _ = tx.send(ReaderEvent::ProtocolError(format!(
                            "invalid JSON-RPC response ({err}): {line}"
                        )));
                        return;
                    }
                },
                Err(err) => {
                    let _ = tx.send(ReaderEvent::IoError(err.to_string()));
                    return;
                }
            };
            if tx.send(event).is_err() {
                return;
            }
        }
        let _ = tx.send(ReaderEvent::Eof);
    });
    rx
}

/// The terminal belongs to the UI, so backend diagnostics go to the log.
fn forward_stderr(stderr: ChildStderr) {
    thread::spawn(move || {
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            if !line.trim().is_empty() {
                tracing::debug!(target: "pixelpet_remote::backend", "{line}");
            }
        }
    });
}

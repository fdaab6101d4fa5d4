// ABOUTME: The oracle seam — given a prompt, return text.
// ABOUTME: CommandOracle shells out to a configured CLI; ScriptedOracle replays canned replies.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// The natural-language reasoning service behind the analysis stages.
///
/// Opaque beyond this contract: one prompt in, one reply out. Transport
/// failures surface as errors; interpreting reply *content* is the caller's
/// job and never fails.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Oracle backed by a subprocess (e.g. a model CLI). The prompt is written to
/// the child's stdin; the reply is its stdout.
pub struct CommandOracle {
    command: String,
    args: Vec<String>,
}

impl CommandOracle {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

#[async_trait]
impl Oracle for CommandOracle {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn oracle command {:?}", self.command))?;

        let mut stdin = child
            .stdin
            .take()
            .context("oracle child stdin unavailable")?;
        stdin
            .write_all(prompt.as_bytes())
            .await
            .context("failed to write prompt to oracle")?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("failed to collect oracle output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "oracle command {:?} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Oracle that pops pre-scripted replies in order, counting calls. Useful for
/// deterministic pipeline tests; an exhausted script is a transport error,
/// which doubles as a way to exercise failure paths.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `complete` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock poisoned").clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompts lock poisoned")
            .push(prompt.to_string());
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted oracle exhausted"))
    }
}

//! Dev Reload
//!
//! `travel-butler-server dev` supervises a [`ServerCommand`] (by default
//! `cargo run -p travel-butler-server -- serve`) and restarts it whenever a
//! `.rs` or `.toml` file under the watched directories changes. Changes under
//! `target/` are ignored.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use anyhow::Context;
use notify::{RecursiveMode, Watcher};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Whether a changed path should trigger a restart
pub fn is_relevant(path: &Path) -> bool {
    let in_target = path
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == "target"));
    let watched_ext = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("rs") | Some("toml")
    );
    watched_ext && !in_target
}

/// Wait until no change has arrived for `window`
pub async fn debounce(rx: &mut UnboundedReceiver<PathBuf>, window: Duration) {
    while let Ok(Some(path)) = tokio::time::timeout(window, rx.recv()).await {
        tracing::debug!("Change coalesced: {}", path.display());
    }
}

/// Process the dev loop keeps alive
#[derive(Debug, Clone)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for ServerCommand {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            args: ["run", "-p", "travel-butler-server", "--", "serve"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl ServerCommand {
    fn spawn(&self) -> anyhow::Result<Child> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program))?;
        tracing::info!("🚀 Server process started (pid {:?})", child.id());
        Ok(child)
    }
}

async fn stop(child: &mut Option<Child>) {
    if let Some(mut running) = child.take() {
        if let Err(e) = running.kill().await {
            tracing::warn!("Failed to stop server process: {}", e);
        }
    }
}

async fn wait_exit(child: &mut Option<Child>) -> std::io::Result<ExitStatus> {
    match child {
        Some(running) => running.wait().await,
        None => std::future::pending().await,
    }
}

/// Keep `command` running, restarting it after each burst of changes.
///
/// Returns the number of processes spawned once `shutdown` resolves or the
/// change channel closes.
pub async fn supervise<F>(
    command: &ServerCommand,
    rx: &mut UnboundedReceiver<PathBuf>,
    window: Duration,
    shutdown: F,
) -> anyhow::Result<usize>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut child = Some(command.spawn()?);
    let mut spawns = 1;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("👋 Stopping dev server");
                stop(&mut child).await;
                return Ok(spawns);
            }
            changed = rx.recv() => {
                let Some(path) = changed else {
                    stop(&mut child).await;
                    return Ok(spawns);
                };
                debounce(rx, window).await;
                tracing::info!("🔄 {} changed - restarting", path.display());
                stop(&mut child).await;
                child = Some(command.spawn()?);
                spawns += 1;
            }
            status = wait_exit(&mut child) => {
                match status {
                    Ok(status) => tracing::warn!("⚠️  Server process exited ({}) - waiting for changes", status),
                    Err(e) => tracing::warn!("⚠️  Server process lost: {} - waiting for changes", e),
                }
                child = None;
            }
        }
    }
}

/// Run the watch/restart loop until Ctrl-C
pub async fn run(watch: Vec<PathBuf>) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<PathBuf>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                for path in event.paths.into_iter().filter(|p| is_relevant(p)) {
                    let _ = tx.send(path);
                }
            }
            Err(e) => tracing::warn!("Watch error: {}", e),
        }
    })
    .context("failed to create file watcher")?;

    for dir in &watch {
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;
        tracing::info!("👀 Watching {}", dir.display());
    }

    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    supervise(&ServerCommand::default(), &mut rx, DEBOUNCE, ctrl_c).await?;
    Ok(())
}

//! Background launcher for the review fetch / reply generation commands
//!
//! The configured commands run one after another in a detached task. The
//! HTTP request that triggers them does not wait, and their outcome is only
//! visible in the log.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use replydesk_common::config::RefreshConfig;
use tokio::process::Command;
use tracing::{error, info, warn};

/// Result of asking for a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStart {
    Started,
    AlreadyRunning,
    NotConfigured,
}

#[derive(Clone)]
pub struct Refresher {
    commands: Arc<Vec<Vec<String>>>,
    working_dir: Option<PathBuf>,
    running: Arc<AtomicBool>,
}

/// Clears the running flag when the task ends, including by panic
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Refresher {
    pub fn new(config: &RefreshConfig) -> Self {
        Self {
            commands: Arc::new(config.commands.clone()),
            working_dir: config.working_dir.clone(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn the command sequence unless one is already in flight
    pub fn trigger(&self, requested_by: &str) -> RefreshStart {
        if self.commands.is_empty() {
            warn!("Refresh requested by {} but no commands are configured", requested_by);
            return RefreshStart::NotConfigured;
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Refresh requested by {} while one is running, ignoring", requested_by);
            return RefreshStart::AlreadyRunning;
        }

        info!("Refresh started by {}", requested_by);
        let guard = RunningGuard(Arc::clone(&self.running));
        let commands = Arc::clone(&self.commands);
        let working_dir = self.working_dir.clone();

        tokio::spawn(async move {
            let _guard = guard;
            run_commands(&commands, working_dir.as_ref()).await;
        });

        RefreshStart::Started
    }
}

/// Run each command to completion; a failing command does not stop the rest
async fn run_commands(commands: &[Vec<String>], working_dir: Option<&PathBuf>) {
    for argv in commands {
        let Some((program, args)) = argv.split_first() else {
            continue;
        };

        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        let line = argv.join(" ");
        match command.status().await {
            Ok(status) if status.success() => info!("Refresh command `{}` finished", line),
            Ok(status) => warn!("Refresh command `{}` exited with {}", line, status),
            Err(e) => error!("Refresh command `{}` could not start: {}", line, e),
        }
    }
    info!("Refresh finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn refresher(commands: Vec<Vec<&str>>, dir: Option<PathBuf>) -> Refresher {
        Refresher::new(&RefreshConfig {
            commands: commands
                .into_iter()
                .map(|c| c.into_iter().map(String::from).collect())
                .collect(),
            working_dir: dir,
        })
    }

    async fn wait_until_idle(refresher: &Refresher) {
        for _ in 0..200 {
            if !refresher.is_running() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("refresh did not finish");
    }

    #[tokio::test]
    async fn test_not_configured() {
        let r = refresher(vec![], None);
        assert_eq!(r.trigger("admin"), RefreshStart::NotConfigured);
        assert!(!r.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_commands_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let r = refresher(
            vec![
                vec!["sh", "-c", "echo fetch >> log.txt"],
                vec!["sh", "-c", "exit 3"],
                vec!["sh", "-c", "echo generate >> log.txt"],
            ],
            Some(dir.path().to_path_buf()),
        );

        assert_eq!(r.trigger("admin"), RefreshStart::Started);
        wait_until_idle(&r).await;

        let log = std::fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(log, "fetch\ngenerate\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_second_trigger_while_running_is_ignored() {
        let r = refresher(vec![vec!["sleep", "1"]], None);

        assert_eq!(r.trigger("admin"), RefreshStart::Started);
        assert_eq!(r.trigger("admin"), RefreshStart::AlreadyRunning);
        wait_until_idle(&r).await;
        assert_eq!(r.trigger("admin"), RefreshStart::Started);
        wait_until_idle(&r).await;
    }

    #[tokio::test]
    async fn test_missing_program_clears_running_flag() {
        let r = refresher(vec![vec!["replydesk-no-such-program"]], None);
        assert_eq!(r.trigger("admin"), RefreshStart::Started);
        wait_until_idle(&r).await;
    }
}

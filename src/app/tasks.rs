//! The session event loop.
//!
//! One tokio task owns the `Session`. It waits on three sources: inbound
//! commands, fired notification timers, and at most one blocking job running
//! on the blocking pool. Commands that arrive while a job runs are queued and
//! handled in order once it is done, so nothing else ever mutates the session.

use std::collections::VecDeque;
use std::ops::ControlFlow;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use super::commands::{self, Dispatch, JobOutcome};
use super::events::Command;
use super::proxy::EventProxy;
use super::state::Session;
use crate::config::{AppConfig, ConfigStore};
use crate::core::TokioTimer;

/// The caller's side of a running session.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<AppConfig>,
}

impl SessionHandle {
    /// Queues a command. Returns `false` if the session has already stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Asks the session to stop after the queued commands and returns its
    /// final config.
    pub async fn shutdown(self) -> Result<AppConfig, JoinError> {
        let _ = self.commands.send(Command::Shutdown);
        self.task.await
    }
}

/// Starts a session on its own task.
pub fn spawn_session<P: EventProxy>(
    config: AppConfig,
    store: ConfigStore,
    proxy: P,
) -> SessionHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_session(config, store, proxy, commands_rx));
    SessionHandle {
        commands: commands_tx,
        task,
    }
}

/// Runs a session until `Command::Shutdown` or until every sender is gone.
/// The final config is persisted to `store` and returned.
pub async fn run_session<P: EventProxy>(
    config: AppConfig,
    store: ConfigStore,
    proxy: P,
    mut commands_rx: mpsc::UnboundedReceiver<Command>,
) -> AppConfig {
    let (timer, mut fired_rx) = TokioTimer::new();
    let mut session = Session::new(config, timer);
    commands::start(&mut session, &proxy);
    tracing::info!("Session started in {:?}", session.current_dir());

    let mut queued: VecDeque<Command> = VecDeque::new();
    let mut job: Option<JoinHandle<JobOutcome>> = None;

    'session: loop {
        while job.is_none() {
            let Some(command) = queued.pop_front() else {
                break;
            };
            if process(&mut session, &proxy, command, &mut job).is_break() {
                break 'session;
            }
        }

        tokio::select! {
            Some(fired) = fired_rx.recv() => {
                session.notifications.handle_timer(fired);
                commands::publish_notifications(&mut session, &proxy);
            }
            joined = wait_for(&mut job), if job.is_some() => {
                job = None;
                match joined {
                    Ok(outcome) => commands::complete(&mut session, &proxy, outcome),
                    Err(e) => {
                        tracing::error!("Worker task failed: {}", e);
                        commands::worker_failed(&mut session, &proxy, &e.to_string());
                    }
                }
            }
            command = commands_rx.recv() => match command {
                Some(command) => queued.push_back(command),
                None => {
                    tracing::info!("All command senders dropped");
                    break 'session;
                }
            },
        }
    }

    if let Some(handle) = job.take() {
        // Transfers are not cancellable; let a running one finish.
        if let Ok(outcome) = handle.await {
            commands::complete(&mut session, &proxy, outcome);
        }
    }
    session.notifications.clear();
    commands::publish_notifications(&mut session, &proxy);

    if let Err(e) = store.save(&session.config) {
        tracing::warn!("Failed to save config on shutdown: {}", e);
    }
    tracing::info!("Session stopped");
    session.config
}

fn process<P: EventProxy>(
    session: &mut Session<TokioTimer>,
    proxy: &P,
    command: Command,
    job: &mut Option<JoinHandle<JobOutcome>>,
) -> ControlFlow<()> {
    match commands::dispatch(session, proxy, command) {
        Dispatch::Done => ControlFlow::Continue(()),
        Dispatch::Offload(work) => {
            *job = Some(tokio::task::spawn_blocking(move || work.run()));
            ControlFlow::Continue(())
        }
        Dispatch::Shutdown => ControlFlow::Break(()),
    }
}

async fn wait_for(job: &mut Option<JoinHandle<JobOutcome>>) -> Result<JobOutcome, JoinError> {
    match job {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

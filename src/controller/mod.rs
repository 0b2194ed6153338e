// Copyright 2024-2026 crd-warden Contributors
// SPDX-License-Identifier: Apache-2.0

//! Long-running driver.
//!
//! Runs passes one at a time. Between passes it sleeps for the scheduler's
//! delay unless a relevant trigger arrives first. Shutdown interrupts both
//! the sleep and a pass in flight.

pub mod report;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::reconciler::{Catalog, ReconcileError, Reconciler};

pub use report::{host_name, PassReport};

/// Capacity of the trigger channel created by [`Controller::spawn`].
pub const TRIGGER_BUFFER: usize = 64;

/// External reason to run a pass before the timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A definition with this name changed or was deleted.
    Changed { name: String },
    /// Re-check the whole catalog.
    Resync,
}

enum Wake {
    Shutdown,
    Timer,
    Trigger(Option<Trigger>),
}

pub struct Controller {
    reconciler: Arc<Reconciler>,
    catalog: Catalog,
    group: String,
    members: HashSet<String>,
}

impl Controller {
    pub fn new(reconciler: Arc<Reconciler>, catalog: Catalog, group: impl Into<String>) -> Self {
        let group = group.into();
        let members = catalog
            .iter()
            .map(|i| reconciler.generator().name_for(i, &group))
            .collect();
        Self {
            reconciler,
            catalog,
            group,
            members,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Whether a trigger should wake the loop.
    pub fn is_relevant(&self, trigger: &Trigger) -> bool {
        match trigger {
            Trigger::Resync => true,
            Trigger::Changed { name } => self.members.contains(name),
        }
    }

    /// Run on the current runtime and return a handle for triggers, reports
    /// and shutdown.
    pub fn spawn(self, shutdown: CancellationToken) -> ControllerHandle {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_BUFFER);
        let (report_tx, report_rx) = watch::channel(None);
        let token = shutdown.clone();
        let task = tokio::spawn(async move { self.run(trigger_rx, report_tx, token).await });
        ControllerHandle {
            triggers: trigger_tx,
            reports: report_rx,
            shutdown,
            task,
        }
    }

    /// Loop until `shutdown` is cancelled.
    pub async fn run(
        self,
        triggers: mpsc::Receiver<Trigger>,
        reports: watch::Sender<Option<PassReport>>,
        shutdown: CancellationToken,
    ) {
        let mut triggers = Some(triggers);
        tracing::info!(
            group = %self.group,
            definitions = self.catalog.len(),
            "controller started"
        );

        'passes: loop {
            let report = match self.run_pass(&shutdown).await {
                Some(report) => report,
                None => break,
            };
            let delay = report.next_delay();
            reports.send_replace(Some(report));

            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);
            loop {
                let wake = tokio::select! {
                    _ = shutdown.cancelled() => Wake::Shutdown,
                    _ = &mut sleep => Wake::Timer,
                    received = next_trigger(&mut triggers) => Wake::Trigger(received),
                };
                match wake {
                    Wake::Shutdown => break 'passes,
                    Wake::Timer => break,
                    Wake::Trigger(None) => {
                        tracing::debug!("trigger channel closed, timer only");
                        triggers = None;
                    }
                    Wake::Trigger(Some(trigger)) if self.is_relevant(&trigger) => {
                        let coalesced = drain(&mut triggers);
                        tracing::debug!(?trigger, coalesced, "pass triggered");
                        break;
                    }
                    Wake::Trigger(Some(trigger)) => {
                        tracing::trace!(?trigger, "ignoring trigger outside catalog");
                    }
                }
            }
        }

        tracing::info!(group = %self.group, "controller stopped");
    }

    async fn run_pass(&self, shutdown: &CancellationToken) -> Option<PassReport> {
        let started_at = Utc::now();
        let started = Instant::now();
        match self
            .reconciler
            .reconcile_until(&self.catalog, &self.group, shutdown)
            .await
        {
            Ok(result) => {
                let report = PassReport::new(&result, &self.group, started_at, started.elapsed());
                report.record_metrics();
                Some(report)
            }
            Err(ReconcileError::Cancelled { completed, total }) => {
                tracing::info!(completed, total, "pass interrupted by shutdown");
                None
            }
        }
    }
}

async fn next_trigger(triggers: &mut Option<mpsc::Receiver<Trigger>>) -> Option<Trigger> {
    match triggers {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Discard queued triggers; they are covered by the pass about to run.
fn drain(triggers: &mut Option<mpsc::Receiver<Trigger>>) -> usize {
    let mut count = 0;
    let mut closed = false;
    if let Some(rx) = triggers.as_mut() {
        loop {
            match rx.try_recv() {
                Ok(_) => count += 1,
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }
    }
    if closed {
        *triggers = None;
    }
    count
}

/// Handle to a spawned [`Controller`].
pub struct ControllerHandle {
    triggers: mpsc::Sender<Trigger>,
    reports: watch::Receiver<Option<PassReport>>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Sender for external triggers.
    pub fn triggers(&self) -> mpsc::Sender<Trigger> {
        self.triggers.clone()
    }

    /// Queue a trigger. Returns false once the controller has stopped.
    pub async fn notify(&self, trigger: Trigger) -> bool {
        self.triggers.send(trigger).await.is_ok()
    }

    pub fn reports(&self) -> watch::Receiver<Option<PassReport>> {
        self.reports.clone()
    }

    pub fn latest(&self) -> Option<PassReport> {
        self.reports.borrow().clone()
    }

    /// Cancel and wait for the loop to exit.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        self.shutdown.cancel();
        self.task.await
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Routes runtime events to the admission mutator and the daemon manager.

use tracing::{debug, info};

use crate::admission::review_pod;
use crate::config::NfsTarget;
use crate::events::{PendingAdmission, ResourceEventSource};
use crate::scheduler::DaemonManager;

pub struct Operator<S: ResourceEventSource> {
    source: S,
    manager: DaemonManager,
    nfs: Option<NfsTarget>,
}

impl<S: ResourceEventSource> Operator<S> {
    pub fn new(source: S, manager: DaemonManager, nfs: Option<NfsTarget>) -> Self {
        Self {
            source,
            manager,
            nfs,
        }
    }

    /// Dispatch events until both event streams are closed, then stop all daemons
    pub async fn run(mut self) -> anyhow::Result<()> {
        info!("Operator started, waiting for events...");

        let Operator {
            source,
            manager,
            nfs,
        } = &mut self;
        let mut admissions_open = true;
        let mut daemons_open = true;

        while admissions_open || daemons_open {
            tokio::select! {
                review = source.next_admission_review(), if admissions_open => match review {
                    Some(pending) => answer(pending, nfs.as_ref()),
                    None => admissions_open = false,
                },
                event = source.next_daemon_event(), if daemons_open => match event {
                    Some(event) => {
                        debug!("Handling daemon event: {:?}", event);
                        manager.handle_event(event);
                    }
                    None => daemons_open = false,
                },
            }
        }

        manager.shutdown().await;
        info!("Operator stopped");
        Ok(())
    }
}

fn answer(pending: PendingAdmission, nfs: Option<&NfsTarget>) {
    let response = review_pod(&pending.request, nfs);
    if pending.respond_to.send(response).is_err() {
        debug!("Admission requester went away before the response was ready");
    }
}

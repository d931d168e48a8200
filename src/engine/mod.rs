mod conflict;
mod error;
mod occupancy;
mod queries;
mod store;
mod transaction;

pub use conflict::evaluate;
pub use error::{EngineError, RejectReason};
pub use occupancy::peak_occupancy;
pub use store::{FacilityStore, GroupIndex};

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::info;
use ulid::Ulid;

use crate::clock::Clock;
use crate::limits::*;
use crate::model::*;
use crate::notify::NotifyHub;

// ── Coordinator intake queue ─────────────────────────────

pub(super) enum CoordinatorCommand {
    Submit {
        request: CompoundRequest,
        response: Option<oneshot::Sender<TransactionReport>>,
    },
    Facility {
        id: FacilityId,
        response: oneshot::Sender<Option<FacilityInfo>>,
    },
    FacilityIds {
        response: oneshot::Sender<Vec<FacilityId>>,
    },
    Facilities {
        response: oneshot::Sender<Vec<FacilityInfo>>,
    },
}

/// Background task that owns the facility store and serializes transactions.
/// 1. Block until the next command arrives.
/// 2. For a compound: read the clock once, evaluate every sub-booking in
///    parallel, then commit all of it or none of it.
/// 3. Queries are answered between transactions, never mid-commit.
async fn coordinator_loop(
    mut store: FacilityStore,
    clock: Clock,
    notify: Arc<NotifyHub>,
    mut rx: mpsc::UnboundedReceiver<CoordinatorCommand>,
) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            CoordinatorCommand::Submit { request, response } => {
                let report = transaction::run(&mut store, request, clock.now(), &notify).await;
                if let Some(tx) = response {
                    let _ = tx.send(report);
                }
            }
            CoordinatorCommand::Facility { id, response } => {
                let _ = response.send(store.info(&id));
            }
            CoordinatorCommand::FacilityIds { response } => {
                let _ = response.send(store.facility_ids());
            }
            CoordinatorCommand::Facilities { response } => {
                let _ = response.send(store.infos());
            }
        }
    }
    info!("coordinator stopped: all handles dropped");
}

/// Handle to the single serializing coordinator. Cheap to clone; the
/// background task exits once every handle is dropped.
#[derive(Clone)]
pub struct Coordinator {
    tx: mpsc::UnboundedSender<CoordinatorCommand>,
    pub notify: Arc<NotifyHub>,
}

impl Coordinator {
    /// Provision the fixed facility set and start the coordinator task.
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        facilities: Vec<FacilitySpec>,
        clock: Clock,
        notify: Arc<NotifyHub>,
    ) -> Result<Self, EngineError> {
        let store = FacilityStore::provision(facilities)?;
        info!(facilities = store.facility_count(), "coordinator starting");
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(coordinator_loop(store, clock, notify.clone(), rx));
        Ok(Self { tx, notify })
    }

    /// Enqueue a compound without waiting for its verdict. Outcomes arrive
    /// in the owners' inboxes.
    pub fn submit(&self, request: CompoundRequest) -> Result<GroupId, EngineError> {
        self.enqueue(request, None)
    }

    /// Enqueue a compound and wait for the coordinator's report.
    pub async fn submit_and_wait(
        &self,
        request: CompoundRequest,
    ) -> Result<TransactionReport, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(request, Some(tx))?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Validate, then stamp the request with a fresh group id. Returns that id.
    fn enqueue(
        &self,
        mut request: CompoundRequest,
        response: Option<oneshot::Sender<TransactionReport>>,
    ) -> Result<GroupId, EngineError> {
        if let Err(e) = validate_request(&request) {
            metrics::counter!(crate::observability::INTAKE_REJECTED_TOTAL).increment(1);
            return Err(e);
        }
        let group = Ulid::new();
        request.regroup(group);
        self.tx
            .send(CoordinatorCommand::Submit { request, response })
            .map_err(|_| EngineError::Shutdown)?;
        Ok(group)
    }
}

/// Caller contract checks. Requests failing these never reach the evaluator.
fn validate_request(request: &CompoundRequest) -> Result<(), EngineError> {
    if request.is_empty() {
        return Err(EngineError::EmptyCompound);
    }
    if request.len() > MAX_COMPOUND_SIZE {
        return Err(EngineError::LimitExceeded("compound too large"));
    }
    let mut seen = HashSet::with_capacity(request.len());
    for booking in &request.bookings {
        if !seen.insert(booking.facility.as_str()) {
            return Err(EngineError::DuplicateFacility(booking.facility.clone()));
        }
    }
    Ok(())
}

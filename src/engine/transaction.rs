use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error, warn};

use crate::model::*;
use crate::notify::NotifyHub;
use crate::observability::*;

use super::conflict::evaluate;
use super::{FacilityStore, RejectReason};

/// Run one compound to a verdict against `store`.
///
/// Evaluation fans out to one task per sub-booking over `Arc` snapshots, so
/// nothing can observe the store while it is being changed. The commit (or
/// discard) happens only after every task has reported back.
pub(super) async fn run(
    store: &mut FacilityStore,
    request: CompoundRequest,
    now: Tick,
    notify: &NotifyHub,
) -> TransactionReport {
    let started = Instant::now();
    let CompoundRequest { group, bookings } = request;
    metrics::histogram!(COMPOUND_SIZE).record(bookings.len() as f64);

    let groups = Arc::new(store.group_index(Some(&candidate_victim_groups(store, &bookings))));

    let tasks = bookings.iter().map(|booking| {
        let facility = store.snapshot(&booking.facility);
        let groups = groups.clone();
        let booking = booking.clone();
        tokio::spawn(async move {
            match facility {
                Some(fs) => evaluate(&fs, &booking, now, &groups),
                None => Evaluation::rejected(booking, RejectReason::FacilityNotFound),
            }
        })
    });
    let results = join_all(tasks).await;
    drop(groups);

    let mut evaluations = Vec::with_capacity(bookings.len());
    for (booking, result) in bookings.into_iter().zip(results) {
        match result {
            Ok(evaluation) => evaluations.push(evaluation),
            Err(e) => {
                error!(%group, facility = %booking.facility, "evaluation task failed: {e}");
                evaluations.push(Evaluation::rejected(booking, RejectReason::CompoundPartialFailure));
            }
        }
    }

    let compound_possible = !evaluations.iter().any(|e| e.verdict.is_reject());
    let delivered = if compound_possible {
        commit(store, &evaluations, group)
    } else {
        abort(&evaluations, group)
    };

    for notification in &delivered {
        metrics::counter!(NOTIFICATIONS_TOTAL, "outcome" => notification.outcome.label()).increment(1);
        notify.send(notification.clone());
    }

    let status = if compound_possible { "committed" } else { "aborted" };
    metrics::counter!(COMPOUNDS_TOTAL, "status" => status).increment(1);
    metrics::histogram!(TRANSACTION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    TransactionReport {
        group,
        committed: compound_possible,
        verdicts: evaluations
            .into_iter()
            .map(|e| (e.booking.facility, e.verdict))
            .collect(),
        delivered,
    }
}

/// Groups owning a standard booking that overlaps some candidate. Only these
/// can lose a booking to preemption in this transaction.
fn candidate_victim_groups(store: &FacilityStore, bookings: &[Booking]) -> HashSet<GroupId> {
    let mut wanted = HashSet::new();
    for booking in bookings {
        if let Some(fs) = store.get(&booking.facility) {
            wanted.extend(
                fs.overlapping(&booking.span)
                    .filter(|existing| !existing.owner.is_vip())
                    .map(|existing| existing.group),
            );
        }
    }
    wanted
}

/// Apply every deduplicated action, return the notifications to deliver.
fn commit(store: &mut FacilityStore, evaluations: &[Evaluation], group: GroupId) -> Vec<Notification> {
    let mut seen_actions = HashSet::new();
    let mut seen_notifications = HashSet::new();
    let mut notifications = Vec::new();
    let mut cancellations = 0u64;

    for evaluation in evaluations {
        for action in &evaluation.actions {
            if !seen_actions.insert(action.target()) {
                continue;
            }
            if !store.apply(action) {
                warn!(%group, ?action, "committed action had no target");
            }
            if matches!(action, StoreAction::Remove { .. }) {
                cancellations += 1;
            }
        }
        for notification in &evaluation.notifications {
            let booking = &notification.booking;
            if seen_notifications.insert((booking.key(), booking.group)) {
                notifications.push(notification.clone());
            }
        }
    }

    let preemptions = evaluations
        .iter()
        .filter(|e| matches!(e.verdict, Verdict::Preempt { .. }))
        .count();
    if preemptions > 0 {
        metrics::counter!(PREEMPTIONS_TOTAL).increment(preemptions as u64);
        metrics::counter!(CANCELLATIONS_TOTAL).increment(cancellations);
    }
    debug!(%group, sub_bookings = evaluations.len(), preemptions, cancellations, "compound committed");
    notifications
}

/// Discard every tentative action. Each sub-booking owner hears about the
/// failure once; tentative victims hear nothing.
fn abort(evaluations: &[Evaluation], group: GroupId) -> Vec<Notification> {
    let rejected: Vec<RejectReason> = evaluations
        .iter()
        .filter_map(|e| match e.verdict {
            Verdict::Reject(reason) => Some(reason),
            _ => None,
        })
        .collect();
    for reason in &rejected {
        metrics::counter!(REJECTIONS_TOTAL, "reason" => reason.label()).increment(1);
    }
    debug!(%group, sub_bookings = evaluations.len(), ?rejected, "compound aborted");

    evaluations
        .iter()
        .map(|e| {
            let reason = match e.verdict {
                Verdict::Reject(reason) => reason,
                _ => RejectReason::CompoundPartialFailure,
            };
            Notification::new(e.booking.clone(), Outcome::Rejected, reason.to_string())
        })
        .collect()
}

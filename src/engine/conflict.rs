use crate::model::*;

use super::occupancy::peak_occupancy;
use super::store::GroupIndex;
use super::RejectReason;

pub(crate) const ADMITTED: &str = "facilities were booked";
pub(crate) const ADMITTED_WITH_PREEMPTION: &str =
    "facilities were booked, you have overwritten a non-VIP booking";
pub(crate) const PREEMPTED: &str = "a VIP user has overwritten your booking";

/// Decide whether `candidate` fits on `facility` at logical time `now`.
///
/// Pure: reads the facility snapshot and the group index, never mutates them.
/// The returned actions are only applied if the whole compound commits.
///
/// Preemption victim is the earliest-admitted overlapping standard booking
/// whose eviction leaves room for the candidate at every instant. Evicting it
/// also evicts every sibling from its compound group, on whichever facility
/// they live.
pub fn evaluate(
    facility: &FacilityState,
    candidate: &Booking,
    now: Tick,
    groups: &GroupIndex,
) -> Evaluation {
    if candidate.span.start < now {
        return Evaluation::rejected(candidate.clone(), RejectReason::PastInterval);
    }
    if !candidate.span.is_valid() {
        return Evaluation::rejected(candidate.clone(), RejectReason::InvalidInterval);
    }

    let capacity = facility.capacity;
    let candidate_vip = candidate.owner.is_vip();
    let overlapping: Vec<&Booking> = facility.overlapping(&candidate.span).collect();
    let mut total = 0u32;
    let mut vip = 0u32;

    for existing in &overlapping {
        total += 1;
        if existing.owner.is_vip() {
            vip += 1;
        }
        if (total >= capacity && !candidate_vip) || vip >= capacity {
            return Evaluation::rejected(candidate.clone(), RejectReason::CapacityExceeded);
        }
    }

    if total < capacity {
        return Evaluation {
            booking: candidate.clone(),
            verdict: Verdict::Admit,
            notifications: vec![Notification::new(candidate.clone(), Outcome::Accepted, ADMITTED)],
            actions: vec![StoreAction::Insert(candidate.clone())],
        };
    }

    // Full, VIP candidate, VIP sub-quota not reached. Scan in acceptance order.
    let victim = overlapping
        .iter()
        .enumerate()
        .filter(|(_, existing)| !existing.owner.is_vip())
        .find(|(i, _)| frees_a_slot(&overlapping, *i, &candidate.span, capacity))
        .map(|(_, existing)| *existing);

    match victim {
        Some(victim) => preempt(candidate, victim, groups),
        None => Evaluation::rejected(candidate.clone(), RejectReason::CapacityExceeded),
    }
}

/// Would the candidate fit at every instant once `overlapping[victim]` is gone?
fn frees_a_slot(overlapping: &[&Booking], victim: usize, span: &Span, capacity: u32) -> bool {
    let rest = overlapping
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != victim)
        .map(|(_, b)| &b.span);
    peak_occupancy(rest, span) < capacity
}

fn preempt(candidate: &Booking, victim: &Booking, groups: &GroupIndex) -> Evaluation {
    let victim_key = victim.key();
    let mut evicted = vec![victim];
    if let Some(siblings) = groups.get(&victim.group) {
        evicted.extend(siblings.iter().filter(|s| s.key() != victim_key));
    }

    let mut notifications = Vec::with_capacity(evicted.len() + 1);
    let mut actions = Vec::with_capacity(evicted.len() + 1);
    for booking in evicted {
        actions.push(StoreAction::remove(booking));
        notifications.push(Notification::new(booking.clone(), Outcome::Cancelled, PREEMPTED));
    }
    actions.push(StoreAction::Insert(candidate.clone()));
    notifications.push(Notification::new(
        candidate.clone(),
        Outcome::Accepted,
        ADMITTED_WITH_PREEMPTION,
    ));

    Evaluation {
        booking: candidate.clone(),
        verdict: Verdict::Preempt { victim: victim_key },
        notifications,
        actions,
    }
}

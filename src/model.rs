use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::RejectReason;

/// Logical clock ticks. The only time type.
pub type Tick = i64;

pub type UserId = u32;

/// Facility key, like `"room"` or `"projector"`.
pub type FacilityId = String;

/// Identifies the set of sibling bookings submitted together in one compound.
pub type GroupId = Ulid;

/// Half-open interval `[start, end)`.
///
/// Unlike a stored booking, a candidate span may be empty or inverted; the
/// evaluator rejects those instead of the constructor panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Tick,
    pub end: Tick,
}

impl Span {
    pub fn new(start: Tick, end: Tick) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    #[cfg(test)]
    pub fn contains_instant(&self, t: Tick) -> bool {
        self.start <= t && t < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Vip,
    Standard,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Vip => f.write_str("VIP"),
            Priority::Standard => f.write_str("non-VIP"),
        }
    }
}

/// A requester. Immutable after creation; its inbox lives in the `NotifyHub`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub priority: Priority,
}

impl User {
    pub fn vip(id: UserId) -> Self {
        Self { id, priority: Priority::Vip }
    }

    pub fn standard(id: UserId) -> Self {
        Self { id, priority: Priority::Standard }
    }

    pub fn is_vip(&self) -> bool {
        self.priority == Priority::Vip
    }
}

/// One reservation of one facility for one interval. Never mutated; only
/// inserted into or removed from a facility's booking list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub owner: User,
    pub facility: FacilityId,
    pub span: Span,
    pub group: GroupId,
}

impl Booking {
    pub fn key(&self) -> BookingKey {
        BookingKey {
            user: self.owner.id,
            facility: self.facility.clone(),
            start: self.span.start,
            end: self.span.end,
        }
    }
}

/// Structural booking identity: same user, facility and interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingKey {
    pub user: UserId,
    pub facility: FacilityId,
    pub start: Tick,
    pub end: Tick,
}

/// Provisioning input for one facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitySpec {
    pub id: FacilityId,
    pub capacity: u32,
}

impl FacilitySpec {
    pub fn new(id: impl Into<FacilityId>, capacity: u32) -> Self {
        Self { id: id.into(), capacity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityState {
    pub id: FacilityId,
    /// Max simultaneously overlapping bookings. Fixed for the facility's lifetime.
    pub capacity: u32,
    /// Accepted bookings in acceptance order (oldest first), not time order.
    pub bookings: Vec<Booking>,
}

impl FacilityState {
    pub fn new(id: FacilityId, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            bookings: Vec::new(),
        }
    }

    pub fn insert_booking(&mut self, booking: Booking) {
        self.bookings.push(booking);
    }

    /// Remove the booking matching `key` that belongs to compound `group`.
    /// Identical bookings from other compounds are left alone.
    pub fn remove_booking(&mut self, key: &BookingKey, group: GroupId) -> Option<Booking> {
        let pos = self
            .bookings
            .iter()
            .position(|b| b.group == group && b.key() == *key)?;
        Some(self.bookings.remove(pos))
    }

    /// Bookings overlapping `query`, in acceptance order.
    pub fn overlapping<'a>(&'a self, query: &'a Span) -> impl Iterator<Item = &'a Booking> + 'a {
        self.bookings.iter().filter(move |b| b.span.overlaps(query))
    }

    /// Number of bookings covering instant `t`, and how many of those are VIP-owned.
    #[cfg(test)]
    pub fn occupancy_at(&self, t: Tick) -> (u32, u32) {
        let mut total = 0;
        let mut vip = 0;
        for b in self.bookings.iter().filter(|b| b.span.contains_instant(t)) {
            total += 1;
            if b.owner.is_vip() {
                vip += 1;
            }
        }
        (total, vip)
    }
}

/// A set of sub-bookings across distinct facilities, decided as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundRequest {
    /// Replaced by a fresh id when the coordinator accepts the request, so
    /// resubmitting a clone never joins an existing compound.
    pub group: GroupId,
    pub bookings: Vec<Booking>,
}

impl CompoundRequest {
    pub fn new() -> Self {
        Self {
            group: Ulid::new(),
            bookings: Vec::new(),
        }
    }

    /// Append a sub-booking. All sub-bookings share this request's group id.
    pub fn book(mut self, owner: User, facility: impl Into<FacilityId>, start: Tick, end: Tick) -> Self {
        self.bookings.push(Booking {
            owner,
            facility: facility.into(),
            span: Span::new(start, end),
            group: self.group,
        });
        self
    }

    /// Degenerate compound touching exactly one facility.
    pub fn single(owner: User, facility: impl Into<FacilityId>, start: Tick, end: Tick) -> Self {
        Self::new().book(owner, facility, start, end)
    }

    /// Move the request and all its sub-bookings to `group`.
    pub(crate) fn regroup(&mut self, group: GroupId) {
        self.group = group;
        for booking in &mut self.bookings {
            booking.group = group;
        }
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

impl Default for CompoundRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// The evaluator's per-sub-booking decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Preempt { victim: BookingKey },
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_reject(&self) -> bool {
        matches!(self, Verdict::Reject(_))
    }
}

/// A pending change to the facility store, applied only on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    Insert(Booking),
    Remove { key: BookingKey, group: GroupId },
}

impl StoreAction {
    pub fn remove(booking: &Booking) -> Self {
        StoreAction::Remove {
            key: booking.key(),
            group: booking.group,
        }
    }

    /// The exact booking this action targets: content plus owning compound.
    pub fn target(&self) -> (BookingKey, GroupId) {
        match self {
            StoreAction::Insert(b) => (b.key(), b.group),
            StoreAction::Remove { key, group } => (key.clone(), *group),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Accepted,
    Rejected,
    Cancelled,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Rejected => "rejected",
            Outcome::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub booking: Booking,
    pub outcome: Outcome,
    pub reason: String,
}

impl Notification {
    pub fn new(booking: Booking, outcome: Outcome, reason: impl Into<String>) -> Self {
        Self {
            booking,
            outcome,
            reason: reason.into(),
        }
    }
}

/// Result of evaluating one sub-booking against one facility snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub booking: Booking,
    pub verdict: Verdict,
    pub notifications: Vec<Notification>,
    pub actions: Vec<StoreAction>,
}

impl Evaluation {
    pub fn rejected(booking: Booking, reason: RejectReason) -> Self {
        let notification = Notification::new(booking.clone(), Outcome::Rejected, reason.to_string());
        Self {
            booking,
            verdict: Verdict::Reject(reason),
            notifications: vec![notification],
            actions: Vec::new(),
        }
    }
}

/// What a caller awaiting a compound gets back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReport {
    pub group: GroupId,
    pub committed: bool,
    /// One verdict per sub-booking, in submission order.
    pub verdicts: Vec<(FacilityId, Verdict)>,
    /// Notifications actually delivered, in emission order.
    pub delivered: Vec<Notification>,
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingInfo {
    pub user: UserId,
    pub priority: Priority,
    pub start: Tick,
    pub end: Tick,
    pub group: GroupId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacilityInfo {
    pub id: FacilityId,
    pub capacity: u32,
    /// In acceptance order.
    pub bookings: Vec<BookingInfo>,
}

impl From<&FacilityState> for FacilityInfo {
    fn from(fs: &FacilityState) -> Self {
        Self {
            id: fs.id.clone(),
            capacity: fs.capacity,
            bookings: fs
                .bookings
                .iter()
                .map(|b| BookingInfo {
                    user: b.owner.id,
                    priority: b.owner.priority,
                    start: b.span.start,
                    end: b.span.end,
                    group: b.group,
                })
                .collect(),
        }
    }
}

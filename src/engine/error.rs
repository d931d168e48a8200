use crate::model::FacilityId;

/// Why a sub-booking was turned down. These are ordinary outcomes reported to
/// users as notifications, never process-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    PastInterval,
    InvalidInterval,
    CapacityExceeded,
    FacilityNotFound,
    CompoundPartialFailure,
}

impl RejectReason {
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::PastInterval => "past_interval",
            RejectReason::InvalidInterval => "invalid_interval",
            RejectReason::CapacityExceeded => "capacity_exceeded",
            RejectReason::FacilityNotFound => "facility_not_found",
            RejectReason::CompoundPartialFailure => "compound_partial_failure",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::PastInterval => f.write_str("in the past"),
            RejectReason::InvalidInterval => f.write_str("invalid interval"),
            RejectReason::CapacityExceeded => f.write_str("capacity exceeded"),
            RejectReason::FacilityNotFound => f.write_str("facility not found"),
            RejectReason::CompoundPartialFailure => f.write_str("part of the compound failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    AlreadyExists(FacilityId),
    InvalidCapacity(FacilityId),
    /// The same facility appears twice in one compound request.
    DuplicateFacility(FacilityId),
    EmptyCompound,
    LimitExceeded(&'static str),
    Shutdown,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::AlreadyExists(id) => write!(f, "facility already exists: {id}"),
            EngineError::InvalidCapacity(id) => {
                write!(f, "facility {id}: capacity must be at least 1")
            }
            EngineError::DuplicateFacility(id) => {
                write!(f, "facility {id} appears more than once in the compound")
            }
            EngineError::EmptyCompound => write!(f, "compound request has no bookings"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Shutdown => write!(f, "coordinator has shut down"),
        }
    }
}

impl std::error::Error for EngineError {}

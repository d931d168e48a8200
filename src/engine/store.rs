use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// Compound group → every accepted booking of that group, across facilities.
/// Built per transaction and dropped when it ends.
pub type GroupIndex = HashMap<GroupId, Vec<Booking>>;

/// In-memory facility state. Owned by the coordinator task; evaluation tasks
/// only ever see `Arc` snapshots handed out before a commit.
#[derive(Debug, Default)]
pub struct FacilityStore {
    facilities: BTreeMap<FacilityId, Arc<FacilityState>>,
}

impl FacilityStore {
    /// Build the fixed facility set. Facilities are never added or removed later.
    pub fn provision(specs: Vec<FacilitySpec>) -> Result<Self, EngineError> {
        if specs.len() > MAX_FACILITIES {
            return Err(EngineError::LimitExceeded("too many facilities"));
        }
        let mut facilities = BTreeMap::new();
        for spec in specs {
            if spec.id.len() > MAX_FACILITY_ID_LEN {
                return Err(EngineError::LimitExceeded("facility id too long"));
            }
            if spec.capacity == 0 {
                return Err(EngineError::InvalidCapacity(spec.id));
            }
            if facilities.contains_key(&spec.id) {
                return Err(EngineError::AlreadyExists(spec.id));
            }
            let state = FacilityState::new(spec.id.clone(), spec.capacity);
            facilities.insert(spec.id, Arc::new(state));
        }
        Ok(Self { facilities })
    }

    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    pub fn get(&self, id: &str) -> Option<&FacilityState> {
        self.facilities.get(id).map(Arc::as_ref)
    }

    /// Cheap shared snapshot for a read-only evaluation task.
    pub fn snapshot(&self, id: &str) -> Option<Arc<FacilityState>> {
        self.facilities.get(id).cloned()
    }

    pub fn facility_ids(&self) -> Vec<FacilityId> {
        self.facilities.keys().cloned().collect()
    }

    pub fn info(&self, id: &str) -> Option<FacilityInfo> {
        self.facilities.get(id).map(|fs| FacilityInfo::from(fs.as_ref()))
    }

    pub fn infos(&self) -> Vec<FacilityInfo> {
        self.facilities.values().map(|fs| FacilityInfo::from(fs.as_ref())).collect()
    }

    /// Index the accepted bookings of the groups in `wanted`, or of every
    /// group when `wanted` is `None`.
    pub fn group_index(&self, wanted: Option<&HashSet<GroupId>>) -> GroupIndex {
        let mut index = GroupIndex::new();
        for fs in self.facilities.values() {
            for booking in &fs.bookings {
                if wanted.is_none_or(|w| w.contains(&booking.group)) {
                    index.entry(booking.group).or_default().push(booking.clone());
                }
            }
        }
        index
    }

    /// Apply one committed action. Returns false if the target facility or
    /// booking no longer exists.
    pub fn apply(&mut self, action: &StoreAction) -> bool {
        let facility_id = match action {
            StoreAction::Insert(b) => &b.facility,
            StoreAction::Remove { key, .. } => &key.facility,
        };
        let Some(fs) = self.facilities.get_mut(facility_id) else {
            return false;
        };
        // Snapshots are dropped at fan-in, so this normally mutates in place.
        let fs = Arc::make_mut(fs);
        match action {
            StoreAction::Insert(b) => {
                fs.insert_booking(b.clone());
                true
            }
            StoreAction::Remove { key, group } => fs.remove_booking(key, *group).is_some(),
        }
    }
}

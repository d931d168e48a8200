use tokio::sync::oneshot;

use crate::model::*;

use super::{Coordinator, CoordinatorCommand, EngineError};

impl Coordinator {
    /// Snapshot of one facility between transactions. `None` if unknown.
    pub async fn facility(&self, id: &str) -> Result<Option<FacilityInfo>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(CoordinatorCommand::Facility {
                id: id.to_string(),
                response: tx,
            })
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Provisioned facility ids, sorted.
    pub async fn facility_ids(&self) -> Result<Vec<FacilityId>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(CoordinatorCommand::FacilityIds { response: tx })
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }

    /// Every facility snapshot, taken at one point between transactions.
    pub async fn facilities(&self) -> Result<Vec<FacilityInfo>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(CoordinatorCommand::Facilities { response: tx })
            .map_err(|_| EngineError::Shutdown)?;
        rx.await.map_err(|_| EngineError::Shutdown)
    }
}

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::*;

/// A demo run: the facilities to provision, the users and the compound
/// requests each user submits after a wall-clock delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub facilities: Vec<FacilitySpec>,
    pub users: Vec<User>,
    pub requests: Vec<ScenarioRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRequest {
    pub user: UserId,
    #[serde(default)]
    pub delay_ms: u64,
    pub bookings: Vec<ScenarioBooking>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioBooking {
    pub facility: FacilityId,
    pub start: Tick,
    pub end: Tick,
}

#[derive(Debug)]
pub enum ScenarioError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    UnknownUser(UserId),
    DuplicateUser(UserId),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io(e) => write!(f, "cannot read scenario: {e}"),
            ScenarioError::Parse(e) => write!(f, "invalid scenario: {e}"),
            ScenarioError::UnknownUser(id) => write!(f, "request references unknown user {id}"),
            ScenarioError::DuplicateUser(id) => write!(f, "user {id} declared twice"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl From<std::io::Error> for ScenarioError {
    fn from(e: std::io::Error) -> Self {
        ScenarioError::Io(e)
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(e: serde_json::Error) -> Self {
        ScenarioError::Parse(e)
    }
}

impl Scenario {
    /// Two facilities of capacity 2; users 1–2 standard, 3–5 VIP; everyone
    /// wants room and projector for `[10, 15)`. Standard users ask first, so
    /// VIPs end up preempting them and the last VIP is turned down.
    pub fn builtin() -> Self {
        let users: Vec<User> = vec![
            User::standard(1),
            User::standard(2),
            User::vip(3),
            User::vip(4),
            User::vip(5),
        ];
        let requests = users
            .iter()
            .map(|u| ScenarioRequest {
                user: u.id,
                delay_ms: if u.is_vip() { 2000 } else { 1000 },
                bookings: ["room", "projector"]
                    .into_iter()
                    .map(|facility| ScenarioBooking {
                        facility: facility.into(),
                        start: 10,
                        end: 15,
                    })
                    .collect(),
            })
            .collect();
        Self {
            facilities: vec![FacilitySpec::new("room", 2), FacilitySpec::new("projector", 2)],
            users,
            requests,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ScenarioError> {
        self.users_by_id()?;
        Ok(())
    }

    fn users_by_id(&self) -> Result<HashMap<UserId, User>, ScenarioError> {
        let mut users = HashMap::with_capacity(self.users.len());
        for user in &self.users {
            if users.insert(user.id, *user).is_some() {
                return Err(ScenarioError::DuplicateUser(user.id));
            }
        }
        for request in &self.requests {
            if !users.contains_key(&request.user) {
                return Err(ScenarioError::UnknownUser(request.user));
            }
        }
        Ok(users)
    }

    /// Turn every scenario request into a compound, paired with its delay.
    pub fn compounds(&self) -> Result<Vec<(u64, CompoundRequest)>, ScenarioError> {
        let users = self.users_by_id()?;
        let mut out = Vec::with_capacity(self.requests.len());
        for request in &self.requests {
            let owner = *users
                .get(&request.user)
                .ok_or(ScenarioError::UnknownUser(request.user))?;
            let compound = request
                .bookings
                .iter()
                .fold(CompoundRequest::new(), |c, b| {
                    c.book(owner, b.facility.clone(), b.start, b.end)
                });
            out.push((request.delay_ms, compound));
        }
        Ok(out)
    }
}

/// Human-readable line for one notification.
pub fn render(n: &Notification) -> String {
    let b = &n.booking;
    let action = match n.outcome {
        Outcome::Accepted => "Booking successful.",
        Outcome::Rejected => "Booking not successful.",
        Outcome::Cancelled => "Booking cancelled.",
    };
    format!(
        "Booking for user {} ({}) for facility '{}' from time {} to time {}. {} {}.",
        b.owner.id, b.owner.priority, b.facility, b.span.start, b.span.end, action, n.reason
    )
}

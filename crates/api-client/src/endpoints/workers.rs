//! Worker endpoints

use crate::client::FleetClient;
use crate::error::ApiResult;
use crate::query::{QueryParams, ToQueryParams};
use serde::{Deserialize, Serialize};

/// Workers API interface
#[derive(Clone, Debug)]
pub struct WorkersApi {
    client: FleetClient,
}

impl WorkersApi {
    pub(crate) fn new(client: FleetClient) -> Self {
        Self { client }
    }

    /// List workers matching `params`
    ///
    /// GET /workers
    pub async fn list(&self, params: &WorkerListParams) -> ApiResult<Vec<Worker>> {
        let request = self.client.get().segment("workers").query(params);
        self.client.call(request).await
    }

    /// Get a worker by id
    ///
    /// GET /workers/{id}
    pub async fn get(&self, id: &str) -> ApiResult<Worker> {
        self.client
            .call(self.client.get().segments(["workers", id]))
            .await
    }

    /// Create a worker
    ///
    /// POST /workers
    pub async fn create(&self, worker: &CreateWorkerRequest) -> ApiResult<Worker> {
        let request = self.client.post().segment("workers").json(worker);
        self.client.call(request).await
    }

    /// Update a worker
    ///
    /// PUT /workers/{id}
    pub async fn update(&self, id: &str, worker: &UpdateWorkerRequest) -> ApiResult<Worker> {
        let request = self.client.put().segments(["workers", id]).json(worker);
        self.client.call(request).await
    }

    /// Delete a worker
    ///
    /// DELETE /workers/{id}
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .send(self.client.delete().segments(["workers", id]))
            .await
    }
}

/// Worker duty states used by the `states` filter
pub mod worker_state {
    /// Off duty
    pub const OFF_DUTY: u8 = 0;
    /// On duty, no active task
    pub const IDLE: u8 = 1;
    /// On duty, working a task
    pub const ACTIVE: u8 = 2;
}

/// Filters for listing workers; empty fields are left out of the query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerListParams {
    /// Fields to return, e.g. `name`, `phone`
    pub filter: Vec<String>,
    /// Only workers on these teams
    pub teams: Vec<String>,
    /// Only workers in these [`worker_state`]s
    pub states: Vec<u8>,
    /// Only workers with these phone numbers
    pub phones: Vec<String>,
}

impl WorkerListParams {
    /// Create new params with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict returned fields
    #[must_use]
    pub fn with_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.filter = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Filter by team
    #[must_use]
    pub fn with_teams<S: Into<String>>(mut self, teams: impl IntoIterator<Item = S>) -> Self {
        self.teams = teams.into_iter().map(Into::into).collect();
        self
    }

    /// Filter by duty state
    #[must_use]
    pub fn with_states(mut self, states: impl IntoIterator<Item = u8>) -> Self {
        self.states = states.into_iter().collect();
        self
    }

    /// Filter by phone number
    #[must_use]
    pub fn with_phones<S: Into<String>>(mut self, phones: impl IntoIterator<Item = S>) -> Self {
        self.phones = phones.into_iter().map(Into::into).collect();
        self
    }
}

impl ToQueryParams for WorkerListParams {
    fn to_query_params(&self) -> ApiResult<QueryParams> {
        QueryParams::from_serialize(self)
    }
}

/// Worker entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    /// Identifier
    pub id: String,
    /// Worker name
    #[serde(default)]
    pub name: String,
    /// Phone number in E.164 form
    #[serde(default)]
    pub phone: String,
    /// Organization the worker belongs to
    #[serde(default)]
    pub organization: String,
    /// Teams the worker belongs to
    #[serde(default)]
    pub teams: Vec<String>,
    /// Whether the worker is on duty
    #[serde(default)]
    pub on_duty: bool,
    /// Task currently in progress
    #[serde(default)]
    pub active_task: Option<String>,
    /// Assigned task ids in order
    #[serde(default)]
    pub tasks: Vec<String>,
    /// Vehicle, absent for on-foot workers
    #[serde(default)]
    pub vehicle: Option<Vehicle>,
    /// `[longitude, latitude]` of the last reported position
    #[serde(default)]
    pub location: Option<Vec<f64>>,
    /// Creation time, milliseconds since the epoch
    #[serde(default)]
    pub time_created: i64,
    /// Last change, milliseconds since the epoch
    #[serde(default)]
    pub time_last_modified: i64,
}

/// Vehicle a worker drives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Vehicle id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// `CAR`, `MOTORCYCLE`, `BICYCLE` or `TRUCK`
    #[serde(rename = "type")]
    pub vehicle_type: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// License plate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    /// Vehicle color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Create worker request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkerRequest {
    /// Display name
    pub name: String,
    /// Phone number in E.164 form
    pub phone: String,
    /// Team ids
    pub teams: Vec<String>,
    /// Vehicle details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    /// Units the worker can carry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// Update worker request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkerRequest {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New team ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<String>>,
    /// New vehicle details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    /// New units the worker can carry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

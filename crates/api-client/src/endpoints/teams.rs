//! Team endpoints

use crate::client::FleetClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

/// Teams API interface
#[derive(Clone, Debug)]
pub struct TeamsApi {
    client: FleetClient,
}

impl TeamsApi {
    pub(crate) fn new(client: FleetClient) -> Self {
        Self { client }
    }

    /// List all teams
    ///
    /// GET /teams
    pub async fn list(&self) -> ApiResult<Vec<Team>> {
        self.client.call(self.client.get().segment("teams")).await
    }

    /// Get a team by id
    ///
    /// GET /teams/{id}
    pub async fn get(&self, id: &str) -> ApiResult<Team> {
        self.client
            .call(self.client.get().segments(["teams", id]))
            .await
    }

    /// Create a team
    ///
    /// POST /teams
    pub async fn create(&self, team: &CreateTeamRequest) -> ApiResult<Team> {
        let request = self.client.post().segment("teams").json(team);
        self.client.call(request).await
    }

    /// Update a team
    ///
    /// PUT /teams/{id}
    pub async fn update(&self, id: &str, team: &UpdateTeamRequest) -> ApiResult<Team> {
        let request = self.client.put().segments(["teams", id]).json(team);
        self.client.call(request).await
    }

    /// Delete a team
    ///
    /// DELETE /teams/{id}
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .send(self.client.delete().segments(["teams", id]))
            .await
    }
}

/// Team entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Identifier
    pub id: String,
    /// Team name
    pub name: String,
    /// Worker ids
    #[serde(default)]
    pub workers: Vec<String>,
    /// Administrator ids
    #[serde(default)]
    pub managers: Vec<String>,
    /// Hub destination id
    #[serde(default)]
    pub hub: Option<String>,
    /// Creation time, milliseconds since the epoch
    #[serde(default)]
    pub time_created: i64,
    /// Last change, milliseconds since the epoch
    #[serde(default)]
    pub time_last_modified: i64,
}

/// Create team request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    /// Display name
    pub name: String,
    /// Worker ids
    pub workers: Vec<String>,
    /// Admin ids managing the team
    pub managers: Vec<String>,
    /// Hub destination id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub: Option<String>,
    /// Let workers assign tasks to themselves
    #[serde(default)]
    pub enable_self_assignment: bool,
}

/// Update team request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New worker ids
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<Vec<String>>,
    /// New admin ids managing the team
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managers: Option<Vec<String>>,
    /// New hub destination id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub: Option<String>,
}

//! Organization endpoints

use crate::client::FleetClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

/// Organization API interface
#[derive(Clone, Debug)]
pub struct OrganizationApi {
    client: FleetClient,
}

impl OrganizationApi {
    pub(crate) fn new(client: FleetClient) -> Self {
        Self { client }
    }

    /// Details of the organization owning the API key
    ///
    /// GET /organization
    pub async fn get(&self) -> ApiResult<Organization> {
        self.client.call(self.client.get().segment("organization")).await
    }

    /// Details of a connected organization
    ///
    /// GET /organizations/{id}
    pub async fn get_delegatee(&self, id: &str) -> ApiResult<Delegatee> {
        let request = self.client.get().segments(["organizations", id]);
        self.client.call(request).await
    }
}

/// The caller's organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Identifier
    pub id: String,
    /// Organization name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Logo image id
    #[serde(default)]
    pub image: Option<String>,
    /// IANA time zone
    #[serde(default)]
    pub timezone: String,
    /// Country code
    #[serde(default)]
    pub country: String,
    /// Organizations this one can hand tasks to
    #[serde(default)]
    pub delegatees: Vec<String>,
    /// Creation time, milliseconds since the epoch
    #[serde(default)]
    pub time_created: i64,
    /// Last change, milliseconds since the epoch
    #[serde(default)]
    pub time_last_modified: i64,
}

/// A connected organization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delegatee {
    /// Identifier
    pub id: String,
    /// Organization name
    pub name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// IANA time zone
    #[serde(default)]
    pub timezone: String,
    /// Country code
    #[serde(default)]
    pub country: String,
    /// Whether the delegatee fulfils tasks
    #[serde(default)]
    pub is_fulfillment: bool,
}

//! Administrator endpoints

use crate::client::FleetClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

/// Administrators API interface
#[derive(Clone, Debug)]
pub struct AdminsApi {
    client: FleetClient,
}

impl AdminsApi {
    pub(crate) fn new(client: FleetClient) -> Self {
        Self { client }
    }

    /// List every administrator of the organization
    ///
    /// GET /admins
    pub async fn list(&self) -> ApiResult<Vec<Admin>> {
        self.client.call(self.client.get().segment("admins")).await
    }

    /// Create an administrator
    ///
    /// POST /admins
    pub async fn create(&self, admin: &CreateAdminRequest) -> ApiResult<Admin> {
        let request = self.client.post().segment("admins").json(admin);
        self.client.call(request).await
    }

    /// Update an administrator
    ///
    /// PUT /admins/{id}
    pub async fn update(&self, id: &str, admin: &UpdateAdminRequest) -> ApiResult<Admin> {
        let request = self.client.put().segments(["admins", id]).json(admin);
        self.client.call(request).await
    }

    /// Delete an administrator
    ///
    /// DELETE /admins/{id}
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .send(self.client.delete().segments(["admins", id]))
            .await
    }
}

/// Administrator account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    /// Identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Owning organization id
    #[serde(default)]
    pub organization: String,
    /// `super` or `standard`
    #[serde(rename = "type", default)]
    pub admin_type: String,
    /// Phone number in E.164 form
    #[serde(default)]
    pub phone: Option<String>,
    /// Whether the account can sign in
    #[serde(default)]
    pub is_active: bool,
    /// Whether this admin owns the account
    #[serde(default)]
    pub is_account_owner: bool,
    /// Creation time, milliseconds since the epoch
    #[serde(default)]
    pub time_created: i64,
    /// Last change, milliseconds since the epoch
    #[serde(default)]
    pub time_last_modified: i64,
    /// Custom metadata entries
    #[serde(default)]
    pub metadata: Vec<serde_json::Value>,
}

/// Create administrator request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Phone number in E.164 form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Only meaningful for dispatcher accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read_only: Option<bool>,
}

/// Update administrator request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdminRequest {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New contact email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New phone number in E.164 form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

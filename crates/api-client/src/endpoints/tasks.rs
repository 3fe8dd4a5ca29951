//! Task endpoints
//!
//! Tasks are the unit of work handed to workers:
//! - Fetch by id or by the short id shown to recipients
//! - Page through tasks created in a time range
//! - Create one at a time or in batches
//! - Update, complete, clone and delete

use crate::client::FleetClient;
use crate::error::{ApiResult, ErrorMessage};
use crate::query::{QueryParams, ToQueryParams};
use serde::{Deserialize, Serialize};

/// Task state codes
pub mod task_state {
    /// Not assigned to any worker
    pub const UNASSIGNED: u8 = 0;
    /// Assigned but not started
    pub const ASSIGNED: u8 = 1;
    /// Worker is on the way
    pub const ACTIVE: u8 = 2;
    /// Finished, successfully or not
    pub const COMPLETED: u8 = 3;
}

/// Tasks API interface
#[derive(Clone, Debug)]
pub struct TasksApi {
    client: FleetClient,
}

impl TasksApi {
    pub(crate) fn new(client: FleetClient) -> Self {
        Self { client }
    }

    /// Get a task by id
    ///
    /// GET /tasks/{id}
    pub async fn get(&self, id: &str) -> ApiResult<Task> {
        self.client
            .call(self.client.get().segments(["tasks", id]))
            .await
    }

    /// Get a task by its short id
    ///
    /// GET /tasks/shortId/{short_id}
    pub async fn get_by_short_id(&self, short_id: &str) -> ApiResult<Task> {
        let request = self.client.get().segments(["tasks", "shortId", short_id]);
        self.client.call(request).await
    }

    /// One page of tasks matching `params`
    ///
    /// GET /tasks/all
    pub async fn list(&self, params: &TaskListParams) -> ApiResult<TaskPage> {
        let request = self.client.get().segments(["tasks", "all"]).query(params);
        self.client.call(request).await
    }

    /// Create a task
    ///
    /// POST /tasks
    pub async fn create(&self, task: &CreateTaskRequest) -> ApiResult<Task> {
        let request = self.client.post().segment("tasks").json(task);
        self.client.call(request).await
    }

    /// Create several tasks in one call.
    ///
    /// Tasks that fail validation are reported per item in
    /// [`BatchCreateResponse::errors`]; the call itself still succeeds.
    ///
    /// POST /tasks/batch
    pub async fn batch_create(&self, tasks: &[CreateTaskRequest]) -> ApiResult<BatchCreateResponse> {
        let body = BatchCreateRequest { tasks };
        let request = self.client.post().segments(["tasks", "batch"]).json(&body);
        self.client.call(request).await
    }

    /// Update a task
    ///
    /// PUT /tasks/{id}
    pub async fn update(&self, id: &str, task: &UpdateTaskRequest) -> ApiResult<Task> {
        let request = self.client.put().segments(["tasks", id]).json(task);
        self.client.call(request).await
    }

    /// Force-complete a started task
    ///
    /// POST /tasks/{id}/complete
    pub async fn complete(&self, id: &str, completion: &CompleteTaskRequest) -> ApiResult<()> {
        let request = self
            .client
            .post()
            .segments(["tasks", id, "complete"])
            .json(completion);
        self.client.send(request).await
    }

    /// Copy a task into a new unassigned one
    ///
    /// POST /tasks/{id}/clone
    pub async fn clone_task(&self, id: &str) -> ApiResult<Task> {
        let request = self.client.post().segments(["tasks", id, "clone"]);
        self.client.call(request).await
    }

    /// Delete a task
    ///
    /// DELETE /tasks/{id}
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.client
            .send(self.client.delete().segments(["tasks", id]))
            .await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Filters for listing tasks; zero and empty fields are left out of the query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    /// Lower bound of creation time, unix milliseconds (required by the service)
    pub from: i64,
    /// Upper bound of creation time, unix milliseconds
    pub to: i64,
    /// Continue after this task id
    pub last_id: String,
    /// Only tasks in these states
    pub state: Vec<u8>,
    /// Only tasks assigned to this worker
    pub worker: String,
}

impl TaskListParams {
    /// Tasks created since `from` (unix milliseconds)
    #[must_use]
    pub fn since(from: i64) -> Self {
        Self {
            from,
            ..Self::default()
        }
    }

    /// Set the upper time bound
    #[must_use]
    pub fn until(mut self, to: i64) -> Self {
        self.to = to;
        self
    }

    /// Resume from the cursor of a previous page
    #[must_use]
    pub fn after(mut self, last_id: impl Into<String>) -> Self {
        self.last_id = last_id.into();
        self
    }

    /// Filter by state codes from [`task_state`]
    #[must_use]
    pub fn with_states(mut self, states: impl IntoIterator<Item = u8>) -> Self {
        self.state = states.into_iter().collect();
        self
    }

    /// Filter by worker
    #[must_use]
    pub fn with_worker(mut self, worker: impl Into<String>) -> Self {
        self.worker = worker.into();
        self
    }
}

impl ToQueryParams for TaskListParams {
    fn to_query_params(&self) -> ApiResult<QueryParams> {
        QueryParams::from_serialize(self)
    }
}

/// One page of tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    /// Cursor for the next page; absent on the last page
    #[serde(default)]
    pub last_id: Option<String>,
    /// Tasks on this page
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Task entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier
    pub id: String,
    /// Short id shown in the dashboard
    #[serde(default)]
    pub short_id: String,
    /// Public tracking page
    #[serde(rename = "trackingURL", default)]
    pub tracking_url: Option<String>,
    /// Owning organization id
    #[serde(default)]
    pub organization: String,
    /// Organization the task is performed for
    #[serde(default)]
    pub merchant: String,
    /// Organization performing the task
    #[serde(default)]
    pub executor: String,
    /// Admin who created the task
    #[serde(default)]
    pub creator: String,
    /// Assigned worker id
    #[serde(default)]
    pub worker: Option<String>,
    /// One of the [`task_state`] codes
    #[serde(default)]
    pub state: u8,
    /// Whether this is a pickup rather than a dropoff
    #[serde(default)]
    pub pickup_task: bool,
    /// Notes for the worker
    #[serde(default)]
    pub notes: String,
    /// Earliest completion time, milliseconds since the epoch
    #[serde(default)]
    pub complete_after: Option<i64>,
    /// Latest completion time, milliseconds since the epoch
    #[serde(default)]
    pub complete_before: Option<i64>,
    /// Where the task happens
    #[serde(default)]
    pub destination: Option<Destination>,
    /// People receiving the task
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    /// Outcome once completed
    #[serde(default)]
    pub completion_details: Option<CompletionDetails>,
    /// Creation time, milliseconds since the epoch
    #[serde(default)]
    pub time_created: i64,
    /// Last change, milliseconds since the epoch
    #[serde(default)]
    pub time_last_modified: i64,
}

/// Where a task happens
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    /// Destination id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Postal address
    pub address: Address,
    /// `[longitude, latitude]`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<f64>,
    /// Notes about this destination
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// Postal address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// House number
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub number: String,
    /// Street name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub street: String,
    /// Apartment or suite
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub apartment: String,
    /// City
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
    /// State or region
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    /// Postal code
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub postal_code: String,
    /// Country code
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,
    /// Free-form address for the service to geocode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unparsed: Option<String>,
}

impl Address {
    /// Address the service should geocode itself
    pub fn unparsed(text: impl Into<String>) -> Self {
        Self {
            unparsed: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Person receiving a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    /// Recipient id
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Recipient name
    pub name: String,
    /// Phone number in E.164 form
    pub phone: String,
    /// Notes for the worker about this recipient
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Suppress SMS for this recipient
    #[serde(default)]
    pub skip_sms_notifications: bool,
}

/// Outcome recorded when a task is completed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionDetails {
    /// Whether the task succeeded
    pub success: bool,
    /// Notes left by the worker
    #[serde(default)]
    pub notes: String,
}

/// Create task request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Where the task happens
    pub destination: Destination,
    /// People receiving the task
    pub recipients: Vec<Recipient>,
    /// Earliest completion time, milliseconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_after: Option<i64>,
    /// Latest completion time, milliseconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_before: Option<i64>,
    /// Whether this is a pickup rather than a dropoff
    #[serde(default)]
    pub pickup_task: bool,
    /// Notes for the worker
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    /// Units carried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Minutes spent at the destination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_time: Option<u32>,
}

/// Update task request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// New free-form notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// New earliest completion time, milliseconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_after: Option<i64>,
    /// New latest completion time, milliseconds since the epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_before: Option<i64>,
    /// New where the task happens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,
    /// New people receiving the task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<Recipient>>,
    /// New units carried
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// Complete task request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskRequest {
    /// Outcome to record
    pub completion_details: CompletionDetails,
}

impl CompleteTaskRequest {
    /// Mark the task as succeeded
    pub fn succeeded(notes: impl Into<String>) -> Self {
        Self {
            completion_details: CompletionDetails {
                success: true,
                notes: notes.into(),
            },
        }
    }

    /// Mark the task as failed
    pub fn failed(notes: impl Into<String>) -> Self {
        Self {
            completion_details: CompletionDetails {
                success: false,
                notes: notes.into(),
            },
        }
    }
}

#[derive(Serialize)]
struct BatchCreateRequest<'a> {
    tasks: &'a [CreateTaskRequest],
}

/// Result of a batch create
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResponse {
    /// Tasks that were created
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Tasks that were rejected
    #[serde(default)]
    pub errors: Vec<BatchTaskError>,
}

/// A task the service refused during a batch create
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTaskError {
    /// Same fields as the `message` of an error body, `statusCode` included
    #[serde(flatten)]
    pub error: ErrorMessage,
    /// The rejected input, as echoed by the service
    #[serde(default)]
    pub task_data: Option<serde_json::Value>,
}

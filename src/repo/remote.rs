use async_trait::async_trait;
use serde_json::{json, Value};

use crate::models::{NewTask, Task, TaskId, TaskStatus, Transition};
use crate::repo::{normalize_list, normalize_task, RepoError};

/// Optional narrowing of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Free-text query
    pub query: Option<String>,
    /// Only tasks touched within the last N days
    pub period_days: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.period_days.is_none() && self.limit.is_none()
    }
}

/// The operations the lifecycle core needs from the task service
///
/// Implementations hold no lifecycle state; every call maps to one remote
/// operation (restore may use two attempts, see [`RemoteTaskRepo`]).
#[async_trait(?Send)]
pub trait TaskRepository {
    async fn list_by_status(&self, status: TaskStatus, filter: &ListFilter) -> Result<Vec<Task>, RepoError>;

    async fn create(&self, draft: &NewTask) -> Result<Task, RepoError>;

    async fn transition(&self, id: &TaskId, intent: Transition) -> Result<Task, RepoError>;

    /// Irreversible. There is no way back once this succeeds.
    async fn hard_delete(&self, id: &TaskId) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A request against the task service, independent of the HTTP client
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Sends [`ApiRequest`]s and returns the decoded JSON body, `None` for an
/// empty body. Non-success statuses come back as [`RepoError::Remote`].
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, RepoError>;
}

const TASKS_PATH: &str = "/api/tasks";

/// [`TaskRepository`] over the task service's REST endpoints
pub struct RemoteTaskRepo<T> {
    transport: T,
}

impl<T: Transport> RemoteTaskRepo<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn list_request(status: TaskStatus, filter: &ListFilter) -> ApiRequest {
        // The trash has its own endpoint; the status is implied
        let mut request = match status {
            TaskStatus::Deleted => ApiRequest::new(Method::Get, format!("{}/trash", TASKS_PATH)),
            _ => ApiRequest::new(Method::Get, TASKS_PATH).query("status", status.as_str()),
        };
        if let Some(q) = filter.query.as_deref().filter(|q| !q.is_empty()) {
            request = request.query("q", q);
        }
        if let Some(days) = filter.period_days {
            request = request.query("periodDays", days);
        }
        if let Some(limit) = filter.limit {
            request = request.query("size", limit);
        }
        request
    }

    fn transition_request(id: &TaskId, intent: Transition, method: Method) -> ApiRequest {
        ApiRequest::new(method, format!("{}/{}/{}", TASKS_PATH, id, intent.endpoint())).body(json!({}))
    }

    fn expect_task(body: Option<Value>, fallback: TaskStatus) -> Result<Task, RepoError> {
        let body = body.ok_or_else(|| RepoError::Decode("empty response body".to_string()))?;
        normalize_task(&body, Some(fallback))
    }
}

#[async_trait(?Send)]
impl<T: Transport> TaskRepository for RemoteTaskRepo<T> {
    async fn list_by_status(&self, status: TaskStatus, filter: &ListFilter) -> Result<Vec<Task>, RepoError> {
        let body = self.transport.send(Self::list_request(status, filter)).await?;
        let tasks = match body {
            Some(data) => normalize_list(&data, Some(status))?,
            None => Vec::new(),
        };
        log::debug!("listed {} {} task(s)", tasks.len(), status.as_str());
        Ok(tasks)
    }

    async fn create(&self, draft: &NewTask) -> Result<Task, RepoError> {
        let payload = serde_json::to_value(draft).map_err(|e| RepoError::Decode(e.to_string()))?;
        let request = ApiRequest::new(Method::Post, TASKS_PATH).body(payload);
        let body = self.transport.send(request).await?;
        Self::expect_task(body, TaskStatus::Active)
    }

    async fn transition(&self, id: &TaskId, intent: Transition) -> Result<Task, RepoError> {
        let fallback = intent.target_status();

        if intent != Transition::Restore {
            let body = self.transport.send(Self::transition_request(id, intent, Method::Patch)).await?;
            return Self::expect_task(body, fallback);
        }

        // Restore is exposed as POST on some deployments and PATCH on others
        match self.transport.send(Self::transition_request(id, intent, Method::Post)).await {
            Ok(body) => Self::expect_task(body, fallback),
            Err(err) if err.is_unsupported() => {
                log::debug!("restore {} via POST unsupported ({}), retrying with PATCH", id, err);
                let body = self.transport.send(Self::transition_request(id, intent, Method::Patch)).await?;
                Self::expect_task(body, fallback)
            }
            Err(err) => Err(err),
        }
    }

    async fn hard_delete(&self, id: &TaskId) -> Result<(), RepoError> {
        let request = ApiRequest::new(Method::Delete, format!("{}/{}", TASKS_PATH, id));
        self.transport.send(request).await?;
        Ok(())
    }
}

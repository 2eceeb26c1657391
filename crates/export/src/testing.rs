//! In-memory transport for tests.
//!
//! Responses are either queued (served in order) or routed by operation,
//! parent UUID and cursor. Routed responses make concurrent fan-out
//! deterministic; the queue keeps single-chain tests short.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::client::{GraphQLRequest, Transport};
use crate::error::TransportError;

/// What the transport does for one request.
#[derive(Debug, Clone)]
enum Step {
    Respond(Value),
    Status(u16),
    RateLimited(Option<u64>),
}

impl Step {
    fn into_result(self) -> Result<Value, TransportError> {
        match self {
            Self::Respond(body) => Ok(body),
            Self::Status(status) => Err(TransportError::Status {
                status,
                body: format!("scripted {status}"),
            }),
            Self::RateLimited(retry_after) => Err(TransportError::RateLimited { retry_after }),
        }
    }
}

/// A request as the transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// GraphQL operation name.
    pub operation_name: String,
    /// Variables, including `first` and `cursor`.
    pub variables: Value,
}

impl RecordedRequest {
    /// `uuid` variable, if present.
    #[must_use]
    pub fn uuid(&self) -> Option<&str> {
        self.variables.get("uuid").and_then(Value::as_str)
    }

    /// `cursor` variable, if non-null.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.variables.get("cursor").and_then(Value::as_str)
    }
}

type RouteKey = (String, String, Option<String>);

/// A [`Transport`] that replays scripted responses.
///
/// Unscripted requests fail with HTTP 404 so a missing fixture shows up as a
/// transport error naming the request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Step>>,
    routes: Mutex<HashMap<RouteKey, VecDeque<Step>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    /// An empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, step: Step) -> Self {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
        self
    }

    /// Queue a response body.
    #[must_use]
    pub fn respond(self, body: Value) -> Self {
        self.push(Step::Respond(body))
    }

    /// Queue a non-2xx status.
    #[must_use]
    pub fn fail_status(self, status: u16) -> Self {
        self.push(Step::Status(status))
    }

    /// Queue an HTTP 429.
    #[must_use]
    pub fn rate_limit(self, retry_after: Option<u64>) -> Self {
        self.push(Step::RateLimited(retry_after))
    }

    fn route_step(self, operation: &str, uuid: &str, cursor: Option<&str>, step: Step) -> Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((
                operation.to_string(),
                uuid.to_string(),
                cursor.map(str::to_string),
            ))
            .or_default()
            .push_back(step);
        self
    }

    /// Respond to `operation` for parent `uuid` at `cursor`.
    ///
    /// Use an empty `uuid` for operations without one (accounts).
    #[must_use]
    pub fn route(self, operation: &str, uuid: &str, cursor: Option<&str>, body: Value) -> Self {
        self.route_step(operation, uuid, cursor, Step::Respond(body))
    }

    /// Fail `operation` for parent `uuid` at `cursor` with a status.
    #[must_use]
    pub fn route_status(self, operation: &str, uuid: &str, cursor: Option<&str>, status: u16) -> Self {
        self.route_step(operation, uuid, cursor, Step::Status(status))
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for one operation.
    #[must_use]
    pub fn requests_for(&self, operation: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.operation_name == operation)
            .collect()
    }

    /// Highest number of requests that were in flight at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, request: &RecordedRequest) -> Step {
        let key = (
            request.operation_name.clone(),
            request.uuid().unwrap_or_default().to_string(),
            request.cursor().map(str::to_string),
        );
        {
            let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(steps) = routes.get_mut(&key)
                && let Some(step) = steps.pop_front()
            {
                return step;
            }
        }
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Step::Status(404))
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &GraphQLRequest) -> Result<Value, TransportError> {
        let recorded = RecordedRequest {
            operation_name: request.operation_name.to_string(),
            variables: request.variables.clone(),
        };
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(recorded.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let step = self.next_step(&recorded);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        step.into_result()
    }
}

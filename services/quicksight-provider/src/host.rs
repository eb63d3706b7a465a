//! Resource operation dispatch
//!
//! Routes `POST /v1/resources/{type}/{operation}` to the registered resource,
//! builds the `ResourceData` and `Context` for the call, and reports the
//! resulting id, state and diagnostics. Every operation gets a child of the
//! process-wide shutdown token so in-flight waits stop on SIGTERM.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use provider::{Context, Diagnostics, Resource, ResourceData, TimeoutOverrides, Timeouts};
use quicksight::AwsClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ApiError;

/// Registered resources keyed by type name.
pub type Registry = BTreeMap<String, Arc<dyn Resource<AwsClient>>>;

pub fn registry(resources: Vec<Arc<dyn Resource<AwsClient>>>) -> Registry {
    resources
        .into_iter()
        .map(|r| (r.type_name().to_owned(), r))
        .collect()
}

/// State shared by the resource routes.
#[derive(Clone)]
pub struct HostState {
    pub resources: Arc<Registry>,
    pub meta: AwsClient,
    /// Operator-level defaults layered over each schema's timeouts.
    pub timeouts: TimeoutOverrides,
    pub shutdown: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostOperation {
    Validate,
    Create,
    Read,
    Delete,
}

impl HostOperation {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "validate" => Some(Self::Validate),
            "create" => Some(Self::Create),
            "read" => Some(Self::Read),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Create => "create",
            Self::Read => "read",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValidateRequest {
    config: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateRequest {
    config: Map<String, Value>,
    #[serde(default)]
    timeouts: Option<TimeoutOverrides>,
}

/// Read and delete address an instance already in state.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstanceRequest {
    id: String,
    #[serde(default)]
    state: Map<String, Value>,
    #[serde(default)]
    timeouts: Option<TimeoutOverrides>,
}

#[derive(Debug, Serialize)]
struct DiagnosticsResponse {
    diagnostics: Diagnostics,
}

/// `id` is `null` when the instance no longer exists.
#[derive(Debug, Serialize)]
struct InstanceResponse {
    id: Option<String>,
    state: Map<String, Value>,
    diagnostics: Diagnostics,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}

fn resolve_timeouts(
    resource: &dyn Resource<AwsClient>,
    defaults: &TimeoutOverrides,
    requested: Option<TimeoutOverrides>,
) -> Timeouts {
    resource
        .schema()
        .timeouts
        .with_overrides(defaults)
        .with_overrides(&requested.unwrap_or_default())
}

/// `GET /v1/schema`: every registered schema keyed by type name.
pub async fn schemas(State(state): State<HostState>) -> Json<Value> {
    let body: Map<String, Value> = state
        .resources
        .iter()
        .map(|(name, resource)| {
            let schema = serde_json::to_value(resource.schema()).unwrap_or(Value::Null);
            (name.clone(), schema)
        })
        .collect();
    Json(Value::Object(body))
}

/// `POST /v1/resources/{type}/{operation}`
pub async fn operation(
    State(state): State<HostState>,
    Path((type_name, operation)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let resource = state
        .resources
        .get(&type_name)
        .cloned()
        .ok_or_else(|| ApiError::UnknownResourceType(type_name.clone()))?;
    let op = HostOperation::parse(&operation)
        .ok_or_else(|| ApiError::UnknownOperation(operation.clone()))?;

    let started = Instant::now();
    let ctx = Context::child_of(&state.shutdown);

    let (diagnostics, response) = match op {
        HostOperation::Validate => {
            let req: ValidateRequest = parse_body(&body)?;
            let diagnostics = resource.validate(&req.config);
            let response = Json(DiagnosticsResponse {
                diagnostics: diagnostics.clone(),
            })
            .into_response();
            (diagnostics, response)
        }
        HostOperation::Create => {
            let req: CreateRequest = parse_body(&body)?;
            let timeouts = resolve_timeouts(resource.as_ref(), &state.timeouts, req.timeouts);
            let mut data = ResourceData::new(req.config, timeouts);
            info!(request_id = ctx.request_id(), resource = %type_name, "creating resource");
            let diagnostics = resource.create(&ctx, &state.meta, &mut data).await;
            (diagnostics.clone(), instance_response(data, diagnostics))
        }
        HostOperation::Read => {
            let req: InstanceRequest = parse_body(&body)?;
            if req.id.is_empty() {
                return Err(ApiError::InvalidRequest("id must not be empty".into()));
            }
            let timeouts = resolve_timeouts(resource.as_ref(), &state.timeouts, req.timeouts);
            let mut data = ResourceData::from_state(req.id, req.state, timeouts);
            let diagnostics = resource.read(&ctx, &state.meta, &mut data).await;
            (diagnostics.clone(), instance_response(data, diagnostics))
        }
        HostOperation::Delete => {
            let req: InstanceRequest = parse_body(&body)?;
            if req.id.is_empty() {
                return Err(ApiError::InvalidRequest("id must not be empty".into()));
            }
            let timeouts = resolve_timeouts(resource.as_ref(), &state.timeouts, req.timeouts);
            let mut data = ResourceData::from_state(req.id, req.state, timeouts);
            info!(
                request_id = ctx.request_id(),
                resource = %type_name,
                id = data.id_or_empty(),
                "deleting resource"
            );
            let diagnostics = resource.delete(&ctx, &state.meta, &mut data).await;
            let response = Json(DiagnosticsResponse {
                diagnostics: diagnostics.clone(),
            })
            .into_response();
            (diagnostics, response)
        }
    };

    let outcome = if diagnostics.has_error() { "error" } else { "ok" };
    let elapsed = started.elapsed();
    crate::metrics::record_operation(&type_name, op.as_str(), outcome, elapsed.as_secs_f64());
    if diagnostics.has_error() {
        warn!(
            request_id = ctx.request_id(),
            resource = %type_name,
            operation = op.as_str(),
            diagnostics = diagnostics.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "operation finished with errors"
        );
    } else {
        info!(
            request_id = ctx.request_id(),
            resource = %type_name,
            operation = op.as_str(),
            elapsed_ms = elapsed.as_millis() as u64,
            "operation finished"
        );
    }

    Ok(response)
}

fn instance_response(data: ResourceData, diagnostics: Diagnostics) -> Response {
    let (id, state) = data.into_parts();
    Json(InstanceResponse {
        id,
        state,
        diagnostics,
    })
    .into_response()
}

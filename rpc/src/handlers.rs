//! HTTP request handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use diploma_kpi::{GraduatedStudents, KpiMetrics};
use diploma_store::DiplomaStore;
use diploma_types::{Identity, RequestId, TemplateId};
use diploma_workflow::{AnchorRequest, DiplomaWorkflow, NewRequest, WorkflowError};

use crate::auth::{authorize_internal, bearer_token};
use crate::dto::{
    AnchorPayloadResponse, AnchorRequestBody, CanSignResponse, ConfirmAnchorBody,
    CreateRequestBody, CreateTemplateBody, RequestResponse, SignBody, TemplateResponse,
};
use crate::error::RpcError;
use crate::extract::ApiJson;
use crate::server::ApiState;

type ApiResult<T> = Result<T, RpcError>;

fn parse_request_id(raw: &str) -> ApiResult<RequestId> {
    RequestId::parse(raw).map_err(|_| RpcError::InvalidRequest(format!("invalid request id: {raw}")))
}

fn parse_template_id(raw: &str) -> ApiResult<TemplateId> {
    TemplateId::parse(raw).map_err(|_| RpcError::InvalidRequest(format!("invalid diploma id: {raw}")))
}

async fn caller<S>(state: &ApiState<S>, headers: &HeaderMap) -> ApiResult<Identity> {
    let token = bearer_token(headers)?;
    Ok(state.gateway.authenticate(token).await?)
}

fn record_duration<S>(state: &ApiState<S>, operation: &str, started: Instant) {
    if let Some(metrics) = &state.metrics {
        metrics.observe_duration(operation, started.elapsed().as_secs_f64());
    }
}

/// Run a store-writing workflow call on the blocking pool. LMDB commits
/// fsync, which must not stall the async workers.
async fn run_blocking<S, T, F>(state: &ApiState<S>, f: F) -> ApiResult<T>
where
    S: DiplomaStore + 'static,
    T: Send + 'static,
    F: FnOnce(&DiplomaWorkflow<S>) -> Result<T, WorkflowError> + Send + 'static,
{
    let workflow = Arc::clone(&state.workflow);
    tokio::task::spawn_blocking(move || f(&workflow))
        .await
        .map_err(|e| RpcError::Server(format!("workflow task failed: {e}")))?
        .map_err(RpcError::from)
}

// ── Service ──────────────────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn metrics<S: DiplomaStore + 'static>(State(state): State<ApiState<S>>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match metrics.encode() {
        Ok(body) => {
            let mut response = body.into_response();
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(e) => RpcError::Server(format!("metrics encode failed: {e}")).into_response(),
    }
}

// ── Templates ────────────────────────────────────────────────────────────

pub async fn create_template<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    ApiJson(body): ApiJson<CreateTemplateBody>,
) -> ApiResult<(StatusCode, Json<TemplateResponse>)> {
    let template =
        run_blocking(&state, move |workflow| workflow.create_template(body.into())).await?;
    Ok((StatusCode::CREATED, Json(template.into())))
}

pub async fn list_templates<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
) -> ApiResult<Json<Vec<TemplateResponse>>> {
    let templates = state.workflow.list_active_templates()?;
    Ok(Json(templates.into_iter().map(Into::into).collect()))
}

pub async fn get_template<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TemplateResponse>> {
    let template = state.workflow.get_template(&parse_template_id(&id)?)?;
    Ok(Json(template.into()))
}

// ── Requests ─────────────────────────────────────────────────────────────

pub async fn create_request<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<CreateRequestBody>,
) -> ApiResult<(StatusCode, Json<RequestResponse>)> {
    let started = Instant::now();
    let creator = caller(&state, &headers).await?;
    let diploma_id = parse_template_id(&body.diploma_id)?;
    if body.required_signatures.is_empty() {
        return Err(RpcError::InvalidRequest(
            "at least one required signer is required".into(),
        ));
    }
    let required_signers = state
        .gateway
        .resolve_signers(&body.required_signatures)
        .await?;
    let new = NewRequest {
        diploma_id,
        student_ids: body.student_ids,
        required_signers,
        comment: body.comment,
    };
    let entry =
        run_blocking(&state, move |workflow| workflow.create_request(new, &creator)).await?;
    record_duration(&state, "create_request", started);
    Ok((StatusCode::CREATED, Json(entry.into())))
}

pub async fn list_requests<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
) -> ApiResult<Json<Vec<RequestResponse>>> {
    let entries = state.workflow.list()?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub async fn my_requests<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<RequestResponse>>> {
    let identity = caller(&state, &headers).await?;
    let entries = state.workflow.list_for_user(&identity)?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

pub async fn get_request<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<RequestResponse>> {
    let entry = state.workflow.get(&parse_request_id(&id)?)?;
    Ok(Json(entry.into()))
}

pub async fn sign_request<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<SignBody>,
) -> ApiResult<Json<RequestResponse>> {
    let started = Instant::now();
    let request_id = parse_request_id(&id)?;
    let signer = caller(&state, &headers).await?;
    let result = run_blocking(&state, move |workflow| {
        workflow.sign(&request_id, &signer, body.approve, body.signature_comment)
    })
    .await;
    if let Some(metrics) = &state.metrics {
        metrics.record_signature(result.is_ok());
    }
    record_duration(&state, "sign", started);
    Ok(Json(result?.into()))
}

pub async fn delete_request<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let request_id = parse_request_id(&id)?;
    let identity = caller(&state, &headers).await?;
    run_blocking(&state, move |workflow| workflow.delete(&request_id, &identity)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn can_sign<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<CanSignResponse>> {
    let request_id = parse_request_id(&id)?;
    let identity = caller(&state, &headers).await?;
    let can_sign = state.workflow.can_sign(&request_id, &identity)?;
    Ok(Json(CanSignResponse {
        can_sign,
        wallet_address: identity.to_string(),
    }))
}

// ── Anchoring ────────────────────────────────────────────────────────────

pub async fn request_anchor<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<AnchorRequestBody>,
) -> ApiResult<Json<RequestResponse>> {
    let started = Instant::now();
    let request_id = parse_request_id(&id)?;
    let identity = caller(&state, &headers).await?;
    let signer = match body.signer.as_deref().map(str::trim) {
        Some(reference) if !reference.is_empty() => {
            Some(state.gateway.resolve_signer(reference).await?)
        }
        _ => None,
    };
    let anchor = AnchorRequest {
        batch_id: body.batch_id,
        diplome_label: body.diplome_label,
        signer,
        signature: body.signature,
    };
    let entry = run_blocking(&state, move |workflow| {
        workflow.request_anchor(&request_id, anchor, &identity)
    })
    .await?;
    record_duration(&state, "anchor_request", started);
    Ok(Json(entry.into()))
}

pub async fn confirm_anchor<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<ConfirmAnchorBody>,
) -> ApiResult<Json<RequestResponse>> {
    authorize_internal(&headers, state.anchor_callback_token.as_deref())?;
    let request_id = parse_request_id(&id)?;
    let entry = run_blocking(&state, move |workflow| {
        workflow.confirm_anchored(&request_id, &body.tx_hash)
    })
    .await?;
    Ok(Json(entry.into()))
}

pub async fn anchor_payload<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
    Path(id): Path<String>,
) -> ApiResult<Json<AnchorPayloadResponse>> {
    let payload = state.workflow.anchor_payload(&parse_request_id(&id)?)?;
    Ok(Json(payload.into()))
}

// ── KPIs ─────────────────────────────────────────────────────────────────

pub async fn kpi_metrics<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
) -> ApiResult<Json<KpiMetrics>> {
    Ok(Json(state.kpi.get_metrics()?))
}

pub async fn graduated_students<S: DiplomaStore + 'static>(
    State(state): State<ApiState<S>>,
) -> ApiResult<Json<GraduatedStudents>> {
    Ok(Json(state.kpi.count_graduated_students()?))
}

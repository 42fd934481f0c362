//! Commitment handlers

use crate::address::CommitmentAddress;
use crate::api::state::AppState;
use crate::error::{AddressError, ApiError, ApiResult};
use crate::service::GroupedCommitments;
use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    Json,
};
use chrono::Utc;
use commits_credit::ScoredCommitment;
use commits_types::{CommitmentId, UserHandle};
use serde::{Deserialize, Serialize};

const CREATE_PREFIX: &str = "/promises/create/";
const LOOKUP_PREFIX: &str = "/promise/";

/// Delete response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub id: CommitmentId,
    pub deleted: bool,
}

/// Bulk delete response
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub deleted: usize,
}

/// The address exactly as typed, escapes and any `?...` tail intact.
fn raw_address<'u>(uri: &'u Uri, prefix: &str) -> ApiResult<&'u str> {
    uri.path_and_query()
        .map_or_else(|| uri.path(), |pq| pq.as_str())
        .strip_prefix(prefix)
        .ok_or_else(|| ApiError::BadRequest(format!("expected an address after {prefix}")))
}

fn parse_id(id: &str) -> ApiResult<CommitmentId> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("'{id}' is not a commitment id")))
}

/// List all commitments, grouped by user, newest first
pub async fn list_promises(State(state): State<AppState>) -> ApiResult<Json<GroupedCommitments>> {
    let grouped = state.service.list_grouped(None, Utc::now()).await?;
    Ok(Json(grouped))
}

/// List one user's commitments
pub async fn list_user_promises(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> ApiResult<Json<GroupedCommitments>> {
    let user = UserHandle::parse(user).map_err(AddressError::from)?;
    let grouped = state.service.list_grouped(Some(&user), Utc::now()).await?;
    Ok(Json(grouped))
}

/// Publish the commitment at `user.promises.to/<expression>`
pub async fn create_promise(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<(StatusCode, Json<ScoredCommitment>)> {
    let address = CommitmentAddress::parse(raw_address(&uri, CREATE_PREFIX)?)?;
    let scored = state.service.create(&address, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(scored)))
}

/// Look up the newest commitment published at an address
pub async fn get_promise(
    State(state): State<AppState>,
    uri: Uri,
) -> ApiResult<Json<ScoredCommitment>> {
    let address = CommitmentAddress::parse(raw_address(&uri, LOOKUP_PREFIX)?)?;
    state
        .service
        .find(&address, Utc::now())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no commitment at {address}")))
}

/// Mark a commitment as kept now
pub async fn complete_commitment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScoredCommitment>> {
    let id = parse_id(&id)?;
    let scored = state.service.complete(id, Utc::now()).await?;
    Ok(Json(scored))
}

/// Delete one commitment
pub async fn delete_commitment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    if !state.service.delete(id).await? {
        return Err(ApiError::NotFound(format!("commitment {id}")));
    }
    Ok(Json(DeleteResponse { id, deleted: true }))
}

/// Delete every commitment
pub async fn clear_promises(State(state): State<AppState>) -> ApiResult<Json<ClearResponse>> {
    let deleted = state.service.clear().await?;
    Ok(Json(ClearResponse { deleted }))
}

use crate::api::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use commits_credit::UserStanding;
use commits_types::UserHandle;
use std::collections::BTreeMap;

/// Per-user counts and total credit
pub async fn standings(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<UserHandle, UserStanding>>> {
    let standings = state.service.standings(chrono::Utc::now()).await?;
    Ok(Json(standings))
}

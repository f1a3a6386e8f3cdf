use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    coaching::{Coaching, CoachingItem, CoachingTotals},
    error::AppError,
    state::{
        AppState, CoachingInput, create_coaching, delete_coaching, get_coaching, list_coachings,
        update_coaching,
    },
    tenant::TenantScope,
};

use super::extract::{AppJson, AppPath, AppQuery};
use super::helpers::{
    clean_opt, hex, parse_datetime_field, parse_object_id, parse_optional_object_id, rfc3339,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingView {
    id: String,
    supervisor: String,
    rep: String,
    visit_date: Option<String>,
    items: Vec<CoachingItem>,
    totals: CoachingTotals,
    notes: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl From<Coaching> for CoachingView {
    fn from(c: Coaching) -> Self {
        CoachingView {
            id: hex(c.id),
            supervisor: c.supervisor.to_hex(),
            rep: c.rep.to_hex(),
            visit_date: rfc3339(Some(c.visit_date)),
            items: c.items,
            totals: c.totals,
            notes: c.notes,
            created_at: rfc3339(c.created_at),
            updated_at: rfc3339(c.updated_at),
        }
    }
}

/// Totals are never accepted from the client; they are derived on write.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachingRequest {
    pub supervisor: String,
    pub rep: String,
    pub visit_date: String,
    pub items: Vec<CoachingItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CoachingRequest {
    fn into_input(self) -> Result<CoachingInput, AppError> {
        Ok(CoachingInput {
            supervisor: parse_object_id(&self.supervisor, "supervisor")?,
            rep: parse_object_id(&self.rep, "rep")?,
            visit_date: parse_datetime_field(&self.visit_date, "visitDate")?,
            items: self.items,
            notes: clean_opt(self.notes),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CoachingsQuery {
    rep: Option<String>,
}

pub async fn coachings_create(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<CoachingRequest>,
) -> Result<(StatusCode, Json<CoachingView>), AppError> {
    let coaching = create_coaching(&state, &scope, body.into_input()?).await?;
    Ok((StatusCode::CREATED, Json(coaching.into())))
}

pub async fn coachings_index(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<CoachingsQuery>,
) -> Result<Json<Vec<CoachingView>>, AppError> {
    let rep = parse_optional_object_id(query.rep.as_deref(), "rep")?;
    let coachings = list_coachings(&state, &scope, rep.as_ref()).await?;
    Ok(Json(coachings.into_iter().map(CoachingView::from).collect()))
}

pub async fn coachings_show(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
) -> Result<Json<CoachingView>, AppError> {
    let id = parse_object_id(&id, "coaching id")?;
    let coaching = get_coaching(&state, &scope, &id)
        .await?
        .ok_or(AppError::NotFound("coaching"))?;
    Ok(Json(coaching.into()))
}

pub async fn coachings_update(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
    AppJson(body): AppJson<CoachingRequest>,
) -> Result<Json<CoachingView>, AppError> {
    let id = parse_object_id(&id, "coaching id")?;
    let coaching = update_coaching(&state, &scope, &id, body.into_input()?).await?;
    Ok(Json(coaching.into()))
}

pub async fn coachings_delete(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_object_id(&id, "coaching id")?;
    delete_coaching(&state, &scope, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

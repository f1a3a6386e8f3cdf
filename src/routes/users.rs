use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    models::{User, UserRole},
    state::{AppState, NewUser, create_user, get_user, list_users},
    team::TeamTags,
    tenant::TenantScope,
};

use super::extract::{AppJson, AppPath, AppQuery};
use super::helpers::{clean_opt, hex, parse_object_id, rfc3339};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    id: String,
    name: String,
    email: String,
    role: UserRole,
    team_products: TeamTags,
    team_area: TeamTags,
    is_active: bool,
    created_at: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            id: hex(user.id),
            name: user.name,
            email: user.email,
            role: user.role,
            team_products: user.team_products,
            team_area: user.team_area,
            is_active: user.is_active,
            created_at: rfc3339(user.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
    pub role: String,
    /// Delimited list, e.g. "TEAM A, TEAM B".
    #[serde(default)]
    pub team_products: String,
    #[serde(default)]
    pub team_area: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct UsersQuery {
    role: Option<String>,
    team: Option<String>,
}

pub async fn users_create(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), AppError> {
    body.validate()?;
    let role = UserRole::parse(&body.role)
        .ok_or_else(|| AppError::BadRequest(format!("unknown role {}", body.role)))?;

    let user = create_user(
        &state,
        &scope,
        NewUser {
            name: body.name,
            email: body.email,
            role,
            team_products: TeamTags::parse(&body.team_products),
            team_area: TeamTags::parse(&body.team_area),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn users_index(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<UsersQuery>,
) -> Result<Json<Vec<UserView>>, AppError> {
    let role = match clean_opt(query.role) {
        Some(raw) => Some(
            UserRole::parse(&raw).ok_or_else(|| AppError::BadRequest(format!("unknown role {raw}")))?,
        ),
        None => None,
    };
    let team = clean_opt(query.team);

    let users = list_users(&state, &scope, role, team.as_deref()).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub async fn users_show(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
) -> Result<Json<UserView>, AppError> {
    let id = parse_object_id(&id, "user id")?;
    let user = get_user(&state, &scope, &id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(user.into()))
}

use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use tracing::info;

use crate::{
    error::{AppError, is_duplicate_key},
    models::{User, UserRole},
    team::TeamTags,
    tenant::TenantScope,
};

use super::AppState;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub team_products: TeamTags,
    pub team_area: TeamTags,
}

pub async fn create_user(
    state: &AppState,
    scope: &TenantScope,
    input: NewUser,
) -> Result<User, AppError> {
    if input.role.is_admin() {
        return Err(AppError::BadRequest(
            "admin accounts own a tenant and cannot be created inside one".into(),
        ));
    }

    let email = input.email.trim().to_lowercase();
    if state
        .users
        .find_one(scope.filter(doc! { "email": &email }))
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!("email {email} already registered")));
    }

    let mut user = User {
        id: None,
        admin_id: Some(scope.admin_id()),
        name: input.name.trim().to_string(),
        email,
        role: input.role,
        team_products: input.team_products,
        team_area: input.team_area,
        is_active: true,
        created_at: Some(DateTime::now()),
    };
    let res = match state.users.insert_one(&user).await {
        Ok(res) => res,
        Err(err) if is_duplicate_key(&err) => {
            return Err(AppError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        Err(err) => return Err(err.into()),
    };
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or_else(|| anyhow::anyhow!("user insert missing _id"))?;
    user.id = Some(id);

    info!(user_id = %id, role = user.role.as_str(), "user created");
    Ok(user)
}

pub async fn get_user(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<Option<User>, AppError> {
    Ok(state.users.find_one(scope.filter(doc! { "_id": id })).await?)
}

/// Users of the tenant, optionally narrowed to a role and to those whose
/// product team covers `team`.
pub async fn list_users(
    state: &AppState,
    scope: &TenantScope,
    role: Option<UserRole>,
    team: Option<&str>,
) -> Result<Vec<User>, AppError> {
    let mut filter = doc! {};
    if let Some(role) = role {
        filter.insert("role", role.as_str());
    }

    let mut cursor = state.users.find(scope.filter(filter)).await?;
    let mut users = Vec::new();
    while let Some(user) = cursor.try_next().await? {
        if team.is_none_or(|t| user.team_products.allows(t)) {
            users.push(user);
        }
    }
    Ok(users)
}

/// Resolves `id` to an active user of this tenant holding one of `roles`.
pub async fn require_user_with_role(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
    roles: &[UserRole],
) -> Result<User, AppError> {
    let user = get_user(state, scope, id)
        .await?
        .ok_or_else(|| AppError::InvalidAssignee(format!("user {id} does not exist")))?;
    if !roles.contains(&user.role) {
        let expected: Vec<&str> = roles.iter().map(UserRole::as_str).collect();
        return Err(AppError::InvalidAssignee(format!(
            "user {id} is {} but must be {}",
            user.role.as_str(),
            expected.join(" or ")
        )));
    }
    if !user.is_active {
        return Err(AppError::InvalidAssignee(format!("user {id} is inactive")));
    }
    Ok(user)
}

pub async fn require_sales_rep(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<User, AppError> {
    require_user_with_role(state, scope, id, &[UserRole::SalesRep]).await
}

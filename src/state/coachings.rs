use futures::stream::TryStreamExt;
use mongodb::bson::{self, DateTime, doc, oid::ObjectId};
use tracing::info;

use crate::{
    coaching::{Coaching, CoachingItem, derive_totals},
    error::AppError,
    models::UserRole,
    tenant::TenantScope,
};

use super::{AppState, require_user_with_role};

const EVALUATORS: [UserRole; 2] = [UserRole::Supervisor, UserRole::Admin];
const EVALUATED: [UserRole; 2] = [UserRole::MedicalRep, UserRole::SalesRep];

#[derive(Debug, Clone)]
pub struct CoachingInput {
    pub supervisor: ObjectId,
    pub rep: ObjectId,
    pub visit_date: DateTime,
    pub items: Vec<CoachingItem>,
    pub notes: Option<String>,
}

pub async fn create_coaching(
    state: &AppState,
    scope: &TenantScope,
    input: CoachingInput,
) -> Result<Coaching, AppError> {
    let totals = derive_totals(&input.items)?;
    check_participants(state, scope, &input).await?;

    let mut coaching = Coaching {
        id: None,
        admin_id: scope.admin_id(),
        supervisor: input.supervisor,
        rep: input.rep,
        visit_date: input.visit_date,
        items: input.items,
        totals,
        notes: input.notes,
        created_at: Some(DateTime::now()),
        updated_at: None,
    };
    let res = state.coachings.insert_one(&coaching).await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or_else(|| anyhow::anyhow!("coaching insert missing _id"))?;
    coaching.id = Some(id);

    info!(
        coaching_id = %id,
        rep = %coaching.rep,
        percentage = coaching.totals.percentage,
        "coaching created"
    );
    Ok(coaching)
}

pub async fn get_coaching(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<Option<Coaching>, AppError> {
    Ok(state.coachings.find_one(scope.filter(doc! { "_id": id })).await?)
}

pub async fn list_coachings(
    state: &AppState,
    scope: &TenantScope,
    rep: Option<&ObjectId>,
) -> Result<Vec<Coaching>, AppError> {
    let mut filter = doc! {};
    if let Some(rep) = rep {
        filter.insert("rep", rep);
    }
    let mut cursor = state.coachings.find(scope.filter(filter)).await?;
    let mut coachings = Vec::new();
    while let Some(c) = cursor.try_next().await? {
        coachings.push(c);
    }
    Ok(coachings)
}

/// Replaces the evaluation and recomputes its totals.
pub async fn update_coaching(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
    input: CoachingInput,
) -> Result<Coaching, AppError> {
    let mut coaching = get_coaching(state, scope, id)
        .await?
        .ok_or(AppError::NotFound("coaching"))?;
    let totals = derive_totals(&input.items)?;
    check_participants(state, scope, &input).await?;

    let now = DateTime::now();
    coaching.supervisor = input.supervisor;
    coaching.rep = input.rep;
    coaching.visit_date = input.visit_date;
    coaching.items = input.items;
    coaching.totals = totals;
    coaching.notes = input.notes;
    coaching.updated_at = Some(now);

    state
        .coachings
        .update_one(
            scope.filter(doc! { "_id": id }),
            doc! { "$set": {
                "supervisor": coaching.supervisor,
                "rep": coaching.rep,
                "visitDate": coaching.visit_date,
                "items": bson::to_bson(&coaching.items)?,
                "totals": bson::to_bson(&coaching.totals)?,
                "notes": coaching.notes.clone(),
                "updatedAt": now,
            } },
        )
        .await?;

    info!(coaching_id = %id, percentage = coaching.totals.percentage, "coaching updated");
    Ok(coaching)
}

pub async fn delete_coaching(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<(), AppError> {
    let res = state
        .coachings
        .delete_one(scope.filter(doc! { "_id": id }))
        .await?;
    if res.deleted_count == 0 {
        return Err(AppError::NotFound("coaching"));
    }
    Ok(())
}

async fn check_participants(
    state: &AppState,
    scope: &TenantScope,
    input: &CoachingInput,
) -> Result<(), AppError> {
    let supervisor = require_user_with_role(state, scope, &input.supervisor, &EVALUATORS).await?;
    let rep = require_user_with_role(state, scope, &input.rep, &EVALUATED).await?;
    if !supervisor.team_products.intersects(&rep.team_products) {
        return Err(AppError::InvalidAssignee(format!(
            "supervisor {} does not cover any product team of rep {}",
            input.supervisor, input.rep
        )));
    }
    Ok(())
}

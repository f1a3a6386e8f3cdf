use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::AppError,
    models::CollectionRecord,
    state::{AppState, NewCollectionRecord, list_collections, record_collection},
    tenant::{Language, TenantScope},
};

use super::{
    extract::{AppJson, AppQuery},
    helpers::{clean_opt, hex, parse_object_id, parse_optional_object_id, rfc3339},
    receipt_books::receipt_rejection,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionView {
    id: String,
    sales_rep: String,
    customer_name: String,
    amount: f64,
    receipt_book: String,
    receipt_number: i64,
    is_sequential: bool,
    notes: Option<String>,
    created_at: Option<String>,
}

impl From<CollectionRecord> for CollectionView {
    fn from(record: CollectionRecord) -> Self {
        CollectionView {
            id: hex(record.id),
            sales_rep: record.sales_rep.to_hex(),
            customer_name: record.customer_name,
            amount: record.amount,
            receipt_book: record.receipt_book.to_hex(),
            receipt_number: record.receipt_number,
            is_sequential: record.is_sequential,
            notes: record.notes,
            created_at: rfc3339(record.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    pub sales_rep: String,
    #[validate(length(min = 1, message = "customerName is required"))]
    pub customer_name: String,
    pub amount: f64,
    pub receipt_book: String,
    pub receipt_number: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionsQuery {
    receipt_book: Option<String>,
}

pub async fn collections_create(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    Language(lang): Language,
    AppJson(body): AppJson<CreateCollectionRequest>,
) -> Result<Response, AppError> {
    body.validate()?;
    let input = NewCollectionRecord {
        sales_rep: parse_object_id(&body.sales_rep, "salesRep")?,
        customer_name: body.customer_name,
        amount: body.amount,
        receipt_book: parse_object_id(&body.receipt_book, "receiptBook")?,
        receipt_number: body.receipt_number,
        notes: clean_opt(body.notes),
    };

    match record_collection(&state, &scope, input).await {
        Ok(record) => Ok((StatusCode::CREATED, Json(CollectionView::from(record))).into_response()),
        Err(AppError::Receipt(err)) => Ok(receipt_rejection(lang, body.receipt_number, &err)),
        Err(err) => Err(err),
    }
}

pub async fn collections_index(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<CollectionsQuery>,
) -> Result<Json<Vec<CollectionView>>, AppError> {
    let book = parse_optional_object_id(query.receipt_book.as_deref(), "receiptBook")?;
    let records = list_collections(&state, &scope, book.as_ref()).await?;
    Ok(Json(records.into_iter().map(CollectionView::from).collect()))
}

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
    messages::{Lang, rejection_message, stats_message, validation_message},
    receipt_book::{
        MAX_RECEIPT_NUMBER, ReceiptBook, ReceiptBookStats, ReceiptError, UsedNumber, Validation,
    },
    state::{
        AppState, NewReceiptBook, ReceiptBookChanges, consume_receipt_number,
        create_receipt_book, delete_receipt_book, list_receipt_books, missing_receipt_numbers,
        receipt_book_stats, require_receipt_book, update_receipt_book, validate_receipt_number,
    },
    tenant::{Language, TenantScope},
};

use super::extract::{AppJson, AppPath, AppQuery};
use super::helpers::{clean_opt, hex, parse_object_id, parse_optional_object_id, rfc3339};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedNumberView {
    receipt_number: i64,
    linked_request_id: Option<String>,
    used_at: Option<String>,
    is_sequential: bool,
}

impl From<UsedNumber> for UsedNumberView {
    fn from(used: UsedNumber) -> Self {
        UsedNumberView {
            receipt_number: used.receipt_number,
            linked_request_id: used.linked_request_id.map(|id| id.to_hex()),
            used_at: rfc3339(Some(used.used_at)),
            is_sequential: used.is_sequential,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBookView {
    id: String,
    book_name: String,
    start_number: i64,
    end_number: i64,
    sales_rep: String,
    current_number: i64,
    used_numbers: Vec<UsedNumberView>,
    is_active: bool,
    is_completed: bool,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl From<ReceiptBook> for ReceiptBookView {
    fn from(book: ReceiptBook) -> Self {
        ReceiptBookView {
            id: hex(book.id),
            book_name: book.book_name,
            start_number: book.start_number,
            end_number: book.end_number,
            sales_rep: book.sales_rep.to_hex(),
            current_number: book.current_number,
            used_numbers: book.used_numbers.into_iter().map(Into::into).collect(),
            is_active: book.is_active,
            is_completed: book.is_completed,
            created_at: rfc3339(book.created_at),
            updated_at: rfc3339(book.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationView {
    receipt_number: i64,
    is_valid: bool,
    is_sequential: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    message: String,
}

impl ValidationView {
    fn new(lang: Lang, number: i64, validation: &Validation) -> Self {
        ValidationView {
            receipt_number: number,
            is_valid: validation.is_valid,
            is_sequential: validation.is_sequential,
            reason: validation.rejection.as_ref().map(ReceiptError::code),
            message: validation_message(lang, number, validation),
        }
    }

    fn rejected(lang: Lang, number: i64, err: &ReceiptError) -> Self {
        ValidationView {
            receipt_number: number,
            is_valid: false,
            is_sequential: false,
            reason: Some(err.code()),
            message: rejection_message(lang, err),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionView {
    validation: ValidationView,
    book: ReceiptBookView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    book_id: String,
    #[serde(flatten)]
    stats: ReceiptBookStats,
    message: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptBookRequest {
    #[validate(length(min = 1, message = "bookName is required"))]
    pub book_name: String,
    #[validate(range(min = 0, message = "startNumber cannot be negative"))]
    pub start_number: i64,
    #[validate(range(max = MAX_RECEIPT_NUMBER, message = "endNumber is above the highest receipt number"))]
    pub end_number: i64,
    pub sales_rep: String,
}

#[derive(Debug, Deserialize, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceiptBookRequest {
    pub book_name: Option<String>,
    #[validate(range(min = 0, message = "startNumber cannot be negative"))]
    pub start_number: Option<i64>,
    #[validate(range(max = MAX_RECEIPT_NUMBER, message = "endNumber is above the highest receipt number"))]
    pub end_number: Option<i64>,
    pub sales_rep: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBooksQuery {
    sales_rep: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptNumberQuery {
    receipt_number: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeRequest {
    pub receipt_number: i64,
    #[serde(default)]
    pub linked_request_id: Option<String>,
}

pub async fn receipt_books_create(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<CreateReceiptBookRequest>,
) -> Result<(StatusCode, Json<ReceiptBookView>), AppError> {
    body.validate()?;
    let sales_rep = parse_object_id(&body.sales_rep, "salesRep")?;

    let book = create_receipt_book(
        &state,
        &scope,
        NewReceiptBook {
            book_name: body.book_name,
            start_number: body.start_number,
            end_number: body.end_number,
            sales_rep,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

pub async fn receipt_books_index(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppQuery(query): AppQuery<ReceiptBooksQuery>,
) -> Result<Json<Vec<ReceiptBookView>>, AppError> {
    let sales_rep = parse_optional_object_id(query.sales_rep.as_deref(), "salesRep")?;
    let books = list_receipt_books(&state, &scope, sales_rep.as_ref()).await?;
    Ok(Json(books.into_iter().map(ReceiptBookView::from).collect()))
}

pub async fn receipt_books_show(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
) -> Result<Json<ReceiptBookView>, AppError> {
    let id = parse_object_id(&id, "receipt book id")?;
    let book = require_receipt_book(&state, &scope, &id).await?;
    Ok(Json(book.into()))
}

pub async fn receipt_books_update(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
    AppJson(body): AppJson<UpdateReceiptBookRequest>,
) -> Result<Json<ReceiptBookView>, AppError> {
    body.validate()?;
    let id = parse_object_id(&id, "receipt book id")?;
    let changes = ReceiptBookChanges {
        book_name: clean_opt(body.book_name),
        start_number: body.start_number,
        end_number: body.end_number,
        sales_rep: parse_optional_object_id(body.sales_rep.as_deref(), "salesRep")?,
        is_active: body.is_active,
    };
    let book = update_receipt_book(&state, &scope, &id, changes).await?;
    Ok(Json(book.into()))
}

pub async fn receipt_books_delete(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_object_id(&id, "receipt book id")?;
    delete_receipt_book(&state, &scope, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Dry run: never records anything, and reports rejections as `isValid: false`.
pub async fn receipt_books_validate(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    Language(lang): Language,
    AppPath(id): AppPath<String>,
    AppQuery(query): AppQuery<ReceiptNumberQuery>,
) -> Result<Json<ValidationView>, AppError> {
    let id = parse_object_id(&id, "receipt book id")?;
    let (_, validation) = validate_receipt_number(&state, &scope, &id, query.receipt_number).await?;
    Ok(Json(ValidationView::new(lang, query.receipt_number, &validation)))
}

pub async fn receipt_books_consume(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    Language(lang): Language,
    AppPath(id): AppPath<String>,
    AppJson(body): AppJson<ConsumeRequest>,
) -> Result<Response, AppError> {
    let id = parse_object_id(&id, "receipt book id")?;
    let linked = parse_optional_object_id(body.linked_request_id.as_deref(), "linkedRequestId")?;

    match consume_receipt_number(&state, &scope, &id, body.receipt_number, linked).await {
        Ok((book, validation)) => Ok(Json(ConsumptionView {
            validation: ValidationView::new(lang, body.receipt_number, &validation),
            book: book.into(),
        })
        .into_response()),
        Err(AppError::Receipt(err)) => Ok(receipt_rejection(lang, body.receipt_number, &err)),
        Err(err) => Err(err),
    }
}

pub async fn receipt_books_missing(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = parse_object_id(&id, "receipt book id")?;
    let missing = missing_receipt_numbers(&state, &scope, &id).await?;
    Ok(Json(serde_json::json!({
        "bookId": id.to_hex(),
        "missingNumbers": missing,
    })))
}

pub async fn receipt_books_stats(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    Language(lang): Language,
    AppPath(id): AppPath<String>,
) -> Result<Json<StatsView>, AppError> {
    let id = parse_object_id(&id, "receipt book id")?;
    let stats = receipt_book_stats(&state, &scope, &id).await?;
    let message = stats_message(lang, &stats);
    Ok(Json(StatsView {
        book_id: id.to_hex(),
        stats,
        message,
    }))
}

pub(super) fn receipt_rejection(lang: Lang, number: i64, err: &ReceiptError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ValidationView::rejected(lang, number, err)),
    )
        .into_response()
}

use futures::stream::TryStreamExt;
use mongodb::bson::{self, DateTime, Document, doc, oid::ObjectId};
use tracing::{info, warn};

use crate::{
    error::AppError,
    receipt_book::{ReceiptBook, ReceiptBookStats, Validation, check_range},
    tenant::TenantScope,
};

use super::{AppState, require_sales_rep};

/// Attempts at the read-decide-write cycle before giving up on a contended book.
const CONSUME_ATTEMPTS: usize = 3;

#[derive(Debug, Clone)]
pub struct NewReceiptBook {
    pub book_name: String,
    pub start_number: i64,
    pub end_number: i64,
    pub sales_rep: ObjectId,
}

#[derive(Debug, Clone, Default)]
pub struct ReceiptBookChanges {
    pub book_name: Option<String>,
    pub start_number: Option<i64>,
    pub end_number: Option<i64>,
    pub sales_rep: Option<ObjectId>,
    pub is_active: Option<bool>,
}

pub async fn create_receipt_book(
    state: &AppState,
    scope: &TenantScope,
    input: NewReceiptBook,
) -> Result<ReceiptBook, AppError> {
    check_range(input.start_number, input.end_number)?;
    require_sales_rep(state, scope, &input.sales_rep).await?;
    ensure_no_overlap(
        state,
        scope,
        &input.sales_rep,
        input.start_number,
        input.end_number,
        None,
    )
    .await?;

    let mut book = ReceiptBook::new(
        scope.admin_id(),
        input.book_name.trim(),
        input.start_number,
        input.end_number,
        input.sales_rep,
        DateTime::now(),
    )?;
    let res = state.receipt_books.insert_one(&book).await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or_else(|| anyhow::anyhow!("receipt book insert missing _id"))?;
    book.id = Some(id);

    info!(
        book_id = %id,
        sales_rep = %book.sales_rep,
        start = book.start_number,
        end = book.end_number,
        "receipt book created"
    );
    Ok(book)
}

pub async fn list_receipt_books(
    state: &AppState,
    scope: &TenantScope,
    sales_rep: Option<&ObjectId>,
) -> Result<Vec<ReceiptBook>, AppError> {
    let mut filter = doc! {};
    if let Some(rep) = sales_rep {
        filter.insert("salesRep", rep);
    }
    let mut cursor = state.receipt_books.find(scope.filter(filter)).await?;
    let mut books = Vec::new();
    while let Some(book) = cursor.try_next().await? {
        books.push(book);
    }
    Ok(books)
}

pub async fn get_receipt_book(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<Option<ReceiptBook>, AppError> {
    Ok(state
        .receipt_books
        .find_one(scope.filter(doc! { "_id": id }))
        .await?)
}

pub async fn require_receipt_book(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<ReceiptBook, AppError> {
    get_receipt_book(state, scope, id)
        .await?
        .ok_or(AppError::NotFound("receipt book"))
}

/// Renames, reassigns, suspends or re-ranges a book. The range may only move
/// while no number has been used; completed books are frozen.
pub async fn update_receipt_book(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
    changes: ReceiptBookChanges,
) -> Result<ReceiptBook, AppError> {
    let mut book = require_receipt_book(state, scope, id).await?;
    if book.is_completed {
        return Err(AppError::Conflict("completed receipt books cannot be edited".into()));
    }
    let observed_cursor = book.current_number;
    let observed_used = book.used_numbers.len() as i64;

    let start = changes.start_number.unwrap_or(book.start_number);
    let end = changes.end_number.unwrap_or(book.end_number);
    let range_changed = start != book.start_number || end != book.end_number;
    if range_changed {
        if !book.used_numbers.is_empty() {
            return Err(AppError::Conflict(
                "the range of a book with used receipts cannot change".into(),
            ));
        }
        check_range(start, end)?;
        book.start_number = start;
        book.end_number = end;
        book.current_number = start;
    }

    if let Some(rep) = changes.sales_rep {
        if rep != book.sales_rep {
            require_sales_rep(state, scope, &rep).await?;
            book.sales_rep = rep;
        }
    }
    if let Some(name) = changes.book_name {
        let name = name.trim();
        if !name.is_empty() {
            book.book_name = name.to_string();
        }
    }
    if let Some(active) = changes.is_active {
        book.is_active = active;
    }
    if book.is_active {
        ensure_no_overlap(
            state,
            scope,
            &book.sales_rep,
            book.start_number,
            book.end_number,
            Some(id),
        )
        .await?;
    }

    let now = DateTime::now();
    book.updated_at = Some(now);
    let res = state
        .receipt_books
        .update_one(
            scope.filter(doc! {
                "_id": id,
                "isCompleted": false,
                "currentNumber": observed_cursor,
                "usedNumbers": { "$size": observed_used },
            }),
            doc! { "$set": {
                "bookName": &book.book_name,
                "startNumber": book.start_number,
                "endNumber": book.end_number,
                "currentNumber": book.current_number,
                "salesRep": book.sales_rep,
                "isActive": book.is_active,
                "updatedAt": now,
            } },
        )
        .await?;
    if res.matched_count == 0 {
        return Err(AppError::Conflict(
            "receipt book changed while it was being edited".into(),
        ));
    }

    info!(book_id = %id, "receipt book updated");
    Ok(book)
}

/// Deletes a book nothing points at.
pub async fn delete_receipt_book(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<(), AppError> {
    let book = require_receipt_book(state, scope, id).await?;

    let linked_collections = state
        .collections
        .count_documents(scope.filter(doc! { "receiptBook": id }))
        .await?;
    let linked = (book.linked_request_count() as u64).max(linked_collections);
    if linked > 0 {
        return Err(AppError::LinkedRecordsExist(linked));
    }

    state
        .receipt_books
        .delete_one(scope.filter(doc! { "_id": id }))
        .await?;
    info!(book_id = %id, "receipt book deleted");
    Ok(())
}

pub async fn validate_receipt_number(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
    number: i64,
) -> Result<(ReceiptBook, Validation), AppError> {
    let book = require_receipt_book(state, scope, id).await?;
    let validation = book.validate(number);
    Ok((book, validation))
}

/// Consumes `number` with a compare-and-swap write: the update only applies
/// if the cursor is still the one the decision was made on, the number is
/// still unused and the book is not completed. Losing the race re-reads the
/// book and decides again.
pub async fn consume_receipt_number(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
    number: i64,
    linked_request_id: Option<ObjectId>,
) -> Result<(ReceiptBook, Validation), AppError> {
    for attempt in 1..=CONSUME_ATTEMPTS {
        let mut book = require_receipt_book(state, scope, id).await?;
        let observed_cursor = book.current_number;
        let now = DateTime::now();

        let validation = book.consume(number, linked_request_id, now)?;
        let entry = book
            .used_numbers
            .last()
            .ok_or_else(|| anyhow::anyhow!("consumed entry missing"))?;

        let filter = scope.filter(doc! {
            "_id": id,
            "isCompleted": false,
            "isActive": true,
            "currentNumber": observed_cursor,
            "usedNumbers.receiptNumber": { "$ne": number },
        });
        let update = doc! {
            "$push": { "usedNumbers": bson::to_bson(entry)? },
            "$set": {
                "currentNumber": book.current_number,
                "isActive": book.is_active,
                "isCompleted": book.is_completed,
                "updatedAt": now,
            },
        };

        let res = state.receipt_books.update_one(filter, update).await?;
        if res.matched_count == 1 {
            info!(
                book_id = %id,
                receipt_number = number,
                sequential = validation.is_sequential,
                completed = book.is_completed,
                "receipt number consumed"
            );
            return Ok((book, validation));
        }

        warn!(
            book_id = %id,
            receipt_number = number,
            attempt,
            "receipt book changed during consumption, retrying"
        );
    }

    Err(AppError::Conflict(format!(
        "receipt book is busy; number {number} was not recorded"
    )))
}

pub async fn missing_receipt_numbers(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<Vec<i64>, AppError> {
    Ok(require_receipt_book(state, scope, id).await?.missing_numbers())
}

pub async fn receipt_book_stats(
    state: &AppState,
    scope: &TenantScope,
    id: &ObjectId,
) -> Result<ReceiptBookStats, AppError> {
    Ok(require_receipt_book(state, scope, id).await?.stats())
}

async fn ensure_no_overlap(
    state: &AppState,
    scope: &TenantScope,
    sales_rep: &ObjectId,
    start: i64,
    end: i64,
    exclude: Option<&ObjectId>,
) -> Result<(), AppError> {
    let mut filter: Document = doc! {
        "salesRep": sales_rep,
        "isActive": true,
        "startNumber": { "$lte": end },
        "endNumber": { "$gte": start },
    };
    if let Some(id) = exclude {
        filter.insert("_id", doc! { "$ne": id });
    }

    if let Some(existing) = state.receipt_books.find_one(scope.filter(filter)).await? {
        return Err(AppError::RangeOverlap {
            start,
            end,
            existing: existing.book_name,
        });
    }
    Ok(())
}

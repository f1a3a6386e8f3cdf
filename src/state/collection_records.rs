use futures::stream::TryStreamExt;
use mongodb::bson::{DateTime, doc, oid::ObjectId};
use tracing::{error, info};

use crate::{error::AppError, models::CollectionRecord, tenant::TenantScope};

use super::{AppState, consume_receipt_number, require_receipt_book};

#[derive(Debug, Clone)]
pub struct NewCollectionRecord {
    pub sales_rep: ObjectId,
    pub customer_name: String,
    pub amount: f64,
    pub receipt_book: ObjectId,
    pub receipt_number: i64,
    pub notes: Option<String>,
}

/// Records a collection and consumes its receipt number, linking the number
/// to the new record.
pub async fn record_collection(
    state: &AppState,
    scope: &TenantScope,
    input: NewCollectionRecord,
) -> Result<CollectionRecord, AppError> {
    if !(input.amount.is_finite() && input.amount > 0.0) {
        return Err(AppError::BadRequest("amount must be greater than zero".into()));
    }

    let book = require_receipt_book(state, scope, &input.receipt_book).await?;
    if book.sales_rep != input.sales_rep {
        return Err(AppError::InvalidAssignee(format!(
            "receipt book {} is not assigned to sales rep {}",
            input.receipt_book, input.sales_rep
        )));
    }

    let record_id = ObjectId::new();
    let (_, validation) = consume_receipt_number(
        state,
        scope,
        &input.receipt_book,
        input.receipt_number,
        Some(record_id),
    )
    .await?;

    let record = CollectionRecord {
        id: Some(record_id),
        admin_id: scope.admin_id(),
        sales_rep: input.sales_rep,
        customer_name: input.customer_name.trim().to_string(),
        amount: input.amount,
        receipt_book: input.receipt_book,
        receipt_number: input.receipt_number,
        is_sequential: validation.is_sequential,
        notes: input.notes,
        created_at: Some(DateTime::now()),
    };
    if let Err(err) = state.collections.insert_one(&record).await {
        // the receipt number stays consumed and linked to this id
        error!(
            record_id = %record_id,
            receipt_number = input.receipt_number,
            error = %err,
            "collection insert failed after receipt consumption"
        );
        return Err(err.into());
    }

    info!(
        record_id = %record_id,
        book_id = %input.receipt_book,
        receipt_number = input.receipt_number,
        "collection recorded"
    );
    Ok(record)
}

pub async fn list_collections(
    state: &AppState,
    scope: &TenantScope,
    receipt_book: Option<&ObjectId>,
) -> Result<Vec<CollectionRecord>, AppError> {
    let mut filter = doc! {};
    if let Some(book) = receipt_book {
        filter.insert("receiptBook", book);
    }
    let mut cursor = state.collections.find(scope.filter(filter)).await?;
    let mut records = Vec::new();
    while let Some(record) = cursor.try_next().await? {
        records.push(record);
    }
    Ok(records)
}

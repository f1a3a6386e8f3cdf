// receipt_book.rs
// Receipt book sequencing: range validation, consumption, gap and stats reporting.

use std::collections::HashSet;

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a receipt number (or a new book range) was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
    #[error("receipt number {number} is outside the book range {start}-{end}")]
    OutOfRange { number: i64, start: i64, end: i64 },
    #[error("receipt number {number} was already used")]
    AlreadyUsed { number: i64 },
    #[error("receipt book is completed")]
    BookCompleted,
    #[error("receipt book is inactive")]
    BookInactive,
    #[error("invalid receipt range {start}-{end}")]
    InvalidRange { start: i64, end: i64 },
}

impl ReceiptError {
    pub fn code(&self) -> &'static str {
        match self {
            ReceiptError::OutOfRange { .. } => "OUT_OF_RANGE",
            ReceiptError::AlreadyUsed { .. } => "ALREADY_USED",
            ReceiptError::BookCompleted => "BOOK_COMPLETED",
            ReceiptError::BookInactive => "BOOK_INACTIVE",
            ReceiptError::InvalidRange { .. } => "INVALID_RANGE",
        }
    }
}

/// One consumed receipt number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsedNumber {
    pub receipt_number: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_request_id: Option<ObjectId>,
    pub used_at: DateTime,
    pub is_sequential: bool,
}

/// Receipt book document stored in MongoDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBook {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub admin_id: ObjectId,
    pub book_name: String,
    pub start_number: i64,
    pub end_number: i64,
    pub sales_rep: ObjectId,
    pub current_number: i64,
    #[serde(default)]
    pub used_numbers: Vec<UsedNumber>,
    pub is_active: bool,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

/// Outcome of checking a candidate number against a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub is_valid: bool,
    pub is_sequential: bool,
    pub rejection: Option<ReceiptError>,
}

impl Validation {
    fn accepted(is_sequential: bool) -> Self {
        Validation {
            is_valid: true,
            is_sequential,
            rejection: None,
        }
    }

    fn rejected(err: ReceiptError) -> Self {
        Validation {
            is_valid: false,
            is_sequential: false,
            rejection: Some(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptBookStats {
    pub total_numbers: i64,
    pub used_count: i64,
    pub remaining_count: i64,
    pub current_number: i64,
    pub sequential_breaks: i64,
    pub missing_numbers: Vec<i64>,
    pub completion_percentage: i64,
    pub is_completed: bool,
    /// Every number is used even though the cursor never passed the end.
    pub all_numbers_used: bool,
}

/// Highest receipt number a book may hold.
pub const MAX_RECEIPT_NUMBER: i64 = 999_999_999;

/// Checks a proposed range for a new book.
pub fn check_range(start: i64, end: i64) -> Result<(), ReceiptError> {
    if start < 0 || end <= start || end > MAX_RECEIPT_NUMBER {
        return Err(ReceiptError::InvalidRange { start, end });
    }
    Ok(())
}

impl ReceiptBook {
    pub fn new(
        admin_id: ObjectId,
        book_name: &str,
        start_number: i64,
        end_number: i64,
        sales_rep: ObjectId,
        now: DateTime,
    ) -> Result<Self, ReceiptError> {
        check_range(start_number, end_number)?;
        Ok(ReceiptBook {
            id: None,
            admin_id,
            book_name: book_name.to_string(),
            start_number,
            end_number,
            sales_rep,
            current_number: start_number,
            used_numbers: Vec::new(),
            is_active: true,
            is_completed: false,
            created_at: Some(now),
            updated_at: None,
        })
    }

    pub fn total_numbers(&self) -> i64 {
        self.end_number
            .saturating_sub(self.start_number)
            .saturating_add(1)
    }

    pub fn contains(&self, number: i64) -> bool {
        (self.start_number..=self.end_number).contains(&number)
    }

    pub fn is_used(&self, number: i64) -> bool {
        self.used_numbers.iter().any(|u| u.receipt_number == number)
    }

    /// Pure read: range membership, uniqueness, and whether `number` is the cursor.
    pub fn validate(&self, number: i64) -> Validation {
        if !self.contains(number) {
            return Validation::rejected(ReceiptError::OutOfRange {
                number,
                start: self.start_number,
                end: self.end_number,
            });
        }
        if self.is_used(number) {
            return Validation::rejected(ReceiptError::AlreadyUsed { number });
        }
        Validation::accepted(number == self.current_number)
    }

    /// Records `number` as used. Leaves the book untouched on rejection.
    pub fn consume(
        &mut self,
        number: i64,
        linked_request_id: Option<ObjectId>,
        used_at: DateTime,
    ) -> Result<Validation, ReceiptError> {
        if self.is_completed {
            return Err(ReceiptError::BookCompleted);
        }
        if !self.is_active {
            return Err(ReceiptError::BookInactive);
        }

        let validation = self.validate(number);
        if let Some(err) = validation.rejection.clone() {
            return Err(err);
        }

        self.used_numbers.push(UsedNumber {
            receipt_number: number,
            linked_request_id,
            used_at,
            is_sequential: validation.is_sequential,
        });

        if validation.is_sequential {
            self.current_number = number.saturating_add(1);
            if number >= self.end_number {
                self.is_completed = true;
                self.is_active = false;
            }
        }
        self.updated_at = Some(used_at);

        Ok(validation)
    }

    /// Unused numbers below the cursor, ascending.
    pub fn missing_numbers(&self) -> Vec<i64> {
        let used: HashSet<i64> = self.used_numbers.iter().map(|u| u.receipt_number).collect();
        (self.start_number..self.current_number)
            .filter(|n| !used.contains(n))
            .collect()
    }

    pub fn stats(&self) -> ReceiptBookStats {
        let total_numbers = self.total_numbers();
        let used_count = self.used_numbers.len() as i64;
        let sequential_breaks = self
            .used_numbers
            .iter()
            .filter(|u| !u.is_sequential)
            .count() as i64;
        let completion_percentage = if total_numbers > 0 {
            ((used_count as f64 / total_numbers as f64) * 100.0).round() as i64
        } else {
            0
        };

        ReceiptBookStats {
            total_numbers,
            used_count,
            remaining_count: total_numbers - used_count,
            current_number: self.current_number,
            sequential_breaks,
            missing_numbers: self.missing_numbers(),
            completion_percentage,
            is_completed: self.is_completed,
            all_numbers_used: used_count >= total_numbers && !self.is_completed,
        }
    }

    /// Used numbers that something outside this book points at.
    pub fn linked_request_count(&self) -> usize {
        self.used_numbers
            .iter()
            .filter(|u| u.linked_request_id.is_some())
            .count()
    }
}

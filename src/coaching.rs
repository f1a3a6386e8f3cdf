// coaching.rs
// Coaching evaluations and the explicit derivation of their score totals.

use std::collections::BTreeMap;

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_ITEM_SCORE: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum CoachingCategory {
    #[serde(rename = "PLANNING")]
    Planning,
    #[serde(rename = "OPENING")]
    Opening,
    #[serde(rename = "DETAILING")]
    Detailing,
    #[serde(rename = "OBJECTION HANDLING")]
    ObjectionHandling,
    #[serde(rename = "CLOSING")]
    Closing,
}

impl CoachingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoachingCategory::Planning => "PLANNING",
            CoachingCategory::Opening => "OPENING",
            CoachingCategory::Detailing => "DETAILING",
            CoachingCategory::ObjectionHandling => "OBJECTION HANDLING",
            CoachingCategory::Closing => "CLOSING",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoachingItem {
    pub category: CoachingCategory,
    pub criterion: String,
    pub score: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Rating {
    fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Rating::Excellent,
            75..=89 => Rating::Good,
            50..=74 => Rating::Fair,
            _ => Rating::Poor,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: CoachingCategory,
    pub score: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoachingTotals {
    pub by_category: Vec<CategoryTotal>,
    pub total_score: u32,
    pub max_score: u32,
    pub percentage: u32,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoachingError {
    #[error("a coaching evaluation needs at least one scored item")]
    NoItems,
    #[error("score {score} for \"{criterion}\" exceeds the maximum of 5")]
    ScoreTooHigh { criterion: String, score: u32 },
}

/// Coaching document stored in MongoDB. `totals` is always the output of
/// [`derive_totals`] over `items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coaching {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub admin_id: ObjectId,
    pub supervisor: ObjectId,
    pub rep: ObjectId,
    pub visit_date: DateTime,
    pub items: Vec<CoachingItem>,
    pub totals: CoachingTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

pub fn derive_totals(items: &[CoachingItem]) -> Result<CoachingTotals, CoachingError> {
    if items.is_empty() {
        return Err(CoachingError::NoItems);
    }

    let mut grouped: BTreeMap<CoachingCategory, (u32, u32)> = BTreeMap::new();
    for item in items {
        if item.score > MAX_ITEM_SCORE {
            return Err(CoachingError::ScoreTooHigh {
                criterion: item.criterion.clone(),
                score: item.score,
            });
        }
        let (score, max) = grouped.entry(item.category).or_insert((0, 0));
        *score += item.score;
        *max += MAX_ITEM_SCORE;
    }

    let by_category: Vec<CategoryTotal> = grouped
        .into_iter()
        .map(|(category, (score, max))| CategoryTotal { category, score, max })
        .collect();
    let total_score: u32 = by_category.iter().map(|t| t.score).sum();
    let max_score: u32 = by_category.iter().map(|t| t.max).sum();
    let percentage = ((f64::from(total_score) / f64::from(max_score)) * 100.0).round() as u32;

    Ok(CoachingTotals {
        by_category,
        total_score,
        max_score,
        percentage,
        rating: Rating::from_percentage(percentage),
    })
}

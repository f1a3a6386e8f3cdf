// models.rs
// Directory and collection documents, plus the seed-file shape (users.json).

use mongodb::bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::team::TeamTags;

/// User roles within a tenant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "SUPERVISOR")]
    Supervisor,
    #[serde(rename = "MEDICAL REP")]
    MedicalRep,
    #[serde(rename = "SALES REP")]
    SalesRep,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Supervisor => "SUPERVISOR",
            UserRole::MedicalRep => "MEDICAL REP",
            UserRole::SalesRep => "SALES REP",
        }
    }

    /// Accepts the stored form and common spellings ("sales_rep", "Sales Rep").
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "ADMIN" => Some(UserRole::Admin),
            "SUPERVISOR" => Some(UserRole::Supervisor),
            "MEDICAL REP" => Some(UserRole::MedicalRep),
            "SALES REP" => Some(UserRole::SalesRep),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// User definition as stored in users.json (tenant referenced by admin email).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    /// Email of the owning admin; absent for admins themselves.
    #[serde(default)]
    pub admin: Option<String>,
    #[serde(default)]
    pub team_products: String,
    #[serde(default)]
    pub team_area: String,
}

/// User document stored in MongoDB. Admins own their tenant, so their
/// `admin_id` is their own id once inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub team_products: TeamTags,
    #[serde(default)]
    pub team_area: TeamTags,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

/// Money collected by a sales rep against a paper receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub admin_id: ObjectId,
    pub sales_rep: ObjectId,
    pub customer_name: String,
    pub amount: f64,
    pub receipt_book: ObjectId,
    pub receipt_number: i64,
    pub is_sequential: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

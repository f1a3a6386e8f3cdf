use anyhow::{Context, Result};
use mongodb::{
    Database, IndexModel,
    bson::{DateTime, Document, doc, oid::ObjectId},
    options::IndexOptions,
};
use std::{collections::HashMap, fs, path::Path};

use crate::{
    models::{SeedUser, User, UserRole},
    team::TeamTags,
};

const COLLECTIONS: [&str; 4] = ["users", "receipt_books", "collections", "coachings"];

pub(super) async fn is_database_empty(db: &Database) -> Result<bool> {
    let users_coll = db.collection::<User>("users");
    let count = users_coll.estimated_document_count().await?;
    Ok(count == 0)
}

/// Missing seed file means nothing to seed.
pub(super) fn load_seed_users(path: &str) -> Result<Vec<SeedUser>> {
    if !Path::new(path).exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let users = serde_json::from_str::<Vec<SeedUser>>(&contents)
        .with_context(|| format!("parsing {path}"))?;
    Ok(users)
}

pub(super) async fn ensure_collections(db: &Database) -> Result<()> {
    let existing = db.list_collection_names().await?;
    for name in COLLECTIONS {
        if !existing.iter().any(|e| e == name) {
            db.create_collection(name).await?;
        }
    }
    Ok(())
}

pub(super) async fn ensure_indexes(db: &Database) -> Result<()> {
    db.collection::<User>("users")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "adminId": 1, "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;
    db.collection::<Document>("receipt_books")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "adminId": 1, "salesRep": 1, "isActive": 1 })
                .build(),
        )
        .await?;
    db.collection::<Document>("collections")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "adminId": 1, "receiptBook": 1 })
                .build(),
        )
        .await?;
    db.collection::<Document>("coachings")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "adminId": 1, "rep": 1 })
                .build(),
        )
        .await?;
    Ok(())
}

/// Inserts admins first so every other seed user can resolve its tenant.
pub(super) async fn seed_users(db: &Database, users: &[SeedUser]) -> Result<()> {
    let users_coll = db.collection::<User>("users");
    let now = DateTime::now();
    let mut admin_ids = HashMap::new();

    for seed in users.iter().filter(|u| u.role.is_admin()) {
        let email = seed.email.trim().to_lowercase();
        let res = users_coll
            .insert_one(seed_document(seed, &email, None, now))
            .await?;
        let id = res
            .inserted_id
            .as_object_id()
            .context("admin insert missing _id")?;
        users_coll
            .update_one(doc! { "_id": id }, doc! { "$set": { "adminId": id } })
            .await?;
        admin_ids.insert(email, id);
    }

    for seed in users.iter().filter(|u| !u.role.is_admin()) {
        let admin_email = seed
            .admin
            .as_deref()
            .map(|e| e.trim().to_lowercase())
            .with_context(|| format!("seed user {} has no admin", seed.email))?;
        let admin_id = *admin_ids
            .get(&admin_email)
            .with_context(|| format!("seed admin {admin_email} not found"))?;
        let email = seed.email.trim().to_lowercase();
        users_coll
            .insert_one(seed_document(seed, &email, Some(admin_id), now))
            .await?;
    }

    Ok(())
}

fn seed_document(
    seed: &SeedUser,
    email: &str,
    admin_id: Option<ObjectId>,
    now: DateTime,
) -> User {
    let team_products = if seed.role == UserRole::Admin && seed.team_products.trim().is_empty() {
        TeamTags::parse("ALL")
    } else {
        TeamTags::parse(&seed.team_products)
    };
    User {
        id: None,
        admin_id,
        name: seed.name.trim().to_string(),
        email: email.to_string(),
        role: seed.role,
        team_products,
        team_area: TeamTags::parse(&seed.team_area),
        is_active: true,
        created_at: Some(now),
    }
}

// state module: AppState, initialization, and re-exports of the repositories.

use anyhow::Result;
use mongodb::{Client, Collection, Database};
use tracing::info;

use crate::{
    coaching::Coaching,
    config::Settings,
    messages::Lang,
    models::{CollectionRecord, User},
    receipt_book::ReceiptBook,
};

mod coachings;
mod collection_records;
mod receipt_books;
mod seed;
mod users;

pub use coachings::*;
pub use collection_records::*;
pub use receipt_books::*;
pub use users::*;

#[derive(Clone)]
pub struct AppState {
    pub users: Collection<User>,
    pub receipt_books: Collection<ReceiptBook>,
    pub collections: Collection<CollectionRecord>,
    pub coachings: Collection<Coaching>,
    pub default_language: Lang,
}

impl AppState {
    /// Collection handles only; no I/O.
    pub fn from_database(db: &Database, default_language: Lang) -> Self {
        AppState {
            users: db.collection::<User>("users"),
            receipt_books: db.collection::<ReceiptBook>("receipt_books"),
            collections: db.collection::<CollectionRecord>("collections"),
            coachings: db.collection::<Coaching>("coachings"),
            default_language,
        }
    }
}

pub async fn init_state(settings: &Settings) -> Result<AppState> {
    let client = Client::with_uri_str(&settings.mongodb_uri).await?;
    let db = client.database(&settings.mongodb_db);

    seed::ensure_collections(&db).await?;
    seed::ensure_indexes(&db).await?;

    // Only seed when the database is effectively empty (no users).
    if seed::is_database_empty(&db).await? {
        let seed_users = seed::load_seed_users(&settings.users_file)?;
        if !seed_users.is_empty() {
            seed::seed_users(&db, &seed_users).await?;
            info!(count = seed_users.len(), file = %settings.users_file, "seeded users");
        }
    }

    info!(db = %settings.mongodb_db, "MongoDB state ready");
    Ok(AppState::from_database(&db, settings.default_language))
}

// routes/mod.rs
// Public re-exports of all route handlers.

mod extract;
mod helpers;

pub mod coachings;
pub mod collections;
pub mod health;
pub mod receipt_books;
pub mod users;

pub use coachings::*;
pub use collections::*;
pub use health::health;
pub use receipt_books::*;
pub use users::*;

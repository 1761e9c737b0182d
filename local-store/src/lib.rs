//! Offline-first recipe store backed by embedded SQLite.
//!
//! Single-user: rows carry no owner and all operations see the whole
//! table. Operations run synchronously; the connection mutex serializes
//! access.

mod db;
mod repository;

pub use db::Database;
pub use repository::RecipeRepository;

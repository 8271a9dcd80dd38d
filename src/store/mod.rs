use std::cmp::Ordering;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Movie, MovieChanges, NewMovie},
};

mod memory;
mod sql;

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// Storage for catalog entries.
///
/// Listings come back by rating, highest first, with unrated movies last and
/// ties broken by id.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn create(&self, movie: NewMovie) -> AppResult<Movie>;

    /// Fails with `AppError::NotFound` when `id` does not exist.
    async fn get(&self, id: i32) -> AppResult<Movie>;

    /// `search` keeps movies whose title or description contains the term,
    /// ignoring case.
    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Movie>>;

    async fn update(&self, id: i32, changes: MovieChanges) -> AppResult<Movie>;

    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Returns the number of rows removed.
    async fn delete_all(&self) -> AppResult<u64>;

    /// Drops every movie and inserts `movies` in their place.
    async fn replace_all(&self, movies: Vec<NewMovie>) -> AppResult<Vec<Movie>>;
}

pub(crate) fn listing_order(a: &Movie, b: &Movie) -> Ordering {
    match (a.rating, b.rating) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then(a.id.cmp(&b.id))
}

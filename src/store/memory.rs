use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MovieStore, listing_order};
use crate::{
    error::{AppError, AppResult},
    models::{self, Movie, MovieChanges, NewMovie},
};

/// Process-local store, used by tests and when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    last_id: i32,
    movies: BTreeMap<i32, Movie>,
}

impl Inner {
    fn insert(&mut self, movie: NewMovie) -> AppResult<Movie> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| anyhow::anyhow!("movie id space exhausted"))?;
        let movie = movie.into_movie(self.last_id, models::now()?);
        self.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn create(&self, movie: NewMovie) -> AppResult<Movie> {
        self.inner.write().await.insert(movie)
    }

    async fn get(&self, id: i32) -> AppResult<Movie> {
        self.inner.read().await.movies.get(&id).cloned().ok_or(AppError::NotFound)
    }

    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Movie>> {
        let needle = search.map(str::to_lowercase);
        let inner = self.inner.read().await;
        let mut movies: Vec<Movie> = inner
            .movies
            .values()
            .filter(|movie| match &needle {
                Some(needle) => {
                    movie.title.to_lowercase().contains(needle)
                        || movie
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(needle))
                }
                None => true,
            })
            .cloned()
            .collect();
        movies.sort_by(listing_order);
        Ok(movies)
    }

    async fn update(&self, id: i32, changes: MovieChanges) -> AppResult<Movie> {
        let mut inner = self.inner.write().await;
        let movie = inner.movies.get_mut(&id).ok_or(AppError::NotFound)?;
        changes.apply(movie);
        movie.updated_at = models::touched(movie.updated_at)?;
        Ok(movie.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        self.inner.write().await.movies.remove(&id).map(|_| ()).ok_or(AppError::NotFound)
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let removed = inner.movies.len() as u64;
        inner.movies.clear();
        Ok(removed)
    }

    async fn replace_all(&self, movies: Vec<NewMovie>) -> AppResult<Vec<Movie>> {
        let mut inner = self.inner.write().await;
        inner.movies.clear();
        movies.into_iter().map(|movie| inner.insert(movie)).collect()
    }
}

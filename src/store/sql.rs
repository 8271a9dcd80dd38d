use async_trait::async_trait;
use jiff::Timestamp;
use sea_orm::{
    ActiveModelTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    Order, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, LikeExpr, NullOrdering},
};

use super::MovieStore;
use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{self, Movie, MovieChanges, NewMovie},
};

/// Store backed by the `movie` table.
#[derive(Clone)]
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn to_active(movie: NewMovie, now: Timestamp) -> AppResult<movie::ActiveModel> {
    Ok(movie::ActiveModel {
        id: Default::default(),
        title: Set(movie.title),
        description: Set(movie.description),
        release_year: Set(movie.release_year),
        rating_tenths: Set(movie.rating.map(models::rating_to_tenths).transpose()?),
        image_url: Set(movie.image_url),
        created_at: Set(now.as_microsecond()),
        updated_at: Set(now.as_microsecond()),
    })
}

/// Makes `%`, `_` and `\` in a search term match themselves.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn from_row(row: movie::Model) -> AppResult<Movie> {
    Ok(Movie {
        id: row.id,
        title: row.title,
        description: row.description,
        release_year: row.release_year,
        rating: row.rating_tenths.map(models::rating_from_tenths),
        image_url: row.image_url,
        created_at: Timestamp::from_microsecond(row.created_at)?,
        updated_at: Timestamp::from_microsecond(row.updated_at)?,
    })
}

#[async_trait]
impl MovieStore for SqlStore {
    async fn create(&self, movie: NewMovie) -> AppResult<Movie> {
        let row = to_active(movie, models::now()?)?.insert(&self.db).await?;
        tracing::debug!(id = row.id, "inserted movie row");
        from_row(row)
    }

    async fn get(&self, id: i32) -> AppResult<Movie> {
        let row = movie::Entity::find_by_id(id).one(&self.db).await?.ok_or(AppError::NotFound)?;
        from_row(row)
    }

    async fn list(&self, search: Option<&str>) -> AppResult<Vec<Movie>> {
        let mut query = movie::Entity::find();
        if let Some(term) = search {
            // SQLite LIKE is case-insensitive for ASCII.
            let pattern = format!("%{}%", escape_like(term));
            query = query.filter(
                Condition::any()
                    .add(Expr::col(movie::Column::Title).like(LikeExpr::new(&pattern).escape('\\')))
                    .add(
                        Expr::col(movie::Column::Description)
                            .like(LikeExpr::new(&pattern).escape('\\')),
                    ),
            );
        }

        let rows = query
            .order_by_with_nulls(movie::Column::RatingTenths, Order::Desc, NullOrdering::Last)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;

        rows.into_iter().map(from_row).collect()
    }

    async fn update(&self, id: i32, changes: MovieChanges) -> AppResult<Movie> {
        let txn = self.db.begin().await?;

        let row = movie::Entity::find_by_id(id).one(&txn).await?.ok_or(AppError::NotFound)?;
        let previous = Timestamp::from_microsecond(row.updated_at)?;
        let mut active = row.into_active_model();

        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(release_year) = changes.release_year {
            active.release_year = Set(release_year);
        }
        if let Some(rating) = changes.rating {
            active.rating_tenths = Set(rating.map(models::rating_to_tenths).transpose()?);
        }
        if let Some(image_url) = changes.image_url {
            active.image_url = Set(image_url);
        }
        active.updated_at = Set(models::touched(previous)?.as_microsecond());

        let row = active.update(&txn).await?;
        txn.commit().await?;

        from_row(row)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn delete_all(&self) -> AppResult<u64> {
        let result = movie::Entity::delete_many().exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    async fn replace_all(&self, movies: Vec<NewMovie>) -> AppResult<Vec<Movie>> {
        let txn = self.db.begin().await?;

        let removed = movie::Entity::delete_many().exec(&txn).await?.rows_affected;

        let now = models::now()?;
        let mut inserted = Vec::with_capacity(movies.len());
        for movie in movies {
            let row = to_active(movie, now)?.insert(&txn).await?;
            inserted.push(from_row(row)?);
        }

        txn.commit().await?;

        tracing::debug!(removed, inserted = inserted.len(), "replaced movie rows");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, store::conformance};

    async fn store() -> SqlStore {
        let db = db::connect_and_migrate("sqlite::memory:").await.unwrap();
        SqlStore::new(db)
    }

    #[tokio::test]
    async fn migrations_create_an_empty_table() {
        let store = store().await;
        let count = movie::Entity::find().all(store.db()).await.unwrap().len();
        assert_eq!(count, 0);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("H_at"), "H\\_at");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn create_then_get() {
        conformance::create_then_get(&store().await).await;
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        conformance::delete_then_get_is_not_found(&store().await).await;
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        conformance::ids_are_not_reused(&store().await).await;
    }

    #[tokio::test]
    async fn update_touches_only_given_fields() {
        conformance::update_touches_only_given_fields(&store().await).await;
    }

    #[tokio::test]
    async fn update_can_clear_optional_fields() {
        conformance::update_can_clear_optional_fields(&store().await).await;
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        conformance::update_missing_is_not_found(&store().await).await;
    }

    #[tokio::test]
    async fn list_orders_by_rating_with_unrated_last() {
        conformance::list_orders_by_rating_with_unrated_last(&store().await).await;
    }

    #[tokio::test]
    async fn list_search_matches_title_or_description() {
        conformance::list_search_matches_title_or_description(&store().await).await;
    }

    #[tokio::test]
    async fn seed_replaces_everything() {
        conformance::seed_replaces_everything(&store().await).await;
    }

    #[tokio::test]
    async fn delete_all_empties_the_store() {
        conformance::delete_all_empties_the_store(&store().await).await;
    }
}

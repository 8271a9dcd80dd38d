use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{Movie, MoviePayload},
    seed,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/movies", get(list).post(create))
        .route("/movies/seed", post(seed_movies))
        .route("/movies/clear", post(clear_movies))
        .route(
            "/movies/{id}",
            get(retrieve).put(replace).patch(partial_update).delete(destroy),
        )
        .with_state(state)
}

/// Ids that are not integers cannot name a movie.
fn parse_id(raw: &str) -> AppResult<i32> {
    raw.parse().map_err(|_| AppError::NotFound)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    search: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let search = q.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    Ok(Json(state.store.list(search).await?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MoviePayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let Json(payload) = payload?;
    let movie = state.store.create(payload.into_new()?).await?;
    tracing::info!(id = movie.id, title = %movie.title, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.store.get(parse_id(&id)?).await?))
}

pub async fn replace(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<MoviePayload>, JsonRejection>,
) -> AppResult<Json<Movie>> {
    update(&state, &id, payload, false).await
}

pub async fn partial_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<MoviePayload>, JsonRejection>,
) -> AppResult<Json<Movie>> {
    update(&state, &id, payload, true).await
}

async fn update(
    state: &AppState,
    id: &str,
    payload: Result<Json<MoviePayload>, JsonRejection>,
    partial: bool,
) -> AppResult<Json<Movie>> {
    let id = parse_id(id)?;
    let Json(payload) = payload?;
    let changes = payload.into_changes(partial)?;
    let movie = state.store.update(id, changes).await?;
    tracing::info!(id, partial, "movie updated");
    Ok(Json(movie))
}

pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    tracing::info!(id, "movie deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn seed_movies(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let movies = state.store.replace_all(seed::sample_movies()).await?;
    tracing::info!(count = movies.len(), "catalog seeded");
    Ok(Json(json!({ "message": "Database seeded successfully" })))
}

pub async fn clear_movies(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let removed = state.store.delete_all().await?;
    tracing::info!(removed, "catalog cleared");
    Ok(Json(json!({ "message": "Database cleared successfully" })))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::store::MemoryStore;

    fn app() -> Router {
        router(Arc::new(AppState { store: Arc::new(MemoryStore::new()) }))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn create_then_retrieve() {
        let app = app();
        let (status, created) = send(
            &app,
            Method::POST,
            "/movies",
            Some(json!({ "title": "Inception", "release_year": 2010, "rating": 8.8 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["title"], "Inception");
        assert_eq!(created["rating"], json!(8.8));
        assert!(created["description"].is_null());
        assert!(created["created_at"].is_string());

        let uri = format!("/movies/{}", created["id"]);
        let (status, fetched) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_without_title_is_rejected_and_not_stored() {
        let app = app();
        let (status, body) =
            send(&app, Method::POST, "/movies", Some(json!({ "description": "untitled" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "title": ["This field is required."] }));

        let (_, listed) = send(&app, Method::GET, "/movies", None).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let app = app();
        let (status, body) =
            send(&app, Method::POST, "/movies", Some(json!({ "title": "x", "release_year": "soon" })))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let app = app();
        for method in [Method::GET, Method::DELETE] {
            let (status, body) = send(&app, method, "/movies/99", None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "detail": "Not found." }));
        }
        let (status, _) =
            send(&app, Method::PATCH, "/movies/99", Some(json!({ "rating": 1.0 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/movies/abc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn seed_then_list_is_ordered_by_rating() {
        let app = app();
        send(&app, Method::POST, "/movies", Some(json!({ "title": "Gone after seeding" }))).await;

        let (status, body) = send(&app, Method::POST, "/movies/seed", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Database seeded successfully" }));

        let (_, listed) = send(&app, Method::GET, "/movies", None).await;
        let listed = listed.as_array().unwrap();
        let ratings: Vec<_> = listed.iter().map(|m| m["rating"].as_f64().unwrap()).collect();
        assert_eq!(ratings, [9.3, 9.2, 9.0, 8.9, 8.8]);
        assert_eq!(listed[2]["title"], "The Dark Knight");
        assert_eq!(listed[2]["release_year"], 2008);
    }

    #[tokio::test]
    async fn search_filters_listing() {
        let app = app();
        send(&app, Method::POST, "/movies/seed", None).await;

        let (_, listed) = send(&app, Method::GET, "/movies?search=GOTHAM", None).await;
        let titles: Vec<_> = listed.as_array().unwrap().iter().map(|m| m["title"].clone()).collect();
        assert_eq!(titles, [json!("The Dark Knight")]);
    }

    #[tokio::test]
    async fn clear_empties_catalog() {
        let app = app();
        send(&app, Method::POST, "/movies/seed", None).await;

        let (status, body) = send(&app, Method::POST, "/movies/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Database cleared successfully" }));

        let (_, listed) = send(&app, Method::GET, "/movies", None).await;
        assert_eq!(listed, json!([]));

        let (status, _) = send(&app, Method::POST, "/movies/clear", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn patch_changes_only_rating() {
        let app = app();
        let (_, created) = send(
            &app,
            Method::POST,
            "/movies",
            Some(json!({ "title": "Oldboy", "description": "Revenge", "rating": 8.4 })),
        )
        .await;
        let uri = format!("/movies/{}", created["id"]);

        let (status, updated) = send(&app, Method::PATCH, &uri, Some(json!({ "rating": 7.5 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["rating"], json!(7.5));
        assert_eq!(updated["description"], "Revenge");
        assert_eq!(updated["created_at"], created["created_at"]);
        assert_ne!(updated["updated_at"], created["updated_at"]);
    }

    #[tokio::test]
    async fn put_requires_title() {
        let app = app();
        let (_, created) = send(&app, Method::POST, "/movies", Some(json!({ "title": "Ran" }))).await;
        let uri = format!("/movies/{}", created["id"]);

        let (status, body) = send(&app, Method::PUT, &uri, Some(json!({ "rating": 8.2 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["title"].is_array());

        let (status, body) =
            send(&app, Method::PUT, &uri, Some(json!({ "title": "Ran", "rating": "8.2" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rating"], json!(8.2));
    }

    #[tokio::test]
    async fn delete_returns_no_content() {
        let app = app();
        let (_, created) = send(&app, Method::POST, "/movies", Some(json!({ "title": "Ikiru" }))).await;
        let uri = format!("/movies/{}", created["id"]);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

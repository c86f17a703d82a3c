// HTTP adapter - request/response shaping only, no graph logic.

use axum::{
    extract::{Path as AxumPath, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    error::AppError,
    models::{EntityId, Film, Genre, Mpa, User},
};

#[derive(Deserialize)]
pub struct PopularQuery {
    pub count: Option<i64>,
}

// Film handlers

async fn create_film_handler(
    State(state): State<AppState>,
    Json(film): Json<Film>,
) -> Result<Json<Film>, AppError> {
    Ok(Json(state.film_service.create_film(film).await?))
}

async fn update_film_handler(
    State(state): State<AppState>,
    Json(film): Json<Film>,
) -> Result<Json<Film>, AppError> {
    Ok(Json(state.film_service.update_film(film).await?))
}

async fn list_films_handler(State(state): State<AppState>) -> Result<Json<Vec<Film>>, AppError> {
    Ok(Json(state.film_service.list_films().await?))
}

async fn get_film_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> Result<Json<Film>, AppError> {
    Ok(Json(state.film_service.get_film(id).await?))
}

async fn popular_films_handler(
    State(state): State<AppState>,
    Query(params): Query<PopularQuery>,
) -> Result<Json<Vec<Film>>, AppError> {
    let count = params.count.unwrap_or(10);
    Ok(Json(state.film_service.top_films(count).await?))
}

async fn like_handler(
    State(state): State<AppState>,
    AxumPath((film_id, user_id)): AxumPath<(EntityId, EntityId)>,
) -> Result<Json<Value>, AppError> {
    state.film_service.like(film_id, user_id).await?;
    Ok(Json(json!({"film_id": film_id, "user_id": user_id, "liked": true})))
}

async fn unlike_handler(
    State(state): State<AppState>,
    AxumPath((film_id, user_id)): AxumPath<(EntityId, EntityId)>,
) -> Result<Json<Value>, AppError> {
    state.film_service.unlike(film_id, user_id).await?;
    Ok(Json(json!({"film_id": film_id, "user_id": user_id, "liked": false})))
}

// User handlers

async fn create_user_handler(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_service.create_user(user).await?))
}

async fn update_user_handler(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_service.update_user(user).await?))
}

async fn list_users_handler(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.user_service.list_users().await?))
}

async fn get_user_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_service.get_user(id).await?))
}

async fn add_friend_handler(
    State(state): State<AppState>,
    AxumPath((id, friend_id)): AxumPath<(EntityId, EntityId)>,
) -> Result<Json<Value>, AppError> {
    state.user_service.add_friend(id, friend_id).await?;
    Ok(Json(json!({"user_id": id, "friend_id": friend_id, "added": true})))
}

async fn remove_friend_handler(
    State(state): State<AppState>,
    AxumPath((id, friend_id)): AxumPath<(EntityId, EntityId)>,
) -> Result<Json<Value>, AppError> {
    state.user_service.remove_friend(id, friend_id).await?;
    Ok(Json(json!({"user_id": id, "friend_id": friend_id, "removed": true})))
}

async fn friends_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.user_service.friends_of(id).await?))
}

async fn mutual_friends_handler(
    State(state): State<AppState>,
    AxumPath((id, other_id)): AxumPath<(EntityId, EntityId)>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.user_service.mutual_friends(id, other_id).await?))
}

// Reference data handlers

async fn list_genres_handler(State(state): State<AppState>) -> Result<Json<Vec<Genre>>, AppError> {
    Ok(Json(state.catalog.genres()))
}

async fn get_genre_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> Result<Json<Genre>, AppError> {
    Ok(Json(state.catalog.genre(id)?))
}

async fn list_mpa_handler(State(state): State<AppState>) -> Result<Json<Vec<Mpa>>, AppError> {
    Ok(Json(state.catalog.mpa_ratings()))
}

async fn get_mpa_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<EntityId>,
) -> Result<Json<Mpa>, AppError> {
    Ok(Json(state.catalog.mpa(id)?))
}

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        // Film operations
        .route("/films", post(create_film_handler))
        .route("/films", put(update_film_handler))
        .route("/films", get(list_films_handler))
        .route("/films/popular", get(popular_films_handler))
        .route("/films/{id}", get(get_film_handler))
        .route("/films/{id}/like/{user_id}", put(like_handler))
        .route("/films/{id}/like/{user_id}", delete(unlike_handler))
        // User operations
        .route("/users", post(create_user_handler))
        .route("/users", put(update_user_handler))
        .route("/users", get(list_users_handler))
        .route("/users/{id}", get(get_user_handler))
        .route("/users/{id}/friends", get(friends_handler))
        .route("/users/{id}/friends/common/{other_id}", get(mutual_friends_handler))
        .route("/users/{id}/friends/{friend_id}", put(add_friend_handler))
        .route("/users/{id}/friends/{friend_id}", delete(remove_friend_handler))
        // Reference data
        .route("/genres", get(list_genres_handler))
        .route("/genres/{id}", get(get_genre_handler))
        .route("/mpa", get(list_mpa_handler))
        .route("/mpa/{id}", get(get_mpa_handler))
        .with_state(state)
}

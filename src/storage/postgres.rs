use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};

use crate::core::{FilmStore, FriendshipEdge, FriendshipStore, LikeStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{EntityId, Film, Genre, Mpa, User};

/// Create tables and seed the Genre/Mpa reference data. Id generation is
/// delegated to the database sequences, so the sequential allocator is
/// never consulted for this backend.
pub async fn init_schema(pool: &PgPool) -> AppResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS mpa (
            id BIGINT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS genres (
            id BIGINT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS films (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            release_date DATE NOT NULL,
            duration BIGINT NOT NULL,
            mpa_id BIGINT NOT NULL REFERENCES mpa(id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS film_genres (
            film_id BIGINT NOT NULL REFERENCES films(id) ON DELETE CASCADE,
            genre_id BIGINT NOT NULL REFERENCES genres(id),
            PRIMARY KEY(film_id, genre_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            email TEXT NOT NULL,
            login TEXT NOT NULL,
            name TEXT NOT NULL,
            birthday DATE NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS likes (
            film_id BIGINT NOT NULL REFERENCES films(id) ON DELETE CASCADE,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            PRIMARY KEY(film_id, user_id)
        )",
    )
    .execute(pool)
    .await?;

    // ordinal keeps edge-insertion order for friends_of
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS friendship (
            follower_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            followee_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            reciprocated BOOLEAN NOT NULL DEFAULT FALSE,
            ordinal BIGSERIAL,
            PRIMARY KEY(follower_id, followee_id),
            CHECK (follower_id <> followee_id)
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_likes_film ON likes(film_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_friendship_follower ON friendship(follower_id)")
        .execute(pool)
        .await?;

    seed_reference_data(pool).await
}

async fn seed_reference_data(pool: &PgPool) -> AppResult<()> {
    let mpa = [
        (1i64, "G"),
        (2, "PG"),
        (3, "PG-13"),
        (4, "R"),
        (5, "NC-17"),
    ];
    for (id, name) in mpa {
        sqlx::query("INSERT INTO mpa (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
    }

    let genres = [
        (1i64, "Comedy"),
        (2, "Drama"),
        (3, "Cartoon"),
        (4, "Thriller"),
        (5, "Documentary"),
        (6, "Action"),
    ];
    for (id, name) in genres {
        sqlx::query("INSERT INTO genres (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
    }
    Ok(())
}

pub struct PostgresFilmStore {
    pool: PgPool,
}

impl PostgresFilmStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn genres_for(&self, film_id: EntityId) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query(
            "SELECT g.id, g.name FROM film_genres fg
             JOIN genres g ON g.id = fg.genre_id
             WHERE fg.film_id = $1 ORDER BY g.id",
        )
        .bind(film_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| Genre {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect())
    }

    fn film_from_row(row: &sqlx::postgres::PgRow) -> Film {
        Film {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            release_date: row.get::<NaiveDate, _>("release_date"),
            duration: row.get("duration"),
            genres: Vec::new(),
            mpa: Mpa {
                id: row.get("mpa_id"),
                name: row.get("mpa_name"),
            },
        }
    }
}

const FILM_SELECT: &str = "SELECT f.id, f.name, f.description, f.release_date, f.duration,
     f.mpa_id, m.name AS mpa_name
     FROM films f JOIN mpa m ON m.id = f.mpa_id";

#[async_trait]
impl FilmStore for PostgresFilmStore {
    async fn create(&self, mut film: Film) -> AppResult<Film> {
        if film.id > 0 && self.exists(film.id).await? {
            return Err(AppError::AlreadyExists(format!(
                "film with id {} already exists",
                film.id
            )));
        }

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            "INSERT INTO films (name, description, release_date, duration, mpa_id)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&film.name)
        .bind(&film.description)
        .bind(film.release_date)
        .bind(film.duration)
        .bind(film.mpa.id)
        .fetch_one(&mut *tx)
        .await?;
        film.id = row.get("id");

        for genre in &film.genres {
            sqlx::query(
                "INSERT INTO film_genres (film_id, genre_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(film.id)
            .bind(genre.id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(film)
    }

    async fn update(&self, film: Film) -> AppResult<Film> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE films SET name = $2, description = $3, release_date = $4,
             duration = $5, mpa_id = $6 WHERE id = $1",
        )
        .bind(film.id)
        .bind(&film.name)
        .bind(&film.description)
        .bind(film.release_date)
        .bind(film.duration)
        .bind(film.mpa.id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "film with id {} does not exist",
                film.id
            )));
        }

        sqlx::query("DELETE FROM film_genres WHERE film_id = $1")
            .bind(film.id)
            .execute(&mut *tx)
            .await?;
        for genre in &film.genres {
            sqlx::query(
                "INSERT INTO film_genres (film_id, genre_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(film.id)
            .bind(genre.id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(film)
    }

    async fn get(&self, id: EntityId) -> AppResult<Film> {
        let sql = format!("{} WHERE f.id = $1", FILM_SELECT);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("film with id {} does not exist", id)))?;
        let mut film = Self::film_from_row(&row);
        film.genres = self.genres_for(film.id).await?;
        Ok(film)
    }

    async fn list(&self) -> AppResult<Vec<Film>> {
        let sql = format!("{} ORDER BY f.id", FILM_SELECT);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut films = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut film = Self::film_from_row(row);
            film.genres = self.genres_for(film.id).await?;
            films.push(film);
        }
        Ok(films)
    }

    async fn exists(&self, id: EntityId) -> AppResult<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM films WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<bool, _>(0))
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("TRUNCATE films CASCADE")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &sqlx::postgres::PgRow) -> User {
        User {
            id: row.get("id"),
            email: row.get("email"),
            login: row.get("login"),
            name: row.get("name"),
            birthday: row.get::<NaiveDate, _>("birthday"),
        }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn create(&self, mut user: User) -> AppResult<User> {
        if user.id > 0 && self.exists(user.id).await? {
            return Err(AppError::AlreadyExists(format!(
                "user with id {} already exists",
                user.id
            )));
        }

        let row = sqlx::query(
            "INSERT INTO users (email, login, name, birthday)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.name)
        .bind(user.birthday)
        .fetch_one(&self.pool)
        .await?;
        user.id = row.get("id");
        Ok(user)
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, login = $3, name = $4, birthday = $5 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.login)
        .bind(&user.name)
        .bind(user.birthday)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "user with id {} does not exist",
                user.id
            )));
        }
        Ok(user)
    }

    async fn get(&self, id: EntityId) -> AppResult<User> {
        let row = sqlx::query("SELECT id, email, login, name, birthday FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user with id {} does not exist", id)))?;
        Ok(Self::user_from_row(&row))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let rows =
            sqlx::query("SELECT id, email, login, name, birthday FROM users ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(Self::user_from_row).collect())
    }

    async fn exists(&self, id: EntityId) -> AppResult<bool> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<bool, _>(0))
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("TRUNCATE users CASCADE")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PostgresLikeStore {
    pool: PgPool,
}

impl PostgresLikeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LikeStore for PostgresLikeStore {
    async fn like(&self, film_id: EntityId, user_id: EntityId) -> AppResult<()> {
        // The primary key makes check-then-insert a single statement
        let result = sqlx::query(
            "INSERT INTO likes (film_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(film_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyExists(format!(
                "user {} already likes film {}",
                user_id, film_id
            )));
        }
        Ok(())
    }

    async fn unlike(&self, film_id: EntityId, user_id: EntityId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM likes WHERE film_id = $1 AND user_id = $2")
            .bind(film_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "user {} has no like on film {}",
                user_id, film_id
            )));
        }
        Ok(())
    }

    async fn count_likes(&self, film_id: EntityId) -> AppResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) FROM likes WHERE film_id = $1")
            .bind(film_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>(0) as u64)
    }

    async fn all_counts(&self) -> AppResult<HashMap<EntityId, u64>> {
        let rows = sqlx::query("SELECT film_id, COUNT(*) AS likes FROM likes GROUP BY film_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.get::<i64, _>("film_id"), row.get::<i64, _>("likes") as u64))
            .collect())
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("TRUNCATE likes").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PostgresFriendshipStore {
    pool: PgPool,
}

// Serializes mutations on an unordered user pair for the duration of the
// transaction. Without it, READ COMMITTED lets concurrent reciprocal adds
// each miss the other's uncommitted edge and both land non-reciprocated.
// A hash collision only over-serializes, it never corrupts.
const PAIR_LOCK: &str =
    "SELECT pg_advisory_xact_lock(hashint8(least($1, $2)), hashint8(greatest($1, $2)))";

impl PostgresFriendshipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FriendshipStore for PostgresFriendshipStore {
    async fn add_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        if user_id == friend_id {
            return Err(AppError::SelfReference(format!(
                "user {} cannot befriend themselves",
                user_id
            )));
        }

        // Insert and reciprocation update happen in one transaction, with
        // the pair locked so both directions stay consistent
        let mut tx = self.pool.begin().await?;
        sqlx::query(PAIR_LOCK)
            .bind(user_id)
            .bind(friend_id)
            .execute(&mut *tx)
            .await?;
        let inverse = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM friendship WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(friend_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?
        .get::<bool, _>(0);

        let result = sqlx::query(
            "INSERT INTO friendship (follower_id, followee_id, reciprocated)
             VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(friend_id)
        .bind(inverse)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::AlreadyExists(format!(
                "user {} already follows user {}",
                user_id, friend_id
            )));
        }

        if inverse {
            sqlx::query(
                "UPDATE friendship SET reciprocated = TRUE
                 WHERE follower_id = $1 AND followee_id = $2",
            )
            .bind(friend_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn remove_friend(&self, user_id: EntityId, friend_id: EntityId) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(PAIR_LOCK)
            .bind(user_id)
            .bind(friend_id)
            .execute(&mut *tx)
            .await?;
        let result =
            sqlx::query("DELETE FROM friendship WHERE follower_id = $1 AND followee_id = $2")
                .bind(user_id)
                .bind(friend_id)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFriends(format!(
                "user {} does not follow user {}",
                user_id, friend_id
            )));
        }

        sqlx::query(
            "UPDATE friendship SET reciprocated = FALSE
             WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(friend_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn friends_of(&self, user_id: EntityId) -> AppResult<Vec<EntityId>> {
        let rows = sqlx::query(
            "SELECT followee_id FROM friendship WHERE follower_id = $1 ORDER BY ordinal",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| row.get::<i64, _>("followee_id"))
            .collect())
    }

    async fn edge(
        &self,
        user_id: EntityId,
        friend_id: EntityId,
    ) -> AppResult<Option<FriendshipEdge>> {
        let row = sqlx::query(
            "SELECT reciprocated FROM friendship WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(user_id)
        .bind(friend_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| FriendshipEdge {
            follower_id: user_id,
            followee_id: friend_id,
            reciprocated: row.get("reciprocated"),
        }))
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("TRUNCATE friendship")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

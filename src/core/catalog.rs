use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::models::{EntityId, Film, Genre, Mpa};

/// Immutable Genre/Mpa reference data, loaded once at startup and used to
/// validate foreign keys on film create/update.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    genres: BTreeMap<EntityId, Genre>,
    mpa: BTreeMap<EntityId, Mpa>,
}

impl ReferenceCatalog {
    pub fn new(genres: Vec<Genre>, mpa: Vec<Mpa>) -> Self {
        Self {
            genres: genres.into_iter().map(|g| (g.id, g)).collect(),
            mpa: mpa.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    /// Standard seed data matching the relational schema.
    pub fn with_defaults() -> Self {
        let genres = ["Comedy", "Drama", "Cartoon", "Thriller", "Documentary", "Action"]
            .iter()
            .enumerate()
            .map(|(i, name)| Genre {
                id: i as EntityId + 1,
                name: (*name).to_string(),
            })
            .collect();
        let mpa = ["G", "PG", "PG-13", "R", "NC-17"]
            .iter()
            .enumerate()
            .map(|(i, name)| Mpa {
                id: i as EntityId + 1,
                name: (*name).to_string(),
            })
            .collect();
        Self::new(genres, mpa)
    }

    pub fn genre(&self, id: EntityId) -> AppResult<Genre> {
        self.genres
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("genre with id {} does not exist", id)))
    }

    pub fn mpa(&self, id: EntityId) -> AppResult<Mpa> {
        self.mpa
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("mpa rating with id {} does not exist", id)))
    }

    pub fn genres(&self) -> Vec<Genre> {
        self.genres.values().cloned().collect()
    }

    pub fn mpa_ratings(&self) -> Vec<Mpa> {
        self.mpa.values().cloned().collect()
    }

    /// Every genre id and the mpa id on the film must resolve to a known
    /// reference entity.
    pub fn validate_film_refs(&self, film: &Film) -> AppResult<()> {
        for genre in &film.genres {
            if !self.genres.contains_key(&genre.id) {
                return Err(AppError::Validation(format!(
                    "unknown genre id {}",
                    genre.id
                )));
            }
        }
        if !self.mpa.contains_key(&film.mpa.id) {
            return Err(AppError::Validation(format!(
                "unknown mpa rating id {}",
                film.mpa.id
            )));
        }
        Ok(())
    }

    /// Replace the incoming genre/mpa stubs (often id-only in requests)
    /// with the canonical catalog records.
    pub fn resolve_film_refs(&self, film: &mut Film) -> AppResult<()> {
        for genre in film.genres.iter_mut() {
            *genre = self.genre(genre.id).map_err(|_| {
                AppError::Validation(format!("unknown genre id {}", genre.id))
            })?;
        }
        let mut seen = std::collections::HashSet::new();
        film.genres.retain(|g| seen.insert(g.id));
        film.mpa = self
            .mpa(film.mpa.id)
            .map_err(|_| AppError::Validation(format!("unknown mpa rating id {}", film.mpa.id)))?;
        Ok(())
    }
}

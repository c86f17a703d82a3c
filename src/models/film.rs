use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::EntityId;

/// Earliest admissible release date - the first public film screening
/// (Lumière brothers, Paris, 1895-12-28).
pub static FIRST_FILM_SCREENING: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(1895, 12, 28).unwrap());

/// Reference entity for film genres. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: EntityId,
    pub name: String,
}

/// Reference entity for MPA age ratings. Loaded once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mpa {
    pub id: EntityId,
    pub name: String,
}

/// A catalogued film. Likes are tracked externally in the like relation,
/// never embedded here, so concurrent readers always see a consistent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    #[serde(default)]
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub release_date: NaiveDate,
    pub duration: i64,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub mpa: Mpa,
}

impl Film {
    /// Field-level constraints. Genre/Mpa foreign keys are checked
    /// separately against the reference catalog.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("film name must not be empty".into()));
        }
        let description_len = self.description.chars().count();
        if description_len == 0 || description_len > 200 {
            return Err(AppError::Validation(
                "film description must be 1-200 characters".into(),
            ));
        }
        if self.release_date < *FIRST_FILM_SCREENING {
            return Err(AppError::Validation(format!(
                "release date must not be before {}",
                *FIRST_FILM_SCREENING
            )));
        }
        if self.duration <= 0 {
            return Err(AppError::Validation(
                "film duration must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film(release_date: NaiveDate) -> Film {
        Film {
            id: 0,
            name: "Titanic".into(),
            description: "Ship sinks".into(),
            release_date,
            duration: 220,
            genres: vec![],
            mpa: Mpa {
                id: 3,
                name: "PG-13".into(),
            },
        }
    }

    #[test]
    fn accepts_valid_film() {
        let f = film(NaiveDate::from_ymd_opt(1997, 12, 19).unwrap());
        assert!(f.validate().is_ok());
    }

    #[test]
    fn accepts_earliest_release_date() {
        let f = film(*FIRST_FILM_SCREENING);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn rejects_release_before_first_screening() {
        let f = film(NaiveDate::from_ymd_opt(1895, 12, 27).unwrap());
        assert!(matches!(f.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_blank_name() {
        let mut f = film(NaiveDate::from_ymd_opt(1997, 12, 19).unwrap());
        f.name = "   ".into();
        assert!(matches!(f.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_bad_description_length() {
        let mut f = film(NaiveDate::from_ymd_opt(1997, 12, 19).unwrap());
        f.description = String::new();
        assert!(f.validate().is_err());
        f.description = "x".repeat(201);
        assert!(f.validate().is_err());
        f.description = "x".repeat(200);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_duration() {
        let mut f = film(NaiveDate::from_ymd_opt(1997, 12, 19).unwrap());
        f.duration = 0;
        assert!(f.validate().is_err());
        f.duration = -10;
        assert!(f.validate().is_err());
    }
}

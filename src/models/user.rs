use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::EntityId;

static LOGIN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+$").unwrap());

/// A registered user. Friendship membership is tracked externally in the
/// friendship relation, never embedded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: EntityId,
    pub email: String,
    pub login: String,
    #[serde(default)]
    pub name: String,
    pub birthday: NaiveDate,
}

impl User {
    pub fn validate(&self) -> AppResult<()> {
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(AppError::Validation(
                "email must not be blank and must contain '@'".into(),
            ));
        }
        if !LOGIN_PATTERN.is_match(&self.login) {
            return Err(AppError::Validation(
                "login must not be blank or contain whitespace".into(),
            ));
        }
        if self.birthday > Utc::now().date_naive() {
            return Err(AppError::Validation(
                "birthday must not be in the future".into(),
            ));
        }
        Ok(())
    }

    /// Display name falls back to the login when absent.
    pub fn normalize(&mut self) {
        if self.name.trim().is_empty() {
            self.name = self.login.clone();
        }
    }
}

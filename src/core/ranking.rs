use std::collections::HashMap;

use crate::models::{EntityId, Film};

/// Orders films by descending like count, ties broken by ascending film
/// id so the result is deterministic regardless of insertion order.
/// Pure function over a snapshot - rankings are recomputed on demand and
/// never cached across mutations.
pub fn top_films(
    mut films: Vec<Film>,
    counts: &HashMap<EntityId, u64>,
    limit: i64,
) -> Vec<Film> {
    if limit <= 0 {
        return Vec::new();
    }
    films.sort_by(|a, b| {
        let likes_a = counts.get(&a.id).copied().unwrap_or(0);
        let likes_b = counts.get(&b.id).copied().unwrap_or(0);
        likes_b.cmp(&likes_a).then(a.id.cmp(&b.id))
    });
    films.truncate(limit as usize);
    films
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mpa;
    use chrono::NaiveDate;

    fn film(id: EntityId) -> Film {
        Film {
            id,
            name: format!("film-{}", id),
            description: "a film".into(),
            release_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            duration: 100,
            genres: vec![],
            mpa: Mpa {
                id: 1,
                name: "G".into(),
            },
        }
    }

    fn counts(pairs: &[(EntityId, u64)]) -> HashMap<EntityId, u64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn orders_by_descending_likes() {
        let ranked = top_films(
            vec![film(1), film(2), film(3)],
            &counts(&[(1, 2), (2, 5), (3, 1)]),
            10,
        );
        let ids: Vec<EntityId> = ranked.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn ties_break_by_ascending_id() {
        // Insertion order deliberately scrambled
        let ranked = top_films(
            vec![film(7), film(2), film(5)],
            &counts(&[(7, 3), (2, 3), (5, 3)]),
            10,
        );
        let ids: Vec<EntityId> = ranked.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 5, 7]);
    }

    #[test]
    fn films_without_likes_count_as_zero() {
        let ranked = top_films(vec![film(1), film(2)], &counts(&[(2, 1)]), 10);
        let ids: Vec<EntityId> = ranked.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn non_positive_limit_yields_empty() {
        assert!(top_films(vec![film(1)], &counts(&[]), 0).is_empty());
        assert!(top_films(vec![film(1)], &counts(&[]), -3).is_empty());
    }

    #[test]
    fn limit_beyond_film_count_returns_all() {
        let ranked = top_films(vec![film(1), film(2)], &counts(&[]), 1000);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn limit_truncates() {
        let ranked = top_films(
            vec![film(1), film(2), film(3)],
            &counts(&[(1, 9), (2, 8), (3, 7)]),
            2,
        );
        let ids: Vec<EntityId> = ranked.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}

//! Friendship adapter tests against a live Postgres. Ignored by default;
//! run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::sync::Arc;

use chrono::NaiveDate;
use filmgraph::core::{FriendshipStore, UserStore};
use filmgraph::models::User;
use filmgraph::storage::{init_schema, PostgresFriendshipStore, PostgresUserStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must point at a scratch Postgres database");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .unwrap();
    init_schema(&pool).await.unwrap();
    pool
}

fn user(login: &str) -> User {
    User {
        id: 0,
        email: format!("{}@example.com", login),
        login: login.into(),
        name: login.into(),
        birthday: NaiveDate::from_ymd_opt(1988, 3, 14).unwrap(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn concurrent_reciprocal_adds_end_up_mutual() {
    let pool = pool().await;
    let users = PostgresUserStore::new(pool.clone());
    let a = users.create(user("alice")).await.unwrap();
    let b = users.create(user("bob")).await.unwrap();
    let store = Arc::new(PostgresFriendshipStore::new(pool));

    // Repeated rounds so an interleaving where both transactions observe
    // the inverse edge as absent gets a real chance to occur
    for _ in 0..50 {
        let forward = {
            let store = Arc::clone(&store);
            let (a, b) = (a.id, b.id);
            tokio::spawn(async move { store.add_friend(a, b).await })
        };
        let backward = {
            let store = Arc::clone(&store);
            let (a, b) = (a.id, b.id);
            tokio::spawn(async move { store.add_friend(b, a).await })
        };
        forward.await.unwrap().unwrap();
        backward.await.unwrap().unwrap();

        assert!(store.edge(a.id, b.id).await.unwrap().unwrap().reciprocated);
        assert!(store.edge(b.id, a.id).await.unwrap().unwrap().reciprocated);

        store.remove_friend(a.id, b.id).await.unwrap();
        store.remove_friend(b.id, a.id).await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn concurrent_identical_adds_admit_exactly_one_edge() {
    let pool = pool().await;
    let users = PostgresUserStore::new(pool.clone());
    let a = users.create(user("carol")).await.unwrap();
    let b = users.create(user("dave")).await.unwrap();
    let store = Arc::new(PostgresFriendshipStore::new(pool));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        let (a, b) = (a.id, b.id);
        handles.push(tokio::spawn(async move { store.add_friend(a, b).await }));
    }

    let mut ok = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(store.friends_of(a.id).await.unwrap(), vec![b.id]);
}

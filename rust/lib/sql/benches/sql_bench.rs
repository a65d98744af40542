use criterion::{black_box, criterion_group, criterion_main, Criterion};

use devplaza_sql::{placeholders, SQLStore, SqliteStore, Value};

fn seeded_store(posts: i64) -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .exec(
            "CREATE TABLE posts (id TEXT PRIMARY KEY, like_count INTEGER NOT NULL DEFAULT 0)",
            &[],
        )
        .unwrap();
    store
        .exec(
            "CREATE TABLE post_likes (post_id TEXT NOT NULL, user_id TEXT NOT NULL, \
             state TEXT NOT NULL, UNIQUE(post_id, user_id))",
            &[],
        )
        .unwrap();
    for i in 0..posts {
        store
            .exec(
                "INSERT INTO posts (id) VALUES (?1)",
                &[Value::Text(format!("post-{}", i))],
            )
            .unwrap();
    }
    store
}

/// Toggle a reaction row and its counter inside one transaction.
fn bench_reaction_toggle(c: &mut Criterion) {
    let store = seeded_store(1);
    let mut active = false;

    c.bench_function("sqlite_reaction_toggle", |b| {
        b.iter(|| {
            let tx = store.begin().unwrap();
            let (state, delta) = if active { ("retracted", -1) } else { ("active", 1) };
            tx.exec(
                "INSERT INTO post_likes (post_id, user_id, state) VALUES ('post-0', 'u1', ?1) \
                 ON CONFLICT(post_id, user_id) DO UPDATE SET state = excluded.state",
                &[Value::from(state)],
            )
            .unwrap();
            tx.exec(
                "UPDATE posts SET like_count = like_count + ?1 WHERE id = 'post-0'",
                &[Value::Integer(black_box(delta))],
            )
            .unwrap();
            tx.commit().unwrap();
            active = !active;
        });
    });
}

/// Membership lookup over a page of post ids, as the status endpoint does.
fn bench_status_lookup(c: &mut Criterion) {
    let store = seeded_store(10_000);
    for i in (0..10_000).step_by(3) {
        store
            .exec(
                "INSERT INTO post_likes (post_id, user_id, state) VALUES (?1, 'u1', 'active')",
                &[Value::Text(format!("post-{}", i))],
            )
            .unwrap();
    }

    let mut offset = 0i64;
    c.bench_function("sqlite_status_lookup_20", |b| {
        b.iter(|| {
            let mut params = vec![Value::from("u1")];
            params.extend((0..20).map(|k| Value::Text(format!("post-{}", (offset + k) % 10_000))));
            let sql = format!(
                "SELECT post_id FROM post_likes WHERE user_id = ?1 AND state = 'active' \
                 AND post_id IN ({})",
                placeholders(2, 20)
            );
            let rows = store.query(&sql, black_box(&params)).unwrap();
            assert!(rows.len() <= 20);
            offset += 20;
        });
    });
}

criterion_group!(benches, bench_reaction_toggle, bench_status_lookup);
criterion_main!(benches);

//! Shared schemas parsed from several threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use serde_json::json;
use shapeguard::prelude::*;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn schemas_and_errors_are_send_and_sync() {
    assert_send_sync::<Schema>();
    assert_send_sync::<Value>();
    assert_send_sync::<ValidationError>();
    assert_send_sync::<ParseContext>();
    assert_send_sync::<shapeguard::Registry>();
}

#[test]
fn one_schema_many_threads() {
    let schema: Schema = object()
        .field("id", int().positive())
        .field("name", string().trim().min(1))
        .into();

    thread::scope(|scope| {
        for worker in 0..8i64 {
            let schema = &schema;
            scope.spawn(move || {
                for i in 1..50i64 {
                    let id = worker * 100 + i;
                    let out = schema.parse(json!({ "id": id, "name": " n " })).unwrap();
                    assert_eq!(out.get("id"), Some(&Value::from(id)));
                    assert!(schema.parse(json!({ "id": -id, "name": "n" })).is_err());
                }
            });
        }
    });
}

#[test]
fn racing_lazy_resolution_agrees() {
    static BUILDS: AtomicUsize = AtomicUsize::new(0);
    let schema = lazy(|| {
        BUILDS.fetch_add(1, Ordering::SeqCst);
        number().int().into()
    });

    thread::scope(|scope| {
        for _ in 0..8 {
            let schema = schema.clone();
            scope.spawn(move || {
                assert!(schema.parse(3).is_ok());
                assert!(schema.parse(1.5).is_err());
            });
        }
    });
    assert!(BUILDS.load(Ordering::SeqCst) >= 1);
    assert!(schema.parse(4).is_ok());
}

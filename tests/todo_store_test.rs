use std::sync::Arc;

use sqlx::SqlitePool;
use todo_backend::{
    auth, db,
    error::AppError,
    models::{NewTodoRequest, TodoRules, UpdateTodoRequest, UserId},
    store::{SqliteTodoStore, TodoStore},
};

const DUE: &str = "2026-11-01T09:00:00Z";

async fn setup_with(rules: TodoRules) -> (SqlitePool, SqliteTodoStore, UserId, UserId) {
    let db = db::connect_in_memory()
        .await
        .expect("Failed to create database");
    let alice = auth::ensure_user(&db, "alice").await.expect("Failed to create alice");
    let bob = auth::ensure_user(&db, "bob").await.expect("Failed to create bob");
    let store = SqliteTodoStore::new(db.clone(), rules);
    (db, store, alice, bob)
}

async fn setup() -> (SqlitePool, SqliteTodoStore, UserId, UserId) {
    setup_with(TodoRules::default()).await
}

fn new_todo(title: &str) -> NewTodoRequest {
    NewTodoRequest {
        title: Some(title.to_string()),
        description: Some("2%".to_string()),
        due_time: Some(DUE.to_string()),
    }
}

fn mark(completed: bool) -> UpdateTodoRequest {
    UpdateTodoRequest {
        completed: Some(completed),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_owner_lifecycle_scenario() {
    let (_db, store, alice, bob) = setup().await;

    let todo = store.create(alice, new_todo("Buy milk")).await.expect("create");

    let listed = store.list(alice).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert!(!listed[0].completed);

    assert!(matches!(store.get(bob, todo.id).await, Err(AppError::NotFound)));

    store.update(alice, todo.id, mark(true)).await.expect("update");
    assert!(store.get(alice, todo.id).await.expect("get").completed);

    store.delete(alice, todo.id).await.expect("delete");
    assert!(matches!(store.get(alice, todo.id).await, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_other_users_cannot_see_or_touch_todo() {
    let (_db, store, alice, bob) = setup().await;
    let todo = store.create(alice, new_todo("Private")).await.expect("create");

    assert!(store.list(bob).await.expect("list").is_empty());
    assert!(matches!(store.get(bob, todo.id).await, Err(AppError::NotFound)));
    assert!(matches!(
        store.update(bob, todo.id, mark(true)).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(store.delete(bob, todo.id).await, Err(AppError::NotFound)));

    let unchanged = store.get(alice, todo.id).await.expect("get");
    assert_eq!(unchanged, todo);
}

#[tokio::test]
async fn test_create_then_get_round_trips() {
    let (_db, store, alice, _bob) = setup().await;

    let created = store.create(alice, new_todo("Buy milk")).await.expect("create");
    assert_eq!(created.owner, alice);
    assert_eq!(created.title, "Buy milk");
    assert_eq!(created.description, "2%");
    assert_eq!(created.due_time.to_rfc3339(), "2026-11-01T09:00:00+00:00");
    assert!(!created.completed);

    let fetched = store.get(alice, created.id).await.expect("get");
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_always_starts_pending() {
    let (_db, store, alice, _bob) = setup().await;

    let payload = serde_json::json!({
        "title": "Already done?",
        "description": "no",
        "due_time": DUE,
        "completed": true
    });
    let req: NewTodoRequest = serde_json::from_value(payload).expect("payload");
    let created = store.create(alice, req).await.expect("create");

    assert!(!created.completed);
    assert!(!store.get(alice, created.id).await.expect("get").completed);
}

#[tokio::test]
async fn test_ids_are_never_reused() {
    let (_db, store, alice, bob) = setup().await;

    let first = store.create(alice, new_todo("one")).await.expect("create");
    let second = store.create(bob, new_todo("two")).await.expect("create");
    store.delete(bob, second.id).await.expect("delete");
    let third = store.create(alice, new_todo("three")).await.expect("create");

    assert_ne!(first.id, second.id);
    assert_ne!(third.id, first.id);
    assert_ne!(third.id, second.id);
}

#[tokio::test]
async fn test_list_is_in_insertion_order() {
    let (_db, store, alice, _bob) = setup().await;

    for title in ["a", "b", "c"] {
        store.create(alice, new_todo(title)).await.expect("create");
    }

    let titles: Vec<String> = store
        .list(alice)
        .await
        .expect("list")
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_update_with_current_values_is_a_no_op() {
    let (_db, store, alice, _bob) = setup().await;
    let todo = store.create(alice, new_todo("Same")).await.expect("create");

    let same = UpdateTodoRequest {
        title: Some(todo.title.clone()),
        description: Some(todo.description.clone()),
        due_time: Some(todo.due_time.to_rfc3339()),
        completed: Some(todo.completed),
    };
    let updated = store.update(alice, todo.id, same).await.expect("update");

    assert_eq!(updated, todo);
    assert_eq!(store.get(alice, todo.id).await.expect("get"), todo);
}

#[tokio::test]
async fn test_owner_in_update_payload_has_no_effect() {
    let (_db, store, alice, bob) = setup().await;
    let todo = store.create(alice, new_todo("Mine")).await.expect("create");

    let payload = serde_json::json!({ "owner": bob.0, "title": "Still mine" });
    let req: UpdateTodoRequest = serde_json::from_value(payload).expect("payload");
    let updated = store.update(alice, todo.id, req).await.expect("update");

    assert_eq!(updated.owner, alice);
    assert_eq!(updated.title, "Still mine");
    assert!(store.list(bob).await.expect("list").is_empty());
}

#[tokio::test]
async fn test_partial_update_leaves_other_fields() {
    let (_db, store, alice, _bob) = setup().await;
    let todo = store.create(alice, new_todo("Keep")).await.expect("create");

    let updated = store
        .update(
            alice,
            todo.id,
            UpdateTodoRequest {
                description: Some("whole".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.title, "Keep");
    assert_eq!(updated.description, "whole");
    assert_eq!(updated.due_time, todo.due_time);
    assert!(!updated.completed);
}

#[tokio::test]
async fn test_done_todo_can_be_reopened() {
    let (_db, store, alice, _bob) = setup().await;
    let todo = store.create(alice, new_todo("Reopen")).await.expect("create");

    assert!(store.update(alice, todo.id, mark(true)).await.expect("done").completed);
    assert!(!store.update(alice, todo.id, mark(false)).await.expect("reopen").completed);
}

#[tokio::test]
async fn test_title_bound() {
    let (_db, store, alice, _bob) = setup().await;

    store
        .create(alice, new_todo(&"t".repeat(30)))
        .await
        .expect("title at the bound is accepted");

    let err = store
        .create(alice, new_todo(&"t".repeat(31)))
        .await
        .expect_err("title over the bound is rejected");
    match err {
        AppError::Validation(errors) => assert!(errors.field("title").is_some()),
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(store.list(alice).await.expect("list").len(), 1);
}

#[tokio::test]
async fn test_title_bound_is_configurable() {
    let (_db, store, alice, _bob) = setup_with(TodoRules { title_max_len: 5 }).await;

    assert!(store.create(alice, new_todo("12345")).await.is_ok());
    assert!(matches!(
        store.create(alice, new_todo("123456")).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_missing_todo_wins_over_invalid_payload() {
    let (_db, store, alice, _bob) = setup().await;

    let bad = UpdateTodoRequest {
        title: Some("x".repeat(31)),
        ..Default::default()
    };
    assert!(matches!(store.update(alice, 404, bad.clone()).await, Err(AppError::NotFound)));

    let todo = store.create(alice, new_todo("Exists")).await.expect("create");
    assert!(matches!(
        store.update(alice, todo.id, bad).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_deleting_twice_is_not_found() {
    let (_db, store, alice, _bob) = setup().await;
    let todo = store.create(alice, new_todo("Once")).await.expect("create");

    store.delete(alice, todo.id).await.expect("delete");
    assert!(matches!(store.delete(alice, todo.id).await, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_concurrent_updates_to_one_todo_keep_both_fields() {
    let (_db, store, alice, _bob) = setup().await;
    let store: Arc<dyn TodoStore> = Arc::new(store);
    let id = store.create(alice, new_todo("Race")).await.expect("create").id;

    let retitle = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update(
                    alice,
                    id,
                    UpdateTodoRequest {
                        title: Some("Raced".to_string()),
                        ..Default::default()
                    },
                )
                .await
        })
    };
    let complete = {
        let store = store.clone();
        tokio::spawn(async move { store.update(alice, id, mark(true)).await })
    };

    retitle.await.expect("join").expect("retitle");
    complete.await.expect("join").expect("complete");

    let current = store.get(alice, id).await.expect("get");
    assert_eq!(current.title, "Raced");
    assert!(current.completed);
}

#[tokio::test]
async fn test_deleting_user_removes_their_todos() {
    let (db, store, alice, bob) = setup().await;
    store.create(alice, new_todo("Gone")).await.expect("create");
    let kept = store.create(bob, new_todo("Kept")).await.expect("create");

    auth::delete_user(&db, alice).await.expect("delete user");

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos")
        .fetch_one(&db)
        .await
        .expect("count");
    assert_eq!(remaining, 1);
    assert_eq!(store.list(bob).await.expect("list"), vec![kept]);
}

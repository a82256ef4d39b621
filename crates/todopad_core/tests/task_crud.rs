use rusqlite::Connection;
use todopad_core::db::migrations::latest_version;
use todopad_core::db::open_db;
use todopad_core::{Priority, RepoError, SqliteTaskDao, Task, TaskRepository};

#[tokio::test]
async fn insert_assigns_ascending_ids_and_orders_list() {
    let repo = TaskRepository::open_in_memory().unwrap();

    let first = repo
        .insert_task(Task::new("first", Priority::Normal))
        .await
        .unwrap();
    let second = repo
        .insert_task(Task::new("second", Priority::High))
        .await
        .unwrap();
    assert!(second > first);

    let tasks = repo.list_all().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, first);
    assert_eq!(tasks[0].title, "first");
    assert_eq!(tasks[1].id, second);
    assert_eq!(tasks[1].priority, Priority::High);
}

#[tokio::test]
async fn get_by_id_round_trips_all_fields() {
    let repo = TaskRepository::open_in_memory().unwrap();
    let task = Task::new("detailed", Priority::Low).with_due_date(Some(1_900_000_000_000));
    let created_at = task.created_at;

    let id = repo.insert_task(task).await.unwrap();
    let stored = repo.get_task(id).await.unwrap().expect("task should exist");

    assert_eq!(stored.id, id);
    assert_eq!(stored.title, "detailed");
    assert!(!stored.is_done);
    assert_eq!(stored.created_at, created_at);
    assert_eq!(stored.priority, Priority::Low);
    assert_eq!(stored.due_date, Some(1_900_000_000_000));

    assert_eq!(repo.get_task(id + 100).await.unwrap(), None);
}

#[tokio::test]
async fn update_replaces_whole_row_and_reports_missing_ids() {
    let repo = TaskRepository::open_in_memory().unwrap();
    let id = repo
        .insert_task(Task::new("original", Priority::Normal))
        .await
        .unwrap();
    let stored = repo.get_task(id).await.unwrap().unwrap();

    let edited = stored
        .with_title("edited")
        .with_done(true)
        .with_priority(Priority::High)
        .with_due_date(Some(42));
    assert!(repo.update_task(edited.clone()).await.unwrap());

    let reread = repo.get_task(id).await.unwrap().unwrap();
    assert_eq!(reread, edited);

    repo.delete_task(id).await.unwrap();
    assert!(!repo.update_task(reread).await.unwrap());
    assert!(repo.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_by_id_is_a_silent_noop_for_missing_rows() {
    let repo = TaskRepository::open_in_memory().unwrap();
    let id = repo
        .insert_task(Task::new("short lived", Priority::Normal))
        .await
        .unwrap();

    assert!(repo.delete_task(id).await.unwrap());
    assert!(!repo.delete_task(id).await.unwrap());
    assert!(!repo.delete_task(9_999).await.unwrap());
}

#[tokio::test]
async fn watcher_sees_new_snapshots_after_effective_writes_only() {
    let repo = TaskRepository::open_in_memory().unwrap();
    let mut stream = repo.observe_all();
    assert!(stream.snapshot().is_empty());
    assert!(!stream.has_pending_update());

    let id = repo
        .insert_task(Task::new("observed", Priority::Normal))
        .await
        .unwrap();
    assert!(stream.changed().await);
    let snapshot = stream.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, id);

    // Writes that change nothing publish nothing.
    assert!(!repo.delete_task(id + 50).await.unwrap());
    assert!(!stream.has_pending_update());

    assert!(repo.delete_task(id).await.unwrap());
    assert!(stream.changed().await);
    assert!(stream.snapshot().is_empty());
}

#[tokio::test]
async fn late_watchers_start_at_the_current_list() {
    let repo = TaskRepository::open_in_memory().unwrap();
    repo.insert_task(Task::new("already there", Priority::Normal))
        .await
        .unwrap();

    let stream = repo.observe_all();
    assert_eq!(stream.snapshot().len(), 1);
    assert!(!stream.has_pending_update());
}

#[tokio::test]
async fn snapshots_stay_in_insertion_order_after_updates() {
    let repo = TaskRepository::open_in_memory().unwrap();
    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        ids.push(
            repo.insert_task(Task::new(title, Priority::Normal))
                .await
                .unwrap(),
        );
    }

    // Touching the middle row must not promote it in the list.
    let middle = repo.get_task(ids[1]).await.unwrap().unwrap();
    assert!(repo.update_task(middle.with_done(true)).await.unwrap());

    let listed: Vec<_> = repo
        .list_all()
        .await
        .unwrap()
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(listed, ids);

    let watched: Vec<_> = repo
        .observe_all()
        .snapshot()
        .iter()
        .map(|task| task.id)
        .collect();
    assert_eq!(watched, ids);
}

#[tokio::test]
async fn corrupt_priority_is_rejected_when_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt_priority.db");
    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO tasks (title, is_done, created_at, priority)
             VALUES ('broken', 0, 1, 'CRITICAL');",
            [],
        )
        .unwrap();
    }

    let err = TaskRepository::open(&path).unwrap_err();
    match err {
        RepoError::Row(inner) => {
            assert!(inner.to_string().contains("CRITICAL"), "{inner}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn corrupt_done_flag_is_rejected_when_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt_done.db");
    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO tasks (title, is_done, created_at, priority)
             VALUES ('broken', 7, 1, 'NORMAL');",
            [],
        )
        .unwrap();
    }

    let err = TaskRepository::open(&path).unwrap_err();
    match err {
        RepoError::InvalidData(message) => assert!(message.contains("is_done"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dao_rejects_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTaskDao::try_new(&conn).unwrap_err() {
        RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn dao_rejects_missing_table_and_columns() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    match SqliteTaskDao::try_new(&conn).unwrap_err() {
        RepoError::MissingRequiredTable(table) => assert_eq!(table, "tasks"),
        other => panic!("unexpected error: {other}"),
    }

    conn.execute_batch("CREATE TABLE tasks (id INTEGER PRIMARY KEY, title TEXT NOT NULL);")
        .unwrap();

    match SqliteTaskDao::try_new(&conn).unwrap_err() {
        RepoError::MissingRequiredColumn { table, column } => {
            assert_eq!(table, "tasks");
            assert_eq!(column, "is_done");
        }
        other => panic!("unexpected error: {other}"),
    }
}

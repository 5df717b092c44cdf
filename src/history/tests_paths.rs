#![allow(clippy::unwrap_used, clippy::expect_used)]

use rusqlite::Connection;
use tempfile::TempDir;

use super::*;

fn temp_db() -> (TempDir, Connection) {
    let dir = TempDir::new().expect("tempdir");
    let conn = open_db(&dir.path().join("histree.db")).expect("open db");
    (dir, conn)
}

fn add(conn: &Connection, cmd: &str, dir: &str) {
    add_entry(
        conn,
        &NewEntry {
            command: cmd.to_owned(),
            directory: dir.to_owned(),
            timestamp: None,
            exit_code: 0,
            hostname: "test-host".to_owned(),
            process_id: 12345,
        },
    )
    .expect("add");
}

fn directories(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT directory FROM history ORDER BY id")
        .expect("prepare");
    stmt.query_map([], |r| r.get(0))
        .expect("query")
        .collect::<Result<_, _>>()
        .expect("collect")
}

#[test]
fn update_paths_rewrites_directory_and_subdirectories() {
    let (_dir, conn) = temp_db();
    add(&conn, "cd /home/user/oldpath", "/home/user/oldpath");
    add(&conn, "ls -la", "/home/user/oldpath/subdir");
    add(&conn, "echo 'unrelated'", "/tmp");

    let count = update_paths(&conn, "/home/user/oldpath", "/home/user/newpath").expect("update");

    assert_eq!(count, 2);
    assert_eq!(
        directories(&conn),
        vec![
            "/home/user/newpath",
            "/home/user/newpath/subdir",
            "/tmp"
        ]
    );
}

#[test]
fn update_paths_leaves_prefix_siblings_alone() {
    let (_dir, conn) = temp_db();
    add(&conn, "a", "/srv/app");
    add(&conn, "b", "/srv/app2");
    add(&conn, "c", "/srv/app-old/logs");

    let count = update_paths(&conn, "/srv/app", "/srv/service").expect("update");

    assert_eq!(count, 1);
    assert_eq!(
        directories(&conn),
        vec!["/srv/service", "/srv/app2", "/srv/app-old/logs"]
    );
}

#[test]
fn update_paths_only_replaces_leading_segment() {
    let (_dir, conn) = temp_db();
    add(&conn, "a", "/x/deep/x/deep");

    let count = update_paths(&conn, "/x", "/y").expect("update");

    assert_eq!(count, 1);
    assert_eq!(directories(&conn), vec!["/y/deep/x/deep"]);
}

#[test]
fn update_paths_handles_multibyte_prefix() {
    let (_dir, conn) = temp_db();
    add(&conn, "a", "/home/ユーザー/プロジェクト/src");

    let count =
        update_paths(&conn, "/home/ユーザー/プロジェクト", "/home/ユーザー/project").expect("update");

    assert_eq!(count, 1);
    assert_eq!(directories(&conn), vec!["/home/ユーザー/project/src"]);
}

#[test]
fn update_paths_no_match_returns_zero() {
    let (_dir, conn) = temp_db();
    add(&conn, "a", "/tmp");

    let count = update_paths(&conn, "/does/not/exist", "/elsewhere").expect("update");

    assert_eq!(count, 0);
    assert_eq!(directories(&conn), vec!["/tmp"]);
}

#[test]
fn update_paths_results_visible_to_subtree_query() {
    let (_dir, conn) = temp_db();
    add(&conn, "make", "/work/old/build");

    update_paths(&conn, "/work/old", "/work/new").expect("update");

    assert!(get_entries(&conn, 10, "/work/old").expect("get").is_empty());
    let moved = get_entries(&conn, 10, "/work/new").expect("get");
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].directory, "/work/new/build");
}

#[test]
fn update_paths_failure_changes_nothing() {
    let (_dir, conn) = temp_db();
    add(&conn, "a", "/old");
    add(&conn, "b", "/old/sub");
    // Reject the second rewrite so the statement aborts midway.
    conn.execute_batch(
        "CREATE TRIGGER reject_sub BEFORE UPDATE ON history
         WHEN NEW.directory = '/new/sub'
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .expect("create trigger");

    let err = update_paths(&conn, "/old", "/new").unwrap_err();

    assert!(
        format!("{err:#}").contains("rewrite history directories"),
        "got: {err:#}"
    );
    assert_eq!(directories(&conn), vec!["/old", "/old/sub"]);
}

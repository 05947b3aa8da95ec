mod common;

use common::{FakeCloud, TempDb};
use folio::db::migrate::{TableReport, copy_tables};
use folio::db::sample::seed_sample;
use folio::db::{LocalStore, RemoteConnector, SqlValue};
use serde_json::json;

#[tokio::test]
async fn copy_tables_replaces_remote_rows_and_skips_empty_tables() {
    let db = TempDb::new("migrate");
    let local = LocalStore::open(&db.url()).await.unwrap();
    for (name, category) in [("Rust", "Back'end"), ("CSS", "Frontend")] {
        local
            .execute(
                "INSERT INTO skills (name, category, proficiency, icon, years_experience) VALUES (?, ?, ?, ?, ?)",
                &[name.into(), category.into(), 80.into(), SqlValue::Null, 3.into()],
            )
            .await
            .unwrap();
    }

    let fake = FakeCloud::new();
    let remote = fake.connector().connect().await.unwrap();
    fake.respond_with(json!({"changes": 0}));
    fake.respond_with(json!({"changes": 1}));
    fake.respond_with(json!({"changes": 1}));
    fake.respond_with(json!([{"count": 2}]));

    let reports = copy_tables(&local, remote.as_ref(), &["skills", "projects"]).await;

    assert_eq!(
        reports,
        vec![
            TableReport {
                table: "skills".to_string(),
                local_rows: 2,
                copied: 2,
                failed: 0,
                remote_rows: Some(2),
                error: None,
            },
            TableReport {
                table: "projects".to_string(),
                ..Default::default()
            },
        ]
    );

    let executed: Vec<String> = fake.executed().into_iter().map(|(_, sql)| sql).collect();
    assert_eq!(executed.len(), 4, "empty tables are never touched remotely");
    assert_eq!(executed[0], "DELETE FROM skills");
    assert_eq!(
        executed[1],
        "INSERT INTO skills (id, name, category, proficiency, icon, years_experience) VALUES (1, 'Rust', 'Back''end', 80, NULL, 3)"
    );
    assert_eq!(executed[3], "SELECT COUNT(*) AS count FROM skills");

    local.close().await;
}

#[tokio::test]
async fn row_failures_are_counted_not_fatal() {
    let db = TempDb::new("migrate-fail");
    let local = LocalStore::open(&db.url()).await.unwrap();
    for name in ["Rust", "Go"] {
        local
            .execute(
                "INSERT INTO skills (name, category, proficiency) VALUES (?, ?, ?)",
                &[name.into(), "Backend".into(), 70.into()],
            )
            .await
            .unwrap();
    }

    let fake = FakeCloud::new();
    let remote = fake.connector().connect().await.unwrap();
    fake.fail_matching("'Go'", "UNIQUE constraint failed: skills.name");
    fake.respond_with(json!({"changes": 0}));
    fake.respond_with(json!({"changes": 1}));
    fake.respond_with(json!({"data": [{"count": 1}]}));

    let reports = copy_tables(&local, remote.as_ref(), &["skills"]).await;

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].local_rows, 2);
    assert_eq!(reports[0].copied, 1);
    assert_eq!(reports[0].failed, 1);
    assert_eq!(reports[0].remote_rows, Some(1));
    assert_eq!(fake.executed().len(), 4);

    local.close().await;
}

#[tokio::test]
async fn a_failing_table_does_not_stop_the_remaining_tables() {
    let db = TempDb::new("migrate-continue");
    let local = LocalStore::open(&db.url()).await.unwrap();
    local
        .execute(
            "INSERT INTO skills (name, category, proficiency) VALUES (?, ?, ?)",
            &["Rust".into(), "Backend".into(), 90.into()],
        )
        .await
        .unwrap();
    local
        .execute(
            "INSERT INTO projects (title, description, technologies) VALUES (?, ?, ?)",
            &["Folio".into(), "Portfolio site".into(), "Rust".into()],
        )
        .await
        .unwrap();

    let fake = FakeCloud::new();
    let remote = fake.connector().connect().await.unwrap();
    fake.fail_matching("DELETE FROM skills", "no such table: skills");
    fake.respond_with(json!({"changes": 0}));
    fake.respond_with(json!({"changes": 1}));
    fake.respond_with(json!([{"count": 1}]));

    let reports = copy_tables(&local, remote.as_ref(), &["skills", "projects"]).await;

    // 1. The failed table carries its error and copied nothing
    assert_eq!(reports[0].table, "skills");
    assert_eq!(reports[0].local_rows, 1);
    assert_eq!(reports[0].copied, 0);
    assert!(
        reports[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("no such table"))
    );

    // 2. The next table is still migrated
    assert_eq!(reports[1].table, "projects");
    assert_eq!(reports[1].copied, 1);
    assert_eq!(reports[1].remote_rows, Some(1));
    assert_eq!(reports[1].error, None);

    let executed: Vec<String> = fake.executed().into_iter().map(|(_, sql)| sql).collect();
    assert_eq!(executed[0], "DELETE FROM skills");
    assert_eq!(executed[1], "DELETE FROM projects");
    assert!(executed[2].starts_with("INSERT INTO projects ("));
    assert_eq!(executed.len(), 4);

    local.close().await;
}

#[tokio::test]
async fn sample_seed_inserts_profile_projects_and_skills() {
    let fake = FakeCloud::new();
    let remote = fake.connector().connect().await.unwrap();

    let executed = seed_sample(remote.as_ref()).await.unwrap();
    assert_eq!(executed, 8);

    let sql: Vec<String> = fake.executed().into_iter().map(|(_, sql)| sql).collect();
    assert!(sql[0].starts_with("INSERT OR REPLACE INTO profile"));
    assert!(sql[0].contains("'Full-Stack Developer & Game Developer'"));
    assert!(sql[1].contains("'E-Commerce Platform'"));
    assert!(sql[1].ends_with(", 1)"), "featured is stored as 1: {}", sql[1]);
    assert!(sql[3].contains("'React', 'Frontend', 90, 'Code', 3"));
    assert_eq!(sql.iter().filter(|s| s.starts_with("INSERT INTO skills")).count(), 5);
}

#[tokio::test]
async fn sample_seed_stops_at_the_first_failure() {
    let fake = FakeCloud::new();
    let remote = fake.connector().connect().await.unwrap();
    fake.fail_matching("'Task Management App'", "UNIQUE constraint failed: projects.title");

    let result = seed_sample(remote.as_ref()).await;
    assert!(matches!(result, Err(folio::DbError::Remote(msg)) if msg.contains("UNIQUE")));
    assert_eq!(fake.executed().len(), 3);
}

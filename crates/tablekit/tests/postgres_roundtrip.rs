//! End-to-end CRUD against a real Postgres.
//!
//! Skipped unless `DATABASE_URL` is set (a `.env` file is honoured).

use std::time::{SystemTime, UNIX_EPOCH};
use tablekit::{Builder, InsertPolicy, OrmError, OrmResult, PgExecutor, WhereClause};
use tokio_postgres::NoTls;

#[derive(Debug, Default, Clone, PartialEq)]
struct Article {
    id: Option<i64>,
    version: Option<i32>,
    title: String,
    summary: Option<String>,
}

#[tokio::test]
async fn crud_roundtrip_with_optimistic_lock() -> OrmResult<()> {
    let _ = dotenvy::dotenv();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping crud_roundtrip_with_optimistic_lock");
            return Ok(());
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .map_err(OrmError::from_db_error)?;
    tokio::spawn(async move {
        let _ = connection.await;
    });

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    let table = format!("tablekit_articles_{}_{}", std::process::id(), nanos);
    client
        .batch_execute(&format!(
            "CREATE TEMP TABLE {table} (
                id BIGSERIAL PRIMARY KEY,
                version INT NOT NULL DEFAULT 1,
                title TEXT NOT NULL,
                summary TEXT DEFAULT 'none'
            )"
        ))
        .await
        .map_err(OrmError::from_db_error)?;

    let articles = Builder::<Article, Option<i64>>::new("Article", table.clone(), Article::default)
        .auto_insert_id("id", |a: &Article| a.id, |a, v| a.id = v)?
        .auto_insert_version("version", |a: &Article| a.version, |a, v| a.version = v)?
        .column("title", |a: &Article| a.title.clone(), |a, v| a.title = v)?
        .column_with_policy(
            "summary",
            InsertPolicy::SkipIfNull,
            |a: &Article| a.summary.clone(),
            |a, v| a.summary = v,
        )?
        .build(PgExecutor::new(&client))?;

    for title in ["first", "second", "third"] {
        let draft = Article {
            title: title.to_string(),
            ..Article::default()
        };
        articles.insert(&draft).await?;
    }

    let mut by_title = WhereClause::new();
    by_title.add_value("title = ?", "second".to_string());
    let draft = Article {
        title: "second".into(),
        ..Article::default()
    };
    let stored = articles
        .query1(&by_title, Some(&draft))
        .await?
        .expect("inserted row is readable");
    assert_eq!(stored.summary.as_deref(), Some("none"));

    let ids = articles.get_ids(None, None, 10).await?;
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let after_first = articles.get_ids(Some(ids[0]), None, 10).await?;
    assert_eq!(after_first, ids[1..].to_vec());

    let fetched = articles.get_entities_by_ids(ids.clone()).await?;
    assert_eq!(fetched.len(), 3);
    assert_eq!(fetched[1], stored);

    let mut edited = stored.clone();
    edited.title = "second (edited)".into();
    assert!(articles.update_by_id(&edited).await?);
    // `edited` still carries the old version, so a second write is stale.
    assert!(!articles.update_by_id(&edited).await?);

    let reread = articles.read_by_id(stored.id).await?.expect("row still exists");
    assert_eq!(reread.version, stored.version.map(|v| v + 1));
    assert_eq!(reread.title, "second (edited)");

    assert!(articles.delete_by_id(stored.id).await?);
    assert_eq!(articles.read_by_id(stored.id).await?, None);
    assert!(!articles.delete_by_id(stored.id).await?);

    Ok(())
}

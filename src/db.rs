use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

use geonotify_core::{
    NotificationConfig, NotificationPayload, NotificationSnapshot, TransitionBroadcast,
};

use crate::models::{DeliveryLogEntry, TransitionLogEntry};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Corrupt stored JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Get current time as milliseconds since Unix epoch.
pub fn current_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Initialize database connection pool with recommended pragmas.
///
/// In-memory URLs get a single connection that is never recycled, since
/// every sqlite connection to `:memory:` opens a separate database.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(5))
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(10)
    };

    pool_options.connect_with(options).await
}

/// Run database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for migration in [
        include_str!("../migrations/001_create_geo_notifications.sql"),
        include_str!("../migrations/002_create_transition_log.sql"),
        include_str!("../migrations/003_create_delivery_log.sql"),
    ] {
        sqlx::query(migration).execute(pool).await?;
    }
    Ok(())
}

/// Add or replace a watched geofence. Returns true if it was new.
///
/// The flag comes from whether the insert itself wrote a row, so two
/// concurrent upserts of the same id never both report it as new.
pub async fn upsert_geofence(
    pool: &SqlitePool,
    config: &NotificationConfig,
) -> Result<bool, DbError> {
    let data = serde_json::to_string(config)?;
    let updated_epoch_ms = current_epoch_ms();

    let inserted = sqlx::query(
        r#"
        INSERT INTO geo_notifications (id, data, updated_epoch_ms)
        VALUES (?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(&config.region_id)
    .bind(&data)
    .bind(updated_epoch_ms)
    .execute(pool)
    .await?;

    if inserted.rows_affected() > 0 {
        return Ok(true);
    }

    sqlx::query("UPDATE geo_notifications SET data = ?, updated_epoch_ms = ? WHERE id = ?")
        .bind(&data)
        .bind(updated_epoch_ms)
        .bind(&config.region_id)
        .execute(pool)
        .await?;

    Ok(false)
}

/// Get the geofence registered for a region.
pub async fn get_geofence(
    pool: &SqlitePool,
    region_id: &str,
) -> Result<Option<NotificationConfig>, DbError> {
    let data: Option<String> = sqlx::query_scalar("SELECT data FROM geo_notifications WHERE id = ?")
        .bind(region_id)
        .fetch_optional(pool)
        .await?;

    match data {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

/// Get all watched geofences, ordered by id.
pub async fn list_geofences(pool: &SqlitePool) -> Result<Vec<NotificationConfig>, DbError> {
    let rows: Vec<String> = sqlx::query_scalar("SELECT data FROM geo_notifications ORDER BY id")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|data| serde_json::from_str(data).map_err(DbError::from))
        .collect()
}

/// Remove a geofence. Returns true if it existed.
pub async fn remove_geofence(pool: &SqlitePool, region_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM geo_notifications WHERE id = ?")
        .bind(region_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove every geofence. Returns the number removed.
pub async fn remove_all_geofences(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM geo_notifications")
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Load the configs for the triggered regions, one lookup at a time in
/// trigger order. Missing regions are left out, and so are regions whose
/// lookup fails; each id is looked up at most once.
pub async fn load_snapshot(pool: &SqlitePool, region_ids: &[String]) -> NotificationSnapshot {
    let mut snapshot = NotificationSnapshot::new();
    let mut looked_up: HashSet<&str> = HashSet::new();
    for region_id in region_ids {
        if !looked_up.insert(region_id.as_str()) {
            continue;
        }
        match get_geofence(pool, region_id).await {
            Ok(Some(config)) => snapshot.insert(config),
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Failed to load geofence {}: {}", region_id, e);
            }
        }
    }
    snapshot
}

/// Record a transition broadcast. Returns the log id.
pub async fn append_transition(
    pool: &SqlitePool,
    uuid: &str,
    broadcast: &TransitionBroadcast,
) -> Result<i64, DbError> {
    let payload = serde_json::to_string(broadcast)?;

    let result = sqlx::query(
        r#"
        INSERT INTO transition_log (uuid, ts_epoch_ms, action, payload)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(uuid)
    .bind(current_epoch_ms())
    .bind(&broadcast.action)
    .bind(payload)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Record the notifications dispatched for a transition.
pub async fn append_deliveries(
    pool: &SqlitePool,
    transition_uuid: &str,
    payloads: &[NotificationPayload],
) -> Result<(), DbError> {
    let ts_epoch_ms = current_epoch_ms();
    let mut tx = pool.begin().await?;

    for payload in payloads {
        sqlx::query(
            r#"
            INSERT INTO delivery_log (transition_uuid, ts_epoch_ms, notification_id, payload)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(transition_uuid)
        .bind(ts_epoch_ms)
        .bind(payload.id)
        .bind(serde_json::to_string(payload)?)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Maximum allowed limit for pagination.
pub const MAX_LIMIT: i64 = 1000;

#[derive(sqlx::FromRow)]
struct TransitionRow {
    id: i64,
    uuid: String,
    ts_epoch_ms: i64,
    payload: String,
}

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: i64,
    transition_uuid: String,
    ts_epoch_ms: i64,
    payload: String,
}

/// Get transition log entries after a given id (for polling).
/// Returns (entries, max_id, has_more).
pub async fn get_transitions_after(
    pool: &SqlitePool,
    after_id: i64,
    limit: i64,
) -> Result<(Vec<TransitionLogEntry>, i64, bool), DbError> {
    let limit = limit.clamp(1, MAX_LIMIT);

    let rows = sqlx::query_as::<_, TransitionRow>(
        r#"
        SELECT id, uuid, ts_epoch_ms, payload
        FROM transition_log
        WHERE id > ?
        ORDER BY id ASC
        LIMIT ?
        "#,
    )
    .bind(after_id)
    .bind(limit + 1) // Fetch one extra to check if there's more
    .fetch_all(pool)
    .await?;

    let has_more = rows.len() > limit as usize;
    let entries = rows
        .into_iter()
        .take(limit as usize)
        .map(|row| -> Result<TransitionLogEntry, DbError> {
            Ok(TransitionLogEntry {
                id: row.id,
                uuid: row.uuid,
                ts_epoch_ms: row.ts_epoch_ms,
                broadcast: serde_json::from_str(&row.payload)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let max_id = entries.last().map(|e| e.id).unwrap_or(after_id);
    Ok((entries, max_id, has_more))
}

/// Get delivery log entries after a given id (for polling).
/// Returns (entries, max_id, has_more).
pub async fn get_deliveries_after(
    pool: &SqlitePool,
    after_id: i64,
    limit: i64,
) -> Result<(Vec<DeliveryLogEntry>, i64, bool), DbError> {
    let limit = limit.clamp(1, MAX_LIMIT);

    let rows = sqlx::query_as::<_, DeliveryRow>(
        r#"
        SELECT id, transition_uuid, ts_epoch_ms, payload
        FROM delivery_log
        WHERE id > ?
        ORDER BY id ASC
        LIMIT ?
        "#,
    )
    .bind(after_id)
    .bind(limit + 1)
    .fetch_all(pool)
    .await?;

    let has_more = rows.len() > limit as usize;
    let entries = rows
        .into_iter()
        .take(limit as usize)
        .map(|row| -> Result<DeliveryLogEntry, DbError> {
            Ok(DeliveryLogEntry {
                id: row.id,
                transition_uuid: row.transition_uuid,
                ts_epoch_ms: row.ts_epoch_ms,
                notification: serde_json::from_str(&row.payload)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let max_id = entries.last().map(|e| e.id).unwrap_or(after_id);
    Ok((entries, max_id, has_more))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geonotify_core::{EvaluationResult, TRANSITION_ACTION};

    async fn setup_test_db() -> SqlitePool {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn config(id: &str) -> NotificationConfig {
        NotificationConfig::new(id, Some(NotificationPayload::always(1, "Hello", id)))
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = setup_test_db().await;
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_and_get_geofence() {
        let pool = setup_test_db().await;

        assert!(upsert_geofence(&pool, &config("home")).await.unwrap());

        let stored = get_geofence(&pool, "home").await.unwrap().unwrap();
        assert_eq!(stored, config("home"));
        assert!(get_geofence(&pool, "work").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let pool = setup_test_db().await;

        upsert_geofence(&pool, &config("home")).await.unwrap();
        let replacement = NotificationConfig::new("home", None);
        assert!(!upsert_geofence(&pool, &replacement).await.unwrap());

        let stored = get_geofence(&pool, "home").await.unwrap().unwrap();
        assert!(stored.notification.is_none());
        assert_eq!(list_geofences(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_and_remove() {
        let pool = setup_test_db().await;

        upsert_geofence(&pool, &config("work")).await.unwrap();
        upsert_geofence(&pool, &config("home")).await.unwrap();
        upsert_geofence(&pool, &config("gym")).await.unwrap();

        let ids: Vec<String> = list_geofences(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.region_id)
            .collect();
        assert_eq!(ids, vec!["gym", "home", "work"]);

        assert!(remove_geofence(&pool, "gym").await.unwrap());
        assert!(!remove_geofence(&pool, "gym").await.unwrap());
        assert_eq!(remove_all_geofences(&pool).await.unwrap(), 2);
        assert!(list_geofences(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let pool = setup_test_db().await;
        upsert_geofence(&pool, &config("home")).await.unwrap();
        upsert_geofence(&pool, &config("work")).await.unwrap();

        let ids = vec![
            "home".to_string(),
            "nowhere".to_string(),
            "home".to_string(),
        ];
        let snapshot = load_snapshot(&pool, &ids).await;

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains("home"));
        assert!(!snapshot.contains("work"));
    }

    #[tokio::test]
    async fn test_load_snapshot_skips_unreadable_row() {
        let pool = setup_test_db().await;
        sqlx::query("INSERT INTO geo_notifications (id, data, updated_epoch_ms) VALUES (?, ?, 0)")
            .bind("bad")
            .bind("{not json")
            .execute(&pool)
            .await
            .unwrap();
        upsert_geofence(&pool, &config("home")).await.unwrap();

        assert!(get_geofence(&pool, "bad").await.is_err());

        let ids = vec!["bad".to_string(), "home".to_string(), "bad".to_string()];
        let snapshot = load_snapshot(&pool, &ids).await;

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains("home"));
        assert!(!snapshot.contains("bad"));
    }

    #[tokio::test]
    async fn test_concurrent_upserts_report_one_creation() {
        let pool = setup_test_db().await;

        let cfg_a = config("home");
        let cfg_b = NotificationConfig::new("home", None);
        let (a, b) = tokio::join!(
            upsert_geofence(&pool, &cfg_a),
            upsert_geofence(&pool, &cfg_b),
        );
        let created = [a.unwrap(), b.unwrap()];

        assert_eq!(created.iter().filter(|c| **c).count(), 1);
        assert_eq!(list_geofences(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replace_updates_data() {
        let pool = setup_test_db().await;

        assert!(upsert_geofence(&pool, &config("home")).await.unwrap());
        let mut moved = config("home");
        moved.latitude = 59.91;
        moved.longitude = 10.75;
        assert!(!upsert_geofence(&pool, &moved).await.unwrap());

        let stored = get_geofence(&pool, "home").await.unwrap().unwrap();
        assert_eq!(stored.latitude, 59.91);
        assert_eq!(stored.longitude, 10.75);
    }

    #[tokio::test]
    async fn test_get_transitions_after() {
        let pool = setup_test_db().await;

        for i in 0..3 {
            let broadcast = TransitionBroadcast::from(&EvaluationResult::Error(format!(
                "Location Services error: {}",
                i
            )));
            append_transition(&pool, &format!("uuid-{}", i), &broadcast)
                .await
                .unwrap();
        }

        let (entries, max_id, has_more) = get_transitions_after(&pool, 0, 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(has_more);
        assert_eq!(max_id, entries[1].id);
        assert_eq!(entries[0].broadcast.action, TRANSITION_ACTION);

        let (rest, _, has_more) = get_transitions_after(&pool, max_id, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert!(!has_more);
        assert_eq!(rest[0].uuid, "uuid-2");
    }

    #[tokio::test]
    async fn test_get_transitions_after_empty() {
        let pool = setup_test_db().await;

        let (entries, max_id, has_more) = get_transitions_after(&pool, 5, 100).await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(max_id, 5);
        assert!(!has_more);
    }

    #[tokio::test]
    async fn test_zero_limit_still_advances() {
        let pool = setup_test_db().await;
        let payloads = vec![
            NotificationPayload::always(1, "a", "b"),
            NotificationPayload::always(2, "c", "d"),
        ];
        append_deliveries(&pool, "t-1", &payloads).await.unwrap();

        let (entries, max_id, has_more) = get_deliveries_after(&pool, 0, 0).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(has_more);
        assert_eq!(max_id, entries[0].id);

        let (rest, _, has_more) = get_deliveries_after(&pool, max_id, -5).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert!(!has_more);
        assert_eq!(rest[0].notification.id, 2);
    }

    #[tokio::test]
    async fn test_deliveries_roundtrip_through_log() {
        let pool = setup_test_db().await;
        let payloads = vec![
            NotificationPayload::always(7, "a", "b"),
            NotificationPayload::always(8, "c", "d"),
        ];

        append_deliveries(&pool, "t-1", &payloads).await.unwrap();

        let (entries, _, has_more) = get_deliveries_after(&pool, 0, 100).await.unwrap();
        assert!(!has_more);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].transition_uuid, "t-1");
        assert_eq!(entries[1].notification.id, 8);
    }

    #[tokio::test]
    async fn test_log_respects_max_limit() {
        let pool = setup_test_db().await;
        let payloads: Vec<_> = (0..(MAX_LIMIT + 5))
            .map(|i| NotificationPayload::always(i, "t", "x"))
            .collect();
        append_deliveries(&pool, "bulk", &payloads).await.unwrap();

        let (entries, _, has_more) = get_deliveries_after(&pool, 0, 5000).await.unwrap();
        assert_eq!(entries.len() as i64, MAX_LIMIT);
        assert!(has_more);
    }
}

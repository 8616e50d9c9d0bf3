// Database-backed ActivityStore implementation
//
// Timestamps are stored as timestamptz, so records come back in UTC. The
// instant is preserved; the original offset is not.

use async_trait::async_trait;
use babylog_core::traits::validate_for_store;
use babylog_core::{
    ActivityFilter, ActivityPage, ActivityRecord, ActivityStore, KnownTypes, StoreError,
    StoreResult,
};
use chrono::Utc;
use uuid::Uuid;

use crate::models::CreateActivityRow;
use crate::repositories::Database;

/// Database-backed activity store
#[derive(Clone)]
pub struct DbActivityStore {
    db: Database,
}

impl DbActivityStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn backend(e: anyhow::Error) -> StoreError {
    StoreError::backend(format!("{:#}", e))
}

#[async_trait]
impl ActivityStore for DbActivityStore {
    async fn append(&self, record: ActivityRecord) -> StoreResult<Uuid> {
        validate_for_store(&record)?;
        let row = self
            .db
            .create_activity(CreateActivityRow::from(&record))
            .await
            .map_err(backend)?;
        Ok(row.id)
    }

    async fn update(&self, id: Uuid, record: ActivityRecord) -> StoreResult<bool> {
        validate_for_store(&record)?;
        let row = self
            .db
            .update_activity(id, CreateActivityRow::from(&record))
            .await
            .map_err(backend)?;
        Ok(row.is_some())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        self.db.delete_activity(id).await.map_err(backend)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<ActivityRecord>> {
        let row = self.db.get_activity(id).await.map_err(backend)?;
        Ok(row.map(ActivityRecord::from))
    }

    async fn fetch(&self, filter: &ActivityFilter) -> StoreResult<ActivityPage> {
        let Some((start, end)) = filter.bounds(Utc::now().fixed_offset())? else {
            let rows = self.db.list_activities().await.map_err(backend)?;
            return Ok(ActivityPage {
                logs: rows.into_iter().map(ActivityRecord::from).collect(),
                has_more: false,
                next_cursor: None,
            });
        };

        let start_utc = start.with_timezone(&Utc);
        let rows = self
            .db
            .list_activities_between(start_utc, end.with_timezone(&Utc))
            .await
            .map_err(backend)?;
        let has_more = self
            .db
            .has_activities_before(start_utc)
            .await
            .map_err(backend)?;

        Ok(ActivityPage {
            logs: rows.into_iter().map(ActivityRecord::from).collect(),
            has_more,
            next_cursor: Some(start),
        })
    }

    async fn known_event_types(&self) -> StoreResult<KnownTypes> {
        let types = self.db.list_event_types().await.map_err(backend)?;
        Ok(types.into())
    }

    async fn check(&self) -> StoreResult<()> {
        self.db.ping().await.map_err(backend)
    }
}

/// Connect, migrate, and wrap the database in a store
pub async fn create_db_activity_store(database_url: &str) -> anyhow::Result<DbActivityStore> {
    let db = Database::from_url(database_url).await?;
    db.migrate().await?;
    tracing::info!("Connected to Postgres activity store");
    Ok(DbActivityStore::new(db))
}

use async_trait::async_trait;
use kefu_core::{Exchange, HistoryStore, HistoryWindow};
use kefu_entities::exchanges;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Schema,
};
use tracing::{debug, info};

use crate::convert;

/// History store over any `sea-orm` backend (Postgres, MySQL or SQLite).
pub struct HistoryManager {
    db: DatabaseConnection,
}

impl HistoryManager {
    /// Connect to `database_url` and make sure the `exchanges` table exists.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to history database");
        let db = Database::connect(database_url).await?;
        Self::from_connection(db).await
    }

    /// Wrap an existing connection, creating the `exchanges` table if missing.
    pub async fn from_connection(db: DatabaseConnection) -> anyhow::Result<Self> {
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);
        let mut stmt = schema.create_table_from_entity(exchanges::Entity);
        stmt.if_not_exists();
        db.execute_unprepared(&backend.build(&stmt).to_string())
            .await?;

        info!("HistoryManager initialized");
        Ok(Self { db })
    }

    /// Number of stored exchanges for a (user, platform) pair.
    pub async fn count(&self, user_id: &str, platform: &str) -> anyhow::Result<u64> {
        let count = exchanges::Entity::find()
            .filter(exchanges::Column::UserId.eq(user_id))
            .filter(exchanges::Column::Platform.eq(platform))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl HistoryStore for HistoryManager {
    async fn append(&self, exchange: &Exchange) -> anyhow::Result<()> {
        convert::active_model_from_exchange(exchange)
            .insert(&self.db)
            .await?;

        info!(
            "Appended exchange {} for {}@{}",
            exchange.id, exchange.user_id, exchange.platform
        );
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn query_recent(
        &self,
        user_id: &str,
        platform: &str,
        max_count: usize,
        max_tokens: usize,
    ) -> anyhow::Result<HistoryWindow> {
        let limit = u64::try_from(max_count).unwrap_or(u64::MAX);

        let rows = exchanges::Entity::find()
            .filter(exchanges::Column::UserId.eq(user_id))
            .filter(exchanges::Column::Platform.eq(platform))
            .order_by_desc(exchanges::Column::CreatedAt)
            .order_by_desc(exchanges::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        let fetched = rows.len();
        let window = HistoryWindow::collect(
            rows.into_iter().map(convert::exchange_from_model),
            max_count,
            max_tokens,
        );

        debug!(
            "History window: kept {} of {} fetched exchanges ({} tokens)",
            window.len(),
            fetched,
            window.total_tokens()
        );
        Ok(window)
    }
}

use async_trait::async_trait;
use jiff::Timestamp;
use portal_core::error::StorageError;
use portal_core::repository::{ReadRepository, Repository, Result, UrlRecord};
use portal_core::shortcode::ShortCode;
use sqlx::mysql::MySqlPool;
use tracing::{debug, info};

const SCHEMA: &str = include_str!("../ddl/mysql/short_urls.sql");

const SELECT_RECORD: &str =
    "SELECT original_url, created_at FROM short_urls WHERE short_code = ? LIMIT 1";
const INSERT_RECORD: &str =
    "INSERT INTO short_urls (short_code, original_url, created_at) VALUES (?, ?, ?)";

/// Durable mappings in the MySQL table `short_urls`.
///
/// `short_code` is the primary key with a binary collation, so `abc` and
/// `ABC` are different rows and a second insert of a code is rejected by the
/// server as a duplicate key.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url).await.map_err(storage_error)?;
        Ok(Self::new(pool))
    }

    /// Runs the idempotent `CREATE TABLE IF NOT EXISTS`.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        info!("mysql schema in place");
        Ok(())
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn storage_error(err: sqlx::Error) -> StorageError {
    use sqlx::Error as E;

    let message = err.to_string();
    match err {
        E::PoolTimedOut => StorageError::Timeout(message),
        E::PoolClosed | E::WorkerCrashed | E::Io(_) | E::Tls(_) => {
            StorageError::Unavailable(message)
        }
        E::ColumnNotFound(_)
        | E::ColumnIndexOutOfBounds { .. }
        | E::ColumnDecode { .. }
        | E::Decode(_)
        | E::TypeNotFound { .. }
        | E::RowNotFound => StorageError::InvalidData(message),
        E::Database(ref db) if db.is_unique_violation() => StorageError::Conflict(message),
        _ => StorageError::Query(message),
    }
}

fn to_record((original_url, created_at): (String, i64)) -> Result<UrlRecord> {
    let created_at = Timestamp::from_second(created_at).map_err(|e| {
        StorageError::InvalidData(format!("created_at {created_at} out of range: {e}"))
    })?;
    Ok(UrlRecord {
        original_url,
        created_at,
    })
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        let row = sqlx::query_as::<_, (String, i64)>(SELECT_RECORD)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.map(to_record).transpose()
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, code: &ShortCode, record: UrlRecord) -> Result<()> {
        sqlx::query(INSERT_RECORD)
            .bind(code.as_str())
            .bind(record.original_url)
            .bind(record.created_at.as_second())
            .execute(&self.pool)
            .await
            .map_err(|e| match storage_error(e) {
                StorageError::Conflict(_) => StorageError::Conflict(code.to_string()),
                other => other,
            })?;

        debug!(code = %code, "row inserted");
        Ok(())
    }
}

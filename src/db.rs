use core::marker::PhantomData;

use bb8_postgres::{PostgresConnectionManager, bb8};
use tokio_postgres::{NoTls, Row, types::ToSql};

use crate::store::{RecordStore, StoreError};

pub type ConnectionManager = PostgresConnectionManager<NoTls>;
pub type Pool = bb8::Pool<ConnectionManager>;
pub type DBError = tokio_postgres::Error;
pub type BB8Error = bb8::RunError<DBError>;
pub type DBResult<T> = Result<T, DBError>;

mod constants {
    use core::time::Duration;

    macro_rules! env_or_default {
        ($name:expr, $default:expr) => {
            if let Some(s) = option_env!($name) {
                s
            } else {
                $default
            }
        };
    }

    pub const HOST: &str = env_or_default!("DB_HOST", "/var/run/postgresql");
    pub const USER: &str = env_or_default!("DB_USER", "postgres");
    pub const DBNAME: &str = env_or_default!("DB_NAME", "postgres");
    pub const PASSWORD: Option<&str> = option_env!("DB_PASSWORD");
    pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Pool over the build-time configured database. Connections are opened
/// lazily, so this succeeds even while the server is down.
pub async fn init_db() -> DBResult<Pool> {
    use constants::{CONNECTION_TIMEOUT, DBNAME, HOST, PASSWORD, USER};

    let mut config = tokio_postgres::Config::new();
    config
        .host(HOST)
        .user(USER)
        .dbname(DBNAME)
        .connect_timeout(CONNECTION_TIMEOUT);
    if let Some(password) = PASSWORD {
        config.password(password);
    }

    let manager = PostgresConnectionManager::new(config, NoTls);

    Pool::builder()
        .connection_timeout(CONNECTION_TIMEOUT)
        .build(manager)
        .await
}

/// A record type that maps onto one table. Every table also gets an
/// implicit `id bigserial primary key` that keeps insertion order.
pub trait Table: Sized + Send + Sync {
    const NAME: &'static str;
    /// `(column, sql type)`, in the order of [`Table::params`].
    const COLUMNS: &'static [(&'static str, &'static str)];

    fn params(&self) -> Vec<&(dyn ToSql + Sync)>;

    fn from_row(row: &Row) -> DBResult<Self>;
}

fn column_list<T: Table>() -> String {
    T::COLUMNS.iter().map(|(name, _)| *name).collect::<Vec<_>>().join(", ")
}

pub fn create_sql<T: Table>() -> String {
    let columns = T::COLUMNS
        .iter()
        .map(|(name, ty)| format!("{name} {ty}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("create table if not exists {} (id bigserial primary key, {columns})", T::NAME)
}

pub fn insert_sql<T: Table>() -> String {
    let holders = (1..=T::COLUMNS.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("insert into {} ({}) values ({holders})", T::NAME, column_list::<T>())
}

pub fn select_sql<T: Table>() -> String {
    format!("select {} from {} order by id", column_list::<T>(), T::NAME)
}

pub struct PgStore<R> {
    pool: Pool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Table> PgStore<R> {
    pub const fn new(pool: Pool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        conn.batch_execute(&create_sql::<R>()).await?;
        Ok(())
    }
}

impl<R: Table> RecordStore<R> for PgStore<R> {
    async fn save_records(&self, records: &[R]) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;
        let stmt = conn.prepare(&insert_sql::<R>()).await?;
        let txn = conn.transaction().await?;

        let mut n = 0;
        for record in records {
            n += txn.execute(&stmt, &record.params()).await?;
        }

        txn.commit().await?;

        tracing::info!(target: "store", "\x1b[36m{}: {n}/{} records inserted\x1b[0m", R::NAME, records.len());
        Ok(())
    }

    async fn fetch_records(&self) -> Result<Vec<R>, StoreError> {
        let conn = self.pool.get().await?;
        let rows = conn.query(&select_sql::<R>(), &[]).await?;
        Ok(rows.iter().map(R::from_row).collect::<DBResult<_>>()?)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        conn.execute(&format!("delete from {}", R::NAME), &[]).await?;
        Ok(())
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{query, query_as, FromRow};
use tracing::{error, info};

#[cfg(feature = "sqlite")]
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

#[cfg(feature = "postgres")]
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::{get_config, DatabaseConfig};
use crate::errors::{LicenseError, LicenseResult};
use crate::license::{License, LicenseStatus, NewLicense, Package};
use crate::store::{BindOutcome, LicenseStore, OwnerLicense};

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("the `server` feature needs at least one of `sqlite` or `postgres`");

/// A `licenses` row before its status is parsed.
#[derive(Debug, Clone, FromRow)]
struct LicenseRow {
    id: String,
    owner_id: String,
    package_id: i64,
    key_code: String,
    status: String,
    hardware_id: Option<String>,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
}

impl TryFrom<LicenseRow> for License {
    type Error = LicenseError;

    fn try_from(row: LicenseRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<LicenseStatus>().map_err(|_| {
            LicenseError::PersistenceError(format!(
                "license {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(License {
            id: row.id,
            owner_id: row.owner_id,
            package_id: row.package_id,
            key_code: row.key_code,
            status,
            hardware_id: row.hardware_id,
            start_date: row.start_date,
            end_date: row.end_date,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct PackageRow {
    id: i64,
    name: String,
    duration_days: i64,
    price_cents: i64,
    is_active: bool,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: row.id,
            name: row.name,
            duration_days: row.duration_days,
            price_cents: row.price_cents,
            is_active: row.is_active,
        }
    }
}

/// One statement in both placeholder dialects.
struct Sql {
    #[cfg(feature = "sqlite")]
    sqlite: &'static str,
    #[cfg(feature = "postgres")]
    postgres: &'static str,
}

const FIND_BY_KEY: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "SELECT id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date \
             FROM licenses WHERE key_code = ?",
    #[cfg(feature = "postgres")]
    postgres: "SELECT id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date \
               FROM licenses WHERE key_code = $1",
};

const FIND_BY_ID: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "SELECT id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date \
             FROM licenses WHERE id = ?",
    #[cfg(feature = "postgres")]
    postgres: "SELECT id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date \
               FROM licenses WHERE id = $1",
};

// Two rows are enough to tell "one" from "ambiguous".
const FIND_BY_OWNER: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "SELECT id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date \
             FROM licenses WHERE owner_id = ? ORDER BY start_date LIMIT 2",
    #[cfg(feature = "postgres")]
    postgres: "SELECT id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date \
               FROM licenses WHERE owner_id = $1 ORDER BY start_date LIMIT 2",
};

const FIND_PACKAGE: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "SELECT id, name, duration_days, price_cents, is_active FROM packages WHERE id = ?",
    #[cfg(feature = "postgres")]
    postgres: "SELECT id, name, duration_days, price_cents, is_active FROM packages WHERE id = $1",
};

const LIST_ACTIVE_PACKAGES: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "SELECT id, name, duration_days, price_cents, is_active FROM packages \
             WHERE is_active = 1 ORDER BY id",
    #[cfg(feature = "postgres")]
    postgres: "SELECT id, name, duration_days, price_cents, is_active FROM packages \
               WHERE is_active = TRUE ORDER BY id",
};

const BIND_HARDWARE: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "UPDATE licenses SET hardware_id = ? \
             WHERE id = ? AND (hardware_id IS NULL OR hardware_id = '')",
    #[cfg(feature = "postgres")]
    postgres: "UPDATE licenses SET hardware_id = $1 \
               WHERE id = $2 AND (hardware_id IS NULL OR hardware_id = '')",
};

const RENEW: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "UPDATE licenses SET package_id = ?, status = 'active', end_date = ? WHERE id = ?",
    #[cfg(feature = "postgres")]
    postgres: "UPDATE licenses SET package_id = $1, status = 'active', end_date = $2 WHERE id = $3",
};

const INSERT_LICENSE: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "INSERT INTO licenses \
             (id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date) \
             VALUES (?, ?, ?, ?, 'active', NULL, ?, ?)",
    #[cfg(feature = "postgres")]
    postgres: "INSERT INTO licenses \
               (id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date) \
               VALUES ($1, $2, $3, $4, 'active', NULL, $5, $6)",
};

const INSERT_PACKAGE: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "INSERT INTO packages (id, name, duration_days, price_cents, is_active) \
             VALUES (?, ?, ?, ?, ?)",
    #[cfg(feature = "postgres")]
    postgres: "INSERT INTO packages (id, name, duration_days, price_cents, is_active) \
               VALUES ($1, $2, $3, $4, $5)",
};

const UNLINK_HARDWARE: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "UPDATE licenses SET hardware_id = NULL WHERE id = ?",
    #[cfg(feature = "postgres")]
    postgres: "UPDATE licenses SET hardware_id = NULL WHERE id = $1",
};

const SET_STATUS: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "UPDATE licenses SET status = ? WHERE id = ?",
    #[cfg(feature = "postgres")]
    postgres: "UPDATE licenses SET status = $1 WHERE id = $2",
};

const LIST_BOUND: Sql = Sql {
    #[cfg(feature = "sqlite")]
    sqlite: "SELECT id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date \
             FROM licenses \
             WHERE status = 'active' AND hardware_id IS NOT NULL AND hardware_id <> '' \
               AND (? IS NULL OR owner_id = ?) \
             ORDER BY key_code",
    #[cfg(feature = "postgres")]
    postgres: "SELECT id, owner_id, package_id, key_code, status, hardware_id, start_date, end_date \
               FROM licenses \
               WHERE status = 'active' AND hardware_id IS NOT NULL AND hardware_id <> '' \
                 AND ($1::TEXT IS NULL OR owner_id = $1) \
               ORDER BY key_code",
};

#[cfg(feature = "sqlite")]
const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS packages (
        id              INTEGER PRIMARY KEY,
        name            TEXT NOT NULL,
        duration_days   INTEGER NOT NULL CHECK (duration_days > 0),
        price_cents     INTEGER NOT NULL DEFAULT 0,
        is_active       BOOLEAN NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS licenses (
        id              TEXT PRIMARY KEY,
        owner_id        TEXT NOT NULL,
        package_id      INTEGER NOT NULL REFERENCES packages(id),
        key_code        TEXT NOT NULL UNIQUE,
        status          TEXT NOT NULL DEFAULT 'active',
        hardware_id     TEXT,
        start_date      TEXT NOT NULL,
        end_date        TEXT NOT NULL,
        CHECK (end_date >= start_date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_licenses_owner_id ON licenses (owner_id)",
];

#[cfg(feature = "postgres")]
const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS packages (
        id              BIGINT PRIMARY KEY,
        name            TEXT NOT NULL,
        duration_days   BIGINT NOT NULL CHECK (duration_days > 0),
        price_cents     BIGINT NOT NULL DEFAULT 0,
        is_active       BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS licenses (
        id              TEXT PRIMARY KEY,
        owner_id        TEXT NOT NULL,
        package_id      BIGINT NOT NULL REFERENCES packages(id),
        key_code        TEXT NOT NULL UNIQUE,
        status          TEXT NOT NULL DEFAULT 'active',
        hardware_id     TEXT,
        start_date      TIMESTAMP NOT NULL,
        end_date        TIMESTAMP NOT NULL,
        CHECK (end_date >= start_date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_licenses_owner_id ON licenses (owner_id)",
];

/// Connection pool for the configured backend.
#[derive(Debug, Clone)]
pub enum DbPool {
    #[cfg(feature = "sqlite")]
    SQLite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

/// sqlx-backed [`LicenseStore`] over SQLite or Postgres.
///
/// Every statement is bounded by the configured timeout and fails with
/// `LicenseError::Timeout` instead of hanging.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
    timeout: Duration,
}

impl Database {
    /// Connect using the global configuration (`config.toml` + environment).
    pub async fn new() -> LicenseResult<Arc<Self>> {
        let config = get_config()?;
        let db = Self::connect(&config.database).await?;
        if config.database.run_migrations {
            db.migrate().await?;
        }
        Ok(Arc::new(db))
    }

    /// Connect with an explicit database configuration. Does not migrate.
    pub async fn connect(config: &DatabaseConfig) -> LicenseResult<Self> {
        let timeout = config.timeout();

        let pool = match config.db_type.as_str() {
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(timeout)
                    .connect(&config.sqlite_url)
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to SQLite: {e}");
                        LicenseError::PersistenceError(format!("failed to connect to SQLite: {e}"))
                    })?;
                DbPool::SQLite(pool)
            }
            #[cfg(not(feature = "sqlite"))]
            "sqlite" => {
                return Err(LicenseError::ConfigError(
                    "SQLite support not compiled in. Enable the 'sqlite' feature.".to_string(),
                ))
            }
            #[cfg(feature = "postgres")]
            "postgres" => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(timeout)
                    .connect(&config.postgres_url)
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to PostgreSQL: {e}");
                        LicenseError::PersistenceError(format!(
                            "failed to connect to PostgreSQL: {e}"
                        ))
                    })?;
                DbPool::Postgres(pool)
            }
            #[cfg(not(feature = "postgres"))]
            "postgres" => {
                return Err(LicenseError::ConfigError(
                    "PostgreSQL support not compiled in. Enable the 'postgres' feature."
                        .to_string(),
                ))
            }
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "unsupported database type: {other}"
                )))
            }
        };

        Ok(Self { pool, timeout })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: DbPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn db_type(&self) -> &'static str {
        match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            DbPool::Postgres(_) => "postgres",
        }
    }

    /// Create the `packages` and `licenses` tables if they are missing.
    pub async fn migrate(&self) -> LicenseResult<()> {
        match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                for stmt in SQLITE_SCHEMA {
                    self.timed("migrate", query(stmt).execute(pool)).await?;
                }
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                for stmt in POSTGRES_SCHEMA {
                    self.timed("migrate", query(stmt).execute(pool)).await?;
                }
            }
        }
        info!("Database schema is up to date ({})", self.db_type());
        Ok(())
    }

    /// Add a package to the catalog.
    pub async fn insert_package(&self, package: &Package) -> LicenseResult<()> {
        match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                self.timed(
                    "insert_package",
                    query(INSERT_PACKAGE.sqlite)
                        .bind(package.id)
                        .bind(&package.name)
                        .bind(package.duration_days)
                        .bind(package.price_cents)
                        .bind(package.is_active)
                        .execute(pool),
                )
                .await?;
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                self.timed(
                    "insert_package",
                    query(INSERT_PACKAGE.postgres)
                        .bind(package.id)
                        .bind(&package.name)
                        .bind(package.duration_days)
                        .bind(package.price_cents)
                        .bind(package.is_active)
                        .execute(pool),
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Run a statement under the store timeout, mapping driver errors.
    async fn timed<T, F>(&self, op: &'static str, fut: F) -> LicenseResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("{} {op} failed: {e}", self.db_type());
                Err(LicenseError::PersistenceError(format!("database error: {e}")))
            }
            Err(_) => {
                error!("{} {op} timed out after {:?}", self.db_type(), self.timeout);
                Err(LicenseError::Timeout(self.timeout))
            }
        }
    }

    async fn fetch_license(
        &self,
        op: &'static str,
        sql: &Sql,
        arg: &str,
    ) -> LicenseResult<Option<License>> {
        let row = match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                self.timed(
                    op,
                    query_as::<_, LicenseRow>(sql.sqlite)
                        .bind(arg)
                        .fetch_optional(pool),
                )
                .await?
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                self.timed(
                    op,
                    query_as::<_, LicenseRow>(sql.postgres)
                        .bind(arg)
                        .fetch_optional(pool),
                )
                .await?
            }
        };

        row.map(License::try_from).transpose()
    }

    async fn execute(
        &self,
        op: &'static str,
        sql: &Sql,
        args: &[SqlArg<'_>],
    ) -> LicenseResult<u64> {
        match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                let mut q = query(sql.sqlite);
                for arg in args {
                    q = match *arg {
                        SqlArg::Text(s) => q.bind(s),
                        SqlArg::Int(i) => q.bind(i),
                        SqlArg::Time(t) => q.bind(t),
                    };
                }
                self.timed(op, q.execute(pool)).await.map(|r| r.rows_affected())
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                let mut q = query(sql.postgres);
                for arg in args {
                    q = match *arg {
                        SqlArg::Text(s) => q.bind(s),
                        SqlArg::Int(i) => q.bind(i),
                        SqlArg::Time(t) => q.bind(t),
                    };
                }
                self.timed(op, q.execute(pool)).await.map(|r| r.rows_affected())
            }
        }
    }
}

/// Bind values for [`Database::execute`].
#[derive(Debug, Clone, Copy)]
enum SqlArg<'a> {
    Text(&'a str),
    Int(i64),
    Time(NaiveDateTime),
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl LicenseStore for Database {
    async fn find_license_by_key(&self, key_code: &str) -> LicenseResult<Option<License>> {
        self.fetch_license("find_license_by_key", &FIND_BY_KEY, key_code)
            .await
    }

    async fn find_license_by_owner(&self, owner_id: &str) -> LicenseResult<OwnerLicense> {
        let mut licenses = match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                self.timed(
                    "find_license_by_owner",
                    query_as::<_, LicenseRow>(FIND_BY_OWNER.sqlite)
                        .bind(owner_id)
                        .fetch_all(pool),
                )
                .await?
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                self.timed(
                    "find_license_by_owner",
                    query_as::<_, LicenseRow>(FIND_BY_OWNER.postgres)
                        .bind(owner_id)
                        .fetch_all(pool),
                )
                .await?
            }
        };

        match licenses.len() {
            0 => Ok(OwnerLicense::None),
            1 => Ok(OwnerLicense::One(License::try_from(licenses.remove(0))?)),
            count => Ok(OwnerLicense::Ambiguous { count }),
        }
    }

    async fn find_package(&self, package_id: i64) -> LicenseResult<Option<Package>> {
        let row = match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                self.timed(
                    "find_package",
                    query_as::<_, PackageRow>(FIND_PACKAGE.sqlite)
                        .bind(package_id)
                        .fetch_optional(pool),
                )
                .await?
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                self.timed(
                    "find_package",
                    query_as::<_, PackageRow>(FIND_PACKAGE.postgres)
                        .bind(package_id)
                        .fetch_optional(pool),
                )
                .await?
            }
        };
        Ok(row.map(Package::from))
    }

    async fn conditional_bind_hardware_id(
        &self,
        license_id: &str,
        hardware_id: &str,
    ) -> LicenseResult<BindOutcome> {
        // Single conditional UPDATE: the row count tells us who won.
        let affected = self
            .execute(
                "conditional_bind_hardware_id",
                &BIND_HARDWARE,
                &[SqlArg::Text(hardware_id), SqlArg::Text(license_id)],
            )
            .await?;

        Ok(if affected == 1 {
            BindOutcome::Bound
        } else {
            BindOutcome::AlreadyBound
        })
    }

    async fn update_license_on_renewal(
        &self,
        license_id: &str,
        package_id: i64,
        new_end_date: NaiveDateTime,
    ) -> LicenseResult<()> {
        let affected = self
            .execute(
                "update_license_on_renewal",
                &RENEW,
                &[
                    SqlArg::Int(package_id),
                    SqlArg::Time(new_end_date),
                    SqlArg::Text(license_id),
                ],
            )
            .await?;

        if affected == 0 {
            return Err(LicenseError::PersistenceError(format!(
                "license {license_id} disappeared during renewal"
            )));
        }
        Ok(())
    }

    async fn insert_license(&self, license: NewLicense) -> LicenseResult<License> {
        let fut = async {
            match &self.pool {
                #[cfg(feature = "sqlite")]
                DbPool::SQLite(pool) => {
                    query(INSERT_LICENSE.sqlite)
                        .bind(&license.id)
                        .bind(&license.owner_id)
                        .bind(license.package_id)
                        .bind(&license.key_code)
                        .bind(license.start_date)
                        .bind(license.end_date)
                        .execute(pool)
                        .await
                        .map(|_| ())
                }
                #[cfg(feature = "postgres")]
                DbPool::Postgres(pool) => {
                    query(INSERT_LICENSE.postgres)
                        .bind(&license.id)
                        .bind(&license.owner_id)
                        .bind(license.package_id)
                        .bind(&license.key_code)
                        .bind(license.start_date)
                        .bind(license.end_date)
                        .execute(pool)
                        .await
                        .map(|_| ())
                }
            }
        };

        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(())) => Ok(license.into_license()),
            Ok(Err(e)) if is_unique_violation(&e) => {
                Err(LicenseError::DuplicateKey(license.key_code))
            }
            Ok(Err(e)) => {
                error!("{} insert_license failed: {e}", self.db_type());
                Err(LicenseError::PersistenceError(format!("database error: {e}")))
            }
            Err(_) => {
                error!("{} insert_license timed out", self.db_type());
                Err(LicenseError::Timeout(self.timeout))
            }
        }
    }

    async fn unlink_hardware_id(&self, license_id: &str) -> LicenseResult<bool> {
        let affected = self
            .execute(
                "unlink_hardware_id",
                &UNLINK_HARDWARE,
                &[SqlArg::Text(license_id)],
            )
            .await?;
        Ok(affected > 0)
    }

    async fn set_license_status(
        &self,
        license_id: &str,
        status: LicenseStatus,
    ) -> LicenseResult<bool> {
        let affected = self
            .execute(
                "set_license_status",
                &SET_STATUS,
                &[SqlArg::Text(status.as_str()), SqlArg::Text(license_id)],
            )
            .await?;
        Ok(affected > 0)
    }

    async fn find_license(&self, license_id: &str) -> LicenseResult<Option<License>> {
        self.fetch_license("find_license", &FIND_BY_ID, license_id)
            .await
    }

    async fn list_active_packages(&self) -> LicenseResult<Vec<Package>> {
        let rows = match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                self.timed(
                    "list_active_packages",
                    query_as::<_, PackageRow>(LIST_ACTIVE_PACKAGES.sqlite).fetch_all(pool),
                )
                .await?
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                self.timed(
                    "list_active_packages",
                    query_as::<_, PackageRow>(LIST_ACTIVE_PACKAGES.postgres).fetch_all(pool),
                )
                .await?
            }
        };
        Ok(rows.into_iter().map(Package::from).collect())
    }

    async fn list_bound_licenses(&self, owner_id: Option<&str>) -> LicenseResult<Vec<License>> {
        let rows = match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                self.timed(
                    "list_bound_licenses",
                    query_as::<_, LicenseRow>(LIST_BOUND.sqlite)
                        .bind(owner_id)
                        .bind(owner_id)
                        .fetch_all(pool),
                )
                .await?
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                self.timed(
                    "list_bound_licenses",
                    query_as::<_, LicenseRow>(LIST_BOUND.postgres)
                        .bind(owner_id)
                        .fetch_all(pool),
                )
                .await?
            }
        };
        rows.into_iter().map(License::try_from).collect()
    }

    async fn ping(&self) -> LicenseResult<()> {
        match &self.pool {
            #[cfg(feature = "sqlite")]
            DbPool::SQLite(pool) => {
                self.timed("ping", query("SELECT 1").execute(pool)).await?;
            }
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                self.timed("ping", query("SELECT 1").execute(pool)).await?;
            }
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        self.db_type()
    }
}

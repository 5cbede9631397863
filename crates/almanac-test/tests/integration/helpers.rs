#![allow(clippy::expect_used, dead_code)]
//! Test helpers for integration tests.
//!
//! Provides utilities for:
//! - Building a schedule service over the in-memory store
//! - Creating a throwaway PostgreSQL database per test, when
//!   `TEST_DATABASE_URL` names a server
//! - Building event inputs and handles for fixed dates
//! - Creating a Salvo service with the full API router

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use salvo::{Router, Service};
use uuid::Uuid;

use almanac_app::app::api::routes;
use almanac_app::config::ConfigHandler;
use almanac_app::service_handler::ScheduleServiceHandler;
use almanac_core::config::{
    AuthConfig, AuthMethod, DatabaseConfig, LoggingConfig, RecurrenceConfig, ReminderConfig,
    ServerConfig, Settings, SingleOwnerAuthConfig,
};
use almanac_core::constants::DEFAULT_RECURRENCE_HORIZON_DAYS;
use almanac_core::types::Owner;
use almanac_db::db::DbProvider;
use almanac_db::db::connection::{DbConnection, DbPool, create_pool};
use almanac_db::db::migrations::run_migrations;
use almanac_recur::{DateWindow, EventHandle};
use almanac_service::notify::{Notifier, PgNotifier};
use almanac_service::schedule::{
    EventView, NewEvent, PgScheduleStore, RecurrenceInput, ScheduleService,
};
use almanac_test::{FailingNotifier, MemoryScheduleStore, RecordingNotifier};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).expect("valid time")
}

pub fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
    DateWindow::new(start, end)
}

/// A one-hour event starting at `start`.
pub fn single(title: &str, start: NaiveDateTime) -> NewEvent {
    NewEvent {
        title: title.to_owned(),
        content: String::new(),
        start_at: start,
        end_at: start + chrono::Duration::hours(1),
        alert: None,
        status: None,
        recurrence: None,
    }
}

/// A one-hour recurring event whose first occurrence starts at `start`.
pub fn recurring(
    title: &str,
    start: NaiveDateTime,
    frequency: &str,
    interval: i64,
    end_date: Option<NaiveDate>,
) -> NewEvent {
    NewEvent {
        recurrence: Some(RecurrenceInput {
            frequency: Some(frequency.to_owned()),
            interval: Some(interval),
            end_date,
        }),
        ..single(title, start)
    }
}

/// Series id of a view created from a recurring input.
pub fn series_of(view: &EventView) -> Uuid {
    view.series_id.expect("view belongs to a series")
}

pub fn occurrence(series_id: Uuid, on: NaiveDate) -> EventHandle {
    EventHandle::occurrence(series_id, on)
}

pub fn dates_of(views: &[EventView]) -> Vec<NaiveDate> {
    views.iter().map(|v| v.start_at.date()).collect()
}

/// A schedule service over fresh in-memory state.
pub struct Harness {
    pub store: Arc<MemoryScheduleStore>,
    pub recorder: Arc<RecordingNotifier>,
    pub service: Arc<ScheduleService>,
    pub owner: Owner,
}

impl Harness {
    pub fn new() -> Self {
        let recorder = Arc::new(RecordingNotifier::new());
        Self::build(Arc::clone(&recorder) as Arc<dyn Notifier>, recorder)
    }

    /// A harness whose notification writes always fail. `recorder` stays empty.
    pub fn with_failing_notifier() -> Self {
        Self::build(Arc::new(FailingNotifier), Arc::new(RecordingNotifier::new()))
    }

    fn build(notifier: Arc<dyn Notifier>, recorder: Arc<RecordingNotifier>) -> Self {
        let store = Arc::new(MemoryScheduleStore::new());
        let service = Arc::new(ScheduleService::new(
            Arc::clone(&store) as _,
            notifier,
            DEFAULT_RECURRENCE_HORIZON_DAYS,
        ));
        Self {
            store,
            recorder,
            service,
            owner: Owner::new(Uuid::now_v7()),
        }
    }

    /// Settings attributing every request to this harness' owner.
    pub fn settings(&self) -> Settings {
        Settings {
            database: DatabaseConfig {
                url: "postgres://localhost/almanac_test".to_owned(),
                max_connections: 1,
            },
            auth: AuthConfig {
                method: AuthMethod::SingleOwner,
                single_owner: Some(SingleOwnerAuthConfig {
                    owner_id: self.owner.id,
                    department_id: None,
                    office_id: None,
                    division_id: None,
                }),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_owned(),
                port: 8700,
            },
            logging: LoggingConfig {
                level: "debug".to_owned(),
            },
            recurrence: RecurrenceConfig::default(),
            reminders: ReminderConfig {
                enabled: false,
                hours_ahead: 24,
                interval_seconds: 600,
            },
        }
    }

    /// The full API router over this harness' service.
    pub fn http(&self) -> Service {
        let router = Router::new()
            .hoop(ConfigHandler {
                settings: self.settings(),
            })
            .hoop(ScheduleServiceHandler {
                service: Arc::clone(&self.service),
            })
            .push(routes().expect("routes build"));
        Service::new(router)
    }
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// Server URL (without a database name) for the database-backed tests.
/// Those tests return early when it is unset.
fn base_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .ok()
        .map(|url| url.trim().trim_end_matches('/').to_owned())
        .filter(|url| !url.is_empty())
}

async fn admin_connection(base_url: &str) -> anyhow::Result<AsyncPgConnection> {
    Ok(AsyncPgConnection::establish(&format!("{base_url}/postgres")).await?)
}

/// A freshly created, fully migrated database owned by one test.
pub struct TestDb {
    pool: DbPool,
    base_url: String,
    db_name: String,
}

impl TestDb {
    /// Creates and migrates a new database, or returns `None` when no test
    /// server is configured.
    ///
    /// ## Errors
    /// Returns an error if the database cannot be created or migrated.
    pub async fn from_env() -> anyhow::Result<Option<Self>> {
        let Some(base_url) = base_database_url() else {
            tracing::warn!("TEST_DATABASE_URL is not set, skipping database test");
            return Ok(None);
        };

        let db_name = format!("almanac_test_{}", Uuid::now_v7().simple());
        let mut admin = admin_connection(&base_url).await?;
        diesel::sql_query(format!("CREATE DATABASE \"{db_name}\""))
            .execute(&mut admin)
            .await?;

        let url = format!("{base_url}/{db_name}");
        run_migrations(&url).await?;
        let pool = create_pool(&url, 4).await?;

        tracing::debug!(%db_name, "Test database ready");
        Ok(Some(Self {
            pool,
            base_url,
            db_name,
        }))
    }

    pub fn provider(&self) -> Arc<dyn DbProvider> {
        Arc::new(self.pool.clone())
    }

    /// ## Errors
    /// Returns an error if no connection can be checked out.
    pub async fn conn(&self) -> anyhow::Result<DbConnection<'_>> {
        Ok(self.pool.get().await?)
    }

    /// Closes the pool and drops the database.
    ///
    /// ## Errors
    /// Returns an error if the database cannot be dropped.
    pub async fn drop_database(self) -> anyhow::Result<()> {
        let Self {
            pool,
            base_url,
            db_name,
        } = self;
        drop(pool);

        let mut admin = admin_connection(&base_url).await?;
        diesel::sql_query(format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
            .execute(&mut admin)
            .await?;
        Ok(())
    }
}

/// A schedule service over PostgreSQL storage and notifications.
pub struct PgHarness {
    pub db: TestDb,
    pub store: Arc<PgScheduleStore>,
    pub notifier: Arc<PgNotifier>,
    pub service: ScheduleService,
    pub owner: Owner,
}

impl PgHarness {
    /// ## Errors
    /// Returns an error if the test database cannot be prepared.
    pub async fn from_env() -> anyhow::Result<Option<Self>> {
        let Some(db) = TestDb::from_env().await? else {
            return Ok(None);
        };
        let store = Arc::new(PgScheduleStore::new(db.provider()));
        let notifier = Arc::new(PgNotifier::new(db.provider()));
        let service = ScheduleService::new(
            Arc::clone(&store) as _,
            Arc::clone(&notifier) as _,
            DEFAULT_RECURRENCE_HORIZON_DAYS,
        );
        Ok(Some(Self {
            db,
            store,
            notifier,
            service,
            owner: Owner::new(Uuid::now_v7()),
        }))
    }
}

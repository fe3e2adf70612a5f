//! PostgreSQL implementation of the racing store.
//!
//! Transactions run at READ COMMITTED. Rows that a cascade depends on are
//! locked with `FOR UPDATE` before they are read for a decision, so two
//! deletions sharing a horse serialize on that horse's row.

use crate::domain::archive::ArchivedHorse;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::IdClass;
use crate::domain::model::{
    ApplicationDecision, Horse, Owner, OwnerHorse, OwnerSummary, Race, RaceResult, Trainer,
    TrainerApplication,
};
use crate::domain::reports::{
    OwnedHorseRow, RaceResultView, TrackStatsRow, TrainerWinningsRow, WinningTrainerRow,
};
use crate::storage::{RacingStore, StoreTx};
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};

/// Tables the service expects; checked by `preflight`.
pub const REQUIRED_TABLES: &[&str] = &[
    "stable",
    "track",
    "owner",
    "horse",
    "owns",
    "race",
    "race_results",
    "trainer",
    "trainer_applications",
    "old_info",
];

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the bundled migrations (schema plus archive trigger).
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Names from [`REQUIRED_TABLES`] that are absent from the `public` schema.
    pub async fn missing_tables(&self) -> anyhow::Result<Vec<String>> {
        let present: Vec<String> = sqlx::query_scalar(
            "SELECT table_name::text FROM information_schema.tables WHERE table_schema = 'public'",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(REQUIRED_TABLES
            .iter()
            .filter(|t| !present.iter().any(|p| p == *t))
            .map(|t| t.to_string())
            .collect())
    }
}

fn id_column(class: IdClass) -> (&'static str, &'static str) {
    match class {
        IdClass::Race => ("race", "race_id"),
        IdClass::Trainer => ("trainer", "trainer_id"),
    }
}

/// A duplicate primary key on an allocated id means another writer minted it first.
fn conflict_on_duplicate(err: sqlx::Error, id: &str) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return DomainError::AllocationConflict { id: id.to_string() };
        }
    }
    err.into()
}

/// Escapes LIKE metacharacters so the search term matches literally.
fn like_contains(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn horse_from_row(row: &PgRow) -> Result<Horse, sqlx::Error> {
    Ok(Horse {
        horse_id: row.try_get("horse_id")?,
        horse_name: row.try_get("horse_name")?,
        age: row.try_get("age")?,
        gender: row.try_get("gender")?,
        registration: row.try_get("registration")?,
        stable_id: row.try_get("stable_id")?,
    })
}

fn application_from_row(row: &PgRow) -> DomainResult<TrainerApplication> {
    let status: String = row.try_get("status")?;
    Ok(TrainerApplication {
        app_id: row.try_get("app_id")?,
        fname: row.try_get("fname")?,
        lname: row.try_get("lname")?,
        stable_id: row.try_get("stable_id")?,
        requested_at: row.try_get("requested_at")?,
        status: status.parse()?,
        decided_at: row.try_get("decided_at")?,
        decision_by: row.try_get("decision_by")?,
        decision_reason: row.try_get("decision_reason")?,
        approved_trainer_id: row.try_get("approved_trainer_id")?,
    })
}

const APPLICATION_COLUMNS: &str = "app_id, fname, lname, stable_id, requested_at, status, \
     decided_at, decision_by, decision_reason, approved_trainer_id";

#[async_trait]
impl RacingStore for PostgresStore {
    async fn begin(&self) -> DomainResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> DomainResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn owners_overview(&self) -> DomainResult<Vec<OwnerSummary>> {
        let rows = sqlx::query(
            "SELECT o.owner_id, o.fname, o.lname, COUNT(ow.horse_id) AS horse_count
             FROM owner o
             LEFT JOIN owns ow ON ow.owner_id = o.owner_id
             GROUP BY o.owner_id, o.fname, o.lname
             ORDER BY o.fname, o.lname, o.owner_id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(OwnerSummary {
                owner_id: row.try_get("owner_id")?,
                fname: row.try_get("fname")?,
                lname: row.try_get("lname")?,
                horse_count: row.try_get("horse_count")?,
            });
        }
        Ok(out)
    }

    async fn owner_horses(&self, owner_id: &str) -> DomainResult<Option<Vec<OwnerHorse>>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM owner WHERE owner_id = $1)")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Ok(None);
        }
        let rows = sqlx::query(
            "SELECT h.horse_id, h.horse_name,
                    (SELECT COUNT(*) FROM owns o2 WHERE o2.horse_id = h.horse_id) AS owner_count
             FROM owns ow
             JOIN horse h ON h.horse_id = ow.horse_id
             WHERE ow.owner_id = $1
             ORDER BY h.horse_name, h.horse_id",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(OwnerHorse {
                horse_id: row.try_get("horse_id")?,
                horse_name: row.try_get("horse_name")?,
                owner_count: row.try_get("owner_count")?,
            });
        }
        Ok(Some(out))
    }

    async fn pending_applications(&self) -> DomainResult<Vec<TrainerApplication>> {
        let sql = format!(
            "SELECT {} FROM trainer_applications WHERE status = 'pending'
             ORDER BY requested_at DESC, app_id DESC",
            APPLICATION_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(application_from_row).collect()
    }

    async fn archived_horses(&self) -> DomainResult<Vec<ArchivedHorse>> {
        let rows = sqlx::query(
            "SELECT horse_id, horse_name, age, gender, registration, stable_id, deleted_at
             FROM old_info ORDER BY deleted_at, archive_id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(ArchivedHorse {
                horse_id: row.try_get("horse_id")?,
                horse_name: row.try_get("horse_name")?,
                age: row.try_get("age")?,
                gender: row.try_get("gender")?,
                registration: row.try_get("registration")?,
                stable_id: row.try_get("stable_id")?,
                deleted_at: row.try_get("deleted_at")?,
            });
        }
        Ok(out)
    }

    async fn horses_by_owner(&self, lname_fragment: &str) -> DomainResult<Vec<OwnedHorseRow>> {
        let rows = sqlx::query(
            "SELECT h.horse_id, h.horse_name, h.age,
                    ARRAY(
                        SELECT (t.fname || ' ' || t.lname)::text
                        FROM trainer t
                        WHERE t.stable_id = h.stable_id
                        ORDER BY t.lname, t.fname, t.trainer_id
                    ) AS trainers
             FROM horse h
             WHERE EXISTS (
                 SELECT 1 FROM owns ow
                 JOIN owner o ON o.owner_id = ow.owner_id
                 WHERE ow.horse_id = h.horse_id AND o.lname ILIKE $1
             )
             ORDER BY h.horse_name, h.horse_id",
        )
        .bind(like_contains(lname_fragment))
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(OwnedHorseRow {
                horse_id: row.try_get("horse_id")?,
                horse_name: row.try_get("horse_name")?,
                age: row.try_get("age")?,
                trainers: row.try_get("trainers")?,
            });
        }
        Ok(out)
    }

    async fn winning_trainers(&self) -> DomainResult<Vec<WinningTrainerRow>> {
        let rows = sqlx::query(
            "SELECT t.fname AS trainer_fname, t.lname AS trainer_lname, h.horse_name,
                    r.race_name, r.race_date, r.track_name
             FROM race_results rr
             JOIN horse h ON h.horse_id = rr.horse_id
             JOIN trainer t ON t.stable_id = h.stable_id
             JOIN race r ON r.race_id = rr.race_id
             WHERE rr.results = 'first'
             ORDER BY r.race_date DESC, t.lname, t.fname, r.race_id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(WinningTrainerRow {
                trainer_fname: row.try_get("trainer_fname")?,
                trainer_lname: row.try_get("trainer_lname")?,
                horse_name: row.try_get("horse_name")?,
                race_name: row.try_get("race_name")?,
                race_date: row.try_get("race_date")?,
                track_name: row.try_get("track_name")?,
            });
        }
        Ok(out)
    }

    async fn trainer_winnings(&self) -> DomainResult<Vec<TrainerWinningsRow>> {
        let rows = sqlx::query(
            "SELECT t.trainer_id, (t.fname || ' ' || t.lname)::text AS trainer,
                    COALESCE(SUM(rr.prize), 0)::float8 AS total_winnings
             FROM trainer t
             LEFT JOIN horse h ON h.stable_id = t.stable_id
             LEFT JOIN race_results rr ON rr.horse_id = h.horse_id
             GROUP BY t.trainer_id, t.fname, t.lname
             ORDER BY total_winnings DESC, t.trainer_id",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(TrainerWinningsRow {
                trainer_id: row.try_get("trainer_id")?,
                trainer: row.try_get("trainer")?,
                total_winnings: row.try_get("total_winnings")?,
            });
        }
        Ok(out)
    }

    async fn track_stats(&self) -> DomainResult<Vec<TrackStatsRow>> {
        let rows = sqlx::query(
            "SELECT r.track_name,
                    COUNT(DISTINCT r.race_id) AS race_count,
                    COUNT(rr.horse_id) AS participations
             FROM race r
             LEFT JOIN race_results rr ON rr.race_id = r.race_id
             GROUP BY r.track_name
             ORDER BY race_count DESC, r.track_name",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(TrackStatsRow {
                track_name: row.try_get("track_name")?,
                race_count: row.try_get("race_count")?,
                participations: row.try_get("participations")?,
            });
        }
        Ok(out)
    }
}

/// One open PostgreSQL transaction. Dropping it without `commit` rolls back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_owner(&mut self, owner_id: &str) -> DomainResult<Option<Owner>> {
        let row = sqlx::query(
            "SELECT owner_id, fname, lname FROM owner WHERE owner_id = $1 FOR UPDATE",
        )
        .bind(owner_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        match row {
            Some(row) => Ok(Some(Owner {
                owner_id: row.try_get("owner_id")?,
                fname: row.try_get("fname")?,
                lname: row.try_get("lname")?,
            })),
            None => Ok(None),
        }
    }

    async fn lock_horses_of_owner(&mut self, owner_id: &str) -> DomainResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT h.horse_id
             FROM horse h
             JOIN owns o ON o.horse_id = h.horse_id
             WHERE o.owner_id = $1
             ORDER BY h.horse_id
             FOR UPDATE OF h",
        )
        .bind(owner_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(ids)
    }

    async fn delete_ownership_of_owner(&mut self, owner_id: &str) -> DomainResult<u64> {
        let res = sqlx::query("DELETE FROM owns WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected())
    }

    async fn orphaned_horses(&mut self) -> DomainResult<Vec<String>> {
        // Rows deleted by a concurrent cascade after our snapshot are skipped by
        // the lock, so each orphan is removed (and archived) exactly once.
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT h.horse_id
             FROM horse h
             WHERE NOT EXISTS (SELECT 1 FROM owns o WHERE o.horse_id = h.horse_id)
             ORDER BY h.horse_id
             FOR UPDATE OF h",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(ids)
    }

    async fn delete_results_of_horse(&mut self, horse_id: &str) -> DomainResult<u64> {
        let res = sqlx::query("DELETE FROM race_results WHERE horse_id = $1")
            .bind(horse_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected())
    }

    async fn delete_ownership_of_horse(&mut self, horse_id: &str) -> DomainResult<u64> {
        let res = sqlx::query("DELETE FROM owns WHERE horse_id = $1")
            .bind(horse_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected())
    }

    async fn delete_horse(&mut self, horse_id: &str) -> DomainResult<bool> {
        // trg_horse_to_old_info archives the row within this statement.
        let res = sqlx::query("DELETE FROM horse WHERE horse_id = $1")
            .bind(horse_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_owner(&mut self, owner_id: &str) -> DomainResult<bool> {
        let res = sqlx::query("DELETE FROM owner WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn lock_horse(&mut self, horse_id: &str) -> DomainResult<Option<Horse>> {
        let row = sqlx::query(
            "SELECT horse_id, horse_name, age, gender, registration, stable_id
             FROM horse WHERE horse_id = $1 FOR UPDATE",
        )
        .bind(horse_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        match row {
            Some(row) => Ok(Some(horse_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn horse_exists(&mut self, horse_id: &str) -> DomainResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM horse WHERE horse_id = $1)")
                .bind(horse_id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn stable_exists(&mut self, stable_id: &str) -> DomainResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM stable WHERE stable_id = $1)")
                .bind(stable_id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn track_exists(&mut self, track_name: &str) -> DomainResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM track WHERE track_name = $1)")
                .bind(track_name)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(exists)
    }

    async fn update_horse_stable(&mut self, horse_id: &str, stable_id: &str) -> DomainResult<u64> {
        let res = sqlx::query("UPDATE horse SET stable_id = $1 WHERE horse_id = $2")
            .bind(stable_id)
            .bind(horse_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(res.rows_affected())
    }

    async fn max_id_suffix(&mut self, class: IdClass) -> DomainResult<Option<u64>> {
        let (table, column) = id_column(class);
        let prefix = class.prefix();
        // 18 digits always fits BIGINT.
        let sql = format!(
            "SELECT MAX(CAST(SUBSTRING({col} FROM {start}) AS BIGINT)) FROM {table} WHERE {col} ~ $1",
            col = column,
            start = prefix.len() + 1,
            table = table
        );
        let max: Option<i64> = sqlx::query_scalar(&sql)
            .bind(format!("^{}[0-9]{{1,18}}$", prefix))
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(max.map(|n| n.max(0) as u64))
    }

    async fn insert_race(&mut self, race: &Race) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO race (race_id, race_name, track_name, race_date, race_time)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&race.race_id)
        .bind(&race.race_name)
        .bind(&race.track_name)
        .bind(race.race_date)
        .bind(race.race_time)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_duplicate(e, &race.race_id))?;
        Ok(())
    }

    async fn insert_race_result(&mut self, result: &RaceResult) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO race_results (race_id, horse_id, results, prize)
             VALUES ($1, $2, $3, CAST($4 AS NUMERIC(12, 2)))",
        )
        .bind(&result.race_id)
        .bind(&result.horse_id)
        .bind(result.results.as_str())
        .bind(result.prize)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn race_results(&mut self, race_id: &str) -> DomainResult<Vec<RaceResultView>> {
        let rows = sqlx::query(
            "SELECT rr.race_id, rr.horse_id, h.horse_name, rr.results, rr.prize::float8 AS prize
             FROM race_results rr
             JOIN horse h ON h.horse_id = rr.horse_id
             WHERE rr.race_id = $1
             ORDER BY rr.prize DESC, rr.horse_id",
        )
        .bind(race_id)
        .fetch_all(&mut *self.tx)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let results: String = row.try_get("results")?;
            out.push(RaceResultView {
                race_id: row.try_get("race_id")?,
                horse_id: row.try_get("horse_id")?,
                horse_name: row.try_get("horse_name")?,
                results: results.parse()?,
                prize: row.try_get("prize")?,
            });
        }
        Ok(out)
    }

    async fn insert_trainer(&mut self, trainer: &Trainer) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO trainer (trainer_id, lname, fname, stable_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(&trainer.trainer_id)
        .bind(&trainer.lname)
        .bind(&trainer.fname)
        .bind(&trainer.stable_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| conflict_on_duplicate(e, &trainer.trainer_id))?;
        Ok(())
    }

    async fn lock_application(&mut self, app_id: i64) -> DomainResult<Option<TrainerApplication>> {
        let sql = format!(
            "SELECT {} FROM trainer_applications WHERE app_id = $1 FOR UPDATE",
            APPLICATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(app_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(application_from_row).transpose()
    }

    async fn decide_application(
        &mut self,
        app_id: i64,
        decision: &ApplicationDecision,
    ) -> DomainResult<u64> {
        let res = match decision {
            ApplicationDecision::Approved {
                trainer_id,
                decided_by,
            } => {
                sqlx::query(
                    "UPDATE trainer_applications
                     SET status = 'approved', decided_at = now(),
                         decision_by = $2, approved_trainer_id = $3
                     WHERE app_id = $1 AND status = 'pending'",
                )
                .bind(app_id)
                .bind(decided_by)
                .bind(trainer_id)
                .execute(&mut *self.tx)
                .await?
            }
            ApplicationDecision::Rejected { reason, decided_by } => {
                sqlx::query(
                    "UPDATE trainer_applications
                     SET status = 'rejected', decided_at = now(),
                         decision_by = $2, decision_reason = $3
                     WHERE app_id = $1 AND status = 'pending'",
                )
                .bind(app_id)
                .bind(decided_by)
                .bind(reason)
                .execute(&mut *self.tx)
                .await?
            }
        };
        Ok(res.rows_affected())
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        let PgTx { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        let PgTx { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}

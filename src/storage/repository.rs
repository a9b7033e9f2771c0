use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::domain::{AppointmentId, AppointmentRecord, Doctor, DoctorId};

use super::MIGRATION_001_INITIAL;

/// Last issued id for each entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdCounters {
    pub doctor: DoctorId,
    pub appointment: AppointmentId,
}

impl IdCounters {
    pub fn next_doctor(&mut self) -> DoctorId {
        self.doctor += 1;
        self.doctor
    }

    pub fn next_appointment(&mut self) -> AppointmentId {
        self.appointment += 1;
        self.appointment
    }
}

/// Everything persisted in the database, exactly as stored.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub doctors: Vec<Doctor>,
    pub appointments: Vec<AppointmentRecord>,
    pub counters: IdCounters,
}

/// Repository for persisting and loading doctors and appointments.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    /// Creates the database file if it doesn't exist.
    ///
    /// Foreign keys are not enforced: appointments of a doctor removed during the
    /// session are still written back and only dropped on the next load.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true)
            .foreign_keys(false);
        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize the database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Read every persisted row, ordered by id.
    pub async fn load_snapshot(&self) -> Result<Snapshot> {
        let doctors = sqlx::query("SELECT id, name, percentage FROM doctors ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load doctors")?
            .iter()
            .map(Self::row_to_doctor)
            .collect();

        let appointments =
            sqlx::query("SELECT id, doctor_id, amount FROM appointments ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to load appointments")?
                .iter()
                .map(Self::row_to_appointment)
                .collect();

        let counters = self.load_counters().await?;

        Ok(Snapshot {
            doctors,
            appointments,
            counters,
        })
    }

    async fn load_counters(&self) -> Result<IdCounters> {
        let rows = sqlx::query("SELECT name, value FROM id_counters")
            .fetch_all(&self.pool)
            .await
            .context("Failed to load id counters")?;

        let mut counters = IdCounters::default();
        for row in rows {
            let name: String = row.get("name");
            let value: i64 = row.get("value");
            match name.as_str() {
                "doctor" => counters.doctor = value,
                "appointment" => counters.appointment = value,
                _ => {}
            }
        }
        Ok(counters)
    }

    /// Replace everything in the database with the given state.
    /// Runs as a single transaction: either all rows are rewritten or none are.
    pub async fn save_snapshot(
        &self,
        doctors: &[Doctor],
        appointments: &[AppointmentRecord],
        counters: IdCounters,
    ) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM appointments")
            .execute(&mut *tx)
            .await
            .context("Failed to clear appointments")?;
        sqlx::query("DELETE FROM doctors")
            .execute(&mut *tx)
            .await
            .context("Failed to clear doctors")?;

        for doctor in doctors {
            sqlx::query("INSERT INTO doctors (id, name, percentage) VALUES (?, ?, ?)")
                .bind(doctor.id)
                .bind(&doctor.name)
                .bind(doctor.percentage)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to save doctor {}", doctor.id))?;
        }

        for appointment in appointments {
            sqlx::query("INSERT INTO appointments (id, doctor_id, amount) VALUES (?, ?, ?)")
                .bind(appointment.id)
                .bind(appointment.doctor_id)
                .bind(appointment.amount)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to save appointment {}", appointment.id))?;
        }

        for (name, value) in [
            ("doctor", counters.doctor),
            ("appointment", counters.appointment),
        ] {
            sqlx::query(
                r#"
                INSERT INTO id_counters (name, value) VALUES (?, ?)
                ON CONFLICT(name) DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(name)
            .bind(value)
            .execute(&mut *tx)
            .await
            .context("Failed to save id counters")?;
        }

        tx.commit().await.context("Failed to commit snapshot")?;
        Ok(())
    }

    fn row_to_doctor(row: &SqliteRow) -> Doctor {
        Doctor {
            id: row.get("id"),
            name: row.get("name"),
            percentage: row.get("percentage"),
        }
    }

    fn row_to_appointment(row: &SqliteRow) -> AppointmentRecord {
        AppointmentRecord {
            id: row.get("id"),
            doctor_id: row.get("doctor_id"),
            amount: row.get("amount"),
        }
    }
}

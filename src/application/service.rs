use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::{
    Appointment, AppointmentRecord, Doctor, DoctorId, FinancialReport, Summary,
    is_valid_amount, is_valid_percentage, normalize_name,
};
use crate::storage::{IdCounters, Repository, Snapshot};

use super::AppError;

/// In-memory view of the ledger.
#[derive(Debug, Clone, Default)]
struct LedgerState {
    doctors: Vec<Doctor>,
    appointments: Vec<AppointmentRecord>,
    counters: IdCounters,
    /// Doctors removed during this session. Their appointments stay visible
    /// (and keep paying out at the last known percentage) until the next reload.
    removed: HashMap<DoctorId, Doctor>,
}

impl LedgerState {
    /// Build the view from persisted rows, dropping appointments whose doctor no
    /// longer exists.
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            doctors,
            appointments,
            mut counters,
        } = snapshot;

        let (appointments, orphans): (Vec<_>, Vec<_>) = appointments
            .into_iter()
            .partition(|a| doctors.iter().any(|d| d.id == a.doctor_id));

        for orphan in &orphans {
            warn!(
                appointment_id = orphan.id,
                doctor_id = orphan.doctor_id,
                "dropping appointment of unknown doctor"
            );
        }

        // Databases written before the counters existed only carry the rows.
        if let Some(max) = doctors.iter().map(|d| d.id).max() {
            counters.doctor = counters.doctor.max(max);
        }
        if let Some(max) = appointments.iter().map(|a| a.id).max() {
            counters.appointment = counters.appointment.max(max);
        }

        Self {
            doctors,
            appointments,
            counters,
            removed: HashMap::new(),
        }
    }

    fn doctor(&self, id: DoctorId) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    /// Resolve an appointment against a live doctor, or a doctor removed in this
    /// session.
    fn resolve(&self, record: &AppointmentRecord) -> Option<Appointment> {
        self.doctor(record.doctor_id)
            .or_else(|| self.removed.get(&record.doctor_id))
            .map(|doctor| Appointment::resolve(record, doctor))
    }

    fn resolved_appointments(&self) -> Vec<Appointment> {
        self.appointments
            .iter()
            .filter_map(|a| self.resolve(a))
            .collect()
    }
}

/// The authoritative store of doctors and appointments.
///
/// Every mutation rewrites the whole database inside one transaction and only
/// touches the in-memory state once that commit succeeds. A single lock is held
/// across the write, so at most one mutation is in flight at a time.
pub struct LedgerStore {
    repo: Repository,
    state: Mutex<LedgerState>,
}

impl LedgerStore {
    /// Create a store from a migrated repository and load its contents.
    pub async fn open(repo: Repository) -> Result<Self, AppError> {
        let snapshot = repo.load_snapshot().await?;
        let state = LedgerState::from_snapshot(snapshot);
        debug!(
            doctors = state.doctors.len(),
            appointments = state.appointments.len(),
            "ledger loaded"
        );
        Ok(Self {
            repo,
            state: Mutex::new(state),
        })
    }

    /// Open (creating if needed) the database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::init(&db_url).await?;
        Self::open(repo).await
    }

    /// Discard the in-memory view and rebuild it from the database.
    /// The read happens under the state lock so no mutation can commit in between.
    pub async fn reload(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let snapshot = self.repo.load_snapshot().await?;
        *state = LedgerState::from_snapshot(snapshot);
        debug!(
            doctors = state.doctors.len(),
            appointments = state.appointments.len(),
            "ledger reloaded"
        );
        Ok(())
    }

    /// Persist `next` and, if that succeeds, make it the current state.
    async fn commit(&self, state: &mut LedgerState, next: LedgerState) -> Result<(), AppError> {
        self.repo
            .save_snapshot(&next.doctors, &next.appointments, next.counters)
            .await?;
        *state = next;
        Ok(())
    }

    // ========================
    // Doctor operations
    // ========================

    /// Register a new doctor. Returns `None` if the name is blank or the
    /// percentage is negative or not a number.
    pub async fn register_doctor(
        &self,
        name: &str,
        percentage: f64,
    ) -> Result<Option<Doctor>, AppError> {
        let Some(name) = normalize_name(name) else {
            return Ok(None);
        };
        if !is_valid_percentage(percentage) {
            return Ok(None);
        }

        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let doctor = Doctor::new(next.counters.next_doctor(), name, percentage);
        next.doctors.push(doctor.clone());
        self.commit(&mut state, next).await?;

        info!(doctor_id = doctor.id, name = %doctor.name, percentage, "doctor registered");
        Ok(Some(doctor))
    }

    pub async fn get_doctor(&self, id: DoctorId) -> Option<Doctor> {
        self.state.lock().await.doctor(id).cloned()
    }

    /// All doctors in registration order.
    pub async fn list_doctors(&self) -> Vec<Doctor> {
        self.state.lock().await.doctors.clone()
    }

    /// Doctors whose name contains `query`, ignoring case.
    pub async fn search_doctors(&self, query: &str) -> Vec<Doctor> {
        self.state
            .lock()
            .await
            .doctors
            .iter()
            .filter(|d| d.matches(query))
            .cloned()
            .collect()
    }

    /// Update the given fields of a doctor, leaving the others untouched.
    /// Returns `false` if the doctor does not exist or a field is invalid.
    pub async fn update_doctor(
        &self,
        id: DoctorId,
        name: Option<&str>,
        percentage: Option<f64>,
    ) -> Result<bool, AppError> {
        let name = match name {
            Some(name) => match normalize_name(name) {
                Some(name) => Some(name),
                None => return Ok(false),
            },
            None => None,
        };
        if percentage.is_some_and(|p| !is_valid_percentage(p)) {
            return Ok(false);
        }

        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let Some(doctor) = next.doctors.iter_mut().find(|d| d.id == id) else {
            return Ok(false);
        };
        if let Some(name) = name {
            doctor.name = name;
        }
        if let Some(percentage) = percentage {
            doctor.percentage = percentage;
        }
        self.commit(&mut state, next).await?;

        info!(doctor_id = id, "doctor updated");
        Ok(true)
    }

    /// Remove a doctor. Appointments referencing it are left alone.
    pub async fn remove_doctor(&self, id: DoctorId) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        let Some(position) = state.doctors.iter().position(|d| d.id == id) else {
            return Ok(false);
        };

        let mut next = state.clone();
        let doctor = next.doctors.remove(position);
        next.removed.insert(doctor.id, doctor);
        self.commit(&mut state, next).await?;

        info!(doctor_id = id, "doctor removed");
        Ok(true)
    }

    // ========================
    // Appointment operations
    // ========================

    /// Record an appointment for an existing doctor. Returns `None` if the doctor
    /// is unknown or the amount is not strictly positive.
    pub async fn register_appointment(
        &self,
        doctor_id: DoctorId,
        amount: f64,
    ) -> Result<Option<Appointment>, AppError> {
        if !is_valid_amount(amount) {
            return Ok(None);
        }

        let mut state = self.state.lock().await;
        let Some(doctor) = state.doctor(doctor_id).cloned() else {
            return Ok(None);
        };

        let mut next = state.clone();
        let record = AppointmentRecord {
            id: next.counters.next_appointment(),
            doctor_id,
            amount,
        };
        next.appointments.push(record.clone());
        self.commit(&mut state, next).await?;

        let appointment = Appointment::resolve(&record, &doctor);
        info!(
            appointment_id = appointment.id,
            doctor_id,
            amount,
            payout = appointment.payout(),
            "appointment registered"
        );
        Ok(Some(appointment))
    }

    /// All appointments in registration order, resolved against their doctors.
    pub async fn list_appointments(&self) -> Vec<Appointment> {
        self.state.lock().await.resolved_appointments()
    }

    // ========================
    // Reporting
    // ========================

    pub async fn financial_report(&self) -> FinancialReport {
        let state = self.state.lock().await;
        FinancialReport::build(&state.resolved_appointments(), state.doctors.len())
    }

    pub async fn summary(&self) -> Summary {
        let state = self.state.lock().await;
        Summary {
            doctor_count: state.doctors.len(),
            appointment_count: state.appointments.len(),
        }
    }
}

use serde::{Deserialize, Serialize};

use super::{Doctor, DoctorId};

pub type AppointmentId = i64;

/// A billable appointment as persisted: it only knows its doctor by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: AppointmentId,
    pub doctor_id: DoctorId,
    pub amount: f64,
}

/// An appointment resolved against its doctor.
///
/// The doctor is a copy taken when the appointment is read from the store, so the
/// payout always reflects the doctor's percentage at that moment rather than at
/// registration time.
#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub doctor: Doctor,
    pub amount: f64,
}

impl Appointment {
    pub fn resolve(record: &AppointmentRecord, doctor: &Doctor) -> Self {
        Self {
            id: record.id,
            doctor: doctor.clone(),
            amount: record.amount,
        }
    }

    /// The doctor's share of this appointment.
    pub fn payout(&self) -> f64 {
        payout(self.amount, self.doctor.percentage)
    }

    /// What the clinic keeps after paying the doctor.
    pub fn retained(&self) -> f64 {
        self.amount - self.payout()
    }
}

impl Serialize for Appointment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Appointment", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("doctor", &self.doctor)?;
        state.serialize_field("amount", &self.amount)?;
        state.serialize_field("payout", &self.payout())?;
        state.end()
    }
}

pub fn payout(amount: f64, percentage: f64) -> f64 {
    amount * (percentage / 100.0)
}

/// Amounts must be finite and strictly positive.
pub fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount > 0.0
}

use serde::{Deserialize, Serialize};

use super::{Appointment, format_currency};

/// Aggregate figures over every appointment in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    /// Sum of all appointment amounts
    pub total_billed: f64,
    /// Sum of all payouts owed to doctors
    pub total_payout: f64,
    /// What the clinic keeps: billed minus payout
    pub net: f64,
    pub appointment_count: usize,
    pub doctor_count: usize,
}

impl FinancialReport {
    pub fn build(appointments: &[Appointment], doctor_count: usize) -> Self {
        let total_billed: f64 = appointments.iter().map(|a| a.amount).sum();
        let total_payout: f64 = appointments.iter().map(Appointment::payout).sum();

        Self {
            total_billed,
            total_payout,
            net: total_billed - total_payout,
            appointment_count: appointments.len(),
            doctor_count,
        }
    }

    pub fn formatted(&self) -> FormattedReport {
        FormattedReport {
            total_billed: format_currency(self.total_billed),
            total_payout: format_currency(self.total_payout),
            net: format_currency(self.net),
        }
    }
}

/// Display strings for the monetary fields of a [`FinancialReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedReport {
    pub total_billed: String,
    pub total_payout: String,
    pub net: String,
}

/// Entity counts shown on the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub doctor_count: usize,
    pub appointment_count: usize,
}

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::application::{AppError, LedgerStore};
use crate::domain::{DoctorId, format_currency, is_valid_amount, parse_amount};
use crate::http;

/// MediPay - doctors, appointments and revenue-share payouts
#[derive(Parser)]
#[command(name = "medipay")]
#[command(about = "Track doctors, their appointments and what each of them is owed")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(
        short,
        long,
        env = "MEDIPAY_DATABASE",
        default_value = "database/medipay.db"
    )]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Doctor management commands
    #[command(subcommand)]
    Doctor(DoctorCommands),

    /// Appointment commands
    #[command(subcommand)]
    Appointment(AppointmentCommands),

    /// Show billed, paid out and retained totals
    Report {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show how many doctors and appointments are recorded
    Summary,

    /// Serve the JSON API
    Serve {
        /// Address to listen on
        #[arg(long, env = "MEDIPAY_BIND", default_value = "127.0.0.1:5000")]
        bind: String,
    },
}

#[derive(Subcommand)]
pub enum DoctorCommands {
    /// Register a new doctor
    Add {
        /// Doctor name
        name: String,

        /// Revenue share in percent (e.g., "20" or "12,5")
        #[arg(short, long)]
        percentage: String,
    },

    /// List doctors
    List {
        /// Only show doctors whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a doctor
    Show {
        /// Doctor ID
        id: DoctorId,
    },

    /// Change a doctor's name or percentage
    Edit {
        /// Doctor ID
        id: DoctorId,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New revenue share in percent
        #[arg(short, long)]
        percentage: Option<String>,
    },

    /// Remove a doctor
    Remove {
        /// Doctor ID
        id: DoctorId,
    },
}

#[derive(Subcommand)]
pub enum AppointmentCommands {
    /// Record an appointment
    Add {
        /// Amount billed (e.g., "150.00" or "150,00")
        amount: String,

        /// Doctor ID
        #[arg(short, long)]
        doctor: DoctorId,
    },

    /// List appointments with their payouts
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let store = open_store(&self.database).await?;

        match self.command {
            Commands::Doctor(doctor_cmd) => run_doctor_command(&store, doctor_cmd).await?,
            Commands::Appointment(appointment_cmd) => {
                run_appointment_command(&store, appointment_cmd).await?
            }
            Commands::Report { format } => run_report_command(&store, &format).await?,
            Commands::Summary => {
                let summary = store.summary().await;
                println!("Doctors:      {}", summary.doctor_count);
                println!("Appointments: {}", summary.appointment_count);
            }
            Commands::Serve { bind } => http::serve(Arc::new(store), &bind).await?,
        }

        Ok(())
    }
}

async fn open_store(database: &str) -> Result<LedgerStore> {
    if let Some(parent) = Path::new(database).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(LedgerStore::init(database).await?)
}

/// Parse a percentage typed by the user, rejecting negative values.
fn parse_percentage(input: &str) -> Result<f64, AppError> {
    let percentage = parse_amount(input)?;
    if percentage < 0.0 {
        return Err(AppError::InvalidInput(
            "percentage must be >= 0".to_string(),
        ));
    }
    Ok(percentage)
}

async fn run_doctor_command(store: &LedgerStore, cmd: DoctorCommands) -> Result<()> {
    match cmd {
        DoctorCommands::Add { name, percentage } => {
            let percentage = parse_percentage(&percentage)?;
            let Some(doctor) = store.register_doctor(&name, percentage).await? else {
                bail!(AppError::InvalidInput("doctor name is required".to_string()));
            };
            println!(
                "Registered doctor: {} ({}%) [id {}]",
                doctor.name, doctor.percentage, doctor.id
            );
        }

        DoctorCommands::List { search } => {
            let doctors = match search {
                Some(query) => store.search_doctors(&query).await,
                None => store.list_doctors().await,
            };
            if doctors.is_empty() {
                println!("No doctors found.");
            } else {
                println!("{:<6} {:<30} {:>10}", "ID", "NAME", "SHARE");
                println!("{}", "-".repeat(48));
                for doctor in doctors {
                    println!(
                        "{:<6} {:<30} {:>9}%",
                        doctor.id, doctor.name, doctor.percentage
                    );
                }
            }
        }

        DoctorCommands::Show { id } => {
            let doctor = store
                .get_doctor(id)
                .await
                .ok_or(AppError::DoctorNotFound(id))?;
            let appointments: Vec<_> = store
                .list_appointments()
                .await
                .into_iter()
                .filter(|a| a.doctor.id == id)
                .collect();
            let billed: f64 = appointments.iter().map(|a| a.amount).sum();
            let payout: f64 = appointments.iter().map(|a| a.payout()).sum();

            println!("Doctor: {}", doctor.name);
            println!("  ID:           {}", doctor.id);
            println!("  Share:        {}%", doctor.percentage);
            println!("  Appointments: {}", appointments.len());
            println!("  Billed:       {}", format_currency(billed));
            println!("  Payout:       {}", format_currency(payout));
        }

        DoctorCommands::Edit {
            id,
            name,
            percentage,
        } => {
            if store.get_doctor(id).await.is_none() {
                bail!(AppError::DoctorNotFound(id));
            }
            let percentage = percentage.as_deref().map(parse_percentage).transpose()?;
            if !store
                .update_doctor(id, name.as_deref(), percentage)
                .await?
            {
                bail!(AppError::InvalidInput(
                    "doctor name must not be blank".to_string()
                ));
            }
            println!("Updated doctor {}", id);
        }

        DoctorCommands::Remove { id } => {
            if !store.remove_doctor(id).await? {
                bail!(AppError::DoctorNotFound(id));
            }
            println!("Removed doctor {}", id);
        }
    }
    Ok(())
}

async fn run_appointment_command(store: &LedgerStore, cmd: AppointmentCommands) -> Result<()> {
    match cmd {
        AppointmentCommands::Add { amount, doctor } => {
            let amount = parse_amount(&amount).map_err(AppError::from)?;
            if !is_valid_amount(amount) {
                bail!(AppError::InvalidInput(
                    "amount must be greater than zero".to_string()
                ));
            }
            let Some(appointment) = store.register_appointment(doctor, amount).await? else {
                bail!(AppError::DoctorNotFound(doctor));
            };
            println!(
                "Recorded appointment {}: {} with {} (payout {})",
                appointment.id,
                format_currency(appointment.amount),
                appointment.doctor.name,
                format_currency(appointment.payout())
            );
        }

        AppointmentCommands::List => {
            let appointments = store.list_appointments().await;
            if appointments.is_empty() {
                println!("No appointments found.");
                return Ok(());
            }
            println!(
                "{:<6} {:<30} {:>14} {:>14}",
                "ID", "DOCTOR", "AMOUNT", "PAYOUT"
            );
            println!("{}", "-".repeat(67));
            for appointment in appointments {
                println!(
                    "{:<6} {:<30} {:>14} {:>14}",
                    appointment.id,
                    appointment.doctor.name,
                    format_currency(appointment.amount),
                    format_currency(appointment.payout())
                );
            }
        }
    }
    Ok(())
}

async fn run_report_command(store: &LedgerStore, format: &str) -> Result<()> {
    let report = store.financial_report().await;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "table" => {
            let formatted = report.formatted();
            println!("Financial Report");
            println!();
            println!("Doctors:        {:>15}", report.doctor_count);
            println!("Appointments:   {:>15}", report.appointment_count);
            println!("Total billed:   {:>15}", formatted.total_billed);
            println!("Total payout:   {:>15}", formatted.total_payout);
            println!("{}", "-".repeat(31));
            println!("Net:            {:>15}", formatted.net);
        }
        other => bail!("Unknown format '{}'. Use table or json", other),
    }
    Ok(())
}

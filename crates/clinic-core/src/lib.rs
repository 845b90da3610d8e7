//! Clinic Core Library
//!
//! Persistence and domain-integrity layer for a single-clinic records
//! manager: patients, their appointments, and the treatments given during
//! those appointments, stored in SQLite.
//!
//! # Architecture
//!
//! ```text
//!   Desktop shell (forms, lists, calendar)
//!                  │
//!        [FFI facade: ClinicCore]  ── presence validation
//!                  │
//!          ┌───────▼────────┐
//!          │    Database    │  Patients / Appointments / Treatments
//!          │  (repository)  │  parameter-bound statements only
//!          └──┬──────────┬──┘
//!             │          │
//!        Field codec   Diagnostic sink
//!      (medications)   (append-only log)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer, schema and referential policy
//! - [`models`]: Domain types (Patient, Appointment, Treatment)
//! - [`codec`]: Medication list encoding
//! - [`diagnostics`]: Diagnostic sink for failed storage operations
//! - [`config`]: Paths and delete policy
//! - [`validation`]: Required-field checks for user input

pub mod codec;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::ClinicConfig;
pub use db::{Database, DbError, DbResult, DeletePolicy, Dependents, ReferenceIndex};
pub use diagnostics::{DiagnosticSink, FileDiagnosticLog, MemorySink, TracingSink};
pub use models::{Appointment, AppointmentSlot, Patient, Treatment};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Still referenced: {0}")]
    Referenced(String),
}

impl From<DbError> for ClinicError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => ClinicError::NotFound(what),
            e @ DbError::Referenced { .. } => ClinicError::Referenced(e.to_string()),
            e => ClinicError::DatabaseError(e.to_string()),
        }
    }
}

impl From<validation::ValidationError> for ClinicError {
    fn from(e: validation::ValidationError) -> Self {
        ClinicError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_date_arg(date: &str) -> Result<chrono::NaiveDate, ClinicError> {
    models::parse_date(date)
        .map_err(|e| ClinicError::InvalidInput(format!("date {date:?}: {e}")))
}

fn parse_time_arg(time: &str) -> Result<chrono::NaiveTime, ClinicError> {
    models::parse_time(time)
        .map_err(|e| ClinicError::InvalidInput(format!("time {time:?}: {e}")))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a console `tracing` subscriber. Later calls are ignored.
#[uniffi::export]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

/// Open or create a database at the given path, logging failures to `log_path`.
#[uniffi::export]
pub fn open_clinic(db_path: String, log_path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let config = ClinicConfig {
        database_path: db_path.into(),
        diagnostic_log_path: log_path.into(),
        ..ClinicConfig::default()
    };
    open_with_config(&config)
}

/// Open the database described by the `CLINIC_*` environment variables.
#[uniffi::export]
pub fn open_clinic_from_env() -> Result<Arc<ClinicCore>, ClinicError> {
    open_with_config(&ClinicConfig::from_env())
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_clinic_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory(Arc::new(TracingSink))?;
    Ok(ClinicCore::wrap(db))
}

/// Open the database and diagnostic log named by `config`.
pub fn open_with_config(config: &ClinicConfig) -> Result<Arc<ClinicCore>, ClinicError> {
    let sink = Arc::new(FileDiagnosticLog::open(&config.diagnostic_log_path));
    let db = Database::open(&config.database_path, sink)?.with_delete_policy(config.delete_policy);
    Ok(ClinicCore::wrap(db))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
}

impl ClinicCore {
    fn wrap(db: Database) -> Arc<Self> {
        Arc::new(ClinicCore {
            db: Arc::new(Mutex::new(db)),
        })
    }
}

#[uniffi::export]
impl ClinicCore {
    /// True when the tables could not be created at startup.
    pub fn is_degraded(&self) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.is_degraded())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient. Returns the assigned ID.
    pub fn add_patient(
        &self,
        name: String,
        age: u32,
        contact: String,
        medical_history: String,
    ) -> Result<i64, ClinicError> {
        let patient = Patient::new(name, age, contact, medical_history);
        validation::validate_patient(&patient)?;
        let db = self.db.lock()?;
        Ok(db.add_patient(&patient)?)
    }

    /// All patients in registration order.
    pub fn get_all_patients(&self) -> Result<Vec<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let patients = db.get_all_patients()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Edit a patient. Returns false if no patient has this ID.
    pub fn update_patient(
        &self,
        id: i64,
        name: String,
        age: u32,
        contact: String,
        medical_history: String,
    ) -> Result<bool, ClinicError> {
        let mut patient = Patient::new(name, age, contact, medical_history);
        patient.id = id;
        validation::validate_patient(&patient)?;
        let db = self.db.lock()?;
        Ok(db.update_patient(&patient)?)
    }

    pub fn delete_patient(&self, id: i64) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.delete_patient(id)?)
    }

    pub fn dependents_of_patient(&self, id: i64) -> Result<FfiDependents, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.dependents_of_patient(id)?.into())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Book an appointment. `date` is `yyyy-MM-dd`, `time` is `HH:mm`.
    pub fn add_appointment(
        &self,
        patient_id: i64,
        date: String,
        time: String,
        purpose: String,
        completed: bool,
    ) -> Result<i64, ClinicError> {
        let mut appointment = Appointment::new(
            patient_id,
            parse_date_arg(&date)?,
            parse_time_arg(&time)?,
            purpose,
        );
        appointment.completed = completed;
        validation::validate_appointment(&appointment)?;
        let db = self.db.lock()?;
        Ok(db.add_appointment(&appointment)?)
    }

    pub fn get_appointment(&self, id: i64) -> Result<Option<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        let appointment = db.get_appointment(id)?;
        Ok(appointment.map(|a| a.into()))
    }

    pub fn update_appointment(
        &self,
        id: i64,
        patient_id: i64,
        date: String,
        time: String,
        purpose: String,
        completed: bool,
    ) -> Result<bool, ClinicError> {
        let mut appointment = Appointment::new(
            patient_id,
            parse_date_arg(&date)?,
            parse_time_arg(&time)?,
            purpose,
        );
        appointment.id = id;
        appointment.completed = completed;
        validation::validate_appointment(&appointment)?;
        let db = self.db.lock()?;
        Ok(db.update_appointment(&appointment)?)
    }

    pub fn delete_appointment(&self, id: i64) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.delete_appointment(id)?)
    }

    /// Day schedule for `date` (`yyyy-MM-dd`).
    pub fn get_appointments_by_date(
        &self,
        date: String,
    ) -> Result<Vec<FfiAppointmentSlot>, ClinicError> {
        let date = parse_date_arg(&date)?;
        let db = self.db.lock()?;
        let slots = db.get_appointments_by_date(date)?;
        Ok(slots.into_iter().map(|s| s.into()).collect())
    }

    pub fn get_appointments_for_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        let appointments = db.get_appointments_for_patient(patient_id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    // =========================================================================
    // Treatment Operations
    // =========================================================================

    /// Record a treatment. Returns the assigned ID.
    pub fn add_treatment(
        &self,
        patient_id: i64,
        appointment_id: i64,
        notes: String,
        medications: Vec<String>,
    ) -> Result<i64, ClinicError> {
        let treatment = Treatment::new(patient_id, appointment_id, notes, medications);
        validation::validate_treatment(&treatment)?;
        let db = self.db.lock()?;
        Ok(db.add_treatment(&treatment)?)
    }

    /// Record a treatment from a raw `"a; b; c"` medication field.
    pub fn add_treatment_from_text(
        &self,
        patient_id: i64,
        appointment_id: i64,
        notes: String,
        medications: String,
    ) -> Result<i64, ClinicError> {
        let medications = codec::parse_medication_input(&medications);
        self.add_treatment(patient_id, appointment_id, notes, medications)
    }

    pub fn get_treatments_by_patient(
        &self,
        patient_id: i64,
    ) -> Result<Vec<FfiTreatment>, ClinicError> {
        let db = self.db.lock()?;
        let treatments = db.get_treatments_by_patient(patient_id)?;
        Ok(treatments.into_iter().map(|t| t.into()).collect())
    }

    /// Edit every treatment recorded for this patient/appointment pair.
    /// Returns how many were changed.
    pub fn update_treatment(
        &self,
        patient_id: i64,
        appointment_id: i64,
        notes: String,
        medications: Vec<String>,
    ) -> Result<u32, ClinicError> {
        let db = self.db.lock()?;
        let changed = db.update_treatment(patient_id, appointment_id, &notes, &medications)?;
        Ok(changed as u32)
    }

    /// Delete every treatment recorded for this patient/appointment pair.
    /// Returns how many were removed.
    pub fn delete_treatment(&self, patient_id: i64, appointment_id: i64) -> Result<u32, ClinicError> {
        let db = self.db.lock()?;
        let removed = db.delete_treatment(patient_id, appointment_id)?;
        Ok(removed as u32)
    }

    pub fn update_treatment_by_id(&self, treatment: FfiTreatment) -> Result<bool, ClinicError> {
        let treatment: Treatment = treatment.into();
        validation::validate_treatment(&treatment)?;
        let db = self.db.lock()?;
        Ok(db.update_treatment_by_id(&treatment)?)
    }

    pub fn delete_treatment_by_id(&self, id: i64) -> Result<bool, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.delete_treatment_by_id(id)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub contact: String,
    pub medical_history: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            age: patient.age,
            contact: patient.contact,
            medical_history: patient.medical_history,
        }
    }
}

/// FFI-safe appointment with ISO date and `HH:mm` time.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiAppointment {
    pub id: i64,
    pub patient_id: i64,
    pub date: String,
    pub time: String,
    pub purpose: String,
    pub completed: bool,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            date: appointment.date_text(),
            time: appointment.time_text(),
            purpose: appointment.purpose,
            completed: appointment.completed,
        }
    }
}

/// FFI-safe day schedule row.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiAppointmentSlot {
    pub time: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub purpose: String,
}

impl From<AppointmentSlot> for FfiAppointmentSlot {
    fn from(slot: AppointmentSlot) -> Self {
        Self {
            time: models::format_time(slot.time),
            patient_id: slot.patient_id,
            patient_name: slot.patient_name,
            purpose: slot.purpose,
        }
    }
}

/// FFI-safe treatment.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiTreatment {
    pub id: i64,
    pub patient_id: i64,
    pub appointment_id: i64,
    pub notes: String,
    pub medications: Vec<String>,
}

impl From<Treatment> for FfiTreatment {
    fn from(treatment: Treatment) -> Self {
        Self {
            id: treatment.id,
            patient_id: treatment.patient_id,
            appointment_id: treatment.appointment_id,
            notes: treatment.notes,
            medications: treatment.medications,
        }
    }
}

impl From<FfiTreatment> for Treatment {
    fn from(treatment: FfiTreatment) -> Self {
        Treatment {
            id: treatment.id,
            patient_id: treatment.patient_id,
            appointment_id: treatment.appointment_id,
            notes: treatment.notes,
            medications: treatment.medications,
        }
    }
}

/// FFI-safe dependent counts.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiDependents {
    pub appointments: u32,
    pub treatments: u32,
}

impl From<Dependents> for FfiDependents {
    fn from(dependents: Dependents) -> Self {
        Self {
            appointments: dependents.appointments as u32,
            treatments: dependents.treatments as u32,
        }
    }
}

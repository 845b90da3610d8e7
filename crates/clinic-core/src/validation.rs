//! Required-field checks performed before records reach the database.
//!
//! The database layer stores whatever it is given. These checks belong to
//! the caller collecting user input; the FFI facade runs them.

use thiserror::Error;

use crate::models::{Appointment, Patient, Treatment};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn require_id(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::InvalidValue {
            field,
            reason: format!("expected a positive ID, got {value}"),
        });
    }
    Ok(())
}

/// Name and contact must be filled in and age must be non-zero.
pub fn validate_patient(patient: &Patient) -> Result<(), ValidationError> {
    require_text("name", &patient.name)?;
    require_text("contact", &patient.contact)?;
    if patient.age == 0 {
        return Err(ValidationError::MissingField("age"));
    }
    Ok(())
}

pub fn validate_appointment(appointment: &Appointment) -> Result<(), ValidationError> {
    require_id("patient_id", appointment.patient_id)?;
    require_text("purpose", &appointment.purpose)
}

pub fn validate_treatment(treatment: &Treatment) -> Result<(), ValidationError> {
    require_id("patient_id", treatment.patient_id)?;
    require_id("appointment_id", treatment.appointment_id)?;
    require_text("notes", &treatment.notes)?;
    if treatment.medications.iter().all(|m| m.trim().is_empty()) {
        return Err(ValidationError::MissingField("medications"));
    }
    Ok(())
}

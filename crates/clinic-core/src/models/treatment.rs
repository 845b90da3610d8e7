//! Treatment models.

use serde::{Deserialize, Serialize};

/// Care administered during an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Treatment {
    /// Store-assigned row ID - 0 until first insert
    pub id: i64,
    pub patient_id: i64,
    pub appointment_id: i64,
    /// Clinician notes
    pub notes: String,
    /// Medications in the order they were entered
    pub medications: Vec<String>,
}

impl Treatment {
    /// Create a treatment that has not been persisted yet.
    pub fn new(
        patient_id: i64,
        appointment_id: i64,
        notes: String,
        medications: Vec<String>,
    ) -> Self {
        Self {
            id: 0,
            patient_id,
            appointment_id,
            notes,
            medications,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// The `(patient_id, appointment_id)` pair used by pair-addressed updates and deletes.
    pub fn pair(&self) -> (i64, i64) {
        (self.patient_id, self.appointment_id)
    }
}

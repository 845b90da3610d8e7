//! Patient models.

use serde::{Deserialize, Serialize};

/// A clinic patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patient {
    /// Store-assigned row ID - 0 until first insert
    pub id: i64,
    /// Full name
    pub name: String,
    /// Age in years
    pub age: u32,
    /// Phone number, email or address
    pub contact: String,
    /// Free-text medical history
    pub medical_history: String,
}

impl Patient {
    /// Create a patient that has not been persisted yet.
    pub fn new(name: String, age: u32, contact: String, medical_history: String) -> Self {
        Self {
            id: 0,
            name,
            age,
            contact,
            medical_history,
        }
    }

    /// Check if the store has assigned this patient an ID.
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

//! Treatment database operations.
//!
//! Pair-addressed updates and deletes match on `(patientId, appointmentId)`
//! and touch every row with that pair. The `_by_id` variants address a
//! single treatment.

use rusqlite::params;

use super::{Database, DbResult};
use crate::codec::{decode_medications, encode_medications};
use crate::models::Treatment;

impl Database {
    /// Insert a new treatment and return its store-assigned ID.
    pub fn add_treatment(&self, treatment: &Treatment) -> DbResult<i64> {
        self.logged("Failed to add treatment", || {
            self.conn.execute(
                r#"
                INSERT INTO Treatments (patientId, appointmentId, notes, medications)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    treatment.patient_id,
                    treatment.appointment_id,
                    treatment.notes,
                    encode_medications(&treatment.medications),
                ],
            )?;
            Ok(self.conn.last_insert_rowid())
        })
    }

    /// All treatments for a patient in insertion order.
    pub fn get_treatments_by_patient(&self, patient_id: i64) -> DbResult<Vec<Treatment>> {
        self.logged("Failed to fetch treatments", || {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT id, patientId, appointmentId, notes, medications
                FROM Treatments
                WHERE patientId = ?
                ORDER BY id
                "#,
            )?;

            let rows = stmt.query_map([patient_id], |row| {
                Ok(TreatmentRow {
                    id: row.get(0)?,
                    patient_id: row.get(1)?,
                    appointment_id: row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
                    notes: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    medications: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?;

            let mut treatments: Vec<Treatment> = Vec::new();
            for row in rows {
                treatments.push(row?.into());
            }
            Ok(treatments)
        })
    }

    /// Replace notes and medications on every treatment with this pair.
    ///
    /// Returns the number of rows changed (0 when none match).
    pub fn update_treatment<S: AsRef<str>>(
        &self,
        patient_id: i64,
        appointment_id: i64,
        notes: &str,
        medications: &[S],
    ) -> DbResult<usize> {
        self.logged("Failed to edit treatment", || {
            let rows_affected = self.conn.execute(
                r#"
                UPDATE Treatments SET
                    notes = ?3,
                    medications = ?4
                WHERE patientId = ?1 AND appointmentId = ?2
                "#,
                params![
                    patient_id,
                    appointment_id,
                    notes,
                    encode_medications(medications),
                ],
            )?;
            Ok(rows_affected)
        })
    }

    /// Delete every treatment with this pair. Returns the number removed.
    pub fn delete_treatment(&self, patient_id: i64, appointment_id: i64) -> DbResult<usize> {
        self.logged("Failed to delete treatment", || {
            let rows_affected = self.conn.execute(
                "DELETE FROM Treatments WHERE patientId = ? AND appointmentId = ?",
                params![patient_id, appointment_id],
            )?;
            Ok(rows_affected)
        })
    }

    /// Overwrite the treatment with `treatment.id`, including its pair.
    pub fn update_treatment_by_id(&self, treatment: &Treatment) -> DbResult<bool> {
        self.logged("Failed to edit treatment", || {
            let rows_affected = self.conn.execute(
                r#"
                UPDATE Treatments SET
                    patientId = ?2,
                    appointmentId = ?3,
                    notes = ?4,
                    medications = ?5
                WHERE id = ?1
                "#,
                params![
                    treatment.id,
                    treatment.patient_id,
                    treatment.appointment_id,
                    treatment.notes,
                    encode_medications(&treatment.medications),
                ],
            )?;
            Ok(rows_affected > 0)
        })
    }

    pub fn delete_treatment_by_id(&self, id: i64) -> DbResult<bool> {
        self.logged("Failed to delete treatment", || {
            let rows_affected = self
                .conn
                .execute("DELETE FROM Treatments WHERE id = ?", [id])?;
            Ok(rows_affected > 0)
        })
    }
}

/// Intermediate row struct for database mapping.
struct TreatmentRow {
    id: i64,
    patient_id: i64,
    appointment_id: i64,
    notes: String,
    medications: String,
}

impl From<TreatmentRow> for Treatment {
    fn from(row: TreatmentRow) -> Self {
        Treatment {
            id: row.id,
            patient_id: row.patient_id,
            appointment_id: row.appointment_id,
            notes: row.notes,
            medications: decode_medications(&row.medications),
        }
    }
}

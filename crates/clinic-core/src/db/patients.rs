//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, DeletePolicy};
use crate::models::Patient;

/// NULL cells read as empty text and age 0, as legacy rows may carry them.
fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    let age: Option<i64> = row.get(2)?;
    Ok(Patient {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        age: age.and_then(|age| u32::try_from(age).ok()).unwrap_or(0),
        contact: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        medical_history: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
    })
}

impl Database {
    /// Insert a new patient and return its store-assigned ID.
    ///
    /// `patient.id` is ignored.
    pub fn add_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.logged("Failed to add patient", || {
            self.conn.execute(
                r#"
                INSERT INTO Patients (name, age, contact, medicalHistory)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    patient.name,
                    patient.age,
                    patient.contact,
                    patient.medical_history,
                ],
            )?;
            let id = self.conn.last_insert_rowid();
            tracing::debug!(id, "Added patient");
            Ok(id)
        })
    }

    /// List all patients in insertion order.
    pub fn get_all_patients(&self) -> DbResult<Vec<Patient>> {
        self.logged("Failed to read patients", || {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT id, name, age, contact, medicalHistory
                FROM Patients
                ORDER BY id
                "#,
            )?;

            let rows = stmt.query_map([], patient_from_row)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        })
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.logged("Failed to read patient", || {
            self.conn
                .query_row(
                    r#"
                    SELECT id, name, age, contact, medicalHistory
                    FROM Patients
                    WHERE id = ?
                    "#,
                    [id],
                    patient_from_row,
                )
                .optional()
                .map_err(Into::into)
        })
    }

    /// Like [`Database::get_patient`] but a missing row is an error.
    pub fn require_patient(&self, id: i64) -> DbResult<Patient> {
        self.get_patient(id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {id}")))
    }

    /// Overwrite every field of the patient with `patient.id`.
    ///
    /// Returns `false` when no such patient exists; that is not an error.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        self.logged("Failed to edit patient", || {
            let rows_affected = self.conn.execute(
                r#"
                UPDATE Patients SET
                    name = ?2,
                    age = ?3,
                    contact = ?4,
                    medicalHistory = ?5
                WHERE id = ?1
                "#,
                params![
                    patient.id,
                    patient.name,
                    patient.age,
                    patient.contact,
                    patient.medical_history,
                ],
            )?;
            Ok(rows_affected > 0)
        })
    }

    /// Delete a patient.
    ///
    /// Appointments and treatments referencing the patient are handled per
    /// the configured [`DeletePolicy`]. Returns `false` when no such patient
    /// exists, without touching any other row.
    pub fn delete_patient(&self, id: i64) -> DbResult<bool> {
        let dependents = self.logged("Failed to delete patient", || {
            if !self.patient_exists(id)? {
                return Ok(None);
            }
            match self.delete_policy {
                DeletePolicy::Restrict => self.count_patient_dependents(id).map(Some),
                DeletePolicy::Orphan | DeletePolicy::Cascade => Ok(Some(Default::default())),
            }
        })?;
        let Some(dependents) = dependents else {
            return Ok(false);
        };
        if !dependents.is_empty() {
            tracing::info!(id, %dependents, "Refused patient delete");
            return Err(DbError::Referenced {
                entity: "patient",
                id,
                dependents,
            });
        }

        self.logged("Failed to delete patient", || {
            if self.delete_policy != DeletePolicy::Cascade {
                let rows_affected = self
                    .conn
                    .execute("DELETE FROM Patients WHERE id = ?", [id])?;
                return Ok(rows_affected > 0);
            }
            let tx = self.conn.unchecked_transaction()?;
            let treatments = tx.execute("DELETE FROM Treatments WHERE patientId = ?", [id])?;
            let appointments = tx.execute("DELETE FROM Appointments WHERE patientId = ?", [id])?;
            let rows_affected = tx.execute("DELETE FROM Patients WHERE id = ?", [id])?;
            tx.commit()?;
            tracing::info!(id, appointments, treatments, "Cascaded patient delete");
            Ok(rows_affected > 0)
        })
    }

    fn patient_exists(&self, id: i64) -> DbResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM Patients WHERE id = ?", [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}

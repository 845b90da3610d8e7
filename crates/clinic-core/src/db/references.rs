//! Cross-table references between patients, appointments and treatments.
//!
//! The store does not enforce foreign keys. This module makes the links
//! visible: dependent counts for a single record, and a [`ReferenceIndex`]
//! over the whole database listing rows whose target no longer exists.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Database, DbResult};

/// What deleting a patient or appointment does to rows that reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Delete only the target row; references are left dangling.
    #[default]
    Orphan,
    /// Delete the target and everything referencing it, in one transaction.
    Cascade,
    /// Refuse to delete while anything references the target.
    Restrict,
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orphan" => Ok(DeletePolicy::Orphan),
            "cascade" => Ok(DeletePolicy::Cascade),
            "restrict" => Ok(DeletePolicy::Restrict),
            other => Err(format!("Unknown delete policy: {other}")),
        }
    }
}

/// Rows referencing a patient or appointment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependents {
    pub appointments: usize,
    pub treatments: usize,
}

impl Dependents {
    pub fn is_empty(&self) -> bool {
        self.appointments == 0 && self.treatments == 0
    }
}

impl fmt::Display for Dependents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} appointment(s) and {} treatment(s)",
            self.appointments, self.treatments
        )
    }
}

/// Snapshot of every foreign reference in the database, keyed by target ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceIndex {
    /// Patient ID -> appointment IDs referencing it
    pub appointments_by_patient: BTreeMap<i64, Vec<i64>>,
    /// Patient ID -> treatment IDs referencing it
    pub treatments_by_patient: BTreeMap<i64, Vec<i64>>,
    /// Appointment ID -> treatment IDs referencing it
    pub treatments_by_appointment: BTreeMap<i64, Vec<i64>>,
    /// Appointments whose patient does not exist
    pub orphaned_appointments: Vec<i64>,
    /// Treatments whose patient or appointment does not exist
    pub orphaned_treatments: Vec<i64>,
}

impl ReferenceIndex {
    pub fn dependents_of_patient(&self, patient_id: i64) -> Dependents {
        Dependents {
            appointments: self
                .appointments_by_patient
                .get(&patient_id)
                .map_or(0, Vec::len),
            treatments: self
                .treatments_by_patient
                .get(&patient_id)
                .map_or(0, Vec::len),
        }
    }

    pub fn dependents_of_appointment(&self, appointment_id: i64) -> Dependents {
        Dependents {
            appointments: 0,
            treatments: self
                .treatments_by_appointment
                .get(&appointment_id)
                .map_or(0, Vec::len),
        }
    }

    pub fn has_orphans(&self) -> bool {
        !self.orphaned_appointments.is_empty() || !self.orphaned_treatments.is_empty()
    }
}

impl Database {
    /// Count appointments and treatments referencing a patient.
    pub fn dependents_of_patient(&self, patient_id: i64) -> DbResult<Dependents> {
        self.logged("Failed to count patient references", || {
            self.count_patient_dependents(patient_id)
        })
    }

    /// Count treatments referencing an appointment.
    pub fn dependents_of_appointment(&self, appointment_id: i64) -> DbResult<Dependents> {
        self.logged("Failed to count appointment references", || {
            self.count_appointment_dependents(appointment_id)
        })
    }

    /// Build a [`ReferenceIndex`] over all three tables.
    pub fn reference_index(&self) -> DbResult<ReferenceIndex> {
        self.logged("Failed to build reference index", || {
            let patient_ids = self.collect_ids("SELECT id FROM Patients")?;
            let appointment_ids = self.collect_ids("SELECT id FROM Appointments")?;

            let mut index = ReferenceIndex::default();

            let mut stmt = self
                .conn
                .prepare("SELECT id, patientId FROM Appointments ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
                ))
            })?;
            for row in rows {
                let (id, patient_id) = row?;
                index
                    .appointments_by_patient
                    .entry(patient_id)
                    .or_default()
                    .push(id);
                if !patient_ids.contains(&patient_id) {
                    index.orphaned_appointments.push(id);
                }
            }

            let mut stmt = self
                .conn
                .prepare("SELECT id, patientId, appointmentId FROM Treatments ORDER BY id")?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
                    row.get::<_, Option<i64>>(2)?.unwrap_or_default(),
                ))
            })?;
            for row in rows {
                let (id, patient_id, appointment_id) = row?;
                index
                    .treatments_by_patient
                    .entry(patient_id)
                    .or_default()
                    .push(id);
                index
                    .treatments_by_appointment
                    .entry(appointment_id)
                    .or_default()
                    .push(id);
                if !patient_ids.contains(&patient_id) || !appointment_ids.contains(&appointment_id)
                {
                    index.orphaned_treatments.push(id);
                }
            }

            if index.has_orphans() {
                tracing::debug!(
                    appointments = index.orphaned_appointments.len(),
                    treatments = index.orphaned_treatments.len(),
                    "Found dangling references"
                );
            }
            Ok(index)
        })
    }

    pub(super) fn count_patient_dependents(&self, patient_id: i64) -> DbResult<Dependents> {
        let appointments: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM Appointments WHERE patientId = ?",
            [patient_id],
            |row| row.get(0),
        )?;
        let treatments: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM Treatments WHERE patientId = ?",
            [patient_id],
            |row| row.get(0),
        )?;
        Ok(Dependents {
            appointments: appointments as usize,
            treatments: treatments as usize,
        })
    }

    pub(super) fn count_appointment_dependents(&self, appointment_id: i64) -> DbResult<Dependents> {
        let treatments: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM Treatments WHERE appointmentId = ?",
            [appointment_id],
            |row| row.get(0),
        )?;
        Ok(Dependents {
            appointments: 0,
            treatments: treatments as usize,
        })
    }

    fn collect_ids(&self, sql: &str) -> DbResult<BTreeSet<i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        ids.collect::<Result<BTreeSet<_>, _>>().map_err(Into::into)
    }
}

//! Appointment database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult, DeletePolicy};
use crate::models::{format_date, parse_date, parse_time, Appointment, AppointmentSlot};

impl Database {
    /// Insert a new appointment and return its store-assigned ID.
    ///
    /// The patient ID is stored as given; it is not checked against Patients.
    pub fn add_appointment(&self, appointment: &Appointment) -> DbResult<i64> {
        self.logged("Failed to add appointment", || {
            self.conn.execute(
                r#"
                INSERT INTO Appointments (patientId, date, time, purpose, completed)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    appointment.patient_id,
                    appointment.date_text(),
                    appointment.time_text(),
                    appointment.purpose,
                    appointment.completed,
                ],
            )?;
            Ok(self.conn.last_insert_rowid())
        })
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: i64) -> DbResult<Option<Appointment>> {
        self.logged("Failed to read appointment", || {
            self.conn
                .query_row(
                    r#"
                    SELECT id, patientId, date, time, purpose, completed
                    FROM Appointments
                    WHERE id = ?
                    "#,
                    [id],
                    AppointmentRow::from_row,
                )
                .optional()?
                .map(Appointment::try_from)
                .transpose()
        })
    }

    /// Overwrite every field of the appointment with `appointment.id`.
    ///
    /// Returns `false` when no such appointment exists.
    pub fn update_appointment(&self, appointment: &Appointment) -> DbResult<bool> {
        self.logged("Failed to edit appointment", || {
            let rows_affected = self.conn.execute(
                r#"
                UPDATE Appointments SET
                    patientId = ?2,
                    date = ?3,
                    time = ?4,
                    purpose = ?5,
                    completed = ?6
                WHERE id = ?1
                "#,
                params![
                    appointment.id,
                    appointment.patient_id,
                    appointment.date_text(),
                    appointment.time_text(),
                    appointment.purpose,
                    appointment.completed,
                ],
            )?;
            Ok(rows_affected > 0)
        })
    }

    /// Delete an appointment.
    ///
    /// Treatments referencing it are handled per the configured
    /// [`DeletePolicy`]. Returns `false` when no such appointment exists,
    /// without touching any treatment.
    pub fn delete_appointment(&self, id: i64) -> DbResult<bool> {
        let dependents = self.logged("Failed to delete appointment", || {
            if !self.appointment_exists(id)? {
                return Ok(None);
            }
            match self.delete_policy {
                DeletePolicy::Restrict => self.count_appointment_dependents(id).map(Some),
                DeletePolicy::Orphan | DeletePolicy::Cascade => Ok(Some(Default::default())),
            }
        })?;
        let Some(dependents) = dependents else {
            return Ok(false);
        };
        if !dependents.is_empty() {
            tracing::info!(id, %dependents, "Refused appointment delete");
            return Err(DbError::Referenced {
                entity: "appointment",
                id,
                dependents,
            });
        }

        self.logged("Failed to delete appointment", || {
            if self.delete_policy != DeletePolicy::Cascade {
                let rows_affected = self
                    .conn
                    .execute("DELETE FROM Appointments WHERE id = ?", [id])?;
                return Ok(rows_affected > 0);
            }
            let tx = self.conn.unchecked_transaction()?;
            let treatments = tx.execute("DELETE FROM Treatments WHERE appointmentId = ?", [id])?;
            let rows_affected = tx.execute("DELETE FROM Appointments WHERE id = ?", [id])?;
            tx.commit()?;
            tracing::info!(id, treatments, "Cascaded appointment delete");
            Ok(rows_affected > 0)
        })
    }

    fn appointment_exists(&self, id: i64) -> DbResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM Appointments WHERE id = ?", [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Day schedule: appointments on `date` joined with their patient's name.
    ///
    /// Appointments whose patient no longer exists are not listed.
    /// Ordered by time, then by appointment ID.
    pub fn get_appointments_by_date(&self, date: NaiveDate) -> DbResult<Vec<AppointmentSlot>> {
        self.logged("Failed to fetch appointments", || {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT a.time, a.patientId, p.name, a.purpose
                FROM Appointments a
                JOIN Patients p ON a.patientId = p.id
                WHERE a.date = ?
                ORDER BY a.time, a.id
                "#,
            )?;

            let rows = stmt.query_map([format_date(date)], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                ))
            })?;

            let mut slots = Vec::new();
            for row in rows {
                let (time, patient_id, patient_name, purpose) = row?;
                slots.push(AppointmentSlot {
                    time: parse_time(&time)
                        .map_err(|e| DbError::Decode(format!("appointment time {time:?}: {e}")))?,
                    patient_id,
                    patient_name,
                    purpose,
                });
            }
            Ok(slots)
        })
    }

    /// All appointments for a patient, oldest first.
    pub fn get_appointments_for_patient(&self, patient_id: i64) -> DbResult<Vec<Appointment>> {
        self.logged("Failed to fetch appointments", || {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT id, patientId, date, time, purpose, completed
                FROM Appointments
                WHERE patientId = ?
                ORDER BY date, time, id
                "#,
            )?;

            let rows = stmt.query_map([patient_id], AppointmentRow::from_row)?;

            let mut appointments: Vec<Appointment> = Vec::new();
            for row in rows {
                appointments.push(row?.try_into()?);
            }
            Ok(appointments)
        })
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: i64,
    patient_id: i64,
    date: String,
    time: String,
    purpose: String,
    completed: bool,
}

impl AppointmentRow {
    /// NULL text reads as empty and a NULL patient or flag as 0. An empty
    /// date or time then fails to decode like any other malformed value.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(AppointmentRow {
            id: row.get(0)?,
            patient_id: row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
            date: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            time: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            purpose: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            completed: row.get::<_, Option<bool>>(5)?.unwrap_or_default(),
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let date = parse_date(&row.date).map_err(|e| {
            DbError::Decode(format!("appointment {} date {:?}: {e}", row.id, row.date))
        })?;
        let time = parse_time(&row.time).map_err(|e| {
            DbError::Decode(format!("appointment {} time {:?}: {e}", row.id, row.time))
        })?;

        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            date,
            time,
            purpose: row.purpose,
            completed: row.completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, Treatment};
    use chrono::NaiveTime;

    fn setup_db() -> Database {
        let db = Database::open_in_memory_default().unwrap();
        // Create a test patient
        let patient = Patient::new("Alice".into(), 30, "555-1234".into(), "none".into());
        db.add_patient(&patient).unwrap();
        db
    }

    fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_add_and_get_appointment() {
        let db = setup_db();

        let mut appointment = Appointment::new(1, march_first(), at(9, 0), "checkup".into());
        appointment.id = db.add_appointment(&appointment).unwrap();
        assert_eq!(appointment.id, 1);

        let retrieved = db.get_appointment(appointment.id).unwrap().unwrap();
        assert_eq!(retrieved, appointment);

        let stored: (String, String, i64) = db
            .conn()
            .query_row(
                "SELECT date, time, completed FROM Appointments WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(stored, ("2024-03-01".into(), "09:00".into(), 0));
    }

    #[test]
    fn test_appointments_by_date() {
        let db = setup_db();
        db.add_appointment(&Appointment::new(1, march_first(), at(9, 0), "checkup".into()))
            .unwrap();

        let slots = db.get_appointments_by_date(march_first()).unwrap();
        assert_eq!(
            slots,
            vec![AppointmentSlot {
                time: at(9, 0),
                patient_id: 1,
                patient_name: "Alice".into(),
                purpose: "checkup".into(),
            }]
        );

        let next_day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert!(db.get_appointments_by_date(next_day).unwrap().is_empty());
    }

    #[test]
    fn test_appointments_by_date_sorted_by_time() {
        let db = setup_db();
        db.add_appointment(&Appointment::new(1, march_first(), at(14, 30), "follow-up".into()))
            .unwrap();
        db.add_appointment(&Appointment::new(1, march_first(), at(8, 15), "bloods".into()))
            .unwrap();

        let purposes: Vec<_> = db
            .get_appointments_by_date(march_first())
            .unwrap()
            .into_iter()
            .map(|slot| slot.purpose)
            .collect();
        assert_eq!(purposes, vec!["bloods", "follow-up"]);
    }

    #[test]
    fn test_appointments_by_date_excludes_missing_patient() {
        let db = setup_db();
        db.add_appointment(&Appointment::new(1, march_first(), at(9, 0), "checkup".into()))
            .unwrap();
        db.add_appointment(&Appointment::new(77, march_first(), at(10, 0), "walk-in".into()))
            .unwrap();

        let slots = db.get_appointments_by_date(march_first()).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].patient_id, 1);

        db.delete_patient(1).unwrap();
        assert!(db.get_appointments_by_date(march_first()).unwrap().is_empty());
    }

    #[test]
    fn test_update_appointment() {
        let db = setup_db();

        let mut appointment = Appointment::new(1, march_first(), at(9, 0), "checkup".into());
        appointment.id = db.add_appointment(&appointment).unwrap();

        appointment.time = at(11, 45);
        appointment.purpose = "O'Neill's referral".into();
        appointment.completed = true;
        assert!(db.update_appointment(&appointment).unwrap());

        let retrieved = db.get_appointment(appointment.id).unwrap().unwrap();
        assert_eq!(retrieved, appointment);
    }

    #[test]
    fn test_update_missing_appointment_is_noop() {
        let db = setup_db();
        let mut appointment = Appointment::new(1, march_first(), at(9, 0), "checkup".into());
        appointment.id = 5;
        assert!(!db.update_appointment(&appointment).unwrap());
    }

    #[test]
    fn test_delete_appointment() {
        let db = setup_db();
        let id = db
            .add_appointment(&Appointment::new(1, march_first(), at(9, 0), "checkup".into()))
            .unwrap();
        db.add_treatment(&Treatment::new(1, id, "rest".into(), vec!["ibuprofen".into()]))
            .unwrap();

        assert!(db.delete_appointment(id).unwrap());
        assert!(db.get_appointment(id).unwrap().is_none());
        assert!(!db.delete_appointment(id).unwrap());

        // Orphan policy leaves the treatment behind
        assert_eq!(db.get_treatments_by_patient(1).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_appointment_cascade_and_restrict() {
        let db = setup_db().with_delete_policy(DeletePolicy::Restrict);
        let id = db
            .add_appointment(&Appointment::new(1, march_first(), at(9, 0), "checkup".into()))
            .unwrap();
        db.add_treatment(&Treatment::new(1, id, "rest".into(), vec!["ibuprofen".into()]))
            .unwrap();

        assert!(matches!(
            db.delete_appointment(id),
            Err(DbError::Referenced { entity: "appointment", .. })
        ));
        assert!(db.get_appointment(id).unwrap().is_some());

        let db = db.with_delete_policy(DeletePolicy::Cascade);
        assert!(db.delete_appointment(id).unwrap());
        assert!(db.get_treatments_by_patient(1).unwrap().is_empty());
    }

    #[test]
    fn test_appointments_for_patient_ordered() {
        let db = setup_db();
        let later = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        db.add_appointment(&Appointment::new(1, later, at(9, 0), "review".into()))
            .unwrap();
        db.add_appointment(&Appointment::new(1, march_first(), at(9, 0), "checkup".into()))
            .unwrap();
        db.add_appointment(&Appointment::new(2, march_first(), at(9, 0), "other".into()))
            .unwrap();

        let appointments = db.get_appointments_for_patient(1).unwrap();
        let purposes: Vec<_> = appointments.iter().map(|a| a.purpose.as_str()).collect();
        assert_eq!(purposes, vec!["checkup", "review"]);
    }

    #[test]
    fn test_malformed_stored_date_is_decode_error() {
        let db = setup_db();
        db.conn()
            .execute(
                "INSERT INTO Appointments (patientId, date, time, purpose, completed) VALUES (1, 'soon', '09:00', 'x', 0)",
                [],
            )
            .unwrap();

        assert!(matches!(db.get_appointment(1), Err(DbError::Decode(_))));
    }

    #[test]
    fn test_delete_absent_appointment_leaves_treatments_alone() {
        for policy in [
            DeletePolicy::Orphan,
            DeletePolicy::Cascade,
            DeletePolicy::Restrict,
        ] {
            let db = setup_db();
            let id = db
                .add_appointment(&Appointment::new(1, march_first(), at(9, 0), "checkup".into()))
                .unwrap();
            db.add_treatment(&Treatment::new(1, id, "rest".into(), vec!["ibuprofen".into()]))
                .unwrap();
            assert!(db.delete_appointment(id).unwrap());

            let db = db.with_delete_policy(policy);
            assert!(!db.delete_appointment(id).unwrap(), "{policy:?}");
            assert_eq!(db.get_treatments_by_patient(1).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_null_cells_read_as_defaults() {
        let db = setup_db();
        db.add_appointment(&Appointment::new(1, march_first(), at(9, 0), "checkup".into()))
            .unwrap();
        db.conn()
            .execute(
                "INSERT INTO Appointments (patientId, date, time) VALUES (1, '2024-03-01', '10:00')",
                [],
            )
            .unwrap();

        let slots = db.get_appointments_by_date(march_first()).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].purpose, "");

        let appointment = db.get_appointment(2).unwrap().unwrap();
        assert_eq!(appointment.purpose, "");
        assert!(!appointment.completed);
        assert_eq!(db.get_appointments_for_patient(1).unwrap().len(), 2);
    }
}

//! SQLite schema definition.
//!
//! Table and column names match existing `clinic.db` files.

/// Complete database schema for clinic records.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS Patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    age INTEGER,
    contact TEXT,
    medicalHistory TEXT
);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS Appointments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patientId INTEGER,                          -- Patients.id, not enforced
    date TEXT,                                  -- yyyy-MM-dd
    time TEXT,                                  -- HH:mm
    purpose TEXT,
    completed INTEGER                           -- 0 or 1
);

CREATE INDEX IF NOT EXISTS idx_appointments_date ON Appointments(date);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON Appointments(patientId);

-- ============================================================================
-- Treatments
-- ============================================================================

CREATE TABLE IF NOT EXISTS Treatments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patientId INTEGER,                          -- Patients.id, not enforced
    appointmentId INTEGER,                      -- Appointments.id, not enforced
    notes TEXT,
    medications TEXT                            -- "a;b;" (see codec)
);

CREATE INDEX IF NOT EXISTS idx_treatments_pair ON Treatments(patientId, appointmentId);
CREATE INDEX IF NOT EXISTS idx_treatments_appointment ON Treatments(appointmentId);
"#;

//! Appointment models.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Storage format for appointment dates (`yyyy-MM-dd`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage format for appointment times (`HH:mm`).
pub const TIME_FORMAT: &str = "%H:%M";

/// A scheduled visit for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    /// Store-assigned row ID - 0 until first insert
    pub id: i64,
    /// Referenced patient. Not checked for existence.
    pub patient_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Reason for the visit
    pub purpose: String,
    pub completed: bool,
}

impl Appointment {
    /// Create an open (not completed) appointment that has not been persisted yet.
    pub fn new(patient_id: i64, date: NaiveDate, time: NaiveTime, purpose: String) -> Self {
        Self {
            id: 0,
            patient_id,
            date,
            time,
            purpose,
            completed: false,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Date as stored (`2024-03-01`).
    pub fn date_text(&self) -> String {
        format_date(self.date)
    }

    /// Time as stored (`09:00`).
    pub fn time_text(&self) -> String {
        format_time(self.time)
    }
}

/// One row of the day schedule: an appointment joined with its patient's name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentSlot {
    pub time: NaiveTime,
    pub patient_id: i64,
    pub patient_name: String,
    pub purpose: String,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
}

/// Parse a stored time. Rows written with seconds (`09:00:00`) are accepted too.
pub fn parse_time(text: &str) -> Result<NaiveTime, chrono::ParseError> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
}

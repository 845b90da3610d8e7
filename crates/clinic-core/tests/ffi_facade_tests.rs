//! FFI facade tests.

use clinic_core::{open_clinic, open_clinic_in_memory, ClinicError, FfiTreatment};

#[test]
fn test_patient_lifecycle() {
    let core = open_clinic_in_memory().unwrap();
    assert!(!core.is_degraded().unwrap());

    let id = core
        .add_patient("Alice".into(), 30, "555-1234".into(), "none".into())
        .unwrap();
    assert_eq!(id, 1);

    assert!(core
        .update_patient(id, "Alice Smith".into(), 31, "555-1234".into(), "none".into())
        .unwrap());
    let patient = core.get_patient(id).unwrap().unwrap();
    assert_eq!(patient.name, "Alice Smith");
    assert_eq!(patient.age, 31);

    assert!(core.delete_patient(id).unwrap());
    assert!(core.get_all_patients().unwrap().is_empty());
}

#[test]
fn test_missing_fields_rejected_before_storage() {
    let core = open_clinic_in_memory().unwrap();

    let err = core
        .add_patient("  ".into(), 30, "555-1234".into(), "".into())
        .unwrap_err();
    assert!(matches!(err, ClinicError::InvalidInput(_)));

    let err = core
        .add_patient("Alice".into(), 0, "555-1234".into(), "".into())
        .unwrap_err();
    assert!(matches!(err, ClinicError::InvalidInput(_)));

    assert!(core.get_all_patients().unwrap().is_empty());
}

#[test]
fn test_appointment_strings() {
    let core = open_clinic_in_memory().unwrap();
    core.add_patient("Alice".into(), 30, "555-1234".into(), "none".into())
        .unwrap();

    let id = core
        .add_appointment(1, "2024-03-01".into(), "09:00".into(), "checkup".into(), false)
        .unwrap();

    let slots = core.get_appointments_by_date("2024-03-01".into()).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].time, "09:00");
    assert_eq!(slots[0].patient_name, "Alice");

    assert!(core
        .update_appointment(id, 1, "2024-03-02".into(), "10:30".into(), "checkup".into(), true)
        .unwrap());
    let appointment = core.get_appointment(id).unwrap().unwrap();
    assert_eq!(appointment.date, "2024-03-02");
    assert_eq!(appointment.time, "10:30");
    assert!(appointment.completed);
    assert_eq!(core.get_appointments_for_patient(1).unwrap().len(), 1);

    let err = core
        .add_appointment(1, "March 1st".into(), "09:00".into(), "checkup".into(), false)
        .unwrap_err();
    assert!(matches!(err, ClinicError::InvalidInput(_)));

    assert!(core.delete_appointment(id).unwrap());
    assert!(core.get_appointment(id).unwrap().is_none());
}

#[test]
fn test_treatment_from_text_and_pair_edits() {
    let core = open_clinic_in_memory().unwrap();

    let first = core
        .add_treatment_from_text(1, 1, "rest advised".into(), " ibuprofen ; vitamin-d ;".into())
        .unwrap();
    core.add_treatment(1, 1, "second".into(), vec!["zinc".into()])
        .unwrap();

    let treatments = core.get_treatments_by_patient(1).unwrap();
    assert_eq!(treatments[0].medications, vec!["ibuprofen", "vitamin-d"]);

    assert_eq!(
        core.update_treatment(1, 1, "revised".into(), vec!["paracetamol".into()])
            .unwrap(),
        2
    );

    assert!(core
        .update_treatment_by_id(FfiTreatment {
            id: first,
            patient_id: 1,
            appointment_id: 1,
            notes: "single edit".into(),
            medications: vec!["aspirin".into()],
        })
        .unwrap());
    let notes: Vec<_> = core
        .get_treatments_by_patient(1)
        .unwrap()
        .into_iter()
        .map(|t| t.notes)
        .collect();
    assert_eq!(notes, vec!["single edit", "revised"]);

    assert!(core.delete_treatment_by_id(first).unwrap());
    assert_eq!(core.delete_treatment(1, 1).unwrap(), 1);
    assert!(core.get_treatments_by_patient(1).unwrap().is_empty());

    let err = core
        .add_treatment_from_text(1, 1, "notes".into(), " ; ".into())
        .unwrap_err();
    assert!(matches!(err, ClinicError::InvalidInput(_)));
}

#[test]
fn test_restrict_policy_from_file_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("clinic.json");
    std::fs::write(
        &config_path,
        serde_json::json!({
            "database_path": dir.path().join("clinic.db"),
            "diagnostic_log_path": dir.path().join("clinic_debug.log"),
            "delete_policy": "restrict",
        })
        .to_string(),
    )
    .unwrap();

    let config = clinic_core::ClinicConfig::from_json_file(&config_path).unwrap();
    let core = clinic_core::open_with_config(&config).unwrap();

    let patient = core
        .add_patient("Alice".into(), 30, "555-1234".into(), "none".into())
        .unwrap();
    core.add_appointment(patient, "2024-03-01".into(), "09:00".into(), "checkup".into(), false)
        .unwrap();

    let dependents = core.dependents_of_patient(patient).unwrap();
    assert_eq!(dependents.appointments, 1);

    let err = core.delete_patient(patient).unwrap_err();
    match err {
        ClinicError::Referenced(message) => {
            assert!(message.starts_with("patient 1 is still referenced by 1 appointment(s)"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(core.get_all_patients().unwrap().len(), 1);

    // Refusals are not storage failures, so the diagnostic log stays empty
    let log = std::fs::read_to_string(dir.path().join("clinic_debug.log")).unwrap();
    assert!(log.is_empty());
}

#[test]
fn test_open_clinic_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("clinic.db");
    let log_path = dir.path().join("clinic_debug.log");

    {
        let core = open_clinic(
            db_path.display().to_string(),
            log_path.display().to_string(),
        )
        .unwrap();
        core.add_patient("Alice".into(), 30, "555-1234".into(), "none".into())
            .unwrap();
    }

    let core = open_clinic(
        db_path.display().to_string(),
        log_path.display().to_string(),
    )
    .unwrap();
    assert_eq!(core.get_all_patients().unwrap().len(), 1);
}

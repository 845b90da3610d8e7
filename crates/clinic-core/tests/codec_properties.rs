//! Property tests for the medication codec.

use clinic_core::codec::{decode_medications, encode_medications, parse_medication_input};
use proptest::prelude::*;

/// Medication names as a clinician would type them: no delimiter, no
/// surrounding whitespace, never empty.
fn medication_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9'\\-]([A-Za-z0-9' ,.\\-/]{0,20}[A-Za-z0-9'\\-])?"
}

proptest! {
    #[test]
    fn decode_inverts_encode(medications in prop::collection::vec(medication_name(), 0..8)) {
        let encoded = encode_medications(&medications);
        prop_assert_eq!(decode_medications(&encoded), medications);
    }

    #[test]
    fn encoded_form_ends_with_delimiter(medications in prop::collection::vec(medication_name(), 1..8)) {
        let encoded = encode_medications(&medications);
        prop_assert!(encoded.ends_with(';'));
        prop_assert_eq!(encoded.matches(';').count(), medications.len());
    }

    #[test]
    fn parsed_input_round_trips(medications in prop::collection::vec(medication_name(), 0..8)) {
        let typed = medications.join(" ; ");
        let parsed = parse_medication_input(&typed);
        prop_assert_eq!(decode_medications(&encode_medications(&parsed)), medications);
    }
}

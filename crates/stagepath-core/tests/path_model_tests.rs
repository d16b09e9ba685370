use pretty_assertions::assert_eq;
use serde_json::json;
use stagepath_core::{
    normalize, normalize_json, reconcile, FieldReference, FieldValue, PathError, PathState,
    RecordId, RecordSnapshot, SourceError, SubTypeId,
};
use stagepath_test_utils::stage_options;

#[test]
fn parse_scenarios() {
    let field = FieldReference::parse("Account.Rating").unwrap();
    assert_eq!((field.entity(), field.field()), ("Account", "Rating"));

    assert!(matches!(
        FieldReference::parse("Rating"),
        Err(PathError::InvalidFieldReference { .. })
    ));
}

#[test]
fn new_qualified_closed_scenario() {
    let options = stage_options(&["New", "Qualified", "Closed"]);
    let steps = reconcile(Some(options.as_slice()), Some("Qualified"));

    let flags: Vec<_> = steps
        .iter()
        .map(|s| (s.value.as_str(), s.is_completed, s.is_current))
        .collect();
    assert_eq!(
        flags,
        [
            ("New", true, false),
            ("Qualified", false, true),
            ("Closed", false, false),
        ]
    );
}

#[test]
fn steps_serialize_for_renderers() {
    let options = stage_options(&["New"]);
    let steps = reconcile(Some(options.as_slice()), Some("New"));
    assert_eq!(
        serde_json::to_value(&steps).unwrap(),
        json!([{
            "value": "New",
            "label": "New",
            "isCurrent": true,
            "isCompleted": false,
            "styleClass": "slds-path__item slds-is-current slds-is-active"
        }])
    );
}

#[test]
fn normalize_structured_and_plain_errors() {
    let structured = SourceError::read(["Field is read only", "Record is locked"]);
    let plain = SourceError::plain("Network request failed");

    assert_eq!(
        normalize([Some(&structured), Some(&plain)]),
        [
            "Field is read only",
            "Record is locked",
            "Network request failed"
        ]
    );
}

#[test]
fn normalize_raw_payloads() {
    let payload = json!([
        {"body": [{"message": "Field is read only"}, {"message": ""}]},
        null,
        {"body": {"message": "Record is locked"}},
        {"statusText": ""},
        {"message": "Network request failed"}
    ]);
    assert_eq!(
        normalize_json(&payload),
        [
            "Field is read only",
            "Record is locked",
            "Network request failed"
        ]
    );
}

#[test]
fn state_recomputes_on_either_input() {
    let mut state = PathState::new(FieldReference::parse("Case.Status").unwrap());
    let record = |status: &str| {
        RecordSnapshot::new(RecordId::new("500A"))
            .with_sub_type(SubTypeId::new("RT"))
            .with_field("Status", FieldValue::of(status))
    };

    state.apply_record(Ok(record("Working"))).unwrap();
    state
        .apply_value_set(
            SubTypeId::new("RT"),
            Ok(stage_options(&["New", "Working", "Escalated", "Closed"])),
        )
        .unwrap();
    assert_eq!(state.view().current().unwrap().value, "Working");

    state.apply_record(Ok(record("Closed"))).unwrap();
    assert_eq!(state.view().completed().count(), 3);

    state
        .apply_value_set(SubTypeId::new("RT"), Ok(stage_options(&["Closed", "New"])))
        .unwrap();
    assert_eq!(state.view().completed().count(), 0);
    assert!(state.view().steps[0].is_current);
}

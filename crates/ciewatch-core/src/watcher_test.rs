use super::*;

fn office(date: &str) -> AvailabilityRecord {
    AvailabilityRecord::new("Municipio I - Via X", "VIA DELLA GREGORIANA 3", date)
}

#[test]
fn first_sighting_is_new() {
    let mut state = WatcherState::new();
    let event = state.observe("centro", &office("10/01/2025")).unwrap();
    assert_eq!(event.target_key, "centro");
    assert_eq!(event.record.date_text, "10/01/2025");
    assert_eq!(state.last_seen("centro"), Some("10/01/2025"));
}

#[test]
fn notifies_only_when_date_changes() {
    let target = Target::new("Municipio I").with_key("centro");
    let targets = vec![target];
    let mut state = WatcherState::new();

    let cycles: Vec<Vec<AvailabilityRecord>> = vec![
        vec![office("10/01/2025")],
        vec![office("10/01/2025")],
        vec![office("12/01/2025")],
        vec![],
        vec![office("12/01/2025")],
    ];
    let fired: Vec<bool> = cycles
        .iter()
        .map(|records| !detect_new_slots(&mut state, &targets, records, SelectionMode::First).is_empty())
        .collect();

    assert_eq!(fired, vec![true, false, true, false, false]);
    assert_eq!(state.last_seen("centro"), Some("12/01/2025"));
}

#[test]
fn empty_cycle_does_not_clear_memory() {
    let targets = vec![Target::new("Municipio I")];
    let mut state = WatcherState::new();
    detect_new_slots(&mut state, &targets, &[office("10/01/2025")], SelectionMode::First);
    let events = detect_new_slots(&mut state, &targets, &[], SelectionMode::First);
    assert!(events.is_empty());
    assert_eq!(state.last_seen("Municipio I"), Some("10/01/2025"));
}

#[test]
fn only_last_value_is_remembered() {
    let mut state = WatcherState::new();
    assert!(state.observe("k", &office("10/01/2025")).is_some());
    assert!(state.observe("k", &office("12/01/2025")).is_some());
    // Going back to an earlier date fires again: no history is kept.
    assert!(state.observe("k", &office("10/01/2025")).is_some());
    assert_eq!(state.len(), 1);
}

#[test]
fn comparison_uses_trimmed_text() {
    let mut state = WatcherState::new();
    assert!(state.observe("k", &office("10/01/2025")).is_some());
    let padded = AvailabilityRecord {
        date_text: "  10/01/2025 ".to_string(),
        ..office("10/01/2025")
    };
    assert!(state.observe("k", &padded).is_none());
}

#[test]
fn distinct_targets_are_tracked_independently() {
    let targets = vec![Target::new("Municipio I -"), Target::new("Municipio II")];
    let records = vec![
        AvailabilityRecord::new("Municipio I - Via X", "Via X", "15/03/2025"),
        AvailabilityRecord::new("Municipio II - Via Y", "Via Y", "15/03/2025"),
    ];
    let mut state = WatcherState::new();
    let events = detect_new_slots(&mut state, &targets, &records, SelectionMode::First);
    assert_eq!(events.len(), 2);
    assert_eq!(state.last_seen("Municipio I -"), Some("15/03/2025"));
    assert_eq!(state.last_seen("Municipio II"), Some("15/03/2025"));
}

#[test]
fn single_target_mode_picks_first_candidate() {
    let targets = vec![Target::new("Municipio I")];
    let records = vec![
        AvailabilityRecord::new("Municipio I - Via X", "Via X", "Non disponibile"),
        AvailabilityRecord::new("Municipio I - Via X", "Via X", "15/03/2025"),
        AvailabilityRecord::new("Municipio I - Sede 2", "Via Z", "01/03/2025"),
    ];
    let mut state = WatcherState::new();
    let events = detect_new_slots(&mut state, &targets, &records, SelectionMode::First);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].record.date_text, "15/03/2025");
}

#[test]
fn all_mode_tracks_each_office_under_the_target() {
    let targets = vec![Target::new("Municipio I").with_key("roma")];
    let records = vec![
        AvailabilityRecord::new("Municipio I - Via X", "Via X", "15/03/2025"),
        AvailabilityRecord::new("Municipio I - Sede 2", "Via Z", "01/03/2025"),
    ];
    let mut state = WatcherState::new();
    let events = detect_new_slots(&mut state, &targets, &records, SelectionMode::All);
    assert_eq!(events.len(), 2);
    assert_eq!(state.last_seen("roma/Municipio I - Via X"), Some("15/03/2025"));
    assert_eq!(state.last_seen("roma/Municipio I - Sede 2"), Some("01/03/2025"));

    let again = detect_new_slots(&mut state, &targets, &records, SelectionMode::All);
    assert!(again.is_empty());
}

#[test]
fn state_round_trips_through_json_as_a_plain_map() {
    let state: WatcherState = [("centro".to_string(), "10/01/2025".to_string())]
        .into_iter()
        .collect();
    let json = serde_json::to_string(&state).unwrap();
    assert_eq!(json, r#"{"centro":"10/01/2025"}"#);
    let back: WatcherState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}

use super::*;

fn record(name: &str, address: &str, date: &str) -> AvailabilityRecord {
    AvailabilityRecord::new(name, address, date)
}

fn sample() -> Vec<AvailabilityRecord> {
    vec![
        record("Municipio I - Via X", "VIA DELLA GREGORIANA 3", "15/03/2025"),
        record("Municipio II - Via Y", "VIA DIRCE 18", "16/03/2025"),
        record("Municipio I - Sede 2", "VIA PETROSELLI 50", "Non disponibile"),
        record("Municipio I - Sede 3", "VIA PETROSELLI 50", "18/03/2025"),
        record("municipio i - lower", "VIA PETROSELLI 50", "19/03/2025"),
    ]
}

#[test]
fn well_formed_date_accepts_dd_mm_yyyy() {
    assert!(is_well_formed_date("15/03/2025"));
    assert!(is_well_formed_date("Prima data: 15/03/2025 ore 09:00"));
}

#[test]
fn well_formed_date_is_format_only() {
    assert!(is_well_formed_date("32/13/2025"));
}

#[test]
fn well_formed_date_rejects_placeholders() {
    assert!(!is_well_formed_date("Non disponibile"));
    assert!(!is_well_formed_date(""));
    assert!(!is_well_formed_date("-"));
    assert!(!is_well_formed_date("5/3/2025"));
    assert!(!is_well_formed_date("15/03/25"));
    assert!(!is_well_formed_date("2025-03-15"));
}

#[test]
fn matches_requires_all_three_predicates() {
    let criteria = FilterCriteria::new("Municipio I", "GREGORIANA");
    assert!(criteria.matches(&record("Municipio I - Via X", "VIA DELLA GREGORIANA 3", "15/03/2025")));
    assert!(!criteria.matches(&record("Municipio I - Via X", "VIA DIRCE 18", "15/03/2025")));
    assert!(!criteria.matches(&record("Municipio V", "VIA DELLA GREGORIANA 3", "15/03/2025")));
    assert!(!criteria.matches(&record("Municipio I - Via X", "VIA DELLA GREGORIANA 3", "Non disponibile")));
}

#[test]
fn name_match_is_a_plain_substring() {
    let criteria = FilterCriteria::new("Municipio I", "GREGORIANA");
    assert!(criteria.matches(&record("Municipio III", "VIA DELLA GREGORIANA 3", "15/03/2025")));
    assert!(criteria.matches(&record("Municipio II - Via Y", "VIA DELLA GREGORIANA 3", "15/03/2025")));
}

#[test]
fn name_match_is_case_sensitive() {
    let records = sample();
    let criteria = FilterCriteria::new("Municipio I", "");
    let hits = filter_candidates(&records, &criteria);
    assert!(hits.iter().all(|r| r.office_name.starts_with("Municipio I")));
    assert!(!hits.iter().any(|r| r.office_name.starts_with("municipio")));
}

#[test]
fn filter_result_is_subset_satisfying_predicates() {
    let records = sample();
    let criteria = FilterCriteria::new("Municipio I", "");
    let hits = filter_candidates(&records, &criteria);

    // "Municipio II" contains "Municipio I" as a substring.
    assert_eq!(hits.len(), 3);
    for hit in &hits {
        assert!(records.contains(hit));
        assert!(criteria.matches(hit));
    }
    for rejected in records.iter().filter(|r| !hits.contains(r)) {
        assert!(!criteria.matches(rejected));
    }
}

#[test]
fn filter_preserves_source_order() {
    let records = sample();
    let criteria = FilterCriteria::new("Municipio I", "VIA PETROSELLI");
    let hits = filter_candidates(&records, &criteria);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].office_name, "Municipio I - Sede 3");
}

#[test]
fn first_candidate_is_first_in_source_order() {
    let records = sample();
    let criteria = FilterCriteria::new("Municipio I", "");
    let first = first_candidate(&records, &criteria).unwrap();
    assert_eq!(first.office_name, "Municipio I - Via X");
}

#[test]
fn first_candidate_none_when_nothing_matches() {
    let records = sample();
    let criteria = FilterCriteria::new("Municipio XV", "");
    assert!(first_candidate(&records, &criteria).is_none());
}

#[test]
fn custom_date_pattern() {
    let criteria = FilterCriteria::new("", "")
        .with_date_pattern(r"^\d{4}-\d{2}-\d{2}$")
        .unwrap();
    assert!(criteria.matches(&record("A", "B", "2025-03-15")));
    assert!(!criteria.matches(&record("A", "B", "15/03/2025")));
}

#[test]
fn invalid_custom_date_pattern_is_an_error() {
    assert!(FilterCriteria::new("", "").with_date_pattern("(").is_err());
}

use super::*;

fn row(cells: &[&str]) -> RowCells {
    cells.iter().map(|c| (*c).to_string()).collect()
}

fn portal_rows() -> Vec<RowCells> {
    vec![
        row(&[
            " Municipio I - Via X ",
            "VIA DELLA GREGORIANA 3",
            "ROMA",
            "15/03/2025 ",
            "Prenota",
        ]),
        row(&["Municipio II - Via Y", "VIA DIRCE 18", "ROMA", "Non disponibile"]),
    ]
}

#[test]
fn default_layout_needs_four_cells() {
    assert_eq!(ColumnLayout::default().min_cells(), 4);
}

#[test]
fn table_rows_map_named_fields_and_trim() {
    let records = extract_table_rows(&portal_rows(), &ColumnLayout::default());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].office_name, "Municipio I - Via X");
    assert_eq!(records[0].office_address, "VIA DELLA GREGORIANA 3");
    assert_eq!(records[0].date_text, "15/03/2025");
    assert_eq!(records[0].raw_cells.len(), 5);
    assert_eq!(records[0].raw_cells[0], "Municipio I - Via X");
    assert_eq!(records[1].date_text, "Non disponibile");
}

#[test]
fn row_with_exactly_min_cells_is_extracted() {
    let rows = vec![row(&["Sede", "Via", "ROMA", "01/02/2025"])];
    let records = extract_table_rows(&rows, &ColumnLayout::default());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date_text, "01/02/2025");
}

#[test]
fn row_one_cell_short_is_skipped() {
    let rows = vec![
        row(&["Sede", "Via", "ROMA"]),
        row(&["Sede 2", "Via 2", "ROMA", "02/02/2025"]),
    ];
    let records = extract_table_rows(&rows, &ColumnLayout::default());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].office_name, "Sede 2");
}

#[test]
fn custom_layout() {
    let layout = ColumnLayout {
        office_name: 1,
        office_address: 2,
        date: 0,
    };
    assert_eq!(layout.min_cells(), 3);
    let records = extract_table_rows(&[row(&["03/03/2025", "Sede", "Via"])], &layout);
    assert_eq!(records[0].office_name, "Sede");
    assert_eq!(records[0].date_text, "03/03/2025");
}

#[test]
fn extraction_is_idempotent() {
    let rendered = RenderedAvailability::Table(portal_rows());
    let first = extract(&rendered, &ColumnLayout::default()).unwrap();
    let second = extract(&rendered, &ColumnLayout::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn response_array_maps_named_fields() {
    let body = serde_json::json!([
        {
            "officeName": "Municipio I - Via X",
            "officeAddress": "VIA DELLA GREGORIANA 3",
            "availabilityText": "15/03/2025"
        },
        {
            "sede": "Municipio II - Via Y",
            "indirizzo": "VIA DIRCE 18",
            "primaDisponibilita": null
        }
    ])
    .to_string();
    let records = extract_response_body(&body).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].office_name, "Municipio I - Via X");
    assert_eq!(records[0].date_text, "15/03/2025");
    assert_eq!(records[1].office_address, "VIA DIRCE 18");
    assert_eq!(records[1].date_text, "");
}

#[test]
fn response_wrapped_array_is_found() {
    let body = serde_json::json!({
        "esito": "OK",
        "data": [
            { "officeName": "Sede", "officeAddress": "Via", "availabilityText": "01/01/2026" }
        ]
    })
    .to_string();
    let records = extract_response_body(&body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].raw_cells, vec!["Sede", "Via", "01/01/2026"]);
}

#[test]
fn response_objects_missing_fields_are_skipped() {
    let body = serde_json::json!([
        { "officeName": "Sede senza indirizzo", "availabilityText": "01/01/2026" },
        { "officeName": "Sede", "officeAddress": "Via", "availabilityText": "02/01/2026" },
        "not an object"
    ])
    .to_string();
    let records = extract_response_body(&body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].office_name, "Sede");
}

#[test]
fn response_without_array_is_empty() {
    let records = extract_response_body(r#"{"esito":"KO"}"#).unwrap();
    assert!(records.is_empty());
}

#[test]
fn response_that_is_not_json_is_an_error() {
    let err = extract_response_body("<html>maintenance</html>").unwrap_err();
    assert!(matches!(err, WizardError::MalformedResponse { .. }), "{err:?}");
}

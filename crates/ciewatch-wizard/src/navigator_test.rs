use super::*;
use crate::scripted::ScriptedPage;

fn config(mode: ExtractionMode) -> NavigatorConfig {
    NavigatorConfig {
        start_url: "https://portal.test/home".to_string(),
        inputs: FormInputs::default(),
        step_timeout: Duration::from_millis(200),
        availability_timeout: Duration::from_millis(200),
        typing_delay: Duration::ZERO,
        extraction_mode: mode,
        availability_endpoint: "disponibilita".to_string(),
    }
}

fn journal(page: &ScriptedPage) -> Vec<String> {
    page.journal().lock().unwrap().clone()
}

#[tokio::test]
async fn dom_mode_reaches_availability_loaded() {
    let mut page =
        ScriptedPage::new().with_rows(vec![vec!["Municipio I", "Via X", "ROMA", "15/03/2025"]]);
    let cfg = config(ExtractionMode::Dom);
    let mut nav = FormNavigator::new(&mut page, &cfg);

    let outcome = nav.run().await.unwrap();
    assert_eq!(nav.state(), NavigationState::AvailabilityLoaded);
    let rows = match outcome {
        NavigationOutcome::Loaded(RenderedAvailability::Table(rows)) => rows,
        other => panic!("expected a loaded table, got {other:?}"),
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][3], "15/03/2025");
}

#[tokio::test]
async fn steps_run_in_wizard_order() {
    let mut page = ScriptedPage::new().with_rows(vec![]);
    let cfg = config(ExtractionMode::Dom);
    FormNavigator::new(&mut page, &cfg).run().await.unwrap();

    let log = journal(&page);
    let expected = [
        "goto https://portal.test/home".to_string(),
        format!("wait {}", selectors::IDENTITY_FORM),
        format!("set {}=1", selectors::IDENTITY_FORM),
        format!("set {}=Mario", selectors::FIRST_NAME),
        format!("set {}=Rossi", selectors::LAST_NAME),
        format!("set {}=RSSMRA80A01H501X", selectors::FISCAL_CODE),
        format!("remove-attr {} disabled", selectors::SUBMIT),
        format!("click {}", selectors::SUBMIT),
        format!("wait-url {}", selectors::LOCATION_ROUTE),
        format!("remove {}", selectors::OVERLAYS),
        format!("type {}=ROMA", selectors::LOCATION_INPUT),
        format!("click-text {}=ROMA", selectors::LOCATION_SUGGESTION),
        format!("remove-attr {} disabled", selectors::SUBMIT),
        format!("click {}", selectors::SUBMIT),
        format!("wait {}", selectors::OFFICE_ROW_MARKER),
        format!("rows {}", selectors::OFFICE_ROW_MARKER),
    ];
    assert_eq!(log, expected);
}

#[tokio::test]
async fn missing_marker_is_empty_not_an_error() {
    let mut page = ScriptedPage::new();
    let cfg = config(ExtractionMode::Dom);
    let mut nav = FormNavigator::new(&mut page, &cfg);

    let outcome = nav.run().await.unwrap();
    assert_eq!(outcome, NavigationOutcome::Empty);
    assert_eq!(nav.state(), NavigationState::Failed);
}

#[tokio::test]
async fn identity_form_timeout_is_tagged_with_step() {
    let mut page = ScriptedPage::new().stalling_on(selectors::IDENTITY_FORM);
    let cfg = config(ExtractionMode::Dom);
    let mut nav = FormNavigator::new(&mut page, &cfg);

    let err = nav.run().await.unwrap_err();
    assert!(
        matches!(err, WizardError::NavigationTimeout { step: WizardStep::Identity, .. }),
        "expected identity timeout, got: {err:?}"
    );
    assert!(err.is_transient());
    assert_eq!(nav.state(), NavigationState::Failed);
}

#[tokio::test]
async fn location_route_timeout_is_tagged_with_step() {
    let mut page = ScriptedPage::new().stalling_on(selectors::LOCATION_ROUTE);
    let cfg = config(ExtractionMode::Dom);
    let err = FormNavigator::new(&mut page, &cfg).run().await.unwrap_err();
    assert_eq!(err.step(), Some(WizardStep::Location));
    assert!(err.is_transient());
}

#[tokio::test]
async fn non_timeout_failure_is_step_failed() {
    let mut page = ScriptedPage::new().failing_on(selectors::LOCATION_INPUT);
    let cfg = config(ExtractionMode::Dom);
    let err = FormNavigator::new(&mut page, &cfg).run().await.unwrap_err();
    assert!(
        matches!(err, WizardError::StepFailed { step: WizardStep::Location, .. }),
        "expected location step failure, got: {err:?}"
    );
    assert!(!err.is_transient());
}

#[tokio::test]
async fn failure_stops_further_steps() {
    let mut page = ScriptedPage::new().stalling_on(selectors::IDENTITY_FORM);
    let cfg = config(ExtractionMode::Dom);
    let _ = FormNavigator::new(&mut page, &cfg).run().await;
    let log = journal(&page);
    assert!(!log.iter().any(|entry| entry.starts_with("set ")), "{log:?}");
}

#[tokio::test]
async fn marker_lookup_failure_is_an_error() {
    let mut page = ScriptedPage::new()
        .with_rows(vec![])
        .failing_on(selectors::OFFICE_ROW_MARKER);
    let cfg = config(ExtractionMode::Dom);
    let err = FormNavigator::new(&mut page, &cfg).run().await.unwrap_err();
    assert_eq!(err.step(), Some(WizardStep::Availability));
}

#[tokio::test]
async fn response_mode_captures_before_final_submit() {
    let mut page = ScriptedPage::new().with_response(r#"[{"officeName":"A"}]"#);
    let cfg = config(ExtractionMode::Response);
    let outcome = FormNavigator::new(&mut page, &cfg).run().await.unwrap();
    assert_eq!(
        outcome,
        NavigationOutcome::Loaded(RenderedAvailability::Response(
            r#"[{"officeName":"A"}]"#.to_string()
        ))
    );

    let log = journal(&page);
    let capture = log.iter().position(|e| e == "capture disponibilita").unwrap();
    let last_click = log
        .iter()
        .rposition(|e| *e == format!("click {}", selectors::SUBMIT))
        .unwrap();
    assert!(capture < last_click, "{log:?}");
    assert!(!log.iter().any(|e| e.starts_with("rows ")));
}

#[tokio::test]
async fn response_mode_without_response_is_empty() {
    let mut page = ScriptedPage::new();
    let cfg = config(ExtractionMode::Response);
    let outcome = FormNavigator::new(&mut page, &cfg).run().await.unwrap();
    assert_eq!(outcome, NavigationOutcome::Empty);
}

#[tokio::test]
async fn navigator_runs_only_once() {
    let mut page = ScriptedPage::new().with_rows(vec![]);
    let cfg = config(ExtractionMode::Dom);
    let mut nav = FormNavigator::new(&mut page, &cfg);
    nav.run().await.unwrap();
    assert!(nav.run().await.is_err());
}

#[tokio::test]
async fn hung_driver_call_is_bounded() {
    let result = bounded(
        Duration::from_millis(20),
        "never",
        std::future::pending::<Result<(), DriverError>>(),
    )
    .await;
    assert!(matches!(result, Err(DriverError::Timeout { ref what, .. }) if what == "never"));
}

#[tokio::test]
async fn unbounded_timeouts_do_not_overflow() {
    let mut page =
        ScriptedPage::new().with_rows(vec![vec!["Municipio I", "Via X", "ROMA", "15/03/2025"]]);
    let cfg = NavigatorConfig {
        step_timeout: Duration::MAX,
        availability_timeout: Duration::MAX,
        typing_delay: Duration::MAX,
        ..config(ExtractionMode::Dom)
    };
    let mut nav = FormNavigator::new(&mut page, &cfg);

    let outcome = nav.run().await.unwrap();
    assert!(matches!(outcome, NavigationOutcome::Loaded(_)), "{outcome:?}");
}

#[test]
fn navigator_config_from_app_config() {
    let app = ciewatch_core::AppConfig {
        start_url: "https://portal.test/".to_string(),
        targets: vec![ciewatch_core::Target::new("Municipio I")],
        selection: ciewatch_core::SelectionMode::First,
        location: "MILANO".to_string(),
        extraction_mode: ExtractionMode::Response,
        availability_endpoint: "slots".to_string(),
        poll_interval_secs: 300,
        poll_jitter_secs: 60,
        step_timeout_secs: 7,
        availability_timeout_secs: 9,
        typing_delay_ms: 50,
        headless: true,
        log_level: "info".to_string(),
        notify_errors: false,
        notify_max_retries: 2,
        state_path: None,
        telegram: None,
    };
    let cfg = NavigatorConfig::from_app_config(&app);
    assert_eq!(cfg.inputs.location, "MILANO");
    assert_eq!(cfg.inputs.first_name, "Mario");
    assert_eq!(cfg.step_timeout, Duration::from_secs(7));
    assert_eq!(cfg.availability_timeout, Duration::from_secs(9));
    assert_eq!(cfg.typing_delay, Duration::from_millis(50));
    assert_eq!(cfg.availability_endpoint, "slots");
}

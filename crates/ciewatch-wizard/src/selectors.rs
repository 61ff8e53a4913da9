//! CSS selectors and route markers of the booking wizard.

/// Document-type `<select>`; its presence means the identity form is ready.
pub const IDENTITY_FORM: &str = "#selectTipoDocumento";
pub const FIRST_NAME: &str = "input[name=nome]";
pub const LAST_NAME: &str = "input[name=cognome]";
pub const FISCAL_CODE: &str = "input[name=codiceFiscale]";

/// "Continua" button shared by both form steps.
pub const SUBMIT: &str = "button[value='continua']";

/// URL fragment of the location step route.
pub const LOCATION_ROUTE: &str = "sceltaComune";

/// Overlay and modal that swallow clicks on the location step.
pub const OVERLAYS: &str = ".black-overlay, #messageModalBox";
pub const LOCATION_INPUT: &str = "#comuneResidenzaInput";
pub const LOCATION_SUGGESTION: &str = "comune-typeahead ul.typeahead.dropdown-menu li";

/// Header cell present once per office row of the availability table.
pub const OFFICE_ROW_MARKER: &str = "tbody tr th[scope='row']";

//! Selector catalog for the POS frontend.
//!
//! The frontend is a Vuetify SPA with almost no stable ids, so every target
//! is a chain of fallback strategies tried in order. Keeping the whole
//! markup contract in one module means a frontend facelift is a one-file
//! change, and tests script the fake browser against the same strategies
//! production resolves.

use comanda_browser::Strategy;

/// URL fragment that confirms a logged-in session.
pub const PANEL_URL_FRAGMENT: &str = "/panel";

pub const LOGIN_BUTTON_TEXT: &str = "INICIAR SESION";
pub const OPTIONS_BUTTON_TEXT: &str = "OPCIONES";
pub const MANAGE_TABLES_TEXT: &str = "Gestionar Mesas";
pub const LOGOUT_ENTRY_TEXT: &str = "Cerrar Sesion";

// -- login ------------------------------------------------------------------

#[must_use]
pub fn username_input() -> Vec<Strategy> {
    vec![Strategy::css("input[type='text']")]
}

#[must_use]
pub fn password_input() -> Vec<Strategy> {
    vec![Strategy::css("input[type='password']")]
}

#[must_use]
pub fn login_button() -> Vec<Strategy> {
    vec![
        Strategy::text("button", LOGIN_BUTTON_TEXT),
        Strategy::text_contains("span", "INICIAR"),
    ]
}

// -- panel navigation -------------------------------------------------------

/// Entry card for the table view. The heading match is primary; the
/// structural match survives heading renames as long as the card keeps its
/// table image.
#[must_use]
pub fn tables_entry() -> Vec<Strategy> {
    vec![
        Strategy::text("h4", "Mesas"),
        Strategy::xpath("//div[contains(@class, 'v-card')][.//img[contains(@src, 'mesa')]]"),
    ]
}

/// Entry card for the product category view.
#[must_use]
pub fn categories_entry() -> Vec<Strategy> {
    vec![
        Strategy::text("h4", "Platos"),
        Strategy::xpath("//div[contains(@class, 'v-card')][.//img[contains(@src, 'plato')]]"),
    ]
}

// -- table list -------------------------------------------------------------

#[must_use]
pub fn table_heading() -> Vec<Strategy> {
    vec![Strategy::css("h2.black--text")]
}

#[must_use]
pub fn table_cards() -> Vec<Strategy> {
    vec![Strategy::css(".v-card--link")]
}

/// Card for one named table: exact heading, ancestor card of a text node,
/// then whole-card contains, in that order.
#[must_use]
pub fn table_card_named(name: &str) -> Vec<Strategy> {
    vec![
        Strategy::text("h2", name),
        Strategy::ancestor_of_text(name, "v-card"),
        Strategy::text_contains("div", name),
    ]
}

// -- table metadata overlay -------------------------------------------------

#[must_use]
pub fn options_button() -> Vec<Strategy> {
    vec![
        Strategy::text("button", OPTIONS_BUTTON_TEXT),
        Strategy::text_contains("span", OPTIONS_BUTTON_TEXT),
    ]
}

#[must_use]
pub fn manage_tables_entry() -> Vec<Strategy> {
    vec![
        Strategy::text_contains("div", MANAGE_TABLES_TEXT),
        Strategy::text_contains("span", MANAGE_TABLES_TEXT),
    ]
}

#[must_use]
pub fn active_overlay() -> Vec<Strategy> {
    vec![Strategy::css(".v-dialog--active")]
}

#[must_use]
pub fn overlay_close_button() -> Vec<Strategy> {
    vec![
        Strategy::text_contains("button", "CERRAR"),
        Strategy::attr_contains("i", "class", "mdi-close"),
    ]
}

// -- product categories -----------------------------------------------------

#[must_use]
pub fn category_cards() -> Vec<Strategy> {
    vec![Strategy::css(".v-card--link")]
}

#[must_use]
pub fn product_table() -> Vec<Strategy> {
    vec![Strategy::css(".v-data-table__wrapper")]
}

/// Red back arrow returning from a category to the category listing.
#[must_use]
pub fn back_arrow() -> Vec<Strategy> {
    vec![
        Strategy::attr_contains("i", "class", "mdi-arrow-left red--text"),
        Strategy::css("i.mdi-arrow-left"),
    ]
}

// -- order writing ----------------------------------------------------------

#[must_use]
pub fn product_search_input() -> Vec<Strategy> {
    vec![
        Strategy::attr_contains("input", "placeholder", "Buscar"),
        Strategy::attr_contains("input", "placeholder", "Producto"),
        Strategy::css(".v-autocomplete input[type='text']"),
    ]
}

#[must_use]
pub fn suggestion_item() -> Vec<Strategy> {
    vec![
        Strategy::css(".v-menu__content .v-list-item"),
        Strategy::css("[role='listbox'] [role='option']"),
    ]
}

#[must_use]
pub fn quantity_input() -> Vec<Strategy> {
    vec![
        Strategy::attr_contains("input", "placeholder", "Cantidad"),
        Strategy::css("input[type='number']"),
    ]
}

#[must_use]
pub fn comment_input() -> Vec<Strategy> {
    vec![
        Strategy::attr_contains("textarea", "placeholder", "Comentario"),
        Strategy::attr_contains("input", "placeholder", "Comentario"),
    ]
}

#[must_use]
pub fn add_confirm_button() -> Vec<Strategy> {
    vec![
        Strategy::text_contains("button", "AGREGAR"),
        Strategy::text_contains("button", "ACEPTAR"),
        Strategy::css("button[type='submit']"),
    ]
}

// -- e-receipt modal --------------------------------------------------------

#[must_use]
pub fn receipt_button() -> Vec<Strategy> {
    vec![
        Strategy::text_contains("button", "COMPROBANTE"),
        Strategy::text_contains("span", "Comprobante"),
    ]
}

#[must_use]
pub fn receipt_modal() -> Vec<Strategy> {
    vec![Strategy::css(".v-dialog--active")]
}

#[must_use]
pub fn document_type_select() -> Vec<Strategy> {
    vec![
        Strategy::attr_contains("div", "class", "tipo-documento"),
        Strategy::css(".v-dialog--active .v-select"),
    ]
}

#[must_use]
pub fn document_type_option(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::text("div", label),
        Strategy::text_contains("div", label),
    ]
}

#[must_use]
pub fn document_number_input() -> Vec<Strategy> {
    vec![
        Strategy::attr_contains("input", "placeholder", "Documento"),
        Strategy::css("input[name='numeroDocumento']"),
    ]
}

#[must_use]
pub fn full_name_input() -> Vec<Strategy> {
    vec![Strategy::attr_contains("input", "placeholder", "Nombre")]
}

#[must_use]
pub fn address_input() -> Vec<Strategy> {
    vec![Strategy::attr_contains("input", "placeholder", "Direcci")]
}

#[must_use]
pub fn observation_input() -> Vec<Strategy> {
    vec![
        Strategy::attr_contains("textarea", "placeholder", "Observaci"),
        Strategy::attr_contains("input", "placeholder", "Observaci"),
    ]
}

/// Radio control for one receipt kind, matched by its visible label.
#[must_use]
pub fn receipt_type_radio(label: &str) -> Vec<Strategy> {
    vec![
        Strategy::ancestor_of_text(label, "v-radio"),
        Strategy::text_contains("label", label),
    ]
}

// -- logout -----------------------------------------------------------------

#[must_use]
pub fn nav_menu_button() -> Vec<Strategy> {
    vec![
        Strategy::attr_contains("i", "class", "mdi-menu"),
        Strategy::css("button.v-app-bar__nav-icon"),
    ]
}

#[must_use]
pub fn logout_entry() -> Vec<Strategy> {
    vec![
        Strategy::text_contains("div", LOGOUT_ENTRY_TEXT),
        Strategy::text_contains("span", LOGOUT_ENTRY_TEXT),
    ]
}

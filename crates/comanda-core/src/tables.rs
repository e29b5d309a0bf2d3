use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Occupancy state of a POS table.
///
/// The POS renders the state either as a text label on the card or, when the
/// label is absent, as one of three known card background colors. Anything
/// else maps to `Unknown` — a table never carries an unset status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Unknown,
}

impl TableStatus {
    /// Normalizes a POS status label (Spanish UI text) into a status.
    #[must_use]
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "disponible" | "libre" | "mesa libre" => TableStatus::Available,
            "ocupada" | "ocupado" => TableStatus::Occupied,
            "reservada" | "reservado" => TableStatus::Reserved,
            _ => TableStatus::Unknown,
        }
    }

    /// Infers a status from a card's inline `style` attribute.
    ///
    /// The POS encodes state in the card background: green for available,
    /// red for occupied, yellow for reserved. Matching ignores whitespace
    /// inside the `rgb(...)` triplet.
    #[must_use]
    pub fn from_style(style: &str) -> Self {
        let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.contains("rgb(70,255,0)") {
            TableStatus::Available
        } else if compact.contains("rgb(255,45,0)") {
            TableStatus::Occupied
        } else if compact.contains("rgb(255,241,0)") {
            TableStatus::Reserved
        } else {
            TableStatus::Unknown
        }
    }
}

/// A physical seating unit as rendered by the POS.
///
/// Constructed fresh on every extraction pass; the display name is not
/// guaranteed unique across screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Free-text area label; `"Desconocida"` when the POS shows none.
    pub zone: String,
    pub note: Option<String>,
    pub status: TableStatus,
}

impl Table {
    /// A table known only by name, before any metadata merge.
    #[must_use]
    pub fn bare(name: &str, status: TableStatus) -> Self {
        Table {
            name: name.to_string(),
            zone: "Desconocida".to_string(),
            note: None,
            status,
        }
    }
}

/// Normalizes a table name for metadata lookup: trimmed, lowercased.
#[must_use]
pub fn normalize_table_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Merges the card listing with the richer management-overlay metadata.
///
/// Lookup is keyed by [`normalize_table_key`]. When a card has a metadata
/// row, the row's name/zone/note win and the card keeps its status; cards
/// without metadata keep their own fields. The merge is idempotent: merging
/// twice with identical inputs yields identical output. Duplicate metadata
/// rows that normalize to the same key resolve last-write-wins (the map is
/// built in row order, so later rows replace earlier ones).
#[must_use]
pub fn merge_table_metadata(cards: Vec<Table>, metadata: &HashMap<String, Table>) -> Vec<Table> {
    cards
        .into_iter()
        .map(|card| match metadata.get(&normalize_table_key(&card.name)) {
            Some(meta) => Table {
                name: meta.name.clone(),
                zone: meta.zone.clone(),
                note: meta.note.clone(),
                status: card.status,
            },
            None => card,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_normalization_covers_pos_variants() {
        assert_eq!(TableStatus::from_label("Disponible"), TableStatus::Available);
        assert_eq!(TableStatus::from_label("  LIBRE "), TableStatus::Available);
        assert_eq!(TableStatus::from_label("Mesa Libre"), TableStatus::Available);
        assert_eq!(TableStatus::from_label("Ocupada"), TableStatus::Occupied);
        assert_eq!(TableStatus::from_label("reservado"), TableStatus::Reserved);
        assert_eq!(TableStatus::from_label(""), TableStatus::Unknown);
        assert_eq!(TableStatus::from_label("cerrada"), TableStatus::Unknown);
    }

    #[test]
    fn style_colors_map_to_statuses() {
        assert_eq!(
            TableStatus::from_style("background-color: rgb(70, 255, 0);"),
            TableStatus::Available
        );
        assert_eq!(
            TableStatus::from_style("background:rgb(255,45,0)"),
            TableStatus::Occupied
        );
        assert_eq!(
            TableStatus::from_style("background-color: rgb( 255, 241, 0 )"),
            TableStatus::Reserved
        );
        assert_eq!(
            TableStatus::from_style("background-color: rgb(1, 2, 3)"),
            TableStatus::Unknown
        );
        assert_eq!(TableStatus::from_style(""), TableStatus::Unknown);
    }

    fn meta(name: &str, zone: &str, note: Option<&str>) -> Table {
        Table {
            name: name.to_string(),
            zone: zone.to_string(),
            note: note.map(str::to_string),
            status: TableStatus::Unknown,
        }
    }

    #[test]
    fn merge_is_case_insensitive_and_trimmed() {
        let mut metadata = HashMap::new();
        metadata.insert(normalize_table_key("P4"), meta("P4", "ZONA 3", Some("PULPO")));

        let merged = merge_table_metadata(
            vec![Table::bare("  P4 ", TableStatus::Occupied)],
            &metadata,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "P4");
        assert_eq!(merged[0].zone, "ZONA 3");
        assert_eq!(merged[0].note.as_deref(), Some("PULPO"));
        assert_eq!(merged[0].status, TableStatus::Occupied);
    }

    #[test]
    fn merge_keeps_cards_without_metadata() {
        let metadata = HashMap::new();
        let merged =
            merge_table_metadata(vec![Table::bare("Z LLEVAR 1", TableStatus::Available)], &metadata);
        assert_eq!(merged[0].zone, "Desconocida");
        assert_eq!(merged[0].status, TableStatus::Available);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut metadata = HashMap::new();
        metadata.insert(normalize_table_key("p4"), meta("P4", "ZONA 3", None));

        let cards = vec![
            Table::bare("P4", TableStatus::Reserved),
            Table::bare("B1", TableStatus::Available),
        ];
        let once = merge_table_metadata(cards, &metadata);
        let twice = merge_table_metadata(once.clone(), &metadata);
        assert_eq!(once, twice);
    }

    #[test]
    fn duplicate_keys_resolve_last_write_wins() {
        // Two management rows normalizing to the same key: insertion order
        // decides, the later row replaces the earlier one.
        let mut metadata = HashMap::new();
        metadata.insert(normalize_table_key("P4"), meta("P4", "ZONA 1", None));
        metadata.insert(normalize_table_key(" p4 "), meta("p4", "ZONA 2", None));

        let merged = merge_table_metadata(vec![Table::bare("P4", TableStatus::Unknown)], &metadata);
        assert_eq!(merged[0].zone, "ZONA 2");
    }
}

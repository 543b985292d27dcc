use eframe::egui::Color32;

use crate::util::normalize_type_key;

pub const DEFAULT_CATEGORY: &str = "person";

pub const DEFAULT_NODE_COLOR: Color32 = Color32::from_rgb(0x49, 0x50, 0x57);
pub const DEFAULT_LINK_COLOR: Color32 = Color32::from_rgb(0xAD, 0xB5, 0xBD);

/// Keyword rules applied to a lowercased display name, in order. The first rule with a keyword
/// contained in the name decides the category.
pub const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("fund", &["fund", "grant", "donation", "investment", "capital"]),
    ("program", &["program", "project", "initiative", "campaign", "operation"]),
    ("committee", &["committee", "commission", "board"]),
    ("council", &["council", "advisory"]),
    (
        "department",
        &["department", "dept", "division", "bureau", "agency", "office"],
    ),
    (
        "foundation",
        &["foundation", "trust", "institute", "association", "society"],
    ),
    (
        "university",
        &["university", "college", "school", "academy", "campus"],
    ),
    (
        "publication",
        &["report", "publication", "journal", "paper", "article", "book"],
    ),
    (
        "organization",
        &[
            "organization",
            "corporation",
            "company",
            "inc",
            "ltd",
            "llc",
            "group",
            "enterprise",
        ],
    ),
    (
        "location",
        &["country", "city", "state", "region", "province", "territory"],
    ),
    (
        "event",
        &["conference", "meeting", "summit", "symposium", "convention"],
    ),
];

const PALETTE: &[(&str, Color32)] = &[
    ("entity", Color32::from_rgb(0x42, 0x63, 0xEB)),
    ("entity_gen", Color32::from_rgb(0x5C, 0x7C, 0xFA)),
    ("relationship", Color32::from_rgb(0xF0, 0x3E, 0x3E)),
    ("action", Color32::from_rgb(0xFD, 0x7E, 0x14)),
    ("process", Color32::from_rgb(0x20, 0xA4, 0xF3)),
    ("result", Color32::from_rgb(0xF3, 0x81, 0x81)),
    ("event_attend", Color32::from_rgb(0x97, 0x75, 0xFA)),
    ("funding", Color32::from_rgb(0x40, 0xC0, 0x57)),
    ("fund", Color32::from_rgb(0x40, 0xC0, 0x57)),
    ("amount", Color32::from_rgb(0x61, 0xD6, 0x19)),
    ("disb_or_trans", Color32::from_rgb(0x51, 0xCF, 0x66)),
    ("financial", Color32::from_rgb(0x51, 0xCF, 0x66)),
    ("agency", Color32::from_rgb(0x79, 0x50, 0xF2)),
    ("recipient", Color32::from_rgb(0x4E, 0xCD, 0xC4)),
    ("dba", Color32::from_rgb(0xFF, 0x92, 0x2B)),
    ("organization", Color32::from_rgb(0xF0, 0x3E, 0x3E)),
    ("department", Color32::from_rgb(0xE6, 0x49, 0x80)),
    ("foundation", Color32::from_rgb(0xBE, 0x4B, 0xDB)),
    ("committee", Color32::from_rgb(0xFA, 0x52, 0x52)),
    ("council", Color32::from_rgb(0xFF, 0x6B, 0x6B)),
    ("country", Color32::from_rgb(0x97, 0x75, 0xFA)),
    ("location", Color32::from_rgb(0x33, 0x9A, 0xF0)),
    ("place", Color32::from_rgb(0x84, 0x5E, 0xF7)),
    ("place_of_performance", Color32::from_rgb(0x84, 0x5E, 0xF7)),
    ("region", Color32::from_rgb(0x95, 0xE1, 0xD3)),
    ("usaid_program_region", Color32::from_rgb(0x74, 0xC0, 0xFC)),
    ("description", Color32::from_rgb(0x51, 0xCF, 0x66)),
    ("publication", Color32::from_rgb(0xFF, 0x92, 0x2B)),
    ("article", Color32::from_rgb(0xFF, 0xA9, 0x4D)),
    ("document", Color32::from_rgb(0xFF, 0xD4, 0x3B)),
    ("person", Color32::from_rgb(0x42, 0x63, 0xEB)),
    ("individual", Color32::from_rgb(0x5C, 0x7C, 0xFA)),
    ("program", Color32::from_rgb(0x20, 0xA4, 0xF3)),
    ("event", Color32::from_rgb(0x79, 0x50, 0xF2)),
    ("concept", Color32::from_rgb(0xFD, 0x7E, 0x14)),
    ("university", Color32::from_rgb(0x97, 0x75, 0xFA)),
    ("institution", Color32::from_rgb(0x84, 0x5E, 0xF7)),
];

/// Category guessed from a display name with [`CATEGORY_RULES`], `person` when nothing matches.
pub fn infer_category(name: &str) -> &'static str {
    let lowered = name.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map_or(DEFAULT_CATEGORY, |(category, _)| category)
}

/// Palette entry for a type or category name, if it has one.
pub fn palette_color(key: &str) -> Option<Color32> {
    let key = normalize_type_key(key);
    PALETTE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, color)| *color)
}

/// Palette color for a category, falling back to the neutral default.
pub fn category_color(category: &str) -> Color32 {
    palette_color(category).unwrap_or(DEFAULT_NODE_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_apply_in_order() {
        assert_eq!(infer_category("Global Health Fund Board"), "fund");
        assert_eq!(infer_category("Advisory Board"), "committee");
        assert_eq!(infer_category("Bureau of Statistics"), "department");
        assert_eq!(infer_category("Acme Holdings LLC"), "organization");
        assert_eq!(infer_category("Jane Doe"), "person");
        assert_eq!(infer_category(""), "person");
    }

    #[test]
    fn palette_lookups_normalize_keys() {
        assert_eq!(category_color("Place of Performance"), Color32::from_rgb(0x84, 0x5E, 0xF7));
        assert_eq!(category_color("AMOUNT"), Color32::from_rgb(0x61, 0xD6, 0x19));
        assert_eq!(category_color("unheard_of"), DEFAULT_NODE_COLOR);
        assert_eq!(palette_color("unheard_of"), None);
    }
}

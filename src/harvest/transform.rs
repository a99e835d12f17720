//! Item record → table entry derivation.
//!
//! Most items keep their repository identifier and display name. Enchanted
//! books are stored per enchantment (`SHARPNESS;5`), so they are re-keyed as
//! `ENCHANTMENT_SHARPNESS_5` and named from that key.

use crate::model::{ItemEntry, ItemRecord};

/// Display-name marker of enchantment books.
pub const ENCHANTED_BOOK_MARKER: &str = "Enchanted Book";

pub const ENCHANTMENT_PREFIX: &str = "ENCHANTMENT_";

/// The only ultimate enchantment whose name keeps its "Ultimate" word.
const ULTIMATE_WISE: &str = "ULTIMATE_WISE";

const ULTIMATE_WORD: &str = "Ultimate ";

/// Derives the table key and entry for a record.
///
/// Returns `None` for records without an identifier.
pub fn derive_entry(record: &ItemRecord) -> Option<(String, ItemEntry)> {
    let id = record.internal_name();
    if id.is_empty() {
        return None;
    }

    let name = record.display_name();
    if is_enchanted_book(name) {
        let key = enchantment_key(id);
        let name = enchantment_name(&key);
        Some((key, ItemEntry::new(name)))
    } else {
        Some((id.to_string(), ItemEntry::new(name)))
    }
}

pub fn is_enchanted_book(display_name: &str) -> bool {
    display_name.contains(ENCHANTED_BOOK_MARKER)
}

/// `ULTIMATE_WISE;5` → `ENCHANTMENT_ULTIMATE_WISE_5`
pub fn enchantment_key(internal_name: &str) -> String {
    format!("{}{}", ENCHANTMENT_PREFIX, internal_name.replace(';', "_"))
}

/// Human-readable name for an enchantment key.
///
/// `ENCHANTMENT_SHARPNESS_5` → `Enchantment Sharpness 5`. "Ultimate " is
/// dropped from every ultimate enchantment except Ultimate Wise.
pub fn enchantment_name(key: &str) -> String {
    let name = title_case(&key.replace('_', " "));
    if key.contains(ULTIMATE_WISE) {
        name
    } else {
        name.replace(ULTIMATE_WORD, "")
    }
}

/// Upper-cases every letter that does not follow another letter and
/// lower-cases the rest.
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_cased = false;

    for ch in input.chars() {
        if prev_cased {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        prev_cased = ch.is_lowercase() || ch.is_uppercase();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<&str>, name: Option<&str>) -> ItemRecord {
        ItemRecord {
            internalname: id.map(str::to_string),
            displayname: name.map(str::to_string),
        }
    }

    #[test]
    fn test_regular_item_passes_through() {
        let (id, entry) = derive_entry(&record(Some("HYPERION"), Some("§dHyperion"))).unwrap();
        assert_eq!(id, "HYPERION");
        assert_eq!(entry.name, "§dHyperion");
    }

    #[test]
    fn test_empty_display_name_is_kept() {
        let (id, entry) = derive_entry(&record(Some("MYSTERY_ITEM"), None)).unwrap();
        assert_eq!(id, "MYSTERY_ITEM");
        assert_eq!(entry.name, "");
    }

    #[test]
    fn test_missing_or_empty_identifier_is_discarded() {
        assert!(derive_entry(&record(None, Some("Nameless"))).is_none());
        assert!(derive_entry(&record(Some(""), Some("Enchanted Book"))).is_none());
    }

    #[test]
    fn test_enchanted_book_without_semicolon() {
        let (id, entry) = derive_entry(&record(Some("BOOK_FIRE"), Some("Enchanted Book"))).unwrap();
        assert_eq!(id, "ENCHANTMENT_BOOK_FIRE");
        assert_eq!(entry.name, "Enchantment Book Fire");
    }

    #[test]
    fn test_enchanted_book_with_level() {
        let (id, entry) =
            derive_entry(&record(Some("SHARPNESS;5"), Some("§fEnchanted Book"))).unwrap();
        assert_eq!(id, "ENCHANTMENT_SHARPNESS_5");
        assert_eq!(entry.name, "Enchantment Sharpness 5");
    }

    #[test]
    fn test_ultimate_wise_keeps_ultimate() {
        let (id, entry) =
            derive_entry(&record(Some("ULTIMATE_WISE;5"), Some("Enchanted Book"))).unwrap();
        assert_eq!(id, "ENCHANTMENT_ULTIMATE_WISE_5");
        assert_eq!(entry.name, "Enchantment Ultimate Wise 5");
    }

    #[test]
    fn test_other_ultimates_drop_ultimate() {
        let (id, entry) =
            derive_entry(&record(Some("ULTIMATE_JERRY;1"), Some("Enchanted Book"))).unwrap();
        assert_eq!(id, "ENCHANTMENT_ULTIMATE_JERRY_1");
        assert_eq!(entry.name, "Enchantment Jerry 1");
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let (id, _) = derive_entry(&record(Some("BOOK"), Some("enchanted book"))).unwrap();
        assert_eq!(id, "BOOK");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("ENCHANTMENT TURBO WHEAT 5"), "Enchantment Turbo Wheat 5");
        assert_eq!(title_case("one-for-all"), "One-For-All");
        assert_eq!(title_case("x2y"), "X2Y");
        assert_eq!(title_case(""), "");
    }
}

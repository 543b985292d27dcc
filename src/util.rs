use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Lowercases a type or category name and folds runs of whitespace, hyphens and underscores
/// into a single underscore: `"Place of Performance"` becomes `"place_of_performance"`.
pub fn normalize_type_key(value: &str) -> String {
    let mut key = String::with_capacity(value.len());
    let mut pending_separator = false;

    for ch in value.trim().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = !key.is_empty();
            continue;
        }

        if pending_separator {
            key.push('_');
            pending_separator = false;
        }
        key.extend(ch.to_lowercase());
    }

    key
}

/// Formats a monetary amount as `$1,234,567` (or `$1,234.50` when it has cents).
pub fn format_amount(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if fraction == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{fraction:02}")
    }
}

/// Deterministic pseudo-random point in `[-1, 1]^3` derived from an id.
pub fn stable_triple(id: &str) -> (f32, f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let unit = |bits: u64| ((bits & 0x1f_ffff) as f64 / 0x1f_ffff as f64) as f32 * 2.0 - 1.0;
    (unit(hash), unit(hash >> 21), unit(hash >> 42))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_keys_fold_separators() {
        assert_eq!(normalize_type_key("Entity"), "entity");
        assert_eq!(normalize_type_key("Place of  Performance"), "place_of_performance");
        assert_eq!(normalize_type_key(" disb-or_trans "), "disb_or_trans");
        assert_eq!(normalize_type_key(""), "");
    }

    #[test]
    fn amounts_are_grouped() {
        assert_eq!(format_amount(1_234_567.0), "$1,234,567");
        assert_eq!(format_amount(999.0), "$999");
        assert_eq!(format_amount(1000.5), "$1,000.50");
        assert_eq!(format_amount(-42.0), "-$42");
    }

    #[test]
    fn stable_triple_is_deterministic_and_bounded() {
        let first = stable_triple("node-a");
        assert_eq!(first, stable_triple("node-a"));
        for value in [first.0, first.1, first.2] {
            assert!((-1.0..=1.0).contains(&value));
        }
    }
}

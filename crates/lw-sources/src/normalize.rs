/// Normalize a player or team name for loose comparison across sources.
///
/// Lowercases, trims, and drops spaces, dots, dashes, underscores and `@`.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_' | '@'))
        .collect()
}

/// Loose equality: exact after normalization, or either contains the other.
/// Empty names never match.
pub fn names_overlap(a: &str, b: &str) -> bool {
    let a = normalize_name(a);
    let b = normalize_name(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_case() {
        assert_eq!(normalize_name("  Tenz "), "tenz");
        assert_eq!(normalize_name("Boaster.GG"), "boastergg");
        assert_eq!(normalize_name("some_one-else @x"), "someoneelsex");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn overlap_is_symmetric() {
        assert!(names_overlap("TenZ", "tenz"));
        assert!(names_overlap("Zekken", "zekkenn"));
        assert!(names_overlap("zekkenn", "Zekken"));
        assert!(!names_overlap("TenZ", "Sacy"));
        assert!(!names_overlap("", "Sacy"));
    }
}

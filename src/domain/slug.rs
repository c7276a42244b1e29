/// URL-safe slug for a title: lowercase, non-alphanumeric runs collapsed to
/// a single hyphen, no leading or trailing hyphen.
pub fn slugify(title: &str) -> String {
    slug::slugify(title)
}

/// Collision policy: given every stored slug that shares `base` (the bare
/// slug or `base-N`), pick the next free suffix. The bare slug counts as
/// suffix 0, so the sequence is `base, base-1, base-2, ...`. Slugs that
/// merely share the prefix without a numeric suffix belong to other titles
/// and are ignored.
pub fn next_unique_slug(base: &str, existing: &[String]) -> String {
    let mut max_suffix: Option<u64> = None;

    for candidate in existing {
        let suffix = if candidate == base {
            Some(0)
        } else {
            candidate
                .strip_prefix(base)
                .and_then(|rest| rest.strip_prefix('-'))
                .and_then(|rest| rest.parse::<u64>().ok())
        };
        if let Some(n) = suffix {
            max_suffix = Some(max_suffix.map_or(n, |m| m.max(n)));
        }
    }

    match max_suffix {
        None => base.to_string(),
        Some(n) => format!("{}-{}", base, n + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Hola Mundo"), "hola-mundo");
        assert_eq!(slugify("Zelda: Tears of the Kingdom"), "zelda-tears-of-the-kingdom");
    }

    #[test]
    fn slugify_is_idempotent() {
        for input in ["Hola Mundo", "One--Two__Three", "árbol & niño", "UPPER CASE!!"] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn slugify_output_charset_is_constrained() {
        for input in ["Hola   Mundo!!!", "--edge--case--", "a&b|c"] {
            let s = slugify(input);
            assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            assert!(!s.starts_with('-') && !s.ends_with('-'));
            assert!(!s.contains("--"));
        }
    }

    #[test]
    fn first_slug_has_no_suffix() {
        assert_eq!(next_unique_slug("hola-mundo", &[]), "hola-mundo");
    }

    #[test]
    fn bare_collision_yields_suffix_one() {
        let existing = vec!["hola-mundo".to_string()];
        assert_eq!(next_unique_slug("hola-mundo", &existing), "hola-mundo-1");
    }

    #[test]
    fn suffix_is_one_past_the_maximum_in_use() {
        let existing = vec![
            "hola-mundo".to_string(),
            "hola-mundo-1".to_string(),
            "hola-mundo-4".to_string(),
        ];
        assert_eq!(next_unique_slug("hola-mundo", &existing), "hola-mundo-5");
    }

    #[test]
    fn unrelated_prefix_sharers_are_ignored() {
        let existing = vec!["hola-mundo-remastered".to_string()];
        assert_eq!(next_unique_slug("hola-mundo", &existing), "hola-mundo");
    }

    #[test]
    fn sequence_stays_contiguous() {
        let mut existing: Vec<String> = Vec::new();
        for expected in ["hola-mundo", "hola-mundo-1", "hola-mundo-2", "hola-mundo-3"] {
            let next = next_unique_slug("hola-mundo", &existing);
            assert_eq!(next, expected);
            existing.push(next);
        }
    }
}

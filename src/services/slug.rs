//! URL slugs derived from titles

/// Derive a URL slug from a title
///
/// Lowercases, keeps ASCII letters and digits, turns whitespace, hyphens and
/// underscores into single hyphens, drops everything else, and trims hyphens
/// from both ends. The result may be empty when the title has no letters or
/// digits.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_well_formed(slug: &str) -> bool {
        slug.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !slug.starts_with('-')
            && !slug.ends_with('-')
            && !slug.contains("--")
    }

    #[test]
    fn test_basic_title() {
        assert_eq!(slugify("My Trip: Tokyo!!"), "my-trip-tokyo");
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn test_separators_collapse() {
        assert_eq!(slugify("  Lisbon -- in   spring_2024  "), "lisbon-in-spring-2024");
        assert_eq!(slugify("a - - b"), "a-b");
    }

    #[test]
    fn test_punctuation_is_dropped_not_separated() {
        assert_eq!(slugify("Don't Panic"), "dont-panic");
        assert_eq!(slugify("EU/US Trade"), "euus-trade");
    }

    #[test]
    fn test_non_ascii_and_empty() {
        assert_eq!(slugify("Café Crème"), "caf-crme");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_output_is_always_well_formed() {
        let titles = [
            "My Trip: Tokyo!!",
            "--Leading and trailing--",
            "Tabs\tand\nnewlines",
            "Ünïcödé Ünïcödé",
            "100% Pure __ Adventure",
            "___",
            "Mixed-CASE_title 42",
        ];
        for title in titles {
            let slug = slugify(title);
            assert!(is_well_formed(&slug), "{:?} -> {:?}", title, slug);
        }
    }

    #[test]
    fn test_same_title_same_slug() {
        assert_eq!(slugify("Night Train"), slugify("Night Train"));
    }
}

/// Derives a URL-safe slug from a display name: lowercase ASCII
/// alphanumerics, with runs of whitespace, hyphens, and underscores
/// collapsed into single hyphens. Any other character is dropped.
///
/// Collisions are not auto-disambiguated; the unique index on the slug
/// column rejects duplicate writes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(slugify("Olympic Barbell 20kg"), "olympic-barbell-20kg");
    }

    #[test]
    fn collapses_separator_runs() {
        assert_eq!(slugify("home  gym -- rack"), "home-gym-rack");
        assert_eq!(slugify("snake_case_name"), "snake-case-name");
    }

    #[test]
    fn trims_leading_and_trailing_separators() {
        assert_eq!(slugify("  trimmed name  "), "trimmed-name");
        assert_eq!(slugify("--dashed--"), "dashed");
    }

    #[test]
    fn drops_non_ascii_and_punctuation() {
        assert_eq!(slugify("Café & Co."), "caf-co");
        assert_eq!(slugify("100% Whey!"), "100-whey");
    }

    #[test]
    fn empty_input_yields_empty_slug() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}

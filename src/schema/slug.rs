/// Lowercases and trims `value`, turns whitespace and `-`/`_` runs into a single
/// `-`, drops anything outside `[a-z0-9]`, and strips separators at either end.
///
/// The result is empty or matches `^[a-z0-9]+(-[a-z0-9]+)*$`, so normalising
/// twice changes nothing.
pub fn normalize_slug(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for ch in value.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_canonical(slug: &str) -> bool {
        slug.is_empty()
            || (slug
                .split('-')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())))
    }

    #[test]
    fn common_inputs() {
        assert_eq!(normalize_slug("  Support Tickets "), "support-tickets");
        assert_eq!(normalize_slug("Due_Date"), "due-date");
        assert_eq!(normalize_slug("a--__b"), "a-b");
        assert_eq!(normalize_slug("-_lead_-"), "lead");
        assert_eq!(normalize_slug("Price ($)"), "price");
        assert_eq!(normalize_slug("a ! b"), "a-b");
        assert_eq!(normalize_slug("Café 2"), "caf-2");
        assert_eq!(normalize_slug("!!!"), "");
        assert_eq!(normalize_slug(""), "");
    }

    #[test]
    fn idempotent_and_canonical() {
        let inputs = [
            "Hello World",
            "  --weird__Input--  ",
            "ÜBER cool_stuff 42",
            "tabs\tand\nnewlines",
            "__",
            "x",
            "9 Lives - Remastered",
        ];
        for input in inputs {
            let once = normalize_slug(input);
            assert_eq!(normalize_slug(&once), once, "input {input:?}");
            assert!(is_canonical(&once), "input {input:?} gave {once:?}");
        }
    }
}

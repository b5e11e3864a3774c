//! Tenant slug derivation from organization names.

/// Derive a URL-safe tenant slug from a display name: lowercase,
/// strip everything outside `[a-z0-9\s-]`, collapse whitespace runs to
/// single hyphens, collapse repeated hyphens, trim leading/trailing
/// hyphens.
pub fn slugify_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true; // suppress leading hyphen

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
            last_hyphen = false;
        } else if ch.is_whitespace() || ch == '-' {
            if !last_hyphen {
                slug.push('-');
                last_hyphen = true;
            }
        }
        // anything else is stripped
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Slug validity: lowercase `[a-z0-9-]+`, 2–50 chars.
pub fn is_valid_slug(slug: &str) -> bool {
    (2..=50).contains(&slug.len())
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name() {
        assert_eq!(slugify_name("Acme Co"), "acme-co");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(slugify_name("Acme, Inc."), "acme-inc");
    }

    #[test]
    fn collapses_whitespace_and_hyphens() {
        assert_eq!(slugify_name("  Big   Corp -- West  "), "big-corp-west");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify_name("Studio 54"), "studio-54");
    }

    #[test]
    fn unicode_is_stripped() {
        assert_eq!(slugify_name("Café Müller"), "caf-mller");
    }

    #[test]
    fn validity_bounds() {
        assert!(is_valid_slug("ab"));
        assert!(is_valid_slug("acme-co"));
        assert!(!is_valid_slug("a"));
        assert!(!is_valid_slug("Acme"));
        assert!(!is_valid_slug(&"x".repeat(51)));
    }
}

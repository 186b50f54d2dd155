/// Lowercases the title, keeps letters and digits from any script and joins
/// the remaining words with `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' || ch == '\u{200c}' {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("item");
    }
    slug
}

/// `base`, then `base-1`, `base-2`, ...
pub fn numbered(base: &str, counter: u32) -> String {
    if counter == 0 {
        base.to_string()
    } else {
        format!("{base}-{counter}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_persian_letters() {
        assert_eq!(slugify("گوشی  موبایل سامسونگ"), "گوشی-موبایل-سامسونگ");
    }

    #[test]
    fn strips_punctuation_and_lowercases() {
        assert_eq!(slugify("  Galaxy S24, Ultra! "), "galaxy-s24-ultra");
        assert_eq!(slugify("???"), "item");
    }

    #[test]
    fn numbered_suffix() {
        assert_eq!(numbered("mug", 0), "mug");
        assert_eq!(numbered("mug", 2), "mug-2");
    }
}

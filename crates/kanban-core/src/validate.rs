//! Input checks applied before anything reaches the store.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._-]+@[a-z]+\.+[a-z]+$").ok());
static NAME: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[a-zA-Z\s]{2,}$").ok());

fn matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

/// Title must contain something other than whitespace.
#[must_use]
pub fn is_valid_title(title: &str) -> bool {
    !title.trim().is_empty()
}

/// Loose `local@domain.tld` shape check.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    matches(&EMAIL, email)
}

/// Two or more letters or spaces.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    matches(&NAME, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("dev.ops@example.com"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("user@EXAMPLE.com"));
    }

    #[test]
    fn names_and_titles() {
        assert!(is_valid_name("Ann Lee"));
        assert!(!is_valid_name("A"));
        assert!(!is_valid_name("R2D2"));
        assert!(is_valid_title(" x "));
        assert!(!is_valid_title("   "));
    }
}

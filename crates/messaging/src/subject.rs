use std::fmt;

use thiserror::Error;

/// Error type for subject validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The name is empty, has empty tokens, or contains reserved characters.
    #[error("invalid subject: {0:?}")]
    InvalidSubject(String),
}

/// A validated, dot-separated subject name (`user.created`,
/// `payment.completed`, ...).
///
/// Wildcards are rejected: a `Subject` always names exactly one topic.
/// Filters with `*`/`>` are plain strings matched with [`matches_filter`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subject(String);

impl Subject {
    /// Creates a subject, rejecting empty tokens and reserved characters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSubject`] if the name is not a plain
    /// dot-separated subject.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty()
            || name.split('.').any(str::is_empty)
            || name
                .contains(|c: char| c.is_whitespace() || c == '*' || c == '>')
        {
            return Err(Error::InvalidSubject(name));
        }
        Ok(Self(name))
    }

    /// The subject as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The durable consumer name for a service subscribed to this subject.
    ///
    /// Dots become dashes (`auth` + `user.created` → `auth-user-created`).
    /// The name is the consumer's cursor identity and must be stable across
    /// restarts and unique per stream, so it always embeds the service name.
    #[must_use]
    pub fn consumer_name(&self, service: &str) -> String {
        format!("{service}-{}", self.0.replace('.', "-"))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        subject.0
    }
}

/// Whether `subject` is matched by `filter`.
///
/// `*` matches exactly one token, a trailing `>` matches one or more.
#[must_use]
pub fn matches_filter(filter: &str, subject: &str) -> bool {
    let mut filter_tokens = filter.split('.').peekable();
    let mut subject_tokens = subject.split('.');

    loop {
        match (filter_tokens.next(), subject_tokens.next()) {
            (None, None) => return true,
            (Some(">"), Some(_)) if filter_tokens.peek().is_none() => return true,
            (Some("*"), Some(_)) => {}
            (Some(f), Some(s)) if f == s => {}
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_subjects() {
        assert!(Subject::new("user.created").is_ok());
        assert!(Subject::new("payment.completed").is_ok());
        assert!(Subject::new("booking").is_ok());
    }

    #[test]
    fn test_invalid_subjects() {
        for name in ["", "user..created", "user.*", "user.>", "user created"] {
            assert_eq!(
                Subject::new(name),
                Err(Error::InvalidSubject(name.to_string()))
            );
        }
    }

    #[test]
    fn test_consumer_name() {
        let subject = Subject::new("user.created").unwrap();
        assert_eq!(subject.consumer_name("auth"), "auth-user-created");
    }

    #[test]
    fn test_matches_filter() {
        assert!(matches_filter("user.created", "user.created"));
        assert!(matches_filter("user.*", "user.created"));
        assert!(matches_filter("user.>", "user.created"));
        assert!(matches_filter(">", "user.created"));
        assert!(!matches_filter("user.*", "booking.created"));
        assert!(!matches_filter("user.created", "user.updated"));
        assert!(!matches_filter("user.*.extra", "user.created"));
        assert!(!matches_filter("user.created.extra", "user.created"));
    }
}

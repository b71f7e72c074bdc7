//! Session → bucket / home / jail mappings.
//!
//! Each mapping is a small trait implemented for any matching closure, so
//! callers can pass `|s: &Session| ...` directly, or use the helpers and
//! the configuration-driven [`Template`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// Placeholder replaced with the session's username in a [`Template`]
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Maps a session to the bucket it is served from
pub trait SessionBucket: Send + Sync {
    fn bucket(&self, session: &Session) -> String;
}

/// Maps a session to its home key, relative to the bucket
pub trait SessionHome: Send + Sync {
    fn home(&self, session: &Session) -> String;
}

/// Maps a session to the key prefix hidden from the user.
///
/// An empty jail means the session is unjailed. A non-empty jail must be a
/// prefix of the session's home.
pub trait SessionJail: Send + Sync {
    fn jail(&self, session: &Session) -> String;
}

impl<F> SessionBucket for F
where
    F: Fn(&Session) -> String + Send + Sync,
{
    fn bucket(&self, session: &Session) -> String {
        self(session)
    }
}

impl<F> SessionHome for F
where
    F: Fn(&Session) -> String + Send + Sync,
{
    fn home(&self, session: &Session) -> String {
        self(session)
    }
}

impl<F> SessionJail for F
where
    F: Fn(&Session) -> String + Send + Sync,
{
    fn jail(&self, session: &Session) -> String {
        self(session)
    }
}

/// Every session is served from the same bucket
pub fn fixed_bucket(bucket: impl Into<String>) -> Arc<dyn SessionBucket> {
    let bucket = bucket.into();
    Arc::new(move |_: &Session| bucket.clone())
}

/// Every session's home is the bucket root
pub fn root_home() -> Arc<dyn SessionHome> {
    Arc::new(|_: &Session| String::new())
}

/// Each user's home is `subdir/username`
pub fn per_user_home(subdir: impl Into<String>) -> Arc<dyn SessionHome> {
    let subdir = subdir.into();
    Arc::new(move |session: &Session| format!("{}/{}", subdir, session.username()))
}

/// No session is jailed
pub fn unjailed() -> Arc<dyn SessionJail> {
    Arc::new(|_: &Session| String::new())
}

/// A mapping expressed as a string with `{username}` substitution,
/// e.g. `users/{username}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(String);

impl Template {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, session: &Session) -> String {
        self.0.replace(USERNAME_PLACEHOLDER, session.username())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SessionBucket for Template {
    fn bucket(&self, session: &Session) -> String {
        self.render(session)
    }
}

impl SessionHome for Template {
    fn home(&self, session: &Session) -> String {
        self.render(session)
    }
}

impl SessionJail for Template {
    fn jail(&self, session: &Session) -> String {
        self.render(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers() {
        let session = Session::new("bob", None);
        assert_eq!(fixed_bucket("bucket").bucket(&session), "bucket");
        assert_eq!(root_home().home(&session), "");
        assert_eq!(per_user_home("users").home(&session), "users/bob");
        assert_eq!(unjailed().jail(&session), "");
    }

    #[test]
    fn test_template_renders_username() {
        let session = Session::new("alice", None);
        assert_eq!(Template::new("users/{username}").home(&session), "users/alice");
        assert_eq!(Template::new("users").jail(&session), "users");
        assert_eq!(Template::default().home(&session), "");
    }

    #[test]
    fn test_closure_mapping() {
        let session = Session::new("carol", None);
        let home = |s: &Session| format!("home-{}", s.username());
        assert_eq!(home.home(&session), "home-carol");
    }
}

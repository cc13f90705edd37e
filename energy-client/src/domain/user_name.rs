use std::{
    fmt,
    hash::{Hash, Hasher},
};

/// Identity of the person logging usage.
///
/// Holds the name as entered (trimmed) and a normalized key. Two names are
/// equal when their keys are, so `" Suhani "` and `"suhani"` are the same user.
#[derive(Debug, Clone)]
pub struct UserName {
    display: String,
    key: String,
}

impl UserName {
    /// Returns `None` when the input is empty after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let display = raw.trim();
        if display.is_empty() {
            return None;
        }

        Some(Self {
            display: display.to_string(),
            key: normalize(display),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a raw `User` column value refers to this user.
    pub fn matches(&self, raw: &str) -> bool {
        normalize(raw) == self.key
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl PartialEq for UserName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for UserName {}

impl Hash for UserName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

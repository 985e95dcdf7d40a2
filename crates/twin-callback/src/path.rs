//! Dotted property paths addressing twins relative to a root.

use std::fmt;

/// Sequence of property names; empty addresses the root twin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse `"songs.composers"`; the empty string is the root.
    #[must_use]
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `other` equals this path or lies below it.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<&str> for PropertyPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let path = PropertyPath::parse("songs.composers");
        assert_eq!(path.segments(), ["songs", "composers"]);
        assert_eq!(path.to_string(), "songs.composers");
        assert!(PropertyPath::parse("").is_root());
    }

    #[test]
    fn containment_is_prefix_based() {
        let songs = PropertyPath::parse("songs");
        assert!(songs.contains(&songs.join("composers")));
        assert!(songs.contains(&songs));
        assert!(!songs.contains(&PropertyPath::parse("artist")));
        assert!(PropertyPath::root().contains(&songs));
    }
}

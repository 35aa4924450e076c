use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media a watch entry refers to.
///
/// Serialized as a bare string. Anything other than `video` or `audio` is kept
/// verbatim so records written by other clients survive a round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum MediaKind {
    #[default]
    Video,
    Audio,
    Other(String),
}

impl MediaKind {
    pub fn as_str(&self) -> &str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other(kind) => kind,
        }
    }
}

impl From<String> for MediaKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            _ => MediaKind::Other(value),
        }
    }
}

impl From<&str> for MediaKind {
    fn from(value: &str) -> Self {
        MediaKind::from(value.to_string())
    }
}

impl From<MediaKind> for String {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_kinds_parse() {
        assert_eq!(MediaKind::from("video"), MediaKind::Video);
        assert_eq!(MediaKind::from("audio"), MediaKind::Audio);
    }

    #[test]
    fn test_unknown_kind_is_preserved() {
        let kind: MediaKind = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(kind, MediaKind::Other("image".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"image\"");
    }
}

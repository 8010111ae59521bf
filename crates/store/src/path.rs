//! Slash-separated addresses of collections and documents.
//!
//! A collection path always has an odd number of segments
//! (`users`, `users/u1/chats`), a document path an even number
//! (`users/u1`, `users/u1/chats/c1`).

use std::fmt;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    segments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// A top-level collection such as `users`.
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            segments: vec![id.into()],
        }
    }

    pub fn doc(&self, id: impl Into<String>) -> DocumentPath {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        DocumentPath { segments }
    }

    /// Last segment, the collection id.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// The document owning this collection, `None` for top-level collections.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_segments(&self.segments, self)
    }
}

impl DocumentPath {
    /// Parse `a/b/c/d` style paths. Fails on odd segment counts or empty segments.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        let path = Self { segments };
        if path.segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath(raw.to_string()));
        }
        path.validate()?;
        Ok(path)
    }

    pub fn collection(&self, id: impl Into<String>) -> CollectionPath {
        let mut segments = self.segments.clone();
        segments.push(id.into());
        CollectionPath { segments }
    }

    /// Last segment, the document id.
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len().saturating_sub(1)].to_vec(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn validate(&self) -> StoreResult<()> {
        validate_segments(&self.segments, self)
    }
}

/// Checks a single client supplied id before it is used as a path segment.
pub fn validate_id(id: &str) -> StoreResult<()> {
    if is_valid_segment(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(id.to_string()))
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.trim().is_empty() && !segment.contains('/') && segment != "." && segment != ".."
}

fn validate_segments(segments: &[String], display: &dyn fmt::Display) -> StoreResult<()> {
    if segments.is_empty() || !segments.iter().all(|segment| is_valid_segment(segment)) {
        return Err(StoreError::InvalidPath(display.to_string()));
    }
    Ok(())
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_render_with_slashes() {
        let chat = CollectionPath::root("users")
            .doc("u1")
            .collection("chats")
            .doc("c1");
        assert_eq!(chat.to_string(), "users/u1/chats/c1");
        assert_eq!(chat.id(), "c1");
        assert_eq!(chat.parent().to_string(), "users/u1/chats");
        assert_eq!(
            chat.collection("messages").parent(),
            Some(chat.clone())
        );
    }

    #[test]
    fn top_level_collection_has_no_parent() {
        assert!(CollectionPath::root("users").parent().is_none());
    }

    #[test]
    fn parse_rejects_collection_paths_and_empty_segments() {
        assert!(DocumentPath::parse("users/u1").is_ok());
        assert!(DocumentPath::parse("users").is_err());
        assert!(DocumentPath::parse("users//chats/c1").is_err());
    }

    #[test]
    fn ids_with_separators_fail_validation() {
        assert!(validate_id("agent-1").is_ok());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("  ").is_err());

        let path = CollectionPath::root("users").doc("a/b");
        assert!(path.validate().is_err());
    }
}

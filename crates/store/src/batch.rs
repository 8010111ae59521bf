use crate::document::Fields;
use crate::path::DocumentPath;

/// One mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Insert a new document; the batch fails if it already exists.
    Create { path: DocumentPath, fields: Fields },
    /// Replace the document, creating it when missing.
    Set { path: DocumentPath, fields: Fields },
    /// Merge top-level fields into an existing document.
    Update { path: DocumentPath, fields: Fields },
    /// Remove the document. Missing documents are not an error.
    Delete { path: DocumentPath },
}

impl Write {
    pub fn path(&self) -> &DocumentPath {
        match self {
            Write::Create { path, .. }
            | Write::Set { path, .. }
            | Write::Update { path, .. }
            | Write::Delete { path } => path,
        }
    }
}

/// Writes applied together: every write becomes visible or none does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.writes.push(Write::Create { path, fields });
        self
    }

    pub fn set(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.writes.push(Write::Set { path, fields });
        self
    }

    pub fn update(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.writes.push(Write::Update { path, fields });
        self
    }

    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.writes.push(Write::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

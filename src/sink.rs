use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::document::OrganizationDocument;
use crate::error::SinkError;

/// Documents accumulated over one run, in arrival order, unique by `uuid`.
#[derive(Debug, Default)]
pub struct ResultSink {
    documents: Vec<OrganizationDocument>,
    seen: HashSet<String>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (and drops the document) if its uuid is already held.
    pub fn append(&mut self, doc: OrganizationDocument) -> bool {
        if !self.seen.insert(doc.uuid.clone()) {
            warn!("Duplicate organization {} dropped", doc.uuid);
            return false;
        }
        self.documents.push(doc);
        true
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[OrganizationDocument] {
        &self.documents
    }

    /// Write every document as one JSON array to `dir/CBData_<random>.json`.
    ///
    /// The file name is picked atomically so concurrent runs never clobber
    /// each other.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf, SinkError> {
        if self.is_empty() {
            return Err(SinkError::Empty);
        }
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::Builder::new()
            .prefix("CBData_")
            .suffix(".json")
            .tempfile_in(dir)?;
        serde_json::to_writer(&mut file, &self.documents)?;
        file.flush()?;

        let (_, path) = file.keep().map_err(|e| SinkError::Io(e.error))?;
        info!("Wrote {} organizations to {}", self.len(), path.display());
        Ok(path)
    }
}

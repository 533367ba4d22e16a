//! Blob object
//!
//! Blobs store file content. They contain only the raw bytes, without any
//! metadata like filename or permissions (those are stored in trees).
//!
//! ## Format
//!
//! On disk: `blob <size>\0<content>`

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::snapshot::entry_mode::FileMode;
use bytes::Bytes;
use derive_new::new;
use std::io::{BufRead, Read, Write};

/// Blob object representing file content
///
/// Blobs are the fundamental unit of file storage. Each unique file content is
/// stored once, identified by its SHA-256 hash.
#[derive(Debug, Clone, new)]
pub struct Blob {
    /// Raw file content
    content: Bytes,
    /// File mode (permissions), known only when read from the workspace
    mode: FileMode,
}

impl Blob {
    pub fn mode(&self) -> &FileMode {
        &self.mode
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }
}

impl Packable for Blob {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut blob_bytes = Vec::new();
        let header = format!("{} {}\0", self.object_type().as_str(), self.content.len());
        blob_bytes.write_all(header.as_bytes())?;
        blob_bytes.write_all(&self.content)?;

        Ok(Bytes::from(blob_bytes))
    }
}

impl Unpackable for Blob {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        // the header has already been read
        let mut content = Vec::new();
        let mut reader = reader;
        reader.read_to_end(&mut content)?;

        Ok(Self::new(content.into(), Default::default()))
    }
}

impl Object for Blob {
    fn object_type(&self) -> ObjectType {
        ObjectType::Blob
    }
}

//! Object identifier (SHA-256 hash)
//!
//! Object IDs are 64-character hexadecimal strings representing SHA-256 hashes.
//! They uniquely identify all objects in the store (blobs, trees, commits);
//! hash equality is treated as content equality.
//!
//! ## Storage
//!
//! Objects are stored in `.tuck/objects/<first-2-chars>/<remaining-62-chars>`

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use std::io;
use std::path::PathBuf;

/// Object identifier (SHA-256 hash)
///
/// A 64-character hexadecimal string that uniquely identifies an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id))
    }

    /// Write the object ID in binary format (32 bytes)
    ///
    /// Used when serializing tree entries.
    pub fn write_h64_to<W: io::Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        let hex64 = self.as_ref();

        // Process a nibble at a time
        for i in (0..OBJECT_ID_LENGTH).step_by(2) {
            let byte = u8::from_str_radix(&hex64[i..i + 2], 16)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Invalid hex digit"))?;
            writer.write_all(&[byte])?;
        }

        Ok(())
    }

    /// Read an object ID from binary format (32 bytes)
    ///
    /// Used when deserializing tree entries.
    pub fn read_h64_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut hex64 = String::with_capacity(OBJECT_ID_LENGTH);
        let mut buffer = [0; 1];

        for _ in 0..(OBJECT_ID_LENGTH / 2) {
            reader.read_exact(&mut buffer)?;
            let hex_pair = &format!("{:02x}", u8::from_be_bytes(buffer));
            hex64.push_str(hex_pair);
        }

        Self::try_parse(hex64)
    }

    /// Convert to file system path for object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 chars.
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// Get abbreviated form of the object ID (first 7 characters)
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length_and_non_hex_characters() {
        assert!(ObjectId::try_parse("abc123".to_string()).is_err());
        assert!(ObjectId::try_parse("g".repeat(OBJECT_ID_LENGTH)).is_err());
        assert!(ObjectId::try_parse("0".repeat(OBJECT_ID_LENGTH)).is_ok());
    }

    #[test]
    fn splits_into_directory_and_file_name() {
        let oid = ObjectId::try_parse(format!("ab{}", "c".repeat(62))).unwrap();
        assert_eq!(oid.to_path(), PathBuf::from("ab").join("c".repeat(62)));
    }

    #[test]
    fn binary_round_trip_preserves_the_id() {
        let oid = ObjectId::try_parse("0123456789abcdef".repeat(4)).unwrap();
        let mut raw = Vec::new();
        oid.write_h64_to(&mut raw).unwrap();
        assert_eq!(raw.len(), OBJECT_ID_LENGTH / 2);

        let read_back = ObjectId::read_h64_from(&mut raw.as_slice()).unwrap();
        assert_eq!(read_back, oid);
    }
}

//! Content checksums.
//!
//! Checksums are CRC-32 (the zlib/gzip polynomial) stored as `i32`, the
//! width of the checksum column in migration history tables. Which bytes go
//! into the CRC depends on the [`ChecksumPolicy`]. Changing the policy for an
//! artifact kind changes every checksum of that kind, so the policy is part of
//! the naming contract:
//!
//! | Artifact kind | Policy |
//! |---------------|--------|
//! | SQL scripts   | [`ChecksumPolicy::Lines`] unless configured otherwise |
//! | Code units    | declared by the unit, or absent |

use serde::{Deserialize, Serialize};

use crate::error::{MigrateResult, MigrationError};

/// How artifact content is normalized before checksumming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumPolicy {
    /// CRC over the raw bytes.
    RawBytes,
    /// CRC over each line's UTF-8 bytes, without line terminators.
    ///
    /// `\n`, `\r\n` and `\r` all end a line, so the checksum does not depend
    /// on line-ending style or on a trailing newline.
    #[default]
    Lines,
    /// Like [`ChecksumPolicy::Lines`], with surrounding whitespace trimmed from
    /// each line.
    TrimmedLines,
}

impl ChecksumPolicy {
    /// Short name, as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawBytes => "raw_bytes",
            Self::Lines => "lines",
            Self::TrimmedLines => "trimmed_lines",
        }
    }

    /// Checksum artifact content under this policy.
    ///
    /// `location` is only used to name the artifact when the content is not
    /// valid UTF-8 under a line-based policy.
    pub fn checksum(&self, content: &[u8], location: &str) -> MigrateResult<i32> {
        match self {
            Self::RawBytes => Ok(checksum_bytes(content)),
            Self::Lines | Self::TrimmedLines => {
                let text = std::str::from_utf8(content).map_err(|e| {
                    MigrationError::content(
                        location,
                        format!("unable to calculate checksum, content is not valid UTF-8: {}", e),
                    )
                })?;
                Ok(self.checksum_str(text))
            }
        }
    }

    /// Checksum already-decoded text under this policy.
    pub fn checksum_str(&self, text: &str) -> i32 {
        match self {
            Self::RawBytes => checksum_bytes(text.as_bytes()),
            Self::Lines => fold_lines(lines(text)),
            Self::TrimmedLines => fold_lines(lines(text).map(str::trim)),
        }
    }
}

impl std::fmt::Display for ChecksumPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CRC-32 of raw bytes.
pub fn checksum_bytes(content: &[u8]) -> i32 {
    crc32fast::hash(content) as i32
}

fn fold_lines<'a>(lines: impl Iterator<Item = &'a str>) -> i32 {
    let mut hasher = crc32fast::Hasher::new();
    for line in lines {
        hasher.update(line.as_bytes());
    }
    hasher.finalize() as i32
}

/// Split text into lines on `\n`, `\r\n` or `\r`.
///
/// A terminator at the very end does not start another line.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(['\n', '\r']) {
            Some(i) => {
                let line = &rest[..i];
                let skip = if rest[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[i + skip..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = "";
                Some(line)
            }
        }
    })
}

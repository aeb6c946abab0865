//! Loadable resources and the scanners that find them.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{MigrateResult, MigrationError};
use crate::location::{Location, LocationKind};

const UTF8_BOM: char = '\u{feff}';

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Embedded(Arc<[u8]>),
}

/// A named, loadable content blob found at a location.
#[derive(Debug, Clone)]
pub struct Resource {
    path: String,
    filename: String,
    physical_location: String,
    source: Source,
}

impl Resource {
    /// A resource backed by a file on disk.
    ///
    /// `path` is relative to the scanned location, `/` separated.
    pub fn file(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = file.into();
        Self {
            filename: filename_of(&path).to_string(),
            physical_location: file.display().to_string(),
            path,
            source: Source::File(file),
        }
    }

    /// A resource whose content lives in memory.
    ///
    /// `path` is relative to the scanned location; `physical_location`
    /// describes where the content came from.
    pub fn in_memory(
        path: impl Into<String>,
        physical_location: impl Into<String>,
        content: Arc<[u8]>,
    ) -> Self {
        let path = path.into();
        Self {
            filename: filename_of(&path).to_string(),
            physical_location: physical_location.into(),
            path,
            source: Source::Embedded(content),
        }
    }

    /// Path relative to the location it was found in.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The file name, without directories.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Human-readable origin, for diagnostics.
    pub fn physical_location(&self) -> &str {
        &self.physical_location
    }

    /// Load the raw content.
    pub fn load_bytes(&self) -> MigrateResult<Cow<'_, [u8]>> {
        match &self.source {
            Source::File(file) => std::fs::read(file)
                .map(Cow::Owned)
                .map_err(|e| MigrationError::io(self.physical_location.clone(), e)),
            Source::Embedded(bytes) => Ok(Cow::Borrowed(&bytes[..])),
        }
    }

    /// Load the content as UTF-8 text, dropping a leading byte order mark.
    pub fn load_as_string(&self) -> MigrateResult<String> {
        let bytes = self.load_bytes()?;
        let text = String::from_utf8(bytes.into_owned()).map_err(|e| {
            MigrationError::content(
                self.physical_location.clone(),
                format!("content is not valid UTF-8: {}", e.utf8_error()),
            )
        })?;
        Ok(match text.strip_prefix(UTF8_BOM) {
            Some(stripped) => stripped.to_string(),
            None => text,
        })
    }
}

fn filename_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn matches(filename: &str, prefix: &str, suffix: &str) -> bool {
    filename.len() >= prefix.len() + suffix.len()
        && filename.starts_with(prefix)
        && filename.ends_with(suffix)
}

/// Finds resources at a location.
pub trait ResourceScanner: Send + Sync {
    /// Return every resource under `location` whose file name starts with
    /// `prefix` and ends with `suffix`, sorted by path.
    ///
    /// Locations of a kind the scanner does not handle yield no resources.
    fn scan_for_resources(
        &self,
        location: &Location,
        prefix: &str,
        suffix: &str,
    ) -> MigrateResult<Vec<Resource>>;
}

/// Scans directories on disk, recursively.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemScanner;

impl FileSystemScanner {
    fn walk(
        root: &Path,
        dir: &Path,
        prefix: &str,
        suffix: &str,
        found: &mut Vec<Resource>,
    ) -> MigrateResult<()> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| MigrationError::io(dir.display().to_string(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| MigrationError::io(dir.display().to_string(), e))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| MigrationError::io(path.display().to_string(), e))?;
            if file_type.is_dir() {
                Self::walk(root, &path, prefix, suffix, found)?;
                continue;
            }
            // Linked directories are not descended into, so cycles terminate.
            if file_type.is_symlink() && path.is_dir() {
                debug!(path = %path.display(), "Skipping symlinked directory");
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !matches(filename, prefix, suffix) {
                continue;
            }
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            found.push(Resource::file(relative, path));
        }
        Ok(())
    }
}

impl ResourceScanner for FileSystemScanner {
    fn scan_for_resources(
        &self,
        location: &Location,
        prefix: &str,
        suffix: &str,
    ) -> MigrateResult<Vec<Resource>> {
        if location.kind() != LocationKind::FileSystem {
            return Ok(Vec::new());
        }

        let root = Path::new(location.path());
        if !root.is_dir() {
            warn!(location = %location, "Skipping filesystem location (not found or not a directory)");
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        Self::walk(root, root, prefix, suffix, &mut found)?;
        found.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(location = %location, prefix, suffix, count = found.len(), "Scanned filesystem location");
        Ok(found)
    }
}

/// Resources compiled into the binary, addressed by `/`-separated paths.
///
/// ```rust
/// use sluice_migrate::resource::EmbeddedResources;
///
/// let resources = EmbeddedResources::new()
///     .with("db/migration/V1__Create_users.sql", "CREATE TABLE users (id INT);");
/// assert_eq!(resources.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedResources {
    entries: BTreeMap<String, Arc<[u8]>>,
}

impl EmbeddedResources {
    /// Create an empty set of resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource.
    pub fn add(&mut self, path: &str, content: impl AsRef<[u8]>) {
        let path = path.trim_start_matches('/').to_string();
        self.entries.insert(path, Arc::from(content.as_ref()));
    }

    /// Add a resource, builder style.
    pub fn with(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.add(path, content);
        self
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no resources.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceScanner for EmbeddedResources {
    fn scan_for_resources(
        &self,
        location: &Location,
        prefix: &str,
        suffix: &str,
    ) -> MigrateResult<Vec<Resource>> {
        if location.kind() != LocationKind::Embedded {
            return Ok(Vec::new());
        }

        let base = if location.path().is_empty() {
            String::new()
        } else {
            format!("{}/", location.path())
        };

        let found: Vec<Resource> = self
            .entries
            .range(base.clone()..)
            .take_while(|(path, _)| path.starts_with(&base))
            .filter(|(path, _)| matches(filename_of(path), prefix, suffix))
            .map(|(path, content)| {
                Resource::in_memory(
                    &path[base.len()..],
                    format!("embedded:{}", path),
                    Arc::clone(content),
                )
            })
            .collect();
        debug!(location = %location, prefix, suffix, count = found.len(), "Scanned embedded location");
        Ok(found)
    }
}

/// Scanner handling both embedded and filesystem locations.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    embedded: EmbeddedResources,
    filesystem: FileSystemScanner,
}

impl Scanner {
    /// A scanner with no embedded resources.
    pub fn new() -> Self {
        Self::default()
    }

    /// A scanner over the given embedded resources and the filesystem.
    pub fn with_embedded(embedded: EmbeddedResources) -> Self {
        Self {
            embedded,
            filesystem: FileSystemScanner,
        }
    }
}

impl ResourceScanner for Scanner {
    fn scan_for_resources(
        &self,
        location: &Location,
        prefix: &str,
        suffix: &str,
    ) -> MigrateResult<Vec<Resource>> {
        match location.kind() {
            LocationKind::Embedded => self.embedded.scan_for_resources(location, prefix, suffix),
            LocationKind::FileSystem => {
                self.filesystem.scan_for_resources(location, prefix, suffix)
            }
        }
    }
}

// crates/engine/src/adapters/resources.rs

//! `CertificateLoader`s for `@raw/NAME` debug certificates.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::collaborators::CertificateLoader;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::types::EngineDefaults;

/// Certificates handed over by the host, keyed by resource name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCertificateLoader {
    resources: HashMap<String, Vec<u8>>,
}

impl InMemoryCertificateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.resources.insert(name.into(), bytes.into());
    }

    pub fn with(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<(String, Vec<u8>)> for InMemoryCertificateLoader {
    fn from_iter<T: IntoIterator<Item = (String, Vec<u8>)>>(iter: T) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

impl CertificateLoader for InMemoryCertificateLoader {
    fn load(&self, name: &str) -> EngineResult<Vec<u8>> {
        self.resources.get(name).cloned().ok_or_else(|| {
            EngineError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no certificate resource named {name:?}"),
            ))
        })
    }
}

/// Looks up `NAME` in a directory, trying the bare name first and then
/// `NAME.pem`, `NAME.crt`, `NAME.cer`, `NAME.der`.
#[derive(Debug, Clone)]
pub struct DirectoryCertificateLoader {
    root: PathBuf,
}

impl DirectoryCertificateLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let bare = self.root.join(name);
        let with_ext = EngineDefaults::RAW_RESOURCE_EXTENSIONS
            .iter()
            .map(move |ext| self.root.join(format!("{name}.{ext}")));
        std::iter::once(bare).chain(with_ext)
    }
}

impl CertificateLoader for DirectoryCertificateLoader {
    fn load(&self, name: &str) -> EngineResult<Vec<u8>> {
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." || name == "." {
            return Err(EngineError::InvalidParameters(format!(
                "certificate resource name must be a plain file name: {name:?}"
            )));
        }
        for path in self.candidates(name) {
            if path.is_file() {
                debug!(path = %path.display(), "loading certificate resource");
                return Ok(fs::read(&path)?);
            }
        }
        Err(EngineError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no certificate resource {name:?} under {}", self.root.display()),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_loader_returns_inserted_bytes() {
        let loader = InMemoryCertificateLoader::new().with("debug_ca", b"bytes".to_vec());
        assert_eq!(loader.load("debug_ca").unwrap(), b"bytes");
        assert!(matches!(loader.load("other"), Err(EngineError::Io(_))));
    }

    #[test]
    fn directory_loader_tries_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("debug_ca.pem"), b"pem").unwrap();
        fs::write(dir.path().join("plain"), b"bare").unwrap();
        let loader = DirectoryCertificateLoader::new(dir.path());

        assert_eq!(loader.load("debug_ca").unwrap(), b"pem");
        assert_eq!(loader.load("plain").unwrap(), b"bare");
        assert!(matches!(loader.load("missing"), Err(EngineError::Io(_))));
    }

    #[test]
    fn directory_loader_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DirectoryCertificateLoader::new(dir.path());
        for name in ["../etc/passwd", "a/b", "..", ""] {
            assert!(matches!(loader.load(name), Err(EngineError::InvalidParameters(_))), "{name}");
        }
    }
}

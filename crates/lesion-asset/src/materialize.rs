/*!
Copies bundled assets into local storage.

Bundled assets live somewhere read-only (an application bundle, an
install prefix, or bytes compiled into the binary). The engine wants a
real file path, so each asset is copied once into a cache directory and
the copy is reused afterwards.

Copies are written to a `.part` sibling and renamed into place, so an
interrupted copy never looks like a finished one.
*/

use crate::AssetError;
use std::{
    collections::HashMap,
    ffi::OsString,
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

/// Somewhere bundled assets can be read from by name.
pub trait AssetSource: Send + Sync {
    /// Open the asset `name` for reading.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>>;

    /// Size in bytes of the asset `name`.
    fn len(&self, name: &str) -> io::Result<u64>;
}

/// Assets stored as files in a directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirSource {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(self.root.join(name))?))
    }

    fn len(&self, name: &str) -> io::Result<u64> {
        Ok(fs::metadata(self.root.join(name))?.len())
    }
}

/// Assets held in memory, e.g. from `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the asset `name`.
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.assets.insert(name.into(), data.into());
    }

    pub fn with(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    fn get(&self, name: &str) -> io::Result<&[u8]> {
        self.assets.get(name).map(Vec::as_slice).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no bundled asset named {:?}", name),
            )
        })
    }
}

impl AssetSource for MemorySource {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.get(name)?))
    }

    fn len(&self, name: &str) -> io::Result<u64> {
        Ok(self.get(name)?.len() as u64)
    }
}

/// When an existing local copy gets replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Any non-empty local copy is kept.
    #[default]
    Never,

    /// The local copy is replaced when its size differs from the bundled asset.
    SizeChanged,
}

/// Copies assets from a [`AssetSource`] into a cache directory.
pub struct Materializer<S> {
    source: S,
    cache_dir: PathBuf,
    policy: RefreshPolicy,
    copies: AtomicUsize,
}

impl<S> Materializer<S>
where
    S: AssetSource,
{
    pub fn new(source: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            cache_dir: cache_dir.into(),
            policy: RefreshPolicy::default(),
            copies: AtomicUsize::new(0),
        }
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Number of copies performed so far.
    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::Relaxed)
    }

    /// Where the local copy of `name` lives, whether or not it exists yet.
    pub fn cached_path(&self, name: &str) -> Result<PathBuf, AssetError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => Ok(self.cache_dir.join(name)),
            _ => Err(AssetError::InvalidName(name.to_owned())),
        }
    }

    /// Ensure a local copy of `name` exists and return its path.
    ///
    /// A copy is made when none exists yet, when the existing one is
    /// empty, or when the [`RefreshPolicy`] says it's stale. Otherwise
    /// the existing file is returned untouched.
    pub fn materialize(&self, name: &str) -> Result<PathBuf, AssetError> {
        let path = self.cached_path(name)?;

        if self.is_fresh(name, &path)? {
            log::debug!("reusing local copy {:?}", path);
            return Ok(path);
        }

        fs::create_dir_all(&self.cache_dir).map_err(|source| AssetError::Cache {
            path: self.cache_dir.clone(),
            source,
        })?;

        let mut partial = OsString::from(path.as_os_str());
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let bytes = match self.copy_to(name, &partial) {
            Ok(bytes) => bytes,
            Err(e) => {
                // Nothing else reads the partial file.
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        };

        fs::rename(&partial, &path).map_err(|source| AssetError::Cache {
            path: path.clone(),
            source,
        })?;

        self.copies.fetch_add(1, Ordering::Relaxed);
        log::info!("copied {:?} ({} bytes) to {:?}", name, bytes, path);

        Ok(path)
    }

    fn is_fresh(&self, name: &str, path: &Path) -> Result<bool, AssetError> {
        let local_len = match fs::metadata(path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => meta.len(),
            _ => return Ok(false),
        };

        match self.policy {
            RefreshPolicy::Never => Ok(true),
            RefreshPolicy::SizeChanged => {
                let bundled_len = self.source.len(name).map_err(|source| AssetError::Bundled {
                    name: name.to_owned(),
                    source,
                })?;

                if bundled_len != local_len {
                    log::debug!(
                        "local copy of {:?} is {} bytes, bundled is {}",
                        name,
                        local_len,
                        bundled_len
                    );
                }

                Ok(bundled_len == local_len)
            }
        }
    }

    fn copy_to(&self, name: &str, partial: &Path) -> Result<u64, AssetError> {
        let mut input = self.source.open(name).map_err(|source| AssetError::Bundled {
            name: name.to_owned(),
            source,
        })?;

        let file = File::create(partial).map_err(|source| AssetError::Cache {
            path: partial.to_owned(),
            source,
        })?;

        let mut output = BufWriter::new(file);
        let copy_err = |source| AssetError::Copy {
            name: name.to_owned(),
            source,
        };

        let bytes = io::copy(&mut input, &mut output).map_err(copy_err)?;
        output.flush().map_err(copy_err)?;

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_names_outside_cache() {
        let materializer = Materializer::new(MemorySource::new(), "cache");

        for name in ["../escape.lsna", "nested/model.lsna", "/abs.lsna", "", ".."] {
            assert!(
                matches!(
                    materializer.cached_path(name),
                    Err(AssetError::InvalidName(_))
                ),
                "{:?} should be rejected",
                name
            );
        }

        assert_eq!(
            materializer.cached_path("lesion_model.lsna").unwrap(),
            Path::new("cache").join("lesion_model.lsna")
        );
    }
}

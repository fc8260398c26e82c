use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use crate::internal::errors::{Error, Result};

const SOURCE_EXTENSION: &str = "sol";

/// Logical file name to verbatim source content. Iterates in sorted key order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceSet {
  sources: BTreeMap<String, Vec<u8>>,
}

impl SourceSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Walk `root` recursively and collect every `.sol` file, keyed by its
  /// `/`-separated path relative to `root`.
  pub fn from_dir(root: impl AsRef<Path>) -> Result<Self> {
    let root = root.as_ref();
    let mut set = SourceSet::new();
    collect_dir(root, root, &mut set)?;
    log::debug!("collected {} source files from {}", set.len(), root.display());
    Ok(set)
  }

  /// Insert or replace a source. Returns the previous content for `name`, if any.
  pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
    self.sources.insert(name.into(), content.into())
  }

  pub fn get(&self, name: &str) -> Option<&[u8]> {
    self.sources.get(name).map(Vec::as_slice)
  }

  pub fn len(&self) -> usize {
    self.sources.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sources.is_empty()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.sources.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
    self
      .sources
      .iter()
      .map(|(name, content)| (name.as_str(), content.as_slice()))
  }
}

impl<K, V> FromIterator<(K, V)> for SourceSet
where
  K: Into<String>,
  V: Into<Vec<u8>>,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut set = SourceSet::new();
    for (name, content) in iter {
      set.insert(name, content);
    }
    set
  }
}

fn collect_dir(root: &Path, dir: &Path, set: &mut SourceSet) -> Result<()> {
  let read_error = |source| Error::SourceRead {
    path: dir.to_path_buf(),
    source,
  };
  let mut entries = fs::read_dir(dir)
    .map_err(read_error)?
    .collect::<std::io::Result<Vec<_>>>()
    .map_err(read_error)?;
  entries.sort_by_key(|entry| entry.file_name());

  for entry in entries {
    let path = entry.path();
    let file_type = entry.file_type().map_err(|source| Error::SourceRead {
      path: path.clone(),
      source,
    })?;

    if file_type.is_dir() {
      collect_dir(root, &path, set)?;
      continue;
    }

    let is_source = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(|ext| ext == SOURCE_EXTENSION)
      .unwrap_or(false);
    if !is_source {
      continue;
    }

    let content = fs::read(&path).map_err(|source| Error::SourceRead {
      path: path.clone(),
      source,
    })?;
    set.insert(logical_name(root, &path), content);
  }

  Ok(())
}

fn logical_name(root: &Path, path: &Path) -> String {
  let relative = path.strip_prefix(root).unwrap_or(path);
  relative
    .components()
    .filter_map(|component| match component {
      Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}

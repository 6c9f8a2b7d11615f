//! YAML file helpers shared by every register.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RegisterError, Result};

/// Read and parse a YAML document. A missing file is `NotFound`.
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let raw = match fs::read_to_string(path) {
    Ok(s) => s,
    Err(e) if e.kind() == ErrorKind::NotFound => return Err(RegisterError::not_found(path)),
    Err(e) => return Err(RegisterError::io(path, e)),
  };
  tracing::debug!(path = %path.display(), bytes = raw.len(), "loaded yaml");
  serde_yaml::from_str(&raw).map_err(|e| RegisterError::yaml(path, e))
}

/// Like [`read`], but a missing file yields `Ok(None)`.
pub fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
  match read(path) {
    Ok(v) => Ok(Some(v)),
    Err(RegisterError::NotFound { .. }) => Ok(None),
    Err(e) => Err(e),
  }
}

/// Serialize and write a YAML document, creating parent directories.
pub fn write<T: Serialize>(path: &Path, value: &T) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(|e| RegisterError::io(parent, e))?;
  }
  let out = serde_yaml::to_string(value).map_err(|e| RegisterError::yaml(path, e))?;
  fs::write(path, out).map_err(|e| RegisterError::io(path, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  #[test]
  fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = read::<BTreeMap<String, String>>(&path).unwrap_err();
    assert!(matches!(err, RegisterError::NotFound { .. }));
    assert!(read_optional::<BTreeMap<String, String>>(&path).unwrap().is_none());
  }

  #[test]
  fn malformed_yaml_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "key: [unclosed").unwrap();
    let err = read::<BTreeMap<String, String>>(&path).unwrap_err();
    assert!(err.to_string().contains("bad.yaml"));
  }

  #[test]
  fn write_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/out.yaml");
    let mut value = BTreeMap::new();
    value.insert("a".to_string(), "b".to_string());
    write(&path, &value).unwrap();
    let back: BTreeMap<String, String> = read(&path).unwrap();
    assert_eq!(back, value);
  }
}

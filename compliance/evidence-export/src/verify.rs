//! Re-hash an existing package against its manifest.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{ExportError, Result};
use crate::hash::sha256_reader;
use crate::manifest::{Manifest, MANIFEST_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
  /// Listed in the manifest but absent from the archive.
  Absent { path: String },
  Mismatch {
    path: String,
    expected: String,
    actual: String,
  },
  SizeMismatch {
    path: String,
    expected: u64,
    actual: u64,
  },
}

impl std::fmt::Display for Problem {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Problem::Absent { path } => write!(f, "{}: listed in manifest but not in archive", path),
      Problem::Mismatch {
        path,
        expected,
        actual,
      } => write!(f, "{}: sha256 {} != manifest {}", path, actual, expected),
      Problem::SizeMismatch {
        path,
        expected,
        actual,
      } => write!(f, "{}: {} bytes != manifest {}", path, actual, expected),
    }
  }
}

#[derive(Debug)]
pub struct VerifyReport {
  pub manifest: Manifest,
  pub checked: usize,
  pub problems: Vec<Problem>,
}

impl VerifyReport {
  pub fn is_ok(&self) -> bool {
    self.problems.is_empty()
  }
}

pub fn verify_archive(path: &Path) -> Result<VerifyReport> {
  let file = File::open(path).map_err(|e| match e.kind() {
    std::io::ErrorKind::NotFound => ExportError::not_found(path),
    _ => ExportError::io(path, e),
  })?;
  let mut archive = ZipArchive::new(file).map_err(|e| ExportError::zip(path, e))?;

  let manifest: Manifest = {
    let mut entry = archive.by_name(MANIFEST_NAME).map_err(|e| match e {
      ZipError::FileNotFound => ExportError::validation(MANIFEST_NAME, "missing from archive"),
      other => ExportError::zip(path, other),
    })?;
    let mut text = String::new();
    entry
      .read_to_string(&mut text)
      .map_err(|e| ExportError::io(path, e))?;
    serde_json::from_str(&text)?
  };

  let mut problems = Vec::new();
  let mut checked = 0;
  for record in &manifest.files {
    let entry = match archive.by_name(&record.path) {
      Ok(entry) => entry,
      Err(ZipError::FileNotFound) => {
        problems.push(Problem::Absent {
          path: record.path.clone(),
        });
        continue;
      }
      Err(e) => return Err(ExportError::zip(path, e)),
    };
    let (actual, size) = sha256_reader(entry).map_err(|e| ExportError::io(path, e))?;
    checked += 1;
    if actual != record.sha256 {
      problems.push(Problem::Mismatch {
        path: record.path.clone(),
        expected: record.sha256.clone(),
        actual,
      });
    } else if size != record.size_bytes {
      problems.push(Problem::SizeMismatch {
        path: record.path.clone(),
        expected: record.size_bytes,
        actual: size,
      });
    }
  }

  tracing::debug!(
    archive = %path.display(),
    checked,
    problems = problems.len(),
    "verified"
  );
  Ok(VerifyReport {
    manifest,
    checked,
    problems,
  })
}

//! Build the evidence zip: copy each planned file, hash it, and write the
//! manifest and auditor README alongside.

use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ExportError, Result};
use crate::hash::{copy_hashed, CopyError};
use crate::manifest::*;
use crate::plan::{archive_name, ExportPlan};
use crate::readme::auditor_readme;

const GENERATOR: &str = "evidence-export";
const PURPOSE: &str = "SOC-2 and ISO 27001 Compliance Evidence Package";

/// Outcome of one export. `failures` holds every file that could not be
/// archived; the rest are in the package.
#[derive(Debug)]
pub struct ExportReport {
  pub output: PathBuf,
  pub manifest: Manifest,
  pub failures: Vec<ExportError>,
}

impl ExportReport {
  pub fn included(&self) -> usize {
    self.manifest.files.len()
  }

  pub fn missing(&self) -> impl Iterator<Item = &Path> {
    self.failures.iter().filter_map(|f| match f {
      ExportError::NotFound { path } => Some(path.as_path()),
      _ => None,
    })
  }
}

/// Presence of a planned file, for dry runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
  pub path: String,
  pub present: bool,
}

/// An opened evidence file and the name it is archived under.
struct Source {
  name: String,
  file: File,
  modified: String,
}

#[derive(Default)]
struct Failures {
  missing: Vec<String>,
  rejected: Vec<String>,
  all: Vec<ExportError>,
}

impl Failures {
  fn push(&mut self, rel: &str, err: ExportError) {
    match &err {
      ExportError::NotFound { .. } => {
        tracing::warn!(file = %rel, "evidence file missing");
        self.missing.push(rel.to_string());
      }
      other => {
        tracing::warn!(file = %rel, error = %other, "evidence file rejected");
        self.rejected.push(rel.to_string());
      }
    }
    self.all.push(err);
  }
}

#[derive(Debug, Clone)]
pub struct Exporter {
  root: PathBuf,
  generated_at: DateTime<Utc>,
}

impl Exporter {
  pub fn new(root: impl Into<PathBuf>, generated_at: DateTime<Utc>) -> Self {
    Self {
      root: root.into(),
      generated_at,
    }
  }

  /// `Compliance_Evidence_Package_<YYYYmmdd_HHMMSS>.zip` under the root.
  pub fn default_output(&self) -> PathBuf {
    self.root.join(format!(
      "Compliance_Evidence_Package_{}.zip",
      self.generated_at.format("%Y%m%d_%H%M%S")
    ))
  }

  pub fn list(&self, plan: &ExportPlan) -> Vec<PlannedFile> {
    plan
      .files
      .iter()
      .map(|path| PlannedFile {
        path: path.clone(),
        present: archive_name(path).is_ok() && self.root.join(path).is_file(),
      })
      .collect()
  }

  /// Open one planned file. Per-file problems come back as the error.
  fn open_source(&self, rel: &str) -> Result<Source> {
    let name = archive_name(rel)?;
    let path = self.root.join(rel);
    let meta = match fs::metadata(&path) {
      Ok(m) if m.is_file() => m,
      Ok(_) => return Err(ExportError::validation(rel, "not a regular file")),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(ExportError::not_found(Path::new(rel)))
      }
      Err(e) => return Err(ExportError::io(&path, e)),
    };
    let file = File::open(&path).map_err(|e| ExportError::io(&path, e))?;
    let modified = meta
      .modified()
      .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Secs, true))
      .unwrap_or_default();
    Ok(Source {
      name,
      file,
      modified,
    })
  }

  /// Write the package to `output`. Archive write failures are fatal and
  /// remove the partial archive; a missing or rejected source file is
  /// recorded and the export continues.
  pub fn export(&self, plan: &ExportPlan, output: &Path) -> Result<ExportReport> {
    plan.validate()?;
    let file = File::create(output).map_err(|e| ExportError::io(output, e))?;
    self.write_package(plan, file, output).inspect_err(|_| {
      if let Err(e) = fs::remove_file(output) {
        tracing::warn!(output = %output.display(), error = %e, "could not remove partial archive");
      }
    })
  }

  fn write_package<W: Write + Seek>(
    &self,
    plan: &ExportPlan,
    sink: W,
    output: &Path,
  ) -> Result<ExportReport> {
    let mut zip = ZipWriter::new(sink);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut files = Vec::new();
    let mut failures = Failures::default();

    for rel in &plan.files {
      let Source {
        name,
        file,
        modified,
      } = match self.open_source(rel) {
        Ok(s) => s,
        Err(e) => {
          failures.push(rel, e);
          continue;
        }
      };

      zip
        .start_file(name.as_str(), options)
        .map_err(|e| ExportError::zip(output, e))?;
      match copy_hashed(file, &mut zip) {
        Ok((sha256, size_bytes)) => {
          tracing::debug!(file = %name, bytes = size_bytes, "archived");
          files.push(FileRecord {
            path: name,
            sha256,
            size_bytes,
            modified,
          });
        }
        Err(CopyError::Read(e)) => {
          zip.abort_file().map_err(|e| ExportError::zip(output, e))?;
          failures.push(rel, ExportError::io(&self.root.join(rel), e));
        }
        Err(CopyError::Write(e)) => return Err(ExportError::io(output, e)),
      }
    }

    let manifest = Manifest {
      metadata: ManifestMetadata {
        generated: self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        generator: GENERATOR.to_string(),
        version: MANIFEST_VERSION.to_string(),
        purpose: PURPOSE.to_string(),
      },
      statistics: Statistics {
        files_included: files.len(),
        files_missing: failures.missing.len(),
        files_rejected: failures.rejected.len(),
        total_expected: plan.files.len(),
      },
      files,
      missing_files: failures.missing,
      rejected_files: failures.rejected,
      evidence_categories: plan.categories.clone(),
    };

    let json = serde_json::to_string_pretty(&manifest)?;
    zip
      .start_file(MANIFEST_NAME, options)
      .map_err(|e| ExportError::zip(output, e))?;
    zip
      .write_all(json.as_bytes())
      .map_err(|e| ExportError::io(output, e))?;

    zip
      .start_file(README_NAME, options)
      .map_err(|e| ExportError::zip(output, e))?;
    zip
      .write_all(auditor_readme(self.generated_at, &plan.categories).as_bytes())
      .map_err(|e| ExportError::io(output, e))?;

    zip.finish().map_err(|e| ExportError::zip(output, e))?;
    tracing::info!(
      output = %output.display(),
      included = manifest.files.len(),
      failed = failures.all.len(),
      "evidence package written"
    );

    Ok(ExportReport {
      output: output.to_path_buf(),
      manifest,
      failures: failures.all,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use std::io::{self, Cursor, SeekFrom};

  fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap()
  }

  #[test]
  fn default_output_is_timestamped() {
    let ex = Exporter::new("/repo", at());
    assert_eq!(
      ex.default_output(),
      PathBuf::from("/repo/Compliance_Evidence_Package_20260203_040506.zip")
    );
  }

  #[test]
  fn list_marks_missing_and_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let ex = Exporter::new(dir.path(), at());
    let plan = ExportPlan::new(vec!["a.txt".into(), "b.txt".into(), "../a.txt".into()]);
    let present: Vec<bool> = ex.list(&plan).into_iter().map(|p| p.present).collect();
    assert_eq!(present, vec![true, false, false]);
  }

  #[test]
  fn escaping_path_is_a_validation_failure() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let out = dir.path().join("out.zip");
    let plan = ExportPlan::new(vec!["a.txt".into(), "../etc/passwd".into()]);
    let report = Exporter::new(dir.path(), at()).export(&plan, &out).unwrap();
    assert_eq!(report.included(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0], ExportError::Validation { .. }));
    assert_eq!(report.manifest.rejected_files, vec!["../etc/passwd"]);
    assert_eq!(report.manifest.statistics.files_rejected, 1);
  }

  #[test]
  fn file_named_like_the_manifest_is_rejected_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::write(dir.path().join("MANIFEST.json"), "{}").unwrap();
    let out = dir.path().join("out.zip");
    let plan = ExportPlan::new(vec!["a.txt".into(), "MANIFEST.json".into()]);
    let report = Exporter::new(dir.path(), at()).export(&plan, &out).unwrap();
    assert_eq!(report.included(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0], ExportError::Validation { .. }));
    assert_eq!(report.manifest.rejected_files, vec!["MANIFEST.json"]);
  }

  #[test]
  fn dotted_path_is_archived_under_its_plain_name() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs/a.txt"), "a").unwrap();
    let out = dir.path().join("out.zip");
    let plan = ExportPlan::new(vec!["./docs/a.txt".into()]);
    let report = Exporter::new(dir.path(), at()).export(&plan, &out).unwrap();
    assert_eq!(report.manifest.files[0].path, "docs/a.txt");
  }

  #[test]
  fn duplicate_plan_entries_fail_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let out = dir.path().join("out.zip");
    let plan = ExportPlan::new(vec!["a.txt".into(), "./a.txt".into()]);
    let err = Exporter::new(dir.path(), at())
      .export(&plan, &out)
      .unwrap_err();
    assert!(matches!(err, ExportError::Validation { .. }));
    assert!(!out.exists());
  }

  #[test]
  fn unwritable_output_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("no/such/dir/out.zip");
    let err = Exporter::new(dir.path(), at())
      .export(&ExportPlan::new(vec!["a.txt".into()]), &out)
      .unwrap_err();
    assert!(matches!(err, ExportError::Io { .. }));
  }

  /// Accepts nothing: every write fails.
  struct FullDisk(Cursor<Vec<u8>>);

  impl Write for FullDisk {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::Other, "no space left"))
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  impl Seek for FullDisk {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
      self.0.seek(pos)
    }
  }

  #[test]
  fn archive_write_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let out = dir.path().join("out.zip");
    let err = Exporter::new(dir.path(), at())
      .write_package(
        &ExportPlan::new(vec!["a.txt".into()]),
        FullDisk(Cursor::new(Vec::new())),
        &out,
      )
      .unwrap_err();
    assert!(matches!(
      err,
      ExportError::Zip { .. } | ExportError::Io { .. }
    ));
  }
}

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::controller::{ExportError, ExportResult};
use crate::traits::FileSystem;

/// Run directory name derived from the fetch time
pub const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// A serialized artifact held in memory until every artifact rendered
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    pub kind: &'static str,
    pub file_name: String,
    pub contents: String,
}

impl RenderedArtifact {
    /// Pretty-printed JSON artifact
    pub fn json<T: Serialize>(
        kind: &'static str,
        file_name: impl Into<String>,
        value: &T,
    ) -> ExportResult<Self> {
        let file_name = file_name.into();
        let contents = serde_json::to_string_pretty(value).map_err(|e| ExportError::Serialization {
            artifact: file_name.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            kind,
            file_name,
            contents,
        })
    }

    /// YAML artifact
    pub fn yaml<T: Serialize>(
        kind: &'static str,
        file_name: impl Into<String>,
        value: &T,
    ) -> ExportResult<Self> {
        let file_name = file_name.into();
        let body = serde_yaml::to_string(value).map_err(|e| ExportError::Serialization {
            artifact: file_name.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            kind,
            file_name,
            contents: format!("---\n{}", body),
        })
    }
}

/// Writes artifacts of one run into `<output>/<stamp>/`
pub struct ArtifactWriter<'a> {
    fs: &'a dyn FileSystem,
    run_dir: PathBuf,
}

impl<'a> ArtifactWriter<'a> {
    pub fn new<Tz: TimeZone>(
        fs: &'a dyn FileSystem,
        output_dir: &Path,
        fetched_at: &DateTime<Tz>,
    ) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            fs,
            run_dir: output_dir.join(fetched_at.format(STAMP_FORMAT).to_string()),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Sibling of the run directory that holds artifacts until all are written
    pub fn staging_dir(&self) -> PathBuf {
        let mut name = self.run_dir.clone().into_os_string();
        name.push(".partial");
        PathBuf::from(name)
    }

    /// Write all artifacts, returning the written paths in order. Either every
    /// artifact lands in the run directory or none does.
    pub fn write_all(&self, artifacts: &[RenderedArtifact]) -> Result<Vec<PathBuf>> {
        let staging = self.staging_dir();
        if self.fs.exists(&staging) {
            self.fs.remove_dir_all(&staging)?;
        }

        let result = self
            .stage(&staging, artifacts)
            .and_then(|()| self.publish(&staging, artifacts));

        if self.fs.exists(&staging) {
            // Best effort; the run result is already decided
            let _ = self.fs.remove_dir_all(&staging);
        }

        result
    }

    fn stage(&self, staging: &Path, artifacts: &[RenderedArtifact]) -> Result<()> {
        self.fs
            .create_dir_all(staging)
            .with_context(|| format!("Failed to create output directory: {:?}", staging))?;

        for artifact in artifacts {
            self.fs
                .write(&staging.join(&artifact.file_name), &artifact.contents)
                .with_context(|| format!("Failed to write {} artifact", artifact.kind))?;
        }

        Ok(())
    }

    fn publish(&self, staging: &Path, artifacts: &[RenderedArtifact]) -> Result<Vec<PathBuf>> {
        let created = !self.fs.is_dir(&self.run_dir);
        self.fs
            .create_dir_all(&self.run_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", self.run_dir))?;

        let mut published = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let target = self.run_dir.join(&artifact.file_name);
            if let Err(err) = self.fs.rename(&staging.join(&artifact.file_name), &target) {
                self.roll_back(&published, created);
                return Err(err.context(format!("Failed to publish {} artifact", artifact.kind)));
            }
            published.push(target);
        }

        Ok(published)
    }

    fn roll_back(&self, published: &[PathBuf], created: bool) {
        if created {
            let _ = self.fs.remove_dir_all(&self.run_dir);
            return;
        }

        for path in published {
            let _ = self.fs.remove_file(path);
        }
    }
}

/// Make a value safe to use as part of a file name
pub fn safe_file_stem(value: &str) -> String {
    value.replace(['/', '\\', ':', ' '], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FailingFileSystem, MockFileSystem};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_run_dir_uses_fetch_timestamp() {
        let fs = MockFileSystem::new();
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let writer = ArtifactWriter::new(&fs, Path::new("output"), &fetched_at);
        assert_eq!(writer.run_dir(), Path::new("output/20240309-140507"));
    }

    #[test]
    fn test_write_all_in_order() {
        let fs = MockFileSystem::new();
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let writer = ArtifactWriter::new(&fs, Path::new("out"), &fetched_at);

        let artifacts = vec![
            RenderedArtifact::json("raw", "pool_web.json", &json!({"pool": []})).unwrap(),
            RenderedArtifact::yaml("playbook", "pool_web.yml", &json!([{"hosts": "localhost"}])).unwrap(),
        ];

        let written = writer.write_all(&artifacts).unwrap();
        assert_eq!(
            written,
            vec![
                PathBuf::from("out/20240309-140507/pool_web.json"),
                PathBuf::from("out/20240309-140507/pool_web.yml"),
            ]
        );
        assert_eq!(
            fs.get_file_contents(&written[0]).unwrap(),
            "{\n  \"pool\": []\n}"
        );
        assert!(fs.get_file_contents(&written[1]).unwrap().starts_with("---\n- hosts: localhost"));
    }

    #[test]
    fn test_existing_run_dir_is_not_an_error() {
        let fs = MockFileSystem::new();
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let writer = ArtifactWriter::new(&fs, Path::new("out"), &fetched_at);
        fs.create_dir_all(writer.run_dir()).unwrap();

        assert!(writer.write_all(&[]).is_ok());
    }

    fn sample_artifacts() -> Vec<RenderedArtifact> {
        vec![
            RenderedArtifact::json("raw", "pool_web.json", &json!({"pool": []})).unwrap(),
            RenderedArtifact::json("provider", "provider.tf.json", &json!({})).unwrap(),
            RenderedArtifact::json("resource", "resource.tf.json", &json!({})).unwrap(),
        ]
    }

    #[test]
    fn test_failed_write_leaves_no_artifacts() {
        let fs = FailingFileSystem::new(3);
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let writer = ArtifactWriter::new(&fs, Path::new("out"), &fetched_at);

        let err = writer.write_all(&sample_artifacts()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to write resource artifact"));
        assert!(fs.list_files().is_empty());
        assert!(!fs.exists(writer.run_dir()));
        assert!(!fs.exists(&writer.staging_dir()));
    }

    #[test]
    fn test_failed_write_keeps_existing_run_dir_contents() {
        let fs = FailingFileSystem::new(2);
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let writer = ArtifactWriter::new(&fs, Path::new("out"), &fetched_at);
        let notes = writer.run_dir().join("notes.txt");
        fs.write(&notes, "keep me").unwrap();

        assert!(writer.write_all(&sample_artifacts()).is_err());
        assert_eq!(fs.list_files(), vec![notes]);
        assert!(fs.is_dir(writer.run_dir()));
    }

    #[test]
    fn test_staging_dir_is_cleared_after_success() {
        let fs = MockFileSystem::new();
        let fetched_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let writer = ArtifactWriter::new(&fs, Path::new("out"), &fetched_at);
        assert_eq!(writer.staging_dir(), PathBuf::from("out/20240309-140507.partial"));

        // Leftover from an interrupted run
        fs.write(&writer.staging_dir().join("stale.json"), "{}").unwrap();

        let written = writer.write_all(&sample_artifacts()).unwrap();
        assert_eq!(fs.list_files().len(), 3);
        assert!(written.iter().all(|p| fs.has_file(p)));
        assert!(!fs.exists(&writer.staging_dir()));
    }

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("web/pool: a"), "web_pool__a");
        assert_eq!(safe_file_stem("foo_pool"), "foo_pool");
    }
}

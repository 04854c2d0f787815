//! Filesystem tarball cache.
//!
//! One materialized package version is one tarball blob
//! (`<root>/<name>-<version>.tgz`) plus its extracted tree
//! (`<root>/<name>-<version>/`). Presence of the extracted directory is the
//! only "already cached" signal: no in-memory index, so the cache survives
//! restarts and is shared between concurrent requests through the
//! filesystem. Entries are immutable once written and never evicted here;
//! the size check below merely reports growth for operators.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::warn;

use crate::config::CacheConfig;
use crate::error::ClientError;
use crate::registry::RegistryDocument;

/// Tarball transport collaborator. Implemented by the registry client;
/// tests substitute a counting mock to assert cache hits skip the network.
#[async_trait]
pub trait TarballFetcher: Send + Sync {
    async fn fetch_tarball(&self, url: &str) -> Result<Bytes>;
}

pub struct CacheStore {
    root: PathBuf,
    size_threshold: u64,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            root: config.dir.clone(),
            size_threshold: config.size_threshold_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating cache directory {}", self.root.display()))
    }

    pub fn tarball_path(&self, local_name: &str) -> PathBuf {
        self.root.join(format!("{local_name}.tgz"))
    }

    pub fn package_dir(&self, local_name: &str) -> PathBuf {
        self.root.join(local_name)
    }

    /// Make sure `exact_version`'s tarball is downloaded and extracted,
    /// doing each step at most once per cache lifetime. Returns the
    /// extraction directory.
    ///
    /// Concurrent first-time callers for the same version may both download
    /// and extract; the end state is identical, so the race is wasteful but
    /// benign. A repeat call does nothing beyond two existence checks.
    pub async fn ensure_materialized(
        &self,
        fetcher: &dyn TarballFetcher,
        doc: &RegistryDocument,
        exact_version: &str,
        local_name: &str,
    ) -> Result<PathBuf> {
        let tarball_path = self.tarball_path(local_name);
        let unpacked_dir = self.package_dir(local_name);
        let mut did_work = false;

        if !tokio::fs::try_exists(&tarball_path).await.unwrap_or(false) {
            // A dist-tag may point at a version the document no longer
            // lists; that is the upstream's inconsistency, reported as
            // not-found rather than a fault.
            let record = doc.versions.get(exact_version).ok_or_else(|| {
                ClientError::not_found(format!(
                    "version {exact_version} has no record in the registry document"
                ))
            })?;
            let body = fetcher.fetch_tarball(&record.dist.tarball).await?;
            tokio::fs::write(&tarball_path, &body)
                .await
                .with_context(|| format!("writing tarball {}", tarball_path.display()))?;
            did_work = true;
        }

        if !tokio::fs::try_exists(&unpacked_dir).await.unwrap_or(false) {
            // The tarball write above completed before this point, so a
            // partially-written blob is never extracted.
            let src = tarball_path.clone();
            let dst = unpacked_dir.clone();
            tokio::task::spawn_blocking(move || unpack_tarball(&src, &dst))
                .await
                .context("joining tarball extraction task")??;
            did_work = true;
        }

        // A full cache hit skips the size scan; walking the cache tree on
        // every hit would dominate the request.
        if did_work {
            self.check_size().await;
        }

        Ok(unpacked_dir)
    }

    /// Byte sizes of every top-level cache entry, plus their total.
    /// Directory names get a trailing `/` in the report.
    pub fn usage(&self) -> Result<CacheUsage> {
        scan_usage(&self.root)
    }

    async fn check_size(&self) {
        let root = self.root.clone();
        let report = tokio::task::spawn_blocking(move || scan_usage(&root)).await;

        match report {
            Ok(Ok(usage)) if usage.total_bytes >= self.size_threshold => {
                warn!(
                    total = %format_bytes(usage.total_bytes),
                    threshold = %format_bytes(self.size_threshold),
                    "cache folder size is at or above the threshold\n{}",
                    largest_entries_report(&usage)
                );
            }
            Ok(Ok(_)) => {}
            Ok(Err(err)) => warn!(error = %err, "failed to measure cache folder size"),
            Err(err) => warn!(error = %err, "cache size check task failed"),
        }
    }
}

fn scan_usage(root: &Path) -> Result<CacheUsage> {
    let mut entries = Vec::new();
    for entry in
        std::fs::read_dir(root).with_context(|| format!("listing cache directory {}", root.display()))?
    {
        let entry = entry.context("reading cache directory entry")?;
        let size = entry_size(&entry.path())
            .with_context(|| format!("sizing cache entry {}", entry.path().display()))?;
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_dir() {
            name.push('/');
        }
        entries.push((size, name));
    }
    let total_bytes = entries.iter().map(|(size, _)| size).sum();
    Ok(CacheUsage {
        total_bytes,
        entries,
    })
}

#[derive(Debug)]
pub struct CacheUsage {
    pub total_bytes: u64,
    /// `(size, name)` per top-level entry, unsorted.
    pub entries: Vec<(u64, String)>,
}

/// The 10 largest top-level entries, size descending, name ascending on
/// ties, one formatted line each.
pub fn largest_entries_report(usage: &CacheUsage) -> String {
    let mut entries = usage.entries.clone();
    entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    entries.truncate(10);
    entries
        .iter()
        .map(|(size, name)| format!("- {:>12}: {}", format_bytes(*size), name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn unpack_tarball(tarball: &Path, dest: &Path) -> Result<()> {
    let file =
        File::open(tarball).with_context(|| format!("opening tarball {}", tarball.display()))?;
    std::fs::create_dir_all(dest)
        .with_context(|| format!("creating extraction directory {}", dest.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive
        .unpack(dest)
        .with_context(|| format!("extracting tarball into {}", dest.display()))
}

/// Size of a file, or the recursive size of a directory.
fn entry_size(path: &Path) -> io::Result<u64> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_file() {
        return Ok(metadata.len());
    }
    let mut total = 0;
    for entry in std::fs::read_dir(path)? {
        total += entry_size(&entry?.path())?;
    }
    Ok(total)
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    use super::*;

    struct CountingFetcher {
        body: Bytes,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TarballFetcher for CountingFetcher {
        async fn fetch_tarball(&self, _url: &str) -> Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    fn tarball_bytes(files: &[(&str, &str)]) -> Bytes {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, contents.as_bytes())
                .unwrap();
        }
        Bytes::from(builder.into_inner().unwrap().finish().unwrap())
    }

    fn doc_with_version(version: &str) -> RegistryDocument {
        serde_json::from_value(serde_json::json!({
            "dist-tags": { "latest": version },
            "versions": {
                version: { "dist": { "tarball": "https://registry.invalid/pkg.tgz" } }
            }
        }))
        .unwrap()
    }

    fn store(root: &Path) -> CacheStore {
        CacheStore::new(&CacheConfig {
            dir: root.to_path_buf(),
            size_threshold_bytes: 1 << 20,
        })
    }

    #[tokio::test]
    async fn materializes_tarball_and_extraction_dir() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let fetcher = CountingFetcher {
            body: tarball_bytes(&[("package/package.json", "{\"main\":\"index.js\"}")]),
            calls: AtomicUsize::new(0),
        };
        let doc = doc_with_version("1.0.0");

        let dir = store
            .ensure_materialized(&fetcher, &doc, "1.0.0", "pkg-1.0.0")
            .await
            .unwrap();

        assert!(store.tarball_path("pkg-1.0.0").is_file());
        assert!(dir.join("package/package.json").is_file());
    }

    #[tokio::test]
    async fn second_call_performs_no_fetch() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let fetcher = CountingFetcher {
            body: tarball_bytes(&[("package/index.js", "module.exports = 1;\n")]),
            calls: AtomicUsize::new(0),
        };
        let doc = doc_with_version("2.1.0");

        store
            .ensure_materialized(&fetcher, &doc, "2.1.0", "pkg-2.1.0")
            .await
            .unwrap();
        store
            .ensure_materialized(&fetcher, &doc, "2.1.0", "pkg-2.1.0")
            .await
            .unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn extraction_is_recovered_when_only_the_directory_is_missing() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let fetcher = CountingFetcher {
            body: tarball_bytes(&[("package/index.js", "ok\n")]),
            calls: AtomicUsize::new(0),
        };
        let doc = doc_with_version("1.0.0");

        store
            .ensure_materialized(&fetcher, &doc, "1.0.0", "pkg-1.0.0")
            .await
            .unwrap();
        std::fs::remove_dir_all(store.package_dir("pkg-1.0.0")).unwrap();
        let dir = store
            .ensure_materialized(&fetcher, &doc, "1.0.0", "pkg-1.0.0")
            .await
            .unwrap();

        // Re-extracted from the blob on disk, no second download.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(dir.join("package/index.js").is_file());
    }

    #[tokio::test]
    async fn missing_version_record_is_a_client_fault() {
        let tmp = tempdir().unwrap();
        let store = store(tmp.path());
        let fetcher = CountingFetcher {
            body: tarball_bytes(&[]),
            calls: AtomicUsize::new(0),
        };
        let doc = doc_with_version("1.0.0");

        let err = store
            .ensure_materialized(&fetcher, &doc, "9.9.9", "pkg-9.9.9")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ClientError>().is_some());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn usage_sums_files_and_directories() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("a.tgz"), vec![0u8; 100]).unwrap();
        std::fs::create_dir(tmp.path().join("a")).unwrap();
        std::fs::write(tmp.path().join("a/inner.js"), vec![0u8; 50]).unwrap();

        let usage = store(tmp.path()).usage().unwrap();
        assert_eq!(usage.total_bytes, 150);
        let mut names: Vec<&str> = usage.entries.iter().map(|(_, n)| n.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["a.tgz", "a/"]);
    }

    #[test]
    fn report_orders_by_size_then_name() {
        let usage = CacheUsage {
            total_bytes: 300,
            entries: vec![
                (100, "bbb/".to_string()),
                (100, "aaa/".to_string()),
                (50, "small.tgz".to_string()),
                (150, "big/".to_string()),
            ],
        };
        let report = largest_entries_report(&usage);
        let lines: Vec<&str> = report.lines().collect();
        assert!(lines[0].ends_with("big/"));
        assert!(lines[1].ends_with("aaa/"));
        assert!(lines[2].ends_with("bbb/"));
        assert!(lines[3].ends_with("small.tgz"));
    }

    #[test]
    fn report_caps_at_ten_entries() {
        let entries = (0..15).map(|i| (i as u64, format!("entry-{i:02}"))).collect();
        let usage = CacheUsage {
            total_bytes: 0,
            entries,
        };
        assert_eq!(largest_entries_report(&usage).lines().count(), 10);
    }

    #[test]
    fn formats_byte_sizes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KiB");
        assert_eq!(format_bytes(1536), "1.50 KiB");
        assert_eq!(format_bytes(5 << 20), "5.00 MiB");
    }
}

//! Locating the artifact a request asks for inside an extracted package.
//!
//! Published npm tarballs conventionally hold a single top-level `package/`
//! folder; object paths are resolved relative to it. No object path means
//! "the package's entry file", which the package nominates through its own
//! manifest.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use path_clean::PathClean;
use serde_json::Value as JsonValue;

use crate::error::ClientError;
use crate::pathspec::ObjectPath;

/// What a request resolves to inside a package.
#[derive(Debug)]
pub enum Artifact {
    /// The package's nominated entry file.
    EntryFile { relpath: String, bytes: Vec<u8> },
    /// Immediate entries of a directory; directories carry a trailing `/`.
    Listing { entries: Vec<String> },
    /// An explicitly addressed file.
    File { relpath: String, bytes: Vec<u8> },
}

/// Resolve `object_path` under `extracted_dir` (the tarball's extraction
/// root). All misses are client faults; only I/O on paths that do exist
/// can fault the server.
pub async fn locate(
    object_path: Option<&ObjectPath>,
    extracted_dir: &Path,
    package_name: &str,
) -> Result<Artifact> {
    let package_root = extracted_dir.join("package");

    let Some(object) = object_path else {
        return entry_file(&package_root, package_name).await;
    };

    let target = confine(&package_root, object.as_str())?;
    if object.is_dir() {
        return directory_listing(&target, object, package_name).await;
    }
    file_bytes(&target, object, package_name).await
}

async fn entry_file(package_root: &Path, package_name: &str) -> Result<Artifact> {
    let manifest_path = package_root.join("package.json");
    if !tokio::fs::try_exists(&manifest_path).await.unwrap_or(false) {
        return Err(
            ClientError::not_found(format!("couldn't find package.json in {package_name}")).into(),
        );
    }
    let raw = tokio::fs::read(&manifest_path)
        .await
        .with_context(|| format!("reading {}", manifest_path.display()))?;
    let manifest: JsonValue = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing {}", manifest_path.display()))?;

    let Some(relpath) = entry_file_from_manifest(&manifest) else {
        return Err(ClientError::not_found(format!(
            "no entry file path found in {package_name}'s package.json"
        ))
        .into());
    };

    let target = confine(package_root, relpath)?;
    if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
        return Err(ClientError::not_found(format!(
            "couldn't find the entry file {relpath} in {package_name}"
        ))
        .into());
    }
    let bytes = tokio::fs::read(&target)
        .await
        .with_context(|| format!("reading entry file {}", target.display()))?;
    Ok(Artifact::EntryFile {
        relpath: relpath.to_string(),
        bytes,
    })
}

/// The entry-file fields, most specific first: the CDN-specific override,
/// the ES-module export default, a bare export path, then the traditional
/// `main`. First string wins.
pub fn entry_file_from_manifest(manifest: &JsonValue) -> Option<&str> {
    if let Some(path) = manifest.get("jsdelivr").and_then(JsonValue::as_str) {
        return Some(path);
    }
    let exports_dot = manifest.get("exports").and_then(|exports| exports.get("."));
    if let Some(path) = exports_dot
        .and_then(|entry| entry.get("default"))
        .and_then(JsonValue::as_str)
    {
        return Some(path);
    }
    if let Some(path) = exports_dot.and_then(JsonValue::as_str) {
        return Some(path);
    }
    manifest.get("main").and_then(JsonValue::as_str)
}

async fn directory_listing(
    target: &Path,
    object: &ObjectPath,
    package_name: &str,
) -> Result<Artifact> {
    if !tokio::fs::try_exists(target).await.unwrap_or(false) {
        return Err(ClientError::not_found(format!(
            "couldn't find the directory {object} in {package_name}"
        ))
        .into());
    }
    let mut read_dir = tokio::fs::read_dir(target)
        .await
        .with_context(|| format!("listing {}", target.display()))?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .with_context(|| format!("reading an entry of {}", target.display()))?
    {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.path().is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();
    Ok(Artifact::Listing { entries })
}

async fn file_bytes(target: &Path, object: &ObjectPath, package_name: &str) -> Result<Artifact> {
    match tokio::fs::metadata(target).await {
        Ok(metadata) if metadata.is_dir() => {
            return Err(ClientError::not_found(format!(
                "{object} in {package_name} is a directory; add a trailing '/' to list it"
            ))
            .into());
        }
        Ok(_) => {}
        Err(_) => {
            return Err(ClientError::not_found(format!(
                "couldn't find the requested file {object} in {package_name}"
            ))
            .into());
        }
    }
    let bytes = tokio::fs::read(target)
        .await
        .with_context(|| format!("reading {}", target.display()))?;
    Ok(Artifact::File {
        relpath: object.as_str().trim_start_matches('/').to_string(),
        bytes,
    })
}

/// Join a request-supplied path under the package root without letting it
/// escape.
fn confine(package_root: &Path, object_path: &str) -> Result<PathBuf, ClientError> {
    let cleaned = PathBuf::from(object_path.trim_start_matches('/')).clean();
    if cleaned.is_absolute()
        || cleaned
            .components()
            .any(|component| matches!(component, Component::ParentDir))
    {
        return Err(ClientError::bad_request(format!(
            "path {object_path} escapes the package root"
        )));
    }
    Ok(package_root.join(cleaned))
}

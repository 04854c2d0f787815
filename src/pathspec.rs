//! Request path parsing.
//!
//! `/lodash@>=1.0.0/lib/` splits into the package name (`lodash`), the
//! version specifier (`>=1.0.0`), and the object path inside the package
//! (`/lib`, directory-typed). No version segment means `latest`.

use crate::error::ClientError;

/// An absolute path inside a package. Whether the request meant a directory
/// is decided by the raw path's trailing `/` and has to be captured here,
/// because normalization drops the trailing separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPath {
    path: String,
    is_dir: bool,
}

impl ObjectPath {
    fn new(raw: &str) -> Self {
        debug_assert!(raw.starts_with('/'));
        let is_dir = raw.ends_with('/');
        let mut path = raw.trim_end_matches('/').to_string();
        if path.is_empty() {
            // `/pkg@1.0.0/` asks for the package root directory.
            path.push('/');
        }
        Self { path, is_dir }
    }

    /// The normalized absolute path, without any trailing separator.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

impl std::fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// A parsed gateway request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    pub package_name: String,
    pub version_spec: String,
    pub object_path: Option<ObjectPath>,
}

impl PathSpec {
    /// Parse an absolute request path. Pure; rejects an empty package name,
    /// an empty version specifier, and more than one `@` in the first
    /// segment.
    pub fn parse(path: &str) -> Result<Self, ClientError> {
        let Some(rest) = path.strip_prefix('/') else {
            return Err(ClientError::bad_request(format!(
                "request path must be absolute, got '{path}'"
            )));
        };

        let (head, object_path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], Some(ObjectPath::new(&rest[idx..]))),
            None => (rest, None),
        };

        let (package_name, version_spec) = match head.matches('@').count() {
            0 => (head, "latest"),
            1 => {
                let (name, spec) = head.split_once('@').unwrap_or((head, ""));
                if spec.is_empty() {
                    return Err(ClientError::bad_request(format!(
                        "version specifier is empty, path: '{path}'"
                    )));
                }
                (name, spec)
            }
            _ => {
                return Err(ClientError::bad_request(format!(
                    "too many '@'s in the name and version part, path: '{path}'"
                )));
            }
        };
        if package_name.is_empty() {
            return Err(ClientError::bad_request(format!(
                "package name is empty, path: '{path}'"
            )));
        }

        Ok(Self {
            package_name: package_name.to_string(),
            version_spec: version_spec.to_string(),
            object_path,
        })
    }
}

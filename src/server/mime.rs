//! Content-type guessing from file names.

/// `(content_type, content_encoding)` for a file name, both optional. A
/// `.gz` suffix becomes a `gzip` content encoding around the inner type.
/// Callers fall back to `application/octet-stream` when the type is
/// unknown.
pub fn guess(file_name: &str) -> (Option<&'static str>, Option<&'static str>) {
    if let Some(inner) = file_name.strip_suffix(".gz") {
        let (content_type, _) = guess(inner);
        return (content_type, Some("gzip"));
    }

    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    let content_type = match extension.to_ascii_lowercase().as_str() {
        "js" | "mjs" | "cjs" => Some("text/javascript; charset=utf-8"),
        "json" | "map" => Some("application/json; charset=utf-8"),
        "css" => Some("text/css; charset=utf-8"),
        "html" | "htm" => Some("text/html; charset=utf-8"),
        "txt" | "text" | "ts" => Some("text/plain; charset=utf-8"),
        "md" | "markdown" => Some("text/markdown; charset=utf-8"),
        "xml" => Some("application/xml"),
        "svg" => Some("image/svg+xml"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "ico" => Some("image/vnd.microsoft.icon"),
        "wasm" => Some("application/wasm"),
        "pdf" => Some("application/pdf"),
        "woff" => Some("font/woff"),
        "woff2" => Some("font/woff2"),
        "ttf" => Some("font/ttf"),
        "eot" => Some("application/vnd.ms-fontobject"),
        "zip" => Some("application/zip"),
        "tgz" => Some("application/gzip"),
        _ => None,
    };
    (content_type, None)
}

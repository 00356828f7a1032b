use std::path::Path;

/// Content type for a file, chosen by its extension.
pub fn content_type(path: impl AsRef<Path>) -> &'static str {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        Some("pdf") => "application/pdf",
        _ => "text/plain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_extension_not_substring() {
        assert_eq!(content_type("/page.html"), "text/html");
        assert_eq!(content_type("/page.html.txt"), "text/plain");
        assert_eq!(content_type("/STYLE.CSS"), "text/css");
        assert_eq!(content_type("/noext"), "text/plain");
    }
}

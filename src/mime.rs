use std::path::Path;

/// Content type sent with an uploaded asset, keyed on its extension.
pub fn content_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("js") | Some("mjs") => "application/javascript",
        Some("css") => "text/css",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("map") | Some("json") => "application/json",
        Some("html") => "text/html",
        _ => {
            tracing::debug!(
                "No content type known for '{}', falling back to application/octet-stream",
                name
            );
            "application/octet-stream"
        }
    }
}

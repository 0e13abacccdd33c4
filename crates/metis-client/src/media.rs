//! Content types for uploaded files.

/// Content type used when the extension is missing or unknown.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Resolve a content type from a file name's extension.
pub fn media_type_for(file_name: &str) -> &'static str {
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return FALLBACK_MEDIA_TYPE;
    };

    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => FALLBACK_MEDIA_TYPE,
    }
}

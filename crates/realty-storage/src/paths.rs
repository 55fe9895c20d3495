//! Object naming and URL helpers shared by all storage backends.

use regex::Regex;
use reqwest::Url;
use uuid::Uuid;

/// Strip path components and characters that are unsafe in object keys.
pub fn sanitize_file_name(file_name: &str) -> String {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '#' | '%' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let sanitized = sanitized.trim();
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return "unnamed_file".to_string();
    }
    sanitized.to_string()
}

/// Key for a photo uploaded with a create/update request:
/// `{prefix}/{uuidv7}-{name}`.
pub fn photo_object_path(prefix: &str, file_name: &str) -> String {
    format!(
        "{}/{}-{}",
        prefix.trim_end_matches('/'),
        Uuid::now_v7(),
        sanitize_file_name(file_name)
    )
}

/// Key for a managed property image: `{property_id}/{millis}-{name}`.
pub fn image_object_path(property_id: i32, millis: i64, file_name: &str) -> String {
    format!("{}/{}-{}", property_id, millis, sanitize_file_name(file_name))
}

/// Content type from magic bytes, then the client's claim, then a generic
/// binary type.
pub fn detect_content_type(data: &[u8], claimed: Option<&str>) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }
    claimed
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Recover the object path from a public URL.
///
/// The path is everything in the URL path after `/{bucket}/`, with the bucket
/// name matched in its URL-encoded form (spaces as `%20`). The result is
/// percent-decoded. Returns `None` for unparsable URLs or URLs that do not
/// reference the bucket.
pub fn extract_storage_path(url: &str, bucket: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let encoded_bucket = bucket.replace(' ', "%20");
    let pattern = Regex::new(&format!("/{}/(.+)$", regex::escape(&encoded_bucket))).ok()?;
    let raw = pattern.captures(parsed.path())?.get(1)?.as_str();
    let decoded = urlencoding::decode(raw).ok()?;
    Some(decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_storage_path() {
        let url = "https://abc.supabase.co/storage/v1/object/public/property-images/12/1718000000000-front.jpg";
        assert_eq!(
            extract_storage_path(url, "property-images"),
            Some("12/1718000000000-front.jpg".to_string())
        );
    }

    #[test]
    fn test_extract_storage_path_encoded_bucket_and_name() {
        let url = "https://cdn.example.com/storage/v1/object/public/property%20images/3/front%20door.jpg";
        assert_eq!(
            extract_storage_path(url, "property images"),
            Some("3/front door.jpg".to_string())
        );
    }

    #[test]
    fn test_extract_storage_path_rejects_unrelated_urls() {
        assert_eq!(extract_storage_path("not a url", "property-images"), None);
        assert_eq!(
            extract_storage_path(
                "https://cdn.example.com/other-bucket/3/a.jpg",
                "property-images"
            ),
            None
        );
        assert_eq!(
            extract_storage_path("https://cdn.example.com/property-images/", "property-images"),
            None
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\a?.jpg"), "a_.jpg");
        assert_eq!(sanitize_file_name("  "), "unnamed_file");
    }

    #[test]
    fn test_object_paths() {
        let photo = photo_object_path("properties", "front.jpg");
        assert!(photo.starts_with("properties/"));
        assert!(photo.ends_with("-front.jpg"));
        assert_eq!(
            image_object_path(7, 1718000000000, "a b.png"),
            "7/1718000000000-a b.png"
        );
    }

    #[test]
    fn test_detect_content_type() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_content_type(&png, Some("text/plain")), "image/png");
        assert_eq!(detect_content_type(b"hello", Some("image/jpeg")), "image/jpeg");
        assert_eq!(detect_content_type(b"hello", None), "application/octet-stream");
    }
}

//! Content-type guesses for resources that carry no header.

/// Guess a MIME type from the last path segment of a URI or path.
///
/// Compound suffixes (`.tool.json`) map to the typed catalog formats.
pub fn guess_content_type(path: &str) -> Option<&'static str> {
    let name = path
        .rsplit(['/', '!', ':'])
        .next()
        .unwrap_or(path)
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    const COMPOUND: &[(&str, &str)] = &[
        (".catalog.json", "application/vnd.example.catalog"),
        (".toolgroup.json", "application/vnd.example.toolgroup"),
        (".tool.json", "application/vnd.example.tool"),
    ];
    if let Some((_, mime)) = COMPOUND.iter().find(|(suffix, _)| name.ends_with(suffix)) {
        return Some(*mime);
    }

    let ext = name.rsplit_once('.')?.1;
    let mime = match ext {
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "zip" => "application/zip",
        "jar" => "application/java-archive",
        "obj" => "model/obj",
        "gltf" => "model/gltf+json",
        "glb" => "model/gltf-binary",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_catalog_suffixes() {
        assert_eq!(
            guess_content_type("http://example.com/tools/box.tool.json"),
            Some("application/vnd.example.tool")
        );
        assert_eq!(
            guess_content_type("archive:file:/a.zip!/groups/Chairs.ToolGroup.json"),
            Some("application/vnd.example.toolgroup")
        );
        assert_eq!(
            guess_content_type("/srv/main.catalog.json"),
            Some("application/vnd.example.catalog")
        );
    }

    #[test]
    fn plain_extensions() {
        assert_eq!(guess_content_type("file:/tmp/a.json"), Some("application/json"));
        assert_eq!(guess_content_type("http://h/icon.PNG?v=2"), Some("image/png"));
        assert_eq!(guess_content_type("http://h/readme"), None);
        assert_eq!(guess_content_type("http://h/blob.unknown"), None);
    }
}

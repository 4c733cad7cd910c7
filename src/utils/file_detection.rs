//! Extension tables used by the catalog filters and the item preview.

use std::path::Path;

/// Extensions kept by the `Images` filter.
pub const IMAGE_FILTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Extensions kept by the `Text` filter.
pub const TEXT_FILTER_EXTENSIONS: &[&str] = &[
    "txt", "md", "log", "csv", "json", "xml", "html", "css", "js",
];

/// Default whitelist for the `Code` filter; overridable through the config.
pub const DEFAULT_CODE_EXTENSIONS: &[&str] = &[
    "py", "rs", "c", "h", "cpp", "hpp", "java", "go", "js", "ts", "rb", "sh",
];

/// Files the preview reads as text.
const TEXT_PREVIEW_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "log", "csv", "json", "xml", "html", "css", "js", "c", "cpp", "java",
    "go", "sh", "rs", "toml", "yaml", "yml",
];

const IMAGE_PREVIEW_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

const MEDIA_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "flac", "m4a", "mp4", "avi", "mkv", "mov", "webm",
];

/// Broad content class of a file, used to pick a preview strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Text,
    Image,
    Media,
    Unknown,
}

/// Splits a file name into stem and extension, keeping the leading dot.
///
/// `"report.txt"` gives `("report", ".txt")`, `"a.tar.gz"` gives
/// `("a.tar", ".gz")` and a dotfile like `".bashrc"` has no extension.
pub fn split_extension(name: &str) -> (String, String) {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

/// Lower-cases an extension and strips its leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.strip_prefix('.').unwrap_or(ext).to_lowercase()
}

/// Checks whether `ext` (with or without dot, any case) is in `whitelist`.
pub fn extension_in<S: AsRef<str>>(ext: &str, whitelist: &[S]) -> bool {
    let ext = normalize_extension(ext);
    !ext.is_empty()
        && whitelist
            .iter()
            .any(|candidate| normalize_extension(candidate.as_ref()) == ext)
}

/// Classifies a file by extension first, then by its guessed MIME type.
pub fn classify(path: &Path) -> ContentClass {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if TEXT_PREVIEW_EXTENSIONS.contains(&ext.as_str()) {
        return ContentClass::Text;
    }
    if IMAGE_PREVIEW_EXTENSIONS.contains(&ext.as_str()) {
        return ContentClass::Image;
    }
    if MEDIA_EXTENSIONS.contains(&ext.as_str()) {
        return ContentClass::Media;
    }

    match mime_guess::from_path(path).first() {
        Some(mime) if mime.type_() == mime_guess::mime::TEXT => ContentClass::Text,
        Some(mime) if mime.type_() == mime_guess::mime::IMAGE => ContentClass::Image,
        Some(mime)
            if mime.type_() == mime_guess::mime::AUDIO
                || mime.type_() == mime_guess::mime::VIDEO =>
        {
            ContentClass::Media
        }
        _ => ContentClass::Unknown,
    }
}

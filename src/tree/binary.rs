use std::collections::HashSet;
use std::path::Path;

/// Extensions never opened for content search
const DEFAULT_BINARY_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "ico", "tif", "tiff", "heic", "psd", "svgz",
    // audio
    "mp3", "wav", "flac", "aac", "ogg", "m4a", "wma", "amr",
    // video
    "mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "3gp", "m4v",
    // archives
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz", "jar", "apk",
    // office documents
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf", "odt", "ods", "odp",
    // executables and objects
    "exe", "dll", "so", "dylib", "bin", "class", "o", "a", "dex",
    // databases
    "db", "sqlite", "sqlite3", "mdb", "accdb",
];

/// Set of file extensions treated as binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryExtensions {
    set: HashSet<String>,
}

impl BinaryExtensions {
    /// An empty set; nothing is excluded from content search
    pub fn empty() -> Self {
        Self {
            set: HashSet::new(),
        }
    }

    /// Add an extension (case-insensitive, leading dot optional)
    pub fn insert(&mut self, extension: &str) {
        let ext = extension.trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() {
            self.set.insert(ext);
        }
    }

    pub fn with(mut self, extension: &str) -> Self {
        self.insert(extension);
        self
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.set.contains(&extension.to_lowercase())
    }

    /// Whether the path's extension is in the set
    pub fn is_binary(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.contains(ext))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl Default for BinaryExtensions {
    fn default() -> Self {
        let mut extensions = Self::empty();
        for ext in DEFAULT_BINARY_EXTENSIONS {
            extensions.insert(ext);
        }
        extensions
    }
}

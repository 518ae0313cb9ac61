use super::{BinaryExtensions, SearchOptions};
use crate::sandbox::Result;
use crate::walker::WalkEntry;
use regex::Regex;
use std::fs;
use std::path::Path;

enum ContentMatcher {
    Pattern(Regex),
    Text(String),
}

impl ContentMatcher {
    fn is_match(&self, text: &str) -> bool {
        match self {
            ContentMatcher::Pattern(regex) => regex.is_match(text),
            ContentMatcher::Text(needle) => text.contains(needle.as_str()),
        }
    }
}

/// Compiled form of [`SearchOptions`]
pub(crate) struct FileFilter<'a> {
    extensions: Vec<String>,
    name: Option<String>,
    name_regex: Option<Regex>,
    content: Option<ContentMatcher>,
    binary: &'a BinaryExtensions,
}

impl<'a> FileFilter<'a> {
    /// Compile the filters; a malformed regex is a [`crate::SandboxError::Pattern`]
    pub(crate) fn new(search: &SearchOptions, binary: &'a BinaryExtensions) -> Result<Self> {
        let name_regex = search.regex.as_deref().map(Regex::new).transpose()?;
        let content = match (&search.content_regex, &search.content) {
            (Some(pattern), _) => Some(ContentMatcher::Pattern(Regex::new(pattern)?)),
            (None, Some(text)) => Some(ContentMatcher::Text(text.clone())),
            (None, None) => None,
        };

        Ok(Self {
            extensions: search
                .extension
                .as_ref()
                .map(|e| e.normalized())
                .unwrap_or_default(),
            name: search.name.as_ref().map(|n| n.to_lowercase()),
            name_regex,
            content,
            binary,
        })
    }

    /// Whether a file entry passes every configured filter
    pub(crate) fn matches(&self, entry: &WalkEntry<'_>) -> bool {
        let name = entry.file_name();

        if !self.extensions.is_empty() {
            let ext = Path::new(name.as_ref())
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !self.extensions.contains(&ext) {
                return false;
            }
        }

        if let Some(needle) = &self.name {
            if !name.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        if let Some(regex) = &self.name_regex {
            if !regex.is_match(&name) {
                return false;
            }
        }

        match &self.content {
            Some(matcher) => self.content_matches(entry, matcher),
            None => true,
        }
    }

    fn content_matches(&self, entry: &WalkEntry<'_>, matcher: &ContentMatcher) -> bool {
        if entry.is_symlink() || self.binary.is_binary(entry.path()) {
            return false;
        }
        match fs::read(entry.path()) {
            Ok(bytes) => matcher.is_match(&String::from_utf8_lossy(&bytes)),
            Err(_) => false,
        }
    }
}

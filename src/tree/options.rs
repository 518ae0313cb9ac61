use serde::Deserialize;

/// Options for a directory tree query
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryOptions {
    /// Append size and modification time to file lines
    pub detail: bool,
    /// Keep directories that have no matching descendants
    pub show_empty_folders: bool,
    pub search: SearchOptions,
    pub sort: SortOptions,
}

/// File filters; a file is listed only if it passes every configured one
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    /// Case-insensitive substring of the file name
    pub name: Option<String>,
    /// Regex matched against the file name
    pub regex: Option<String>,
    /// One extension or a set of them, case-insensitive, leading dot optional
    pub extension: Option<Extensions>,
    /// Substring of the file's text content
    pub content: Option<String>,
    /// Regex matched against the file's text content; wins over `content`
    pub content_regex: Option<String>,
}

impl SearchOptions {
    pub fn has_content_filter(&self) -> bool {
        self.content.is_some() || self.content_regex.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Extensions {
    One(String),
    Many(Vec<String>),
}

impl Extensions {
    /// Lowercased extensions without leading dots
    pub fn normalized(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Extensions::One(ext) => vec![ext.as_str()],
            Extensions::Many(exts) => exts.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

impl From<&str> for Extensions {
    fn from(ext: &str) -> Self {
        Extensions::One(ext.to_string())
    }
}

impl From<Vec<String>> for Extensions {
    fn from(exts: Vec<String>) -> Self {
        Extensions::Many(exts)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SortOptions {
    pub by: SortKey,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Date,
    Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

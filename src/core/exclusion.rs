//! Paths that skip classification (static assets).

use crate::config::ExclusionConfig;

#[derive(Debug, Clone, Default)]
pub struct ExclusionList {
    prefixes: Vec<String>,
    /// Lowercased, without the leading dot
    extensions: Vec<String>,
}

impl ExclusionList {
    pub fn new<P, E>(prefixes: P, extensions: E) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ExclusionConfig) -> Self {
        Self::new(config.prefixes.iter().cloned(), &config.extensions)
    }

    /// True when the request should bypass the classifier.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self
            .prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return true;
        }

        let file_name = path.rsplit('/').next().unwrap_or(path);
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }
}

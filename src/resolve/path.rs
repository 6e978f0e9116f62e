//! Dot-path segmentation.

/// Delimiter between path segments.
pub const DELIMITER: char = '.';

/// Splits `path` into its ordered, trimmed, non-empty segments.
///
/// Empty segments produced by leading, trailing, or repeated delimiters are
/// dropped, as are segments consisting only of whitespace. An empty result
/// means the path is invalid.
pub fn segments(path: &str) -> Vec<&str> {
    path.split(DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// A path split into the segments to walk and the terminal segment to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPath<'a> {
    pub parents: Vec<&'a str>,
    pub terminal: &'a str,
}

impl<'a> SplitPath<'a> {
    /// Parses `path`, returning `None` when it has no usable segments.
    pub fn parse(path: &'a str) -> Option<Self> {
        let mut parents = segments(path);
        let terminal = parents.pop()?;
        Some(Self { parents, terminal })
    }

    /// Whether the terminal segment is resolved directly against the root.
    pub fn is_root_level(&self) -> bool {
        self.parents.is_empty()
    }
}

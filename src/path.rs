//! Hierarchical path decomposition.
//!
//! Extraction paths locate each fragment inside the document structure,
//! e.g. `//Document/Sect[2]/H1` or `L[3]/LI/LBody`. Each `/`-separated
//! segment is a node type with an optional 1-based sibling index in
//! brackets; a missing index means the first sibling.

use crate::models::Fragment;

/// Root prefix carried by every extraction path.
pub const ROOT_PREFIX: &str = "//Document/";

/// One decomposed path segment: node type plus 1-based sibling index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathToken {
    pub node_type: String,
    pub index: u32,
}

/// Tree-construction fault (see also [`crate::tree`]).
///
/// `MalformedPath` is recoverable: the tree builder skips the offending
/// fragment and keeps folding.
#[derive(Debug)]
pub enum TreeError {
    MalformedPath(String),
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::MalformedPath(segment) => {
                write!(f, "malformed path segment: {}", segment)
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Decompose a single path segment into a [`PathToken`].
///
/// `"Para[3]"` → `("Para", 3)`, `"Para"` → `("Para", 1)`. Fails only when
/// the bracketed portion is not a valid integer.
pub fn decompose(segment: &str) -> Result<PathToken, TreeError> {
    match segment.split_once('[') {
        Some((node_type, rest)) => {
            let digits = rest.strip_suffix(']').unwrap_or(rest);
            let index = digits
                .parse::<u32>()
                .map_err(|_| TreeError::MalformedPath(segment.to_string()))?;
            Ok(PathToken {
                node_type: node_type.to_string(),
                index,
            })
        }
        None => Ok(PathToken {
            node_type: segment.to_string(),
            index: 1,
        }),
    }
}

/// Decompose every segment of a root-relative path.
pub fn decompose_path(path: &str) -> Result<Vec<PathToken>, TreeError> {
    path.split('/').map(decompose).collect()
}

/// Strip the `//Document/` root prefix, when present.
pub fn relative_path(fragment: &Fragment) -> &str {
    fragment
        .path
        .strip_prefix(ROOT_PREFIX)
        .unwrap_or(&fragment.path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_indexed_segment() {
        let token = decompose("Para[3]").unwrap();
        assert_eq!(token.node_type, "Para");
        assert_eq!(token.index, 3);
    }

    #[test]
    fn test_decompose_plain_segment_defaults_to_one() {
        let token = decompose("Para").unwrap();
        assert_eq!(token.node_type, "Para");
        assert_eq!(token.index, 1);
    }

    #[test]
    fn test_decompose_bad_index_fails() {
        let err = decompose("Bad[x]").unwrap_err();
        assert!(matches!(err, TreeError::MalformedPath(_)));
        assert!(err.to_string().contains("Bad[x]"));
    }

    #[test]
    fn test_decompose_path_splits_all_segments() {
        let tokens = decompose_path("Sect[2]/H1/Span").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].node_type, "Sect");
        assert_eq!(tokens[0].index, 2);
        assert_eq!(tokens[1].node_type, "H1");
        assert_eq!(tokens[2].index, 1);
    }

    #[test]
    fn test_decompose_path_propagates_malformed_segment() {
        assert!(decompose_path("Sect/P[]").is_err());
    }

    #[test]
    fn test_relative_path_strips_root_prefix() {
        let fragment = Fragment {
            path: "//Document/Sect/P".to_string(),
            page: Some(0),
            text: Some("x".to_string()),
        };
        assert_eq!(relative_path(&fragment), "Sect/P");

        let bare = Fragment {
            path: "Sect/P".to_string(),
            page: Some(0),
            text: Some("x".to_string()),
        };
        assert_eq!(relative_path(&bare), "Sect/P");
    }
}

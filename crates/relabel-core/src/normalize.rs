//! Title normalization for keyword matching.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// The record has an empty or whitespace-only title. Batch callers skip
    /// the record and count it separately rather than aborting the run.
    #[error("title is empty")]
    EmptyTitle,
}

/// Lowercase and trim a title for substring matching.
///
/// Punctuation is deliberately preserved and internal whitespace is not
/// collapsed: the rule tables carry punctuation-adjacent keywords such as
/// `"t-shirt"` that must match literally.
///
/// # Errors
///
/// Returns [`ClassifyError::EmptyTitle`] if the title is empty after trimming.
pub fn normalize_title(title: &str) -> Result<String, ClassifyError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ClassifyError::EmptyTitle);
    }
    Ok(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(
            normalize_title("  Nike Tech Fleece  ").unwrap(),
            "nike tech fleece"
        );
    }

    #[test]
    fn preserves_punctuation_and_internal_whitespace() {
        assert_eq!(
            normalize_title("Vintage  T-Shirt (XL)").unwrap(),
            "vintage  t-shirt (xl)"
        );
    }

    #[test]
    fn empty_title_is_an_error() {
        assert_eq!(normalize_title(""), Err(ClassifyError::EmptyTitle));
        assert_eq!(normalize_title("   "), Err(ClassifyError::EmptyTitle));
    }
}

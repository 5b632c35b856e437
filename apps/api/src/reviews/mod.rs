pub mod handlers;

use crate::errors::AppError;

pub const MIN_REVIEW_LEN: usize = 5;

/// Trims review text and enforces the minimum length.
pub fn clean_review_text(raw: &str) -> Result<String, AppError> {
    let text = raw.trim();
    if text.chars().count() < MIN_REVIEW_LEN {
        return Err(AppError::validation("Review is too short"));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_text_length_counts_chars() {
        assert!(clean_review_text("  ok  ").is_err());
        assert_eq!(clean_review_text(" Tasty! ").unwrap(), "Tasty!");
        // five multi-byte characters are enough
        assert!(clean_review_text("вкусно").is_ok());
    }
}

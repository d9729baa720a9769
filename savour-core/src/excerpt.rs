//! Representative review text shown alongside a result.

use crate::Review;

/// Characters kept before an excerpt is cut.
pub const EXCERPT_CHARS: usize = 150;

const ELLIPSIS: &str = "...";

/// Excerpt of the first review in snapshot order.
///
/// Text longer than [`EXCERPT_CHARS`] characters is cut and `"..."` is
/// appended. No excerpt is produced when there are no reviews or the first
/// review has no text.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use savour_core::{Review, review_excerpt};
///
/// # fn main() -> Result<(), savour_core::RestaurantError> {
/// let review = Review::new("p1".into(), 5.0, Utc::now())?.with_text("Great tacos.");
/// assert_eq!(review_excerpt(&[review]).as_deref(), Some("Great tacos."));
/// assert_eq!(review_excerpt(&[]), None);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn review_excerpt(reviews: &[Review]) -> Option<String> {
    let text = reviews.first()?.text.as_deref()?;
    if text.chars().count() <= EXCERPT_CHARS {
        return Some(text.to_owned());
    }
    let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
    excerpt.push_str(ELLIPSIS);
    Some(excerpt)
}

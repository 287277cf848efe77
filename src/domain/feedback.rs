use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::validation::{FieldError, Validator};

text_enum! {
    pub enum FeedbackType {
        General => "general",
        Product => "product",
        Service => "service",
        Bug => "bug",
        Feature => "feature",
    }
}

text_enum! {
    pub enum FeedbackStatus {
        Pending => "pending",
        Reviewed => "reviewed",
        Resolved => "resolved",
    }
}

impl FeedbackStatus {
    /// Product reviews become public once an admin has looked at them.
    pub const PUBLISHED: &'static [FeedbackStatus] =
        &[FeedbackStatus::Reviewed, FeedbackStatus::Resolved];
}

/// Whether stored feedback is shown on its product's page: a product review an admin has seen.
pub fn is_public_review(feedback_type: &str, status: &str) -> bool {
    let is_review = feedback_type.parse::<FeedbackType>() == Ok(FeedbackType::Product);
    let published = status
        .parse::<FeedbackStatus>()
        .is_ok_and(|status| FeedbackStatus::PUBLISHED.contains(&status));
    is_review && published
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FeedbackInput {
    #[serde(default = "default_feedback_type")]
    pub feedback_type: FeedbackType,
    pub rating: i32,
    pub comment: String,
    #[serde(default)]
    pub product_id: Option<Uuid>,
}

fn default_feedback_type() -> FeedbackType {
    FeedbackType::General
}

impl FeedbackInput {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut validator = Validator::new();
        validator
            .check(
                (1..=5).contains(&self.rating),
                "rating",
                "Please select a rating",
            )
            .check(
                !self.comment.trim().is_empty(),
                "comment",
                "Please enter your feedback",
            );
        if self.feedback_type == FeedbackType::Product {
            validator.check(
                self.product_id.is_some(),
                "product_id",
                "Select the product you are reviewing",
            );
        }
        validator.finish()
    }

    /// The product being reviewed. Only product reviews are attached to a product.
    pub fn reviewed_product(&self) -> Option<Uuid> {
        self.product_id
            .filter(|_| self.feedback_type == FeedbackType::Product)
    }
}

/// Aggregate of the published ratings of one product.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReviewSummary {
    pub total: usize,
    /// Mean rating rounded to one decimal place.
    pub average: f64,
    /// Number of reviews per star, index 0 holding one-star reviews.
    pub distribution: [usize; 5],
}

impl ReviewSummary {
    pub fn from_ratings(ratings: impl IntoIterator<Item = i32>) -> Self {
        let mut distribution = [0usize; 5];
        let mut total = 0usize;
        let mut sum = 0i64;
        for rating in ratings {
            total += 1;
            sum += i64::from(rating);
            if (1..=5).contains(&rating) {
                distribution[(rating - 1) as usize] += 1;
            }
        }
        let average = if total == 0 {
            0.0
        } else {
            (sum as f64 / total as f64 * 10.0).round() / 10.0
        };
        Self {
            total,
            average,
            distribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_ratings() {
        let summary = ReviewSummary::from_ratings([5, 4, 4, 1]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.average, 3.5);
        assert_eq!(summary.distribution, [1, 0, 0, 2, 1]);

        let summary = ReviewSummary::from_ratings([5, 4, 4]);
        assert_eq!(summary.average, 4.3);
    }

    #[test]
    fn empty_summary() {
        let summary = ReviewSummary::from_ratings([]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average, 0.0);
    }

    #[test]
    fn product_reviews_need_a_product() {
        let input = FeedbackInput {
            feedback_type: FeedbackType::Product,
            rating: 0,
            comment: "   ".into(),
            product_id: None,
        };
        let errors = input.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["rating", "comment", "product_id"]);
    }

    #[test]
    fn only_product_reviews_keep_their_product() {
        let product_id = Uuid::new_v4();
        let mut input = FeedbackInput {
            feedback_type: FeedbackType::Bug,
            rating: 1,
            comment: "Checkout button does nothing".into(),
            product_id: Some(product_id),
        };
        assert_eq!(input.reviewed_product(), None);

        input.feedback_type = FeedbackType::Product;
        assert_eq!(input.reviewed_product(), Some(product_id));
    }

    #[test]
    fn public_reviews_are_seen_product_reviews() {
        assert!(is_public_review("product", "reviewed"));
        assert!(is_public_review("product", "resolved"));
        assert!(!is_public_review("product", "pending"));
        assert!(!is_public_review("bug", "reviewed"));
        assert!(!is_public_review("general", "resolved"));
    }

    #[test]
    fn general_feedback_is_accepted() {
        let input: FeedbackInput =
            serde_json::from_str(r#"{"rating": 4, "comment": "Fast delivery"}"#).unwrap();
        assert_eq!(input.feedback_type, FeedbackType::General);
        assert!(input.validate().is_ok());
    }
}

//! Buyer reviews and the reputation update they trigger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ServiceError, ServiceResult};
use crate::lifecycle;
use crate::models::*;
use crate::repo::Repo;
use crate::reputation::{self, ReputationPolicy};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewSubmission {
    pub rating: i32,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmittedReview {
    pub review: Review,
    /// Seller's score after the recompute triggered by this review.
    pub reputation_score: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewView {
    pub review: Review,
    pub author_name: Option<String>,
}

/// Accepts a review and synchronously recomputes the seller's reputation.
///
/// The duplicate check is a plain read before the insert; two submissions
/// racing each other can both pass it.
pub async fn submit_review<R>(
    repo: &R,
    author_id: Id,
    listing_id: Id,
    submission: ReviewSubmission,
    policy: ReputationPolicy,
    now: DateTime<Utc>,
) -> ServiceResult<SubmittedReview>
where
    R: Repo + ?Sized,
{
    if !(MIN_RATING..=MAX_RATING).contains(&submission.rating) {
        return Err(ServiceError::Invalid(format!("rating must be between {MIN_RATING} and {MAX_RATING}")));
    }
    let listing = repo.get_listing(listing_id).await?;
    if listing.user_id == author_id {
        return Err(ServiceError::Forbidden("sellers cannot review their own listing"));
    }
    if !lifecycle::is_visible(&listing, now) {
        return Err(ServiceError::Invalid("listing is not open for reviews".into()));
    }
    if !repo.has_interaction(author_id, listing_id).await? {
        return Err(ServiceError::Forbidden("contact the seller before leaving a review"));
    }
    if repo.find_review(author_id, listing_id).await?.is_some() {
        return Err(ServiceError::DuplicateReview);
    }

    let text = submission.text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let review = repo
        .create_review(NewReview { listing_id, author_id, rating: submission.rating, text })
        .await?;
    info!(review_id = %review.id, %listing_id, rating = review.rating, "review accepted");

    let reputation_score = reputation::recompute(repo, listing.user_id, policy).await?;
    Ok(SubmittedReview { review, reputation_score })
}

/// Active reviews of a listing with their authors' display names.
pub async fn listing_reviews<R>(repo: &R, listing_id: Id) -> ServiceResult<Vec<ReviewView>>
where
    R: Repo + ?Sized,
{
    repo.get_listing(listing_id).await?;
    let reviews = repo.list_reviews_for_listing(listing_id, Some(ReviewStatus::Active)).await?;
    let mut out = Vec::with_capacity(reviews.len());
    for review in reviews {
        out.push(with_author(repo, review).await?);
    }
    Ok(out)
}

pub(crate) async fn with_author<R>(repo: &R, review: Review) -> ServiceResult<ReviewView>
where
    R: Repo + ?Sized,
{
    let author_name = match repo.get_profile(review.author_id).await {
        Ok(p) => p.name,
        Err(crate::repo::RepoError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };
    Ok(ReviewView { review, author_name })
}

/// Flags a review for moderation.
pub async fn report_review<R>(repo: &R, review_id: Id) -> ServiceResult<Review>
where
    R: Repo + ?Sized,
{
    let review = repo.get_review(review_id).await?;
    if review.verified {
        return Err(ServiceError::Invalid("verified reviews cannot be reported".into()));
    }
    let review = repo.set_review_status(review_id, ReviewStatus::Reported, None).await?;
    info!(%review_id, "review reported");
    Ok(review)
}

/// Removes a review; allowed for its author and moderators.
pub async fn delete_review<R>(repo: &R, actor: Id, is_moderator: bool, review_id: Id) -> ServiceResult<()>
where
    R: Repo + ?Sized,
{
    let review = repo.get_review(review_id).await?;
    if review.author_id != actor && !is_moderator {
        return Err(ServiceError::Forbidden("only the author or a moderator can delete a review"));
    }
    repo.delete_review(review_id).await?;
    info!(%review_id, %actor, "review deleted");
    Ok(())
}

//! Moderator queues and decisions.

use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::models::*;
use crate::repo::Repo;
use crate::reviews::{self, ReviewView};

/// Listings waiting for a decision, oldest first.
pub async fn pending_listings<R: Repo + ?Sized>(repo: &R) -> ServiceResult<Vec<Listing>> {
    Ok(repo.list_listings(Some(ListingStatus::Check)).await?)
}

pub async fn reported_reviews<R: Repo + ?Sized>(repo: &R) -> ServiceResult<Vec<ReviewView>> {
    let reviews = repo.list_reviews_by_status(ReviewStatus::Reported).await?;
    let mut out = Vec::with_capacity(reviews.len());
    for review in reviews {
        out.push(reviews::with_author(repo, review).await?);
    }
    Ok(out)
}

async fn decide<R: Repo + ?Sized>(repo: &R, id: Id, to: ListingStatus) -> ServiceResult<Listing> {
    let listing = repo.get_listing(id).await?;
    if listing.status != ListingStatus::Check {
        return Err(ServiceError::Invalid(format!(
            "listing is '{}', only listings in 'check' can be moderated",
            listing.status
        )));
    }
    let listing = repo.set_listing_status(id, to).await?;
    info!(listing_id = %id, status = %to, "listing moderated");
    Ok(listing)
}

pub async fn approve_listing<R: Repo + ?Sized>(repo: &R, id: Id) -> ServiceResult<Listing> {
    decide(repo, id, ListingStatus::Active).await
}

pub async fn reject_listing<R: Repo + ?Sized>(repo: &R, id: Id) -> ServiceResult<Listing> {
    decide(repo, id, ListingStatus::Rejected).await
}

/// Restores a reported review and marks it verified, which also shields it
/// from further reports.
pub async fn approve_review<R: Repo + ?Sized>(repo: &R, id: Id) -> ServiceResult<Review> {
    let review = repo.set_review_status(id, ReviewStatus::Active, Some(true)).await?;
    info!(review_id = %id, "review verified");
    Ok(review)
}

/// Deletes a reported review.
pub async fn dismiss_review<R: Repo + ?Sized>(repo: &R, moderator: Id, id: Id) -> ServiceResult<()> {
    reviews::delete_review(repo, moderator, true, id).await
}

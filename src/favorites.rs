//! Bookmarks and buyer/seller contact.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::error::{ServiceError, ServiceResult};
use crate::lifecycle;
use crate::models::*;
use crate::repo::{RepoError, Repo};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FavoriteState {
    pub listing_id: uuid::Uuid,
    pub favorite: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContactInfo {
    pub listing_id: uuid::Uuid,
    pub seller_id: uuid::Uuid,
    pub phone_number: Option<String>,
}

/// Adds the listing to the user's favorites, or removes it if already there.
pub async fn toggle_favorite<R: Repo + ?Sized>(repo: &R, user_id: Id, listing_id: Id) -> ServiceResult<FavoriteState> {
    repo.get_listing(listing_id).await?;
    let favorite = if repo.is_favorite(user_id, listing_id).await? {
        match repo.remove_favorite(user_id, listing_id).await {
            // removed concurrently, end state is the same
            Ok(()) | Err(RepoError::NotFound) => false,
            Err(e) => return Err(e.into()),
        }
    } else {
        match repo.add_favorite(user_id, listing_id).await {
            Ok(_) | Err(RepoError::Conflict) => true,
            Err(e) => return Err(e.into()),
        }
    };
    debug!(%user_id, %listing_id, favorite, "favorite toggled");
    Ok(FavoriteState { listing_id, favorite })
}

pub async fn favorites<R: Repo + ?Sized>(repo: &R, user_id: Id) -> ServiceResult<Vec<Listing>> {
    let ids = repo.list_favorite_listing_ids(user_id).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(repo.list_listings_by_ids(&ids).await?)
}

/// Records that `user_id` asked for the seller's contact and returns it.
/// This interaction is what later allows the buyer to leave a review.
pub async fn request_contact<R: Repo + ?Sized>(
    repo: &R,
    user_id: Id,
    listing_id: Id,
    now: DateTime<Utc>,
) -> ServiceResult<ContactInfo> {
    let listing = repo.get_listing(listing_id).await?;
    if listing.user_id == user_id {
        return Err(ServiceError::Invalid("this is your own listing".into()));
    }
    if !lifecycle::is_visible(&listing, now) {
        return Err(ServiceError::Invalid("listing is not active".into()));
    }
    repo.record_interaction(user_id, listing_id).await?;
    let phone_number = match repo.get_profile(listing.user_id).await {
        Ok(p) => p.phone_number,
        Err(RepoError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };
    Ok(ContactInfo { listing_id, seller_id: listing.user_id, phone_number })
}

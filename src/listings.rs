//! Seller-side listing operations.

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{ServiceError, ServiceResult};
use crate::lifecycle::{self, MAX_HOT_MINUTES, MIN_HOT_MINUTES};
use crate::models::*;
use crate::repo::{ListingRepo, ProfileRepo, RepoError};

pub const MAX_TITLE_LEN: usize = 200;

/// A listing as shown to a reader at a given instant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListingView {
    pub listing: Listing,
    /// Time-based activity (always true for regular listings).
    pub active: bool,
    /// Human-readable time left; "unspecified" for listings without expiry.
    pub remaining: String,
}

pub fn listing_view(listing: Listing, now: DateTime<Utc>) -> ListingView {
    let active = lifecycle::is_active(&listing, now);
    let remaining = lifecycle::remaining(lifecycle::expiry(&listing), now).to_string();
    ListingView { listing, active, remaining }
}

fn validate(new: &NewListing) -> ServiceResult<()> {
    let title = new.title.trim();
    if title.is_empty() {
        return Err(ServiceError::Invalid("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::Invalid(format!("title longer than {MAX_TITLE_LEN} characters")));
    }
    if new.price_list.iter().any(|p| p.price.trim().is_empty()) {
        return Err(ServiceError::Invalid("price must not be empty".into()));
    }
    if new.geo_position.as_ref().is_some_and(|p| p.lon_lat().is_none()) {
        return Err(ServiceError::Invalid("geo_position must be a point with [lon, lat] in range".into()));
    }
    if let Some(hours) = &new.working_hours {
        validate_hours(new.kind, hours)?;
    }
    match (new.kind, new.duration_minutes) {
        (ListingKind::Regular, Some(_)) => {
            Err(ServiceError::Invalid("regular listings do not take a duration".into()))
        }
        (ListingKind::Hot, Some(m)) if !(MIN_HOT_MINUTES..=MAX_HOT_MINUTES).contains(&m) => Err(ServiceError::Invalid(
            format!("hot listing duration must be {MIN_HOT_MINUTES}..={MAX_HOT_MINUTES} minutes"),
        )),
        _ => Ok(()),
    }
}

fn validate_hours(kind: ListingKind, hours: &WorkingHours) -> ServiceResult<()> {
    if kind != ListingKind::Regular {
        return Err(ServiceError::Invalid("working hours apply to regular listings only".into()));
    }
    let parse = |s: &str| NaiveTime::parse_from_str(s.trim(), "%H:%M");
    match (parse(&hours.start), parse(&hours.end)) {
        (Ok(_), Ok(_)) => {}
        _ => return Err(ServiceError::Invalid("working hours must be HH:MM".into())),
    }
    if hours.days.as_ref().is_some_and(|d| d.iter().any(|day| day.trim().is_empty())) {
        return Err(ServiceError::Invalid("working days must not be blank".into()));
    }
    Ok(())
}

fn draft(owner: Id, new: NewListing, expires_at: Option<String>) -> ListingDraft {
    ListingDraft {
        user_id: owner,
        title: new.title.trim().to_string(),
        description: new.description,
        category_id: new.category_id,
        price_list: new.price_list,
        geo_position: new.geo_position,
        working_hours: new.working_hours,
        status: ListingStatus::Check,
        kind: new.kind,
        expires_at,
        image_url: new.image_url,
    }
}

/// Creates a listing awaiting moderation. The seller must have a profile.
pub async fn create_listing<R>(repo: &R, owner: Id, new: NewListing, now: DateTime<Utc>) -> ServiceResult<Listing>
where
    R: ListingRepo + ProfileRepo + ?Sized,
{
    validate(&new)?;
    match repo.get_profile(owner).await {
        Ok(_) => {}
        Err(RepoError::NotFound) => return Err(ServiceError::Invalid("create your profile first".into())),
        Err(e) => return Err(e.into()),
    }
    let expires_at = match (new.kind, new.duration_minutes) {
        (ListingKind::Hot, Some(m)) => Some(lifecycle::expiry_after(now, m)),
        (ListingKind::Hot, None) => {
            return Err(ServiceError::Invalid("hot listings need a duration".into()))
        }
        (ListingKind::Regular, _) => None,
    };
    let listing = repo.create_listing(draft(owner, new, expires_at)).await?;
    info!(listing_id = %listing.id, kind = %listing.kind, "listing submitted for moderation");
    Ok(listing)
}

/// Replaces the content of an owned listing and sends it back to moderation.
/// A hot listing keeps its expiry unless a new duration is given.
pub async fn edit_listing<R>(repo: &R, actor: Id, id: Id, new: NewListing, now: DateTime<Utc>) -> ServiceResult<Listing>
where
    R: ListingRepo + ?Sized,
{
    let current = repo.get_listing(id).await?;
    if current.user_id != actor {
        return Err(ServiceError::Forbidden("only the owner can edit a listing"));
    }
    validate(&new)?;
    let expires_at = match (new.kind, new.duration_minutes) {
        (ListingKind::Hot, Some(m)) => Some(lifecycle::expiry_after(now, m)),
        (ListingKind::Hot, None) if current.kind == ListingKind::Hot => current.expires_at.clone(),
        (ListingKind::Hot, None) => {
            return Err(ServiceError::Invalid("hot listings need a duration".into()))
        }
        (ListingKind::Regular, _) => None,
    };
    let listing = repo.update_listing(id, draft(actor, new, expires_at)).await?;
    info!(listing_id = %id, "listing edited, back in moderation");
    Ok(listing)
}

/// Archives an owned listing.
pub async fn close_listing<R>(repo: &R, actor: Id, id: Id) -> ServiceResult<Listing>
where
    R: ListingRepo + ?Sized,
{
    let current = repo.get_listing(id).await?;
    if current.user_id != actor {
        return Err(ServiceError::Forbidden("only the owner can close a listing"));
    }
    Ok(repo.set_listing_status(id, ListingStatus::Inactive).await?)
}

/// Hard delete by the owner or a moderator.
pub async fn delete_listing<R>(repo: &R, actor: Id, is_moderator: bool, id: Id) -> ServiceResult<()>
where
    R: ListingRepo + ?Sized,
{
    let current = repo.get_listing(id).await?;
    if current.user_id != actor && !is_moderator {
        return Err(ServiceError::Forbidden("only the owner or a moderator can delete a listing"));
    }
    repo.delete_listing(id).await?;
    info!(listing_id = %id, %actor, "listing deleted");
    Ok(())
}

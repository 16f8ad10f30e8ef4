//! Seller reputation: the mean rating over every review on every listing a
//! user owns, truncated into `0..=5` and written to the profile.
//!
//! The score is always recomputed from the full source data, never
//! incremented, so concurrent recomputes converge (last write wins).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Id, Review, ReviewStatus, UnknownVariant};
use crate::repo::{ListingRepo, ProfileRepo, RepoError, RepoResult, ReviewRepo};

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 5;

/// Which reviews contribute to the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountedReviews {
    /// Every review regardless of status or verification.
    #[default]
    All,
    /// Only reviews in `active` status, i.e. the ones buyers can see.
    Active,
    /// Only reviews a moderator has verified.
    Verified,
}

impl CountedReviews {
    pub fn counts(&self, review: &Review) -> bool {
        match self {
            CountedReviews::All => true,
            CountedReviews::Active => review.status == ReviewStatus::Active,
            CountedReviews::Verified => review.verified,
        }
    }
}

impl FromStr for CountedReviews {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "verified" => Ok(Self::Verified),
            other => Err(UnknownVariant { kind: "review filter", value: other.to_string() }),
        }
    }
}

/// How reviews are pulled from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// One review query per owned listing.
    PerListing,
    /// A single query over all owned listing ids.
    #[default]
    Batched,
}

impl FromStr for FetchStrategy {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_listing" => Ok(Self::PerListing),
            "batched" => Ok(Self::Batched),
            other => Err(UnknownVariant { kind: "fetch strategy", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationPolicy {
    pub counted: CountedReviews,
    pub fetch: FetchStrategy,
}

/// floor(clamp(mean(ratings), 0, 5)); an empty set scores 0.
pub fn score<I>(ratings: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    let (sum, n) = ratings
        .into_iter()
        .fold((0i64, 0i64), |(sum, n), r| (sum + i64::from(r), n + 1));
    if n == 0 {
        return MIN_SCORE;
    }
    let mean = sum as f64 / n as f64;
    mean.clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)).floor() as i32
}

/// Every review on every listing owned by `user_id`.
pub async fn owner_reviews<R>(repo: &R, user_id: Id, fetch: FetchStrategy) -> RepoResult<Vec<Review>>
where
    R: ListingRepo + ReviewRepo + ?Sized,
{
    let listings = repo.list_listings_by_owner(user_id).await?;
    if listings.is_empty() {
        return Ok(Vec::new());
    }
    match fetch {
        FetchStrategy::Batched => {
            let ids: Vec<Id> = listings.iter().map(|l| l.id).collect();
            repo.list_reviews_for_listings(&ids).await
        }
        FetchStrategy::PerListing => {
            let mut all = Vec::new();
            for listing in &listings {
                all.extend(repo.list_reviews_for_listing(listing.id, None).await?);
            }
            Ok(all)
        }
    }
}

/// Score `user_id` would get right now, without writing it.
pub async fn compute<R>(repo: &R, user_id: Id, policy: ReputationPolicy) -> RepoResult<i32>
where
    R: ListingRepo + ReviewRepo + ?Sized,
{
    let reviews = owner_reviews(repo, user_id, policy.fetch).await?;
    let counted: Vec<i32> = reviews
        .iter()
        .filter(|r| policy.counted.counts(r))
        .map(|r| r.rating)
        .collect();
    debug!(%user_id, fetched = reviews.len(), counted = counted.len(), "reputation inputs");
    Ok(score(counted))
}

/// Recomputes and persists the reputation of `user_id`. The profile write
/// is the last step, so a failed read leaves the stored score untouched.
/// A user without a profile has nowhere to store a score; the computed
/// value is returned and nothing is written.
pub async fn recompute<R>(repo: &R, user_id: Id, policy: ReputationPolicy) -> RepoResult<i32>
where
    R: ListingRepo + ReviewRepo + ProfileRepo + ?Sized,
{
    let value = compute(repo, user_id, policy).await?;
    match repo.set_reputation(user_id, value).await {
        Ok(()) => info!(%user_id, score = value, "reputation updated"),
        Err(RepoError::NotFound) => warn!(%user_id, score = value, "no profile, reputation not stored"),
        Err(e) => return Err(e),
    }
    Ok(value)
}

#![cfg(feature = "inmem-store")]

use async_trait::async_trait;
use naymer::models::*;
use naymer::repo::inmem::InMemRepo;
use naymer::repo::{FavoriteRepo, InteractionRepo, ListingRepo, ProfileRepo, RepoError, RepoResult, ReviewRepo};
use naymer::reputation::{self, CountedReviews, FetchStrategy, ReputationPolicy};
use uuid::Uuid;

async fn seller(r: &InMemRepo) -> Id {
    let id = Uuid::new_v4();
    r.upsert_profile(NewProfile { user_id: id, name: Some("Seller".into()), email: None, role: ProfileRole::User })
        .await
        .unwrap();
    id
}

async fn listing(r: &InMemRepo, owner: Id, status: ListingStatus) -> Id {
    r.create_listing(ListingDraft {
        user_id: owner,
        title: "Thing".into(),
        description: String::new(),
        category_id: Uuid::nil(),
        price_list: vec![PriceItem { name: None, price: "10".into() }],
        geo_position: None,
        working_hours: None,
        status,
        kind: ListingKind::Regular,
        expires_at: None,
        image_url: None,
    })
    .await
    .unwrap()
    .id
}

async fn review(r: &InMemRepo, listing_id: Id, rating: i32) -> Review {
    r.create_review(NewReview { listing_id, author_id: Uuid::new_v4(), rating, text: None })
        .await
        .unwrap()
}

#[tokio::test]
async fn no_reviews_scores_zero() {
    let r = InMemRepo::new();
    let s = seller(&r).await;
    listing(&r, s, ListingStatus::Active).await;
    r.set_reputation(s, 3).await.unwrap();

    let score = reputation::recompute(&r, s, ReputationPolicy::default()).await.unwrap();
    assert_eq!(score, 0);
    assert_eq!(r.get_profile(s).await.unwrap().reputation_score, 0);
}

#[tokio::test]
async fn mean_over_all_listings_is_truncated() {
    let r = InMemRepo::new();
    let s = seller(&r).await;
    let a = listing(&r, s, ListingStatus::Active).await;
    let b = listing(&r, s, ListingStatus::Inactive).await;
    review(&r, a, 5).await;
    review(&r, a, 4).await;
    review(&r, b, 5).await;

    // (5 + 4 + 5) / 3 = 4.67
    let score = reputation::recompute(&r, s, ReputationPolicy::default()).await.unwrap();
    assert_eq!(score, 4);
}

#[tokio::test]
async fn recompute_is_idempotent() {
    let r = InMemRepo::new();
    let s = seller(&r).await;
    let a = listing(&r, s, ListingStatus::Active).await;
    review(&r, a, 3).await;
    review(&r, a, 4).await;

    let policy = ReputationPolicy::default();
    let first = reputation::recompute(&r, s, policy).await.unwrap();
    let second = reputation::recompute(&r, s, policy).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(r.get_profile(s).await.unwrap().reputation_score, 3);
}

#[tokio::test]
async fn fetch_strategies_agree() {
    let r = InMemRepo::new();
    let s = seller(&r).await;
    for rating in [1, 5, 5, 2] {
        let l = listing(&r, s, ListingStatus::Active).await;
        review(&r, l, rating).await;
    }
    // another seller's reviews must not leak in
    let other = seller(&r).await;
    let l = listing(&r, other, ListingStatus::Active).await;
    review(&r, l, 1).await;

    let batched = ReputationPolicy { fetch: FetchStrategy::Batched, ..Default::default() };
    let per_listing = ReputationPolicy { fetch: FetchStrategy::PerListing, ..Default::default() };
    assert_eq!(
        reputation::compute(&r, s, batched).await.unwrap(),
        reputation::compute(&r, s, per_listing).await.unwrap()
    );
    assert_eq!(reputation::compute(&r, s, batched).await.unwrap(), 3);
}

#[tokio::test]
async fn counted_reviews_policy() {
    let r = InMemRepo::new();
    let s = seller(&r).await;
    let l = listing(&r, s, ListingStatus::Active).await;
    let good = review(&r, l, 5).await;
    let bad = review(&r, l, 1).await;
    r.set_review_status(bad.id, ReviewStatus::Reported, None).await.unwrap();
    r.set_review_status(good.id, ReviewStatus::Active, Some(true)).await.unwrap();
    review(&r, l, 2).await;

    let with = |counted| ReputationPolicy { counted, ..Default::default() };
    // all: (5 + 1 + 2) / 3
    assert_eq!(reputation::compute(&r, s, with(CountedReviews::All)).await.unwrap(), 2);
    // active: (5 + 2) / 2
    assert_eq!(reputation::compute(&r, s, with(CountedReviews::Active)).await.unwrap(), 3);
    assert_eq!(reputation::compute(&r, s, with(CountedReviews::Verified)).await.unwrap(), 5);
}

#[tokio::test]
async fn missing_profile_is_skipped() {
    let r = InMemRepo::new();
    let owner = Uuid::new_v4();
    let l = listing(&r, owner, ListingStatus::Active).await;
    review(&r, l, 4).await;

    let value = reputation::recompute(&r, owner, ReputationPolicy::default()).await.unwrap();
    assert_eq!(value, 4);
    // no profile is created as a side effect
    assert!(matches!(r.get_profile(owner).await, Err(RepoError::NotFound)));
    assert_eq!(reputation::recompute(&r, Uuid::new_v4(), ReputationPolicy::default()).await.unwrap(), 0);
}

/// Store whose review reads fail; everything else goes to the inner repo.
struct BrokenReviews(InMemRepo);

#[async_trait]
impl ListingRepo for BrokenReviews {
    async fn list_listings(&self, status: Option<ListingStatus>) -> RepoResult<Vec<Listing>> {
        self.0.list_listings(status).await
    }
    async fn page_listings(&self, status: ListingStatus, offset: i64, limit: i64) -> RepoResult<Vec<Listing>> {
        self.0.page_listings(status, offset, limit).await
    }
    async fn list_listings_by_owner(&self, user_id: Id) -> RepoResult<Vec<Listing>> {
        self.0.list_listings_by_owner(user_id).await
    }
    async fn list_listings_by_ids(&self, ids: &[Id]) -> RepoResult<Vec<Listing>> {
        self.0.list_listings_by_ids(ids).await
    }
    async fn get_listing(&self, id: Id) -> RepoResult<Listing> {
        self.0.get_listing(id).await
    }
    async fn create_listing(&self, draft: ListingDraft) -> RepoResult<Listing> {
        self.0.create_listing(draft).await
    }
    async fn update_listing(&self, id: Id, draft: ListingDraft) -> RepoResult<Listing> {
        self.0.update_listing(id, draft).await
    }
    async fn set_listing_status(&self, id: Id, status: ListingStatus) -> RepoResult<Listing> {
        self.0.set_listing_status(id, status).await
    }
    async fn delete_listing(&self, id: Id) -> RepoResult<()> {
        self.0.delete_listing(id).await
    }
}

#[async_trait]
impl ReviewRepo for BrokenReviews {
    async fn list_reviews_for_listing(&self, _: Id, _: Option<ReviewStatus>) -> RepoResult<Vec<Review>> {
        Err(RepoError::Internal("connection reset".into()))
    }
    async fn list_reviews_for_listings(&self, _: &[Id]) -> RepoResult<Vec<Review>> {
        Err(RepoError::Internal("connection reset".into()))
    }
    async fn list_reviews_by_status(&self, status: ReviewStatus) -> RepoResult<Vec<Review>> {
        self.0.list_reviews_by_status(status).await
    }
    async fn find_review(&self, author_id: Id, listing_id: Id) -> RepoResult<Option<Review>> {
        self.0.find_review(author_id, listing_id).await
    }
    async fn get_review(&self, id: Id) -> RepoResult<Review> {
        self.0.get_review(id).await
    }
    async fn create_review(&self, new: NewReview) -> RepoResult<Review> {
        self.0.create_review(new).await
    }
    async fn set_review_status(&self, id: Id, status: ReviewStatus, verified: Option<bool>) -> RepoResult<Review> {
        self.0.set_review_status(id, status, verified).await
    }
    async fn delete_review(&self, id: Id) -> RepoResult<()> {
        self.0.delete_review(id).await
    }
}

#[async_trait]
impl ProfileRepo for BrokenReviews {
    async fn get_profile(&self, user_id: Id) -> RepoResult<Profile> {
        self.0.get_profile(user_id).await
    }
    async fn upsert_profile(&self, new: NewProfile) -> RepoResult<Profile> {
        self.0.upsert_profile(new).await
    }
    async fn update_profile(&self, user_id: Id, upd: UpdateProfile) -> RepoResult<Profile> {
        self.0.update_profile(user_id, upd).await
    }
    async fn set_reputation(&self, user_id: Id, score: i32) -> RepoResult<()> {
        self.0.set_reputation(user_id, score).await
    }
}

#[async_trait]
impl FavoriteRepo for BrokenReviews {
    async fn is_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<bool> {
        self.0.is_favorite(user_id, listing_id).await
    }
    async fn add_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<Favorite> {
        self.0.add_favorite(user_id, listing_id).await
    }
    async fn remove_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<()> {
        self.0.remove_favorite(user_id, listing_id).await
    }
    async fn list_favorite_listing_ids(&self, user_id: Id) -> RepoResult<Vec<Id>> {
        self.0.list_favorite_listing_ids(user_id).await
    }
}

#[async_trait]
impl InteractionRepo for BrokenReviews {
    async fn record_interaction(&self, user_id: Id, listing_id: Id) -> RepoResult<Interaction> {
        self.0.record_interaction(user_id, listing_id).await
    }
    async fn has_interaction(&self, user_id: Id, listing_id: Id) -> RepoResult<bool> {
        self.0.has_interaction(user_id, listing_id).await
    }
}

#[tokio::test]
async fn failed_read_keeps_previous_score() {
    let inner = InMemRepo::new();
    let s = seller(&inner).await;
    let l = listing(&inner, s, ListingStatus::Active).await;
    review(&inner, l, 5).await;
    reputation::recompute(&inner, s, ReputationPolicy::default()).await.unwrap();

    let broken = BrokenReviews(inner.clone());
    for fetch in [FetchStrategy::Batched, FetchStrategy::PerListing] {
        let policy = ReputationPolicy { fetch, ..Default::default() };
        let err = reputation::recompute(&broken, s, policy).await.unwrap_err();
        assert!(matches!(err, RepoError::Internal(_)));
    }
    assert_eq!(inner.get_profile(s).await.unwrap().reputation_score, 5);
}

use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("conflict")] Conflict,
    #[error("backend error: {0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait ListingRepo: Send + Sync {
    /// All listings, optionally restricted to one status, oldest first.
    async fn list_listings(&self, status: Option<ListingStatus>) -> RepoResult<Vec<Listing>>;
    /// One page of listings with the given status, oldest first.
    async fn page_listings(&self, status: ListingStatus, offset: i64, limit: i64) -> RepoResult<Vec<Listing>>;
    async fn list_listings_by_owner(&self, user_id: Id) -> RepoResult<Vec<Listing>>;
    async fn list_listings_by_ids(&self, ids: &[Id]) -> RepoResult<Vec<Listing>>;
    async fn get_listing(&self, id: Id) -> RepoResult<Listing>;
    async fn create_listing(&self, draft: ListingDraft) -> RepoResult<Listing>;
    async fn update_listing(&self, id: Id, draft: ListingDraft) -> RepoResult<Listing>;
    async fn set_listing_status(&self, id: Id, status: ListingStatus) -> RepoResult<Listing>;
    /// Removes the listing together with its reviews, favorites and interactions.
    async fn delete_listing(&self, id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait ReviewRepo: Send + Sync {
    async fn list_reviews_for_listing(&self, listing_id: Id, status: Option<ReviewStatus>) -> RepoResult<Vec<Review>>;
    /// Batched variant: every review on any of `listing_ids`.
    async fn list_reviews_for_listings(&self, listing_ids: &[Id]) -> RepoResult<Vec<Review>>;
    async fn list_reviews_by_status(&self, status: ReviewStatus) -> RepoResult<Vec<Review>>;
    /// Existence check used before insert. Not backed by a unique index.
    async fn find_review(&self, author_id: Id, listing_id: Id) -> RepoResult<Option<Review>>;
    async fn get_review(&self, id: Id) -> RepoResult<Review>;
    async fn create_review(&self, new: NewReview) -> RepoResult<Review>;
    async fn set_review_status(&self, id: Id, status: ReviewStatus, verified: Option<bool>) -> RepoResult<Review>;
    async fn delete_review(&self, id: Id) -> RepoResult<()>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, user_id: Id) -> RepoResult<Profile>;
    /// Creates the profile or refreshes name/email/role of an existing one.
    /// Never touches `reputation_score`.
    async fn upsert_profile(&self, new: NewProfile) -> RepoResult<Profile>;
    async fn update_profile(&self, user_id: Id, upd: UpdateProfile) -> RepoResult<Profile>;
    async fn set_reputation(&self, user_id: Id, score: i32) -> RepoResult<()>;
}

#[async_trait]
pub trait FavoriteRepo: Send + Sync {
    async fn is_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<bool>;
    async fn add_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<Favorite>;
    async fn remove_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<()>;
    async fn list_favorite_listing_ids(&self, user_id: Id) -> RepoResult<Vec<Id>>;
}

#[async_trait]
pub trait InteractionRepo: Send + Sync {
    async fn record_interaction(&self, user_id: Id, listing_id: Id) -> RepoResult<Interaction>;
    async fn has_interaction(&self, user_id: Id, listing_id: Id) -> RepoResult<bool>;
}

#[async_trait]
pub trait CategoryRepo: Send + Sync {
    /// Sorted by name.
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    /// `Conflict` when a category with the same name (case-insensitive) exists.
    async fn create_category(&self, name: &str) -> RepoResult<Category>;
}

pub trait Repo: ListingRepo + ReviewRepo + ProfileRepo + FavoriteRepo + InteractionRepo + CategoryRepo {}

impl<T> Repo for T where T: ListingRepo + ReviewRepo + ProfileRepo + FavoriteRepo + InteractionRepo + CategoryRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use tracing::{debug, warn};
    use uuid::Uuid;

    const SNAPSHOT_FILE: &str = "state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        listings: HashMap<Id, Listing>,
        reviews: HashMap<Id, Review>,
        profiles: HashMap<Id, Profile>,
        favorites: HashMap<Id, Favorite>,
        interactions: HashMap<Id, Interaction>,
        #[serde(default)]
        categories: HashMap<Id, Category>,
    }

    /// Process-local store. Optionally mirrors its state to a JSON snapshot
    /// after every write so a dev server survives restarts.
    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Option<Arc<PathBuf>>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store backed by `<dir>/state.json`; a missing or unreadable
        /// snapshot starts empty.
        pub fn with_snapshot_dir(dir: impl AsRef<Path>) -> Self {
            let path = dir.as_ref().join(SNAPSHOT_FILE);
            let state = Self::load_state_from(&path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Some(Arc::new(path)),
            }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        debug!(path = %path.display(), "loaded snapshot");
                        s
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "unparseable snapshot, starting empty");
                        State::default()
                    }
                },
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "no snapshot, starting empty");
                    State::default()
                }
            }
        }

        fn persist(&self) {
            let Some(path) = self.snapshot_path.as_deref() else { return };
            let bytes = match self.state.read() {
                Ok(s) => serde_json::to_vec_pretty(&*s),
                Err(_) => return,
            };
            match bytes {
                Ok(bytes) => {
                    if let Some(dir) = path.parent() {
                        let _ = std::fs::create_dir_all(dir);
                    }
                    if let Err(e) = std::fs::write(path, bytes) {
                        warn!(path = %path.display(), error = %e, "failed to write snapshot");
                    }
                }
                Err(e) => warn!(error = %e, "failed to serialize snapshot"),
            }
        }

        fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn sorted_listings<'a>(it: impl Iterator<Item = &'a Listing>) -> Vec<Listing> {
            let mut v: Vec<_> = it.cloned().collect();
            v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            v
        }

        fn sorted_reviews<'a>(it: impl Iterator<Item = &'a Review>) -> Vec<Review> {
            let mut v: Vec<_> = it.cloned().collect();
            v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            v
        }
    }

    #[async_trait]
    impl ListingRepo for InMemRepo {
        async fn list_listings(&self, status: Option<ListingStatus>) -> RepoResult<Vec<Listing>> {
            let s = self.read()?;
            Ok(Self::sorted_listings(
                s.listings.values().filter(|l| status.map_or(true, |st| l.status == st)),
            ))
        }

        async fn page_listings(&self, status: ListingStatus, offset: i64, limit: i64) -> RepoResult<Vec<Listing>> {
            let all = self.list_listings(Some(status)).await?;
            Ok(all
                .into_iter()
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .collect())
        }

        async fn list_listings_by_owner(&self, user_id: Id) -> RepoResult<Vec<Listing>> {
            let s = self.read()?;
            Ok(Self::sorted_listings(s.listings.values().filter(|l| l.user_id == user_id)))
        }

        async fn list_listings_by_ids(&self, ids: &[Id]) -> RepoResult<Vec<Listing>> {
            let s = self.read()?;
            Ok(Self::sorted_listings(ids.iter().filter_map(|id| s.listings.get(id))))
        }

        async fn get_listing(&self, id: Id) -> RepoResult<Listing> {
            let s = self.read()?;
            s.listings.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn create_listing(&self, draft: ListingDraft) -> RepoResult<Listing> {
            let mut s = self.write()?;
            let now = Utc::now();
            let listing = Listing {
                id: Uuid::new_v4(),
                user_id: draft.user_id,
                title: draft.title,
                description: draft.description,
                category_id: draft.category_id,
                price_list: draft.price_list,
                geo_position: draft.geo_position,
                working_hours: draft.working_hours,
                status: draft.status,
                kind: draft.kind,
                expires_at: draft.expires_at,
                image_url: draft.image_url,
                created_at: now,
                updated_at: now,
            };
            s.listings.insert(listing.id, listing.clone());
            drop(s); // release lock before persisting
            self.persist();
            Ok(listing)
        }

        async fn update_listing(&self, id: Id, draft: ListingDraft) -> RepoResult<Listing> {
            let mut s = self.write()?;
            let listing = s.listings.get_mut(&id).ok_or(RepoError::NotFound)?;
            listing.title = draft.title;
            listing.description = draft.description;
            listing.category_id = draft.category_id;
            listing.price_list = draft.price_list;
            listing.geo_position = draft.geo_position;
            listing.working_hours = draft.working_hours;
            listing.status = draft.status;
            listing.kind = draft.kind;
            listing.expires_at = draft.expires_at;
            listing.image_url = draft.image_url;
            listing.updated_at = Utc::now();
            let updated = listing.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn set_listing_status(&self, id: Id, status: ListingStatus) -> RepoResult<Listing> {
            let mut s = self.write()?;
            let listing = s.listings.get_mut(&id).ok_or(RepoError::NotFound)?;
            listing.status = status;
            listing.updated_at = Utc::now();
            let updated = listing.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn delete_listing(&self, id: Id) -> RepoResult<()> {
            let mut s = self.write()?;
            if s.listings.remove(&id).is_none() {
                return Err(RepoError::NotFound);
            }
            s.reviews.retain(|_, r| r.listing_id != id);
            s.favorites.retain(|_, f| f.listing_id != id);
            s.interactions.retain(|_, i| i.listing_id != id);
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl ReviewRepo for InMemRepo {
        async fn list_reviews_for_listing(&self, listing_id: Id, status: Option<ReviewStatus>) -> RepoResult<Vec<Review>> {
            let s = self.read()?;
            Ok(Self::sorted_reviews(s.reviews.values().filter(|r| {
                r.listing_id == listing_id && status.map_or(true, |st| r.status == st)
            })))
        }

        async fn list_reviews_for_listings(&self, listing_ids: &[Id]) -> RepoResult<Vec<Review>> {
            let s = self.read()?;
            Ok(Self::sorted_reviews(
                s.reviews.values().filter(|r| listing_ids.contains(&r.listing_id)),
            ))
        }

        async fn list_reviews_by_status(&self, status: ReviewStatus) -> RepoResult<Vec<Review>> {
            let s = self.read()?;
            Ok(Self::sorted_reviews(s.reviews.values().filter(|r| r.status == status)))
        }

        async fn find_review(&self, author_id: Id, listing_id: Id) -> RepoResult<Option<Review>> {
            let s = self.read()?;
            Ok(s.reviews
                .values()
                .find(|r| r.author_id == author_id && r.listing_id == listing_id)
                .cloned())
        }

        async fn get_review(&self, id: Id) -> RepoResult<Review> {
            let s = self.read()?;
            s.reviews.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn create_review(&self, new: NewReview) -> RepoResult<Review> {
            let mut s = self.write()?;
            if !s.listings.contains_key(&new.listing_id) {
                return Err(RepoError::NotFound);
            }
            let now = Utc::now();
            let review = Review {
                id: Uuid::new_v4(),
                listing_id: new.listing_id,
                author_id: new.author_id,
                rating: new.rating,
                text: new.text,
                status: ReviewStatus::Active,
                verified: false,
                created_at: now,
                updated_at: now,
            };
            s.reviews.insert(review.id, review.clone());
            drop(s);
            self.persist();
            Ok(review)
        }

        async fn set_review_status(&self, id: Id, status: ReviewStatus, verified: Option<bool>) -> RepoResult<Review> {
            let mut s = self.write()?;
            let review = s.reviews.get_mut(&id).ok_or(RepoError::NotFound)?;
            review.status = status;
            if let Some(v) = verified { review.verified = v; }
            review.updated_at = Utc::now();
            let updated = review.clone();
            drop(s);
            self.persist();
            Ok(updated)
        }

        async fn delete_review(&self, id: Id) -> RepoResult<()> {
            let mut s = self.write()?;
            s.reviews.remove(&id).ok_or(RepoError::NotFound)?;
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl ProfileRepo for InMemRepo {
        async fn get_profile(&self, user_id: Id) -> RepoResult<Profile> {
            let s = self.read()?;
            s.profiles.get(&user_id).cloned().ok_or(RepoError::NotFound)
        }

        async fn upsert_profile(&self, new: NewProfile) -> RepoResult<Profile> {
            let mut s = self.write()?;
            let profile = s.profiles.entry(new.user_id).or_insert_with(|| Profile {
                user_id: new.user_id,
                name: None,
                email: None,
                phone_number: None,
                address: None,
                geo_position: None,
                reputation_score: 0,
                role: ProfileRole::User,
                avatar_url: None,
            });
            profile.name = new.name;
            profile.email = new.email;
            profile.role = new.role;
            let p = profile.clone();
            drop(s);
            self.persist();
            Ok(p)
        }

        async fn update_profile(&self, user_id: Id, upd: UpdateProfile) -> RepoResult<Profile> {
            let mut s = self.write()?;
            let profile = s.profiles.get_mut(&user_id).ok_or(RepoError::NotFound)?;
            if let Some(name) = upd.name { profile.name = Some(name); }
            if let Some(phone) = upd.phone_number { profile.phone_number = Some(phone); }
            if let Some(address) = upd.address { profile.address = Some(address); }
            if let Some(point) = upd.geo_position { profile.geo_position = Some(point); }
            if let Some(avatar) = upd.avatar_url { profile.avatar_url = Some(avatar); }
            let p = profile.clone();
            drop(s);
            self.persist();
            Ok(p)
        }

        async fn set_reputation(&self, user_id: Id, score: i32) -> RepoResult<()> {
            let mut s = self.write()?;
            let profile = s.profiles.get_mut(&user_id).ok_or(RepoError::NotFound)?;
            profile.reputation_score = score;
            drop(s);
            self.persist();
            Ok(())
        }
    }

    #[async_trait]
    impl FavoriteRepo for InMemRepo {
        async fn is_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<bool> {
            let s = self.read()?;
            Ok(s.favorites.values().any(|f| f.user_id == user_id && f.listing_id == listing_id))
        }

        async fn add_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<Favorite> {
            let mut s = self.write()?;
            if !s.listings.contains_key(&listing_id) {
                return Err(RepoError::NotFound);
            }
            if s.favorites.values().any(|f| f.user_id == user_id && f.listing_id == listing_id) {
                return Err(RepoError::Conflict);
            }
            let fav = Favorite { id: Uuid::new_v4(), user_id, listing_id };
            s.favorites.insert(fav.id, fav.clone());
            drop(s);
            self.persist();
            Ok(fav)
        }

        async fn remove_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<()> {
            let mut s = self.write()?;
            let before = s.favorites.len();
            s.favorites.retain(|_, f| !(f.user_id == user_id && f.listing_id == listing_id));
            if s.favorites.len() == before {
                return Err(RepoError::NotFound);
            }
            drop(s);
            self.persist();
            Ok(())
        }

        async fn list_favorite_listing_ids(&self, user_id: Id) -> RepoResult<Vec<Id>> {
            let s = self.read()?;
            Ok(s.favorites
                .values()
                .filter(|f| f.user_id == user_id)
                .map(|f| f.listing_id)
                .collect())
        }
    }

    #[async_trait]
    impl InteractionRepo for InMemRepo {
        async fn record_interaction(&self, user_id: Id, listing_id: Id) -> RepoResult<Interaction> {
            let mut s = self.write()?;
            if !s.listings.contains_key(&listing_id) {
                return Err(RepoError::NotFound);
            }
            let interaction = Interaction {
                id: Uuid::new_v4(),
                user_id,
                listing_id,
                created_at: Utc::now(),
            };
            s.interactions.insert(interaction.id, interaction.clone());
            drop(s);
            self.persist();
            Ok(interaction)
        }

        async fn has_interaction(&self, user_id: Id, listing_id: Id) -> RepoResult<bool> {
            let s = self.read()?;
            Ok(s.interactions.values().any(|i| i.user_id == user_id && i.listing_id == listing_id))
        }
    }

    #[async_trait]
    impl CategoryRepo for InMemRepo {
        async fn list_categories(&self) -> RepoResult<Vec<Category>> {
            let s = self.read()?;
            let mut v: Vec<_> = s.categories.values().cloned().collect();
            v.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.cmp(&b.id)));
            Ok(v)
        }

        async fn create_category(&self, name: &str) -> RepoResult<Category> {
            let mut s = self.write()?;
            if s.categories.values().any(|c| c.name.to_lowercase() == name.to_lowercase()) {
                return Err(RepoError::Conflict);
            }
            let category = Category { id: Uuid::new_v4(), name: name.to_string() };
            s.categories.insert(category.id, category.clone());
            drop(s);
            self.persist();
            Ok(category)
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use chrono::{DateTime, Utc};
    use sqlx::postgres::PgPoolOptions;
    use sqlx::types::Json;
    use sqlx::{Pool, Postgres};
    use std::time::Duration;

    impl From<sqlx::Error> for RepoError {
        fn from(e: sqlx::Error) -> Self {
            match e {
                sqlx::Error::RowNotFound => RepoError::NotFound,
                sqlx::Error::Database(ref db) => match db.code().as_deref() {
                    Some("23505") => RepoError::Conflict,   // unique_violation
                    Some("23503") => RepoError::NotFound,   // foreign_key_violation
                    _ => RepoError::Internal(e.to_string()),
                },
                other => RepoError::Internal(other.to_string()),
            }
        }
    }

    fn parse_text<T: std::str::FromStr<Err = UnknownVariant>>(raw: &str) -> RepoResult<T> {
        raw.parse().map_err(|e: UnknownVariant| RepoError::Internal(e.to_string()))
    }

    #[derive(sqlx::FromRow)]
    struct ListingRow {
        id: Id,
        user_id: Id,
        title: String,
        description: String,
        category_id: Id,
        price_list: Json<Vec<PriceItem>>,
        geo_position: Option<Json<GeoPoint>>,
        working_hours: Option<Json<WorkingHours>>,
        status: String,
        kind: String,
        expires_at: Option<String>,
        image_url: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl TryFrom<ListingRow> for Listing {
        type Error = RepoError;
        fn try_from(r: ListingRow) -> RepoResult<Self> {
            Ok(Listing {
                id: r.id,
                user_id: r.user_id,
                title: r.title,
                description: r.description,
                category_id: r.category_id,
                price_list: r.price_list.0,
                geo_position: r.geo_position.map(|j| j.0),
                working_hours: r.working_hours.map(|j| j.0),
                status: parse_text(&r.status)?,
                kind: parse_text(&r.kind)?,
                expires_at: r.expires_at,
                image_url: r.image_url,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
        }
    }

    #[derive(sqlx::FromRow)]
    struct ReviewRow {
        id: Id,
        listing_id: Id,
        author_id: Id,
        rating: i32,
        text: Option<String>,
        status: String,
        verified: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    impl TryFrom<ReviewRow> for Review {
        type Error = RepoError;
        fn try_from(r: ReviewRow) -> RepoResult<Self> {
            Ok(Review {
                id: r.id,
                listing_id: r.listing_id,
                author_id: r.author_id,
                rating: r.rating,
                text: r.text,
                status: parse_text(&r.status)?,
                verified: r.verified,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
        }
    }

    #[derive(sqlx::FromRow)]
    struct ProfileRow {
        user_id: Id,
        name: Option<String>,
        email: Option<String>,
        phone_number: Option<String>,
        address: Option<String>,
        geo_position: Option<Json<GeoPoint>>,
        reputation_score: i32,
        role: String,
        avatar_url: Option<String>,
    }

    impl TryFrom<ProfileRow> for Profile {
        type Error = RepoError;
        fn try_from(r: ProfileRow) -> RepoResult<Self> {
            Ok(Profile {
                user_id: r.user_id,
                name: r.name,
                email: r.email,
                phone_number: r.phone_number,
                address: r.address,
                geo_position: r.geo_position.map(|j| j.0),
                reputation_score: r.reputation_score,
                role: parse_text(&r.role)?,
                avatar_url: r.avatar_url,
            })
        }
    }

    fn convert<R, T: TryFrom<R, Error = RepoError>>(rows: Vec<R>) -> RepoResult<Vec<T>> {
        rows.into_iter().map(T::try_from).collect()
    }

    const LISTING_COLS: &str = "id, user_id, title, description, category_id, price_list, geo_position, working_hours, status, kind, expires_at, image_url, created_at, updated_at";
    const REVIEW_COLS: &str = "id, listing_id, author_id, rating, text, status, verified, created_at, updated_at";
    const PROFILE_COLS: &str = "user_id, name, email, phone_number, address, geo_position, reputation_score, role, avatar_url";

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }

        /// Lazily connecting pool; the first query opens the connection.
        pub fn connect_lazy(url: &str, max_connections: u32) -> RepoResult<Self> {
            let pool = PgPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(Duration::from_secs(5))
                .connect_lazy(url)?;
            Ok(Self::new(pool))
        }

        pub async fn migrate(&self) -> RepoResult<()> {
            sqlx::migrate!("./migrations")
                .run(&self.pool)
                .await
                .map_err(|e| RepoError::Internal(e.to_string()))
        }

        pub async fn close(&self) {
            self.pool.close().await;
        }
    }

    #[async_trait]
    impl ListingRepo for PgRepo {
        async fn list_listings(&self, status: Option<ListingStatus>) -> RepoResult<Vec<Listing>> {
            let rows = sqlx::query_as::<_, ListingRow>(&format!(
                "SELECT {LISTING_COLS} FROM listings WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at, id"
            ))
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
            convert(rows)
        }

        async fn page_listings(&self, status: ListingStatus, offset: i64, limit: i64) -> RepoResult<Vec<Listing>> {
            let rows = sqlx::query_as::<_, ListingRow>(&format!(
                "SELECT {LISTING_COLS} FROM listings WHERE status = $1 ORDER BY created_at, id OFFSET $2 LIMIT $3"
            ))
            .bind(status.as_str())
            .bind(offset.max(0))
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?;
            convert(rows)
        }

        async fn list_listings_by_owner(&self, user_id: Id) -> RepoResult<Vec<Listing>> {
            let rows = sqlx::query_as::<_, ListingRow>(&format!(
                "SELECT {LISTING_COLS} FROM listings WHERE user_id = $1 ORDER BY created_at, id"
            ))
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
            convert(rows)
        }

        async fn list_listings_by_ids(&self, ids: &[Id]) -> RepoResult<Vec<Listing>> {
            let rows = sqlx::query_as::<_, ListingRow>(&format!(
                "SELECT {LISTING_COLS} FROM listings WHERE id = ANY($1) ORDER BY created_at, id"
            ))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
            convert(rows)
        }

        async fn get_listing(&self, id: Id) -> RepoResult<Listing> {
            let row = sqlx::query_as::<_, ListingRow>(&format!(
                "SELECT {LISTING_COLS} FROM listings WHERE id = $1"
            ))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            row.try_into()
        }

        async fn create_listing(&self, d: ListingDraft) -> RepoResult<Listing> {
            let row = sqlx::query_as::<_, ListingRow>(&format!(
                "INSERT INTO listings (user_id, title, description, category_id, price_list, geo_position, working_hours, \
                 status, kind, expires_at, image_url) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11) RETURNING {LISTING_COLS}"
            ))
            .bind(d.user_id)
            .bind(&d.title)
            .bind(&d.description)
            .bind(d.category_id)
            .bind(Json(&d.price_list))
            .bind(d.geo_position.as_ref().map(Json))
            .bind(d.working_hours.as_ref().map(Json))
            .bind(d.status.as_str())
            .bind(d.kind.as_str())
            .bind(d.expires_at.as_deref())
            .bind(d.image_url.as_deref())
            .fetch_one(&self.pool)
            .await?;
            row.try_into()
        }

        async fn update_listing(&self, id: Id, d: ListingDraft) -> RepoResult<Listing> {
            let row = sqlx::query_as::<_, ListingRow>(&format!(
                "UPDATE listings SET title = $2, description = $3, category_id = $4, price_list = $5, geo_position = $6, \
                 working_hours = $7, status = $8, kind = $9, expires_at = $10, image_url = $11, updated_at = now() \
                 WHERE id = $1 RETURNING {LISTING_COLS}"
            ))
            .bind(id)
            .bind(&d.title)
            .bind(&d.description)
            .bind(d.category_id)
            .bind(Json(&d.price_list))
            .bind(d.geo_position.as_ref().map(Json))
            .bind(d.working_hours.as_ref().map(Json))
            .bind(d.status.as_str())
            .bind(d.kind.as_str())
            .bind(d.expires_at.as_deref())
            .bind(d.image_url.as_deref())
            .fetch_one(&self.pool)
            .await?;
            row.try_into()
        }

        async fn set_listing_status(&self, id: Id, status: ListingStatus) -> RepoResult<Listing> {
            let row = sqlx::query_as::<_, ListingRow>(&format!(
                "UPDATE listings SET status = $2, updated_at = now() WHERE id = $1 RETURNING {LISTING_COLS}"
            ))
            .bind(id)
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
            row.try_into()
        }

        async fn delete_listing(&self, id: Id) -> RepoResult<()> {
            // reviews, favorites and interactions go with it (ON DELETE CASCADE)
            let res = sqlx::query("DELETE FROM listings WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }
    }

    #[async_trait]
    impl ReviewRepo for PgRepo {
        async fn list_reviews_for_listing(&self, listing_id: Id, status: Option<ReviewStatus>) -> RepoResult<Vec<Review>> {
            let rows = sqlx::query_as::<_, ReviewRow>(&format!(
                "SELECT {REVIEW_COLS} FROM reviews WHERE listing_id = $1 AND ($2::text IS NULL OR status = $2) ORDER BY created_at, id"
            ))
            .bind(listing_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;
            convert(rows)
        }

        async fn list_reviews_for_listings(&self, listing_ids: &[Id]) -> RepoResult<Vec<Review>> {
            let rows = sqlx::query_as::<_, ReviewRow>(&format!(
                "SELECT {REVIEW_COLS} FROM reviews WHERE listing_id = ANY($1) ORDER BY created_at, id"
            ))
            .bind(listing_ids)
            .fetch_all(&self.pool)
            .await?;
            convert(rows)
        }

        async fn list_reviews_by_status(&self, status: ReviewStatus) -> RepoResult<Vec<Review>> {
            let rows = sqlx::query_as::<_, ReviewRow>(&format!(
                "SELECT {REVIEW_COLS} FROM reviews WHERE status = $1 ORDER BY created_at, id"
            ))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
            convert(rows)
        }

        async fn find_review(&self, author_id: Id, listing_id: Id) -> RepoResult<Option<Review>> {
            let row = sqlx::query_as::<_, ReviewRow>(&format!(
                "SELECT {REVIEW_COLS} FROM reviews WHERE author_id = $1 AND listing_id = $2 LIMIT 1"
            ))
            .bind(author_id)
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?;
            row.map(Review::try_from).transpose()
        }

        async fn get_review(&self, id: Id) -> RepoResult<Review> {
            let row = sqlx::query_as::<_, ReviewRow>(&format!("SELECT {REVIEW_COLS} FROM reviews WHERE id = $1"))
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            row.try_into()
        }

        async fn create_review(&self, new: NewReview) -> RepoResult<Review> {
            let row = sqlx::query_as::<_, ReviewRow>(&format!(
                "INSERT INTO reviews (listing_id, author_id, rating, text) VALUES ($1,$2,$3,$4) RETURNING {REVIEW_COLS}"
            ))
            .bind(new.listing_id)
            .bind(new.author_id)
            .bind(new.rating)
            .bind(new.text.as_deref())
            .fetch_one(&self.pool)
            .await?;
            row.try_into()
        }

        async fn set_review_status(&self, id: Id, status: ReviewStatus, verified: Option<bool>) -> RepoResult<Review> {
            let row = sqlx::query_as::<_, ReviewRow>(&format!(
                "UPDATE reviews SET status = $2, verified = COALESCE($3, verified), updated_at = now() WHERE id = $1 RETURNING {REVIEW_COLS}"
            ))
            .bind(id)
            .bind(status.as_str())
            .bind(verified)
            .fetch_one(&self.pool)
            .await?;
            row.try_into()
        }

        async fn delete_review(&self, id: Id) -> RepoResult<()> {
            let res = sqlx::query("DELETE FROM reviews WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }
    }

    #[async_trait]
    impl ProfileRepo for PgRepo {
        async fn get_profile(&self, user_id: Id) -> RepoResult<Profile> {
            let row = sqlx::query_as::<_, ProfileRow>(&format!("SELECT {PROFILE_COLS} FROM profiles WHERE user_id = $1"))
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
            row.try_into()
        }

        async fn upsert_profile(&self, new: NewProfile) -> RepoResult<Profile> {
            let row = sqlx::query_as::<_, ProfileRow>(&format!(
                "INSERT INTO profiles (user_id, name, email, role) VALUES ($1,$2,$3,$4) \
                 ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email, role = EXCLUDED.role \
                 RETURNING {PROFILE_COLS}"
            ))
            .bind(new.user_id)
            .bind(new.name.as_deref())
            .bind(new.email.as_deref())
            .bind(new.role.as_str())
            .fetch_one(&self.pool)
            .await?;
            row.try_into()
        }

        async fn update_profile(&self, user_id: Id, upd: UpdateProfile) -> RepoResult<Profile> {
            let row = sqlx::query_as::<_, ProfileRow>(&format!(
                "UPDATE profiles SET name = COALESCE($2, name), phone_number = COALESCE($3, phone_number), \
                 address = COALESCE($4, address), avatar_url = COALESCE($5, avatar_url), \
                 geo_position = COALESCE($6, geo_position) WHERE user_id = $1 RETURNING {PROFILE_COLS}"
            ))
            .bind(user_id)
            .bind(upd.name.as_deref())
            .bind(upd.phone_number.as_deref())
            .bind(upd.address.as_deref())
            .bind(upd.avatar_url.as_deref())
            .bind(upd.geo_position.as_ref().map(Json))
            .fetch_one(&self.pool)
            .await?;
            row.try_into()
        }

        async fn set_reputation(&self, user_id: Id, score: i32) -> RepoResult<()> {
            let res = sqlx::query("UPDATE profiles SET reputation_score = $2 WHERE user_id = $1")
                .bind(user_id)
                .bind(score)
                .execute(&self.pool)
                .await?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }
    }

    #[async_trait]
    impl FavoriteRepo for PgRepo {
        async fn is_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<bool> {
            let found: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND listing_id = $2)",
            )
            .bind(user_id)
            .bind(listing_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(found)
        }

        async fn add_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<Favorite> {
            let (id,): (Id,) = sqlx::query_as(
                "INSERT INTO favorites (user_id, listing_id) VALUES ($1,$2) RETURNING id",
            )
            .bind(user_id)
            .bind(listing_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(Favorite { id, user_id, listing_id })
        }

        async fn remove_favorite(&self, user_id: Id, listing_id: Id) -> RepoResult<()> {
            let res = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
                .bind(user_id)
                .bind(listing_id)
                .execute(&self.pool)
                .await?;
            if res.rows_affected() == 0 { return Err(RepoError::NotFound); }
            Ok(())
        }

        async fn list_favorite_listing_ids(&self, user_id: Id) -> RepoResult<Vec<Id>> {
            let ids: Vec<Id> = sqlx::query_scalar("SELECT listing_id FROM favorites WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
            Ok(ids)
        }
    }

    #[async_trait]
    impl InteractionRepo for PgRepo {
        async fn record_interaction(&self, user_id: Id, listing_id: Id) -> RepoResult<Interaction> {
            let (id, created_at): (Id, DateTime<Utc>) = sqlx::query_as(
                "INSERT INTO interactions (user_id, listing_id) VALUES ($1,$2) RETURNING id, created_at",
            )
            .bind(user_id)
            .bind(listing_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(Interaction { id, user_id, listing_id, created_at })
        }

        async fn has_interaction(&self, user_id: Id, listing_id: Id) -> RepoResult<bool> {
            let found: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM interactions WHERE user_id = $1 AND listing_id = $2)",
            )
            .bind(user_id)
            .bind(listing_id)
            .fetch_one(&self.pool)
            .await?;
            Ok(found)
        }
    }

    #[async_trait]
    impl CategoryRepo for PgRepo {
        async fn list_categories(&self) -> RepoResult<Vec<Category>> {
            let rows: Vec<(Id, String)> = sqlx::query_as("SELECT id, name FROM categories ORDER BY lower(name), id")
                .fetch_all(&self.pool)
                .await?;
            Ok(rows.into_iter().map(|(id, name)| Category { id, name }).collect())
        }

        async fn create_category(&self, name: &str) -> RepoResult<Category> {
            // unique index on lower(name) turns duplicates into Conflict
            let (id,): (Id,) = sqlx::query_as("INSERT INTO categories (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
            Ok(Category { id, name: name.to_string() })
        }
    }
}

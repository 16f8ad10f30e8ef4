use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::{Auth, Role};
use crate::catalog::{self, FilterCriteria, SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::ApiError;
use crate::favorites;
use crate::geo::Near;
use crate::listings::{self, ListingView};
use crate::models::*;
use crate::moderation;
use crate::repo::{Repo, RepoError};
use crate::reputation::{self, ReputationPolicy};
use crate::require_role;
use crate::reviews::{self, ReviewSubmission};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::resource("/listings")
                    .route(web::get().to(list_listings))
                    .route(web::post().to(create_listing)),
            )
            .service(web::resource("/listings/hot").route(web::get().to(list_hot_listings)))
            .service(web::resource("/listings/map").route(web::get().to(list_map_listings)))
            .service(
                web::resource("/listings/{id}")
                    .route(web::get().to(get_listing))
                    .route(web::put().to(edit_listing))
                    .route(web::delete().to(delete_listing)),
            )
            .service(web::resource("/listings/{id}/close").route(web::post().to(close_listing)))
            .service(
                web::resource("/listings/{id}/reviews")
                    .route(web::get().to(list_reviews))
                    .route(web::post().to(submit_review)),
            )
            .service(web::resource("/listings/{id}/contact").route(web::post().to(request_contact)))
            .service(web::resource("/listings/{id}/favorite").route(web::post().to(toggle_favorite)))
            .service(web::resource("/favorites").route(web::get().to(list_favorites)))
            .service(web::resource("/reviews/{id}/report").route(web::post().to(report_review)))
            .service(web::resource("/reviews/{id}").route(web::delete().to(delete_review)))
            .service(web::resource("/profiles/me").route(web::put().to(update_my_profile)))
            .service(web::resource("/profiles/{id}").route(web::get().to(get_profile)))
            .service(web::resource("/profiles/{id}/listings").route(web::get().to(list_profile_listings)))
            .service(web::resource("/categories").route(web::get().to(list_categories)))
            // Moderation
            .service(web::resource("/moderation/listings").route(web::get().to(moderation_listings)))
            .service(web::resource("/moderation/listings/{id}/approve").route(web::post().to(approve_listing)))
            .service(web::resource("/moderation/listings/{id}/reject").route(web::post().to(reject_listing)))
            .service(web::resource("/moderation/reviews").route(web::get().to(moderation_reviews)))
            .service(web::resource("/moderation/reviews/{id}/approve").route(web::post().to(approve_review)))
            .service(web::resource("/moderation/reviews/{id}").route(web::delete().to(dismiss_review)))
            .service(web::resource("/moderation/categories").route(web::post().to(create_category)))
            .service(
                web::resource("/moderation/profiles/{id}/reputation").route(web::post().to(recompute_reputation)),
            ),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub reputation: ReputationPolicy,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Case-insensitive title search.
    pub q: Option<String>,
    /// Comma-separated category ids.
    pub categories: Option<String>,
    pub price_from: Option<i64>,
    pub price_to: Option<i64>,
    pub sort: Option<SortOrder>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl ListingQuery {
    fn criteria(&self) -> Result<FilterCriteria, ApiError> {
        let categories = match self.categories.as_deref() {
            None => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<Id>().map_err(|_| ApiError::BadRequest(format!("invalid category id '{s}'"))))
                .collect::<Result<_, _>>()?,
        };
        Ok(FilterCriteria {
            search: self.q.clone(),
            categories,
            price_from: self.price_from,
            price_to: self.price_to,
            sort: self.sort.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HotQuery {
    /// Case-insensitive title search.
    pub q: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Search radius in kilometres. Without `lat`/`lon` the caller's profile position is used.
    pub radius: Option<f64>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub geo_position: Option<GeoPoint>,
    pub avatar_url: Option<String>,
}

fn views(listings: Vec<Listing>) -> Vec<ListingView> {
    let now = Utc::now();
    listings.into_iter().map(|l| listings::listing_view(l, now)).collect()
}

async fn active_listings(repo: &dyn Repo, offset: Option<i64>, limit: Option<i64>) -> Result<Vec<Listing>, ApiError> {
    Ok(match (offset, limit) {
        (None, None) => repo.list_listings(Some(ListingStatus::Active)).await?,
        (offset, limit) => {
            let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
            repo.page_listings(ListingStatus::Active, offset.unwrap_or(0), limit).await?
        }
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/listings",
    tag = "listings",
    params(ListingQuery),
    responses((status = 200, description = "Visible regular listings", body = [ListingView]))
)]
pub async fn list_listings(data: web::Data<AppState>, query: web::Query<ListingQuery>) -> Result<HttpResponse, ApiError> {
    let criteria = query.criteria()?;
    let fetched = active_listings(data.repo.as_ref(), query.offset, query.limit).await?;
    Ok(HttpResponse::Ok().json(views(catalog::feed(fetched, &criteria, Utc::now()))))
}

/// Resolves the search circle of a hot-feed query.
async fn search_area(repo: &dyn Repo, auth: Option<&Auth>, q: &HotQuery) -> Result<Option<Near>, ApiError> {
    let Some(radius_km) = q.radius else { return Ok(None) };
    if !(radius_km.is_finite() && radius_km > 0.0) {
        return Err(ApiError::BadRequest("radius must be a positive number of kilometres".into()));
    }
    let (lon, lat) = match (q.lon, q.lat) {
        (Some(lon), Some(lat)) => GeoPoint::new(lon, lat)
            .lon_lat()
            .ok_or_else(|| ApiError::BadRequest("lat/lon out of range".into()))?,
        (None, None) => {
            let user_id = auth
                .and_then(|a| a.user_id().ok())
                .ok_or_else(|| ApiError::BadRequest("radius needs lat/lon or a signed-in user".into()))?;
            let position = match repo.get_profile(user_id).await {
                Ok(p) => p.geo_position.and_then(|g| g.lon_lat()),
                Err(RepoError::NotFound) => None,
                Err(e) => return Err(e.into()),
            };
            position.ok_or_else(|| ApiError::BadRequest("set a position in your profile or pass lat/lon".into()))?
        }
        _ => return Err(ApiError::BadRequest("lat and lon go together".into())),
    };
    Ok(Some(Near { lon, lat, radius_km }))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/hot",
    tag = "listings",
    params(HotQuery),
    responses(
        (status = 200, description = "Unexpired hot listings, soonest expiry first", body = [ListingView]),
        (status = 400, description = "Invalid search area")
    )
)]
pub async fn list_hot_listings(
    auth: Option<Auth>,
    data: web::Data<AppState>,
    query: web::Query<HotQuery>,
) -> Result<HttpResponse, ApiError> {
    let near = search_area(data.repo.as_ref(), auth.as_ref(), &query).await?;
    let fetched = active_listings(data.repo.as_ref(), query.offset, query.limit).await?;
    Ok(HttpResponse::Ok().json(views(catalog::hot_feed(fetched, query.q.as_deref(), near.as_ref(), Utc::now()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/map",
    tag = "listings",
    responses((status = 200, description = "Visible listings that have a position", body = [catalog::MapPoint]))
)]
pub async fn list_map_listings(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let fetched = data.repo.list_listings(Some(ListingStatus::Active)).await?;
    Ok(HttpResponse::Ok().json(catalog::map_points(fetched, Utc::now())))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    tag = "listings",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing", body = ListingView),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn get_listing(auth: Option<Auth>, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let listing = data.repo.get_listing(path.into_inner()).await?;
    // unmoderated or rejected listings are only shown to their owner and moderators
    if matches!(listing.status, ListingStatus::Check | ListingStatus::Rejected) {
        let allowed = match &auth {
            Some(a) => a.is_moderator() || a.user_id().ok() == Some(listing.user_id),
            None => false,
        };
        if !allowed { return Err(ApiError::NotFound); }
    }
    Ok(HttpResponse::Ok().json(listings::listing_view(listing, Utc::now())))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings",
    tag = "listings",
    request_body = NewListing,
    responses(
        (status = 201, description = "Listing submitted for moderation", body = Listing),
        (status = 400, description = "Invalid listing"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_listing(auth: Auth, data: web::Data<AppState>, payload: web::Json<NewListing>) -> Result<HttpResponse, ApiError> {
    let owner = auth.user_id()?;
    let listing = listings::create_listing(data.repo.as_ref(), owner, payload.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Created().json(listing))
}

#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}",
    tag = "listings",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    request_body = NewListing,
    responses(
        (status = 200, description = "Listing updated and back in moderation", body = Listing),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn edit_listing(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<NewListing>,
) -> Result<HttpResponse, ApiError> {
    let listing =
        listings::edit_listing(data.repo.as_ref(), auth.user_id()?, path.into_inner(), payload.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/close",
    tag = "listings",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing archived", body = Listing),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn close_listing(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let listing = listings::close_listing(data.repo.as_ref(), auth.user_id()?, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(listing))
}

#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    tag = "listings",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Listing deleted with its reviews, favorites and contacts"),
        (status = 403, description = "Neither owner nor moderator"),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn delete_listing(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    listings::delete_listing(data.repo.as_ref(), auth.user_id()?, auth.is_moderator(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/reviews",
    tag = "reviews",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Active reviews", body = [reviews::ReviewView]),
        (status = 404, description = "Listing not found")
    )
)]
pub async fn list_reviews(data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let reviews = reviews::listing_reviews(data.repo.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/reviews",
    tag = "reviews",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    request_body = ReviewSubmission,
    responses(
        (status = 201, description = "Review accepted, seller reputation recomputed", body = reviews::SubmittedReview),
        (status = 400, description = "Invalid rating or listing closed"),
        (status = 403, description = "Own listing or no prior contact"),
        (status = 409, description = "Already reviewed")
    )
)]
pub async fn submit_review(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<ReviewSubmission>,
) -> Result<HttpResponse, ApiError> {
    let submitted = reviews::submit_review(
        data.repo.as_ref(),
        auth.user_id()?,
        path.into_inner(),
        payload.into_inner(),
        data.reputation,
        Utc::now(),
    )
    .await?;
    Ok(HttpResponse::Created().json(submitted))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/contact",
    tag = "listings",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Seller contact; the request is recorded", body = favorites::ContactInfo),
        (status = 400, description = "Own or inactive listing")
    )
)]
pub async fn request_contact(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let contact = favorites::request_contact(data.repo.as_ref(), auth.user_id()?, path.into_inner(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(contact))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings/{id}/favorite",
    tag = "listings",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    responses((status = 200, description = "New favorite state", body = favorites::FavoriteState))
)]
pub async fn toggle_favorite(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let state = favorites::toggle_favorite(data.repo.as_ref(), auth.user_id()?, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(state))
}

#[utoipa::path(
    get,
    path = "/api/v1/favorites",
    tag = "listings",
    responses(
        (status = 200, description = "The caller's favorite listings", body = [ListingView]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_favorites(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let listings = favorites::favorites(data.repo.as_ref(), auth.user_id()?).await?;
    Ok(HttpResponse::Ok().json(views(listings)))
}

#[utoipa::path(
    post,
    path = "/api/v1/reviews/{id}/report",
    tag = "reviews",
    params(("id" = uuid::Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review hidden until a moderator decides", body = Review),
        (status = 400, description = "Review already verified"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn report_review(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    auth.user_id()?;
    let review = reviews::report_review(data.repo.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(review))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    tag = "reviews",
    params(("id" = uuid::Uuid, Path, description = "Review id")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Neither author nor moderator"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete_review(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    reviews::delete_review(data.repo.as_ref(), auth.user_id()?, auth.is_moderator(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}",
    tag = "profiles",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_profile(data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let profile = data.repo.get_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}/listings",
    tag = "profiles",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses((status = 200, description = "The user's listings; others see only moderated ones", body = [ListingView]))
)]
pub async fn list_profile_listings(auth: Option<Auth>, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let own = auth.as_ref().and_then(|a| a.user_id().ok()) == Some(user_id);
    let mut listings = data.repo.list_listings_by_owner(user_id).await?;
    if !own {
        listings.retain(|l| matches!(l.status, ListingStatus::Active | ListingStatus::Inactive));
    }
    Ok(HttpResponse::Ok().json(views(listings)))
}

#[utoipa::path(
    put,
    path = "/api/v1/profiles/me",
    tag = "profiles",
    request_body = ProfileInput,
    responses((status = 200, description = "Profile created or updated", body = Profile))
)]
pub async fn update_my_profile(auth: Auth, data: web::Data<AppState>, payload: web::Json<ProfileInput>) -> Result<HttpResponse, ApiError> {
    let user_id = auth.user_id()?;
    let input = payload.into_inner();
    if input.geo_position.as_ref().is_some_and(|g| g.lon_lat().is_none()) {
        return Err(ApiError::BadRequest("geo_position must be a point with [lon, lat] in range".into()));
    }
    match data.repo.get_profile(user_id).await {
        Ok(_) => {}
        Err(RepoError::NotFound) => {
            let role = if auth.0.roles.contains(&Role::Admin) {
                ProfileRole::Admin
            } else if auth.0.roles.contains(&Role::Moderator) {
                ProfileRole::Moderator
            } else {
                ProfileRole::User
            };
            data.repo
                .upsert_profile(NewProfile { user_id, name: input.name.clone(), email: input.email.clone(), role })
                .await?;
        }
        Err(e) => return Err(e.into()),
    }
    let profile = data
        .repo
        .update_profile(
            user_id,
            UpdateProfile {
                name: input.name,
                phone_number: input.phone_number,
                address: input.address,
                geo_position: input.geo_position,
                avatar_url: input.avatar_url,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "listings",
    responses((status = 200, description = "All categories by name", body = [Category]))
)]
pub async fn list_categories(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(catalog::categories(data.repo.as_ref()).await?))
}

// ---------------- Moderation handlers -----------------------

#[utoipa::path(
    get,
    path = "/api/v1/moderation/listings",
    tag = "moderation",
    responses(
        (status = 200, description = "Listings awaiting moderation", body = [Listing]),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn moderation_listings(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Moderator | Role::Admin);
    Ok(HttpResponse::Ok().json(moderation::pending_listings(data.repo.as_ref()).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/moderation/reviews",
    tag = "moderation",
    responses(
        (status = 200, description = "Reported reviews", body = [reviews::ReviewView]),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn moderation_reviews(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Moderator | Role::Admin);
    Ok(HttpResponse::Ok().json(moderation::reported_reviews(data.repo.as_ref()).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/moderation/listings/{id}/approve",
    tag = "moderation",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing published", body = Listing),
        (status = 400, description = "Listing is not awaiting moderation"),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn approve_listing(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Moderator | Role::Admin);
    Ok(HttpResponse::Ok().json(moderation::approve_listing(data.repo.as_ref(), path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/moderation/listings/{id}/reject",
    tag = "moderation",
    params(("id" = uuid::Uuid, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing rejected", body = Listing),
        (status = 400, description = "Listing is not awaiting moderation"),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn reject_listing(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Moderator | Role::Admin);
    Ok(HttpResponse::Ok().json(moderation::reject_listing(data.repo.as_ref(), path.into_inner()).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/moderation/reviews/{id}/approve",
    tag = "moderation",
    params(("id" = uuid::Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review restored and verified", body = Review),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn approve_review(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Moderator | Role::Admin);
    Ok(HttpResponse::Ok().json(moderation::approve_review(data.repo.as_ref(), path.into_inner()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/moderation/reviews/{id}",
    tag = "moderation",
    params(("id" = uuid::Uuid, Path, description = "Review id")),
    responses(
        (status = 204, description = "Reported review deleted"),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn dismiss_review(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Moderator | Role::Admin);
    moderation::dismiss_review(data.repo.as_ref(), auth.user_id()?, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/v1/moderation/categories",
    tag = "moderation",
    request_body = NewCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Blank or duplicate name"),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn create_category(auth: Auth, data: web::Data<AppState>, payload: web::Json<NewCategory>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Moderator | Role::Admin);
    let category = catalog::create_category(data.repo.as_ref(), &payload.name).await?;
    Ok(HttpResponse::Created().json(category))
}

#[utoipa::path(
    post,
    path = "/api/v1/moderation/profiles/{id}/reputation",
    tag = "moderation",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Recomputed reputation score"),
        (status = 403, description = "Moderators only")
    )
)]
pub async fn recompute_reputation(auth: Auth, data: web::Data<AppState>, path: web::Path<Id>) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Moderator | Role::Admin);
    let user_id = path.into_inner();
    let score = reputation::recompute(data.repo.as_ref(), user_id, data.reputation).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "user_id": user_id, "reputation_score": score })))
}

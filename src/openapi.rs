use crate::catalog::{MapPoint, SortOrder};
use crate::error::ApiErrorBody;
use crate::favorites::{ContactInfo, FavoriteState};
use crate::listings::ListingView;
use crate::models::{
    Category, GeoPoint, Listing, ListingKind, ListingStatus, NewCategory, NewListing, PriceItem, Profile, ProfileRole,
    Review, ReviewStatus, WorkingHours,
};
use crate::reviews::{ReviewSubmission, ReviewView, SubmittedReview};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_listings,
        crate::routes::list_hot_listings,
        crate::routes::list_map_listings,
        crate::routes::get_listing,
        crate::routes::create_listing,
        crate::routes::edit_listing,
        crate::routes::close_listing,
        crate::routes::delete_listing,
        crate::routes::list_reviews,
        crate::routes::submit_review,
        crate::routes::request_contact,
        crate::routes::toggle_favorite,
        crate::routes::list_favorites,
        crate::routes::report_review,
        crate::routes::delete_review,
        crate::routes::get_profile,
        crate::routes::list_profile_listings,
        crate::routes::update_my_profile,
        crate::routes::list_categories,
        crate::routes::moderation_listings,
        crate::routes::approve_listing,
        crate::routes::reject_listing,
        crate::routes::moderation_reviews,
        crate::routes::approve_review,
        crate::routes::dismiss_review,
        crate::routes::create_category,
        crate::routes::recompute_reputation,
    ),
    components(schemas(
        Listing, ListingKind, ListingStatus, NewListing, PriceItem, GeoPoint, WorkingHours, ListingView, SortOrder,
        MapPoint, Category, NewCategory,
        Review, ReviewStatus, ReviewSubmission, ReviewView, SubmittedReview,
        Profile, ProfileRole, crate::routes::ProfileInput,
        FavoriteState, ContactInfo, ApiErrorBody
    )),
    tags(
        (name = "listings", description = "Catalog and listing authoring"),
        (name = "reviews", description = "Buyer reviews and reputation"),
        (name = "profiles", description = "Seller and buyer profiles"),
        (name = "moderation", description = "Moderator queues"),
    )
)]
pub struct ApiDoc;

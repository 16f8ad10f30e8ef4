//! Filtering and sorting of already-fetched listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::geo::Near;
use crate::lifecycle;
use crate::models::{Category, Id, Listing, ListingKind};
use crate::repo::{CategoryRepo, RepoError};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Keep fetch order.
    #[default]
    Default,
    /// Lowest price first.
    Cheaper,
    /// Highest price first.
    Expensive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: Option<String>,
    /// Empty means every category.
    pub categories: Vec<Id>,
    pub price_from: Option<i64>,
    pub price_to: Option<i64>,
    pub sort: SortOrder,
}

/// Price of the first price item, digits only; 0 when absent or unparseable.
pub fn extract_price(listing: &Listing) -> i64 {
    listing
        .price_list
        .first()
        .map(|p| p.price.chars().filter(char::is_ascii_digit).collect::<String>())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0)
}

fn title_matches(listing: &Listing, search: Option<&str>) -> bool {
    match search.map(str::trim) {
        None | Some("") => true,
        Some(needle) => listing.title.to_lowercase().contains(&needle.to_lowercase()),
    }
}

impl FilterCriteria {
    pub fn matches(&self, listing: &Listing) -> bool {
        if !title_matches(listing, self.search.as_deref()) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&listing.category_id) {
            return false;
        }
        let price = extract_price(listing);
        self.price_from.map_or(true, |from| price >= from) && self.price_to.map_or(true, |to| price <= to)
    }
}

pub fn sort(listings: &mut [Listing], order: SortOrder) {
    match order {
        SortOrder::Default => {}
        SortOrder::Cheaper => listings.sort_by_key(extract_price),
        SortOrder::Expensive => listings.sort_by_key(|l| std::cmp::Reverse(extract_price(l))),
    }
}

/// Main feed: visible regular listings matching `criteria`.
pub fn feed(listings: Vec<Listing>, criteria: &FilterCriteria, now: DateTime<Utc>) -> Vec<Listing> {
    let mut out: Vec<Listing> = listings
        .into_iter()
        .filter(|l| l.kind == ListingKind::Regular && lifecycle::is_visible(l, now) && criteria.matches(l))
        .collect();
    sort(&mut out, criteria.sort);
    out
}

/// Visible hot listings whose title matches `search`, soonest expiry first.
/// With `near`, listings without a position are dropped too.
pub fn hot_feed(listings: Vec<Listing>, search: Option<&str>, near: Option<&Near>, now: DateTime<Utc>) -> Vec<Listing> {
    let mut out: Vec<Listing> = listings
        .into_iter()
        .filter(|l| l.kind == ListingKind::Hot && lifecycle::is_visible(l, now) && title_matches(l, search))
        .filter(|l| match near {
            None => true,
            Some(n) => l.geo_position.as_ref().is_some_and(|p| n.contains(p)),
        })
        .collect();
    out.sort_by_key(lifecycle::expiry);
    out
}

/// Map marker for one listing.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MapPoint {
    pub id: uuid::Uuid,
    pub title: String,
    pub kind: ListingKind,
    pub lat: f64,
    pub lon: f64,
}

/// Markers for everything a buyer could open right now, both kinds.
/// Listings without a usable position have no marker.
pub fn map_points(listings: Vec<Listing>, now: DateTime<Utc>) -> Vec<MapPoint> {
    listings
        .into_iter()
        .filter(|l| lifecycle::is_visible(l, now))
        .filter_map(|l| {
            let (lon, lat) = l.geo_position.as_ref()?.lon_lat()?;
            Some(MapPoint { id: l.id, title: l.title, kind: l.kind, lat, lon })
        })
        .collect()
}

pub async fn categories<R: CategoryRepo + ?Sized>(repo: &R) -> ServiceResult<Vec<Category>> {
    Ok(repo.list_categories().await?)
}

pub async fn create_category<R: CategoryRepo + ?Sized>(repo: &R, name: &str) -> ServiceResult<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::Invalid("category name must not be empty".into()));
    }
    match repo.create_category(name).await {
        Ok(c) => {
            info!(category_id = %c.id, name = %c.name, "category created");
            Ok(c)
        }
        Err(RepoError::Conflict) => Err(ServiceError::Invalid(format!("category {name:?} already exists"))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, ListingStatus, PriceItem};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn listing(title: &str, price: Option<&str>, kind: ListingKind, expires_in_min: Option<i64>) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            category_id: Uuid::nil(),
            price_list: price.map(|p| vec![PriceItem { name: None, price: p.into() }]).unwrap_or_default(),
            geo_position: None,
            working_hours: None,
            status: ListingStatus::Active,
            kind,
            expires_at: expires_in_min.map(|m| (now() + Duration::minutes(m)).to_rfc3339()),
            image_url: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn price_extraction() {
        assert_eq!(extract_price(&listing("a", Some("1 500 ₽"), ListingKind::Regular, None)), 1500);
        assert_eq!(extract_price(&listing("a", Some("free"), ListingKind::Regular, None)), 0);
        assert_eq!(extract_price(&listing("a", None, ListingKind::Regular, None)), 0);
    }

    #[test]
    fn feed_filters_and_sorts() {
        let items = vec![
            listing("Red bike", Some("300"), ListingKind::Regular, None),
            listing("Blue bike", Some("100"), ListingKind::Regular, None),
            listing("Bike repair", Some("50"), ListingKind::Hot, Some(30)),
            listing("Lamp", Some("200"), ListingKind::Regular, None),
        ];
        let criteria = FilterCriteria {
            search: Some("BIKE".into()),
            price_from: Some(100),
            sort: SortOrder::Cheaper,
            ..Default::default()
        };
        let titles: Vec<_> = feed(items.clone(), &criteria, now()).into_iter().map(|l| l.title).collect();
        assert_eq!(titles, ["Blue bike", "Red bike"]);

        let criteria = FilterCriteria { sort: SortOrder::Expensive, price_to: Some(250), ..Default::default() };
        let titles: Vec<_> = feed(items, &criteria, now()).into_iter().map(|l| l.title).collect();
        assert_eq!(titles, ["Lamp", "Blue bike"]);
    }

    #[test]
    fn category_filter() {
        let mut a = listing("a", None, ListingKind::Regular, None);
        let b = listing("b", None, ListingKind::Regular, None);
        let cat = Uuid::new_v4();
        a.category_id = cat;
        let criteria = FilterCriteria { categories: vec![cat], ..Default::default() };
        let out = feed(vec![a, b], &criteria, now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "a");
    }

    #[test]
    fn hot_feed_drops_expired_and_orders_by_expiry() {
        let items = vec![
            listing("later", None, ListingKind::Hot, Some(120)),
            listing("gone", None, ListingKind::Hot, Some(-1)),
            listing("soon", None, ListingKind::Hot, Some(5)),
            listing("regular", None, ListingKind::Regular, None),
        ];
        let titles: Vec<_> = hot_feed(items, None, None, now()).into_iter().map(|l| l.title).collect();
        assert_eq!(titles, ["soon", "later"]);
    }

    #[test]
    fn hot_feed_radius() {
        let mut close = listing("close", None, ListingKind::Hot, Some(30));
        close.geo_position = Some(GeoPoint::new(37.62, 55.75));
        let mut far = listing("far", None, ListingKind::Hot, Some(30));
        far.geo_position = Some(GeoPoint::new(30.33, 59.93));
        let nowhere = listing("nowhere", None, ListingKind::Hot, Some(30));
        let items = vec![close, far, nowhere];

        let near = Near { lon: 37.6, lat: 55.75, radius_km: 5.0 };
        let titles: Vec<_> = hot_feed(items.clone(), None, Some(&near), now()).into_iter().map(|l| l.title).collect();
        assert_eq!(titles, ["close"]);
        assert_eq!(hot_feed(items, None, None, now()).len(), 3);
    }

    #[test]
    fn map_points_need_coordinates() {
        let mut placed = listing("placed", None, ListingKind::Regular, None);
        placed.geo_position = Some(GeoPoint::new(37.62, 55.75));
        let mut expired = listing("expired", None, ListingKind::Hot, Some(-5));
        expired.geo_position = Some(GeoPoint::new(37.0, 55.0));
        let unplaced = listing("unplaced", None, ListingKind::Hot, Some(5));

        let points = map_points(vec![placed.clone(), expired, unplaced], now());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, placed.id);
        assert_eq!((points[0].lon, points[0].lat), (37.62, 55.75));
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type Id = Uuid;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` for the text-backed enums
/// stored by the backend.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self { $($ty::$variant => $text),+ }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

/// Moderation/lifecycle status persisted on a listing. `Check` is the
/// state a listing sits in until a moderator has looked at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Check,
    Active,
    Inactive,
    Rejected,
}
text_enum!(ListingStatus, "listing status", {
    Check => "check",
    Active => "active",
    Inactive => "inactive",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    /// Open-ended listing, never expires by time.
    Regular,
    /// Time-boxed listing with an `expires_at`.
    Hot,
}
text_enum!(ListingKind, "listing kind", {
    Regular => "regular",
    Hot => "hot",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Active,
    Reported,
}
text_enum!(ReviewStatus, "review status", {
    Active => "active",
    Reported => "reported",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    User,
    Moderator,
    Admin,
}
text_enum!(ProfileRole, "profile role", {
    User => "user",
    Moderator => "moderator",
    Admin => "admin",
});

/// GeoJSON point as exchanged with clients; `coordinates` is `[lon, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { kind: "Point".into(), coordinates: vec![lon, lat] }
    }

    /// `(lon, lat)` of a well-formed point in range, `None` otherwise.
    pub fn lon_lat(&self) -> Option<(f64, f64)> {
        if !self.kind.eq_ignore_ascii_case("point") {
            return None;
        }
        match *self.coordinates.as_slice() {
            [lon, lat] if (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat) => Some((lon, lat)),
            _ => None,
        }
    }
}

/// Opening hours of a regular listing, `start`/`end` as "HH:MM".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WorkingHours {
    /// Short weekday names; `None` means every day.
    #[serde(default)]
    pub days: Option<Vec<String>>,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceItem {
    pub name: Option<String>,
    /// Free text as typed by the seller, e.g. "1 500 ₽".
    pub price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub price_list: Vec<PriceItem>,
    pub geo_position: Option<GeoPoint>,
    pub working_hours: Option<WorkingHours>,
    pub status: ListingStatus,
    pub kind: ListingKind,
    /// RFC 3339 instant as written by the client. Kept as text: a value
    /// that fails to parse reads as "no expiry".
    pub expires_at: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing content as submitted by a seller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewListing {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Uuid,
    #[serde(default)]
    pub price_list: Vec<PriceItem>,
    #[serde(default)]
    pub geo_position: Option<GeoPoint>,
    /// Regular listings only.
    #[serde(default)]
    pub working_hours: Option<WorkingHours>,
    pub kind: ListingKind,
    /// Lifetime of a hot listing in minutes.
    pub duration_minutes: Option<i64>,
    pub image_url: Option<String>,
}

/// Fully resolved listing row handed to the store for insert/update.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub price_list: Vec<PriceItem>,
    pub geo_position: Option<GeoPoint>,
    pub working_hours: Option<WorkingHours>,
    pub status: ListingStatus,
    pub kind: ListingKind,
    pub expires_at: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub author_id: Uuid,
    pub rating: i32,
    pub text: Option<String>,
    pub status: ReviewStatus,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewReview {
    pub listing_id: Uuid,
    pub author_id: Uuid,
    pub rating: i32,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub geo_position: Option<GeoPoint>,
    pub reputation_score: i32,
    pub role: ProfileRole,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: ProfileRole,
}

/// Seller-editable profile fields; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub geo_position: Option<GeoPoint>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
}

/// A buyer asked for the seller's contact details.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

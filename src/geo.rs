use crate::models::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two `(lon, lat)` pairs.
pub fn distance_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let h = ((lat2 - lat1) / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Circle a hot-feed search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Near {
    pub lon: f64,
    pub lat: f64,
    pub radius_km: f64,
}

impl Near {
    /// A point without usable coordinates is never inside.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point
            .lon_lat()
            .map(|p| distance_km((self.lon, self.lat), p) <= self.radius_km)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_known_cities() {
        // Moscow to Saint Petersburg, roughly 634 km.
        let d = distance_km((37.6173, 55.7558), (30.3351, 59.9343));
        assert!((d - 634.0).abs() < 5.0, "{d}");
        assert_eq!(distance_km((10.0, 10.0), (10.0, 10.0)), 0.0);
    }

    #[test]
    fn near_contains() {
        let near = Near { lon: 37.6173, lat: 55.7558, radius_km: 10.0 };
        assert!(near.contains(&GeoPoint::new(37.65, 55.76)));
        assert!(!near.contains(&GeoPoint::new(30.3351, 59.9343)));
        assert!(!near.contains(&GeoPoint { kind: "Point".into(), coordinates: vec![] }));
    }
}

//! OSRM HTTP adapter for route estimates.

use serde::Deserialize;

use crate::model::{Coordinates, RouteEstimate, RouteSource};
use crate::traits::RouteEstimator;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, from: Coordinates, to: Coordinates) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            from.lng,
            from.lat,
            to.lng,
            to.lat
        )
    }
}

impl RouteEstimator for OsrmClient {
    fn estimate(&self, from: Coordinates, to: Coordinates) -> Option<RouteEstimate> {
        let response = self
            .client
            .get(self.route_url(from, to))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmRouteResponse>());

        match response {
            Ok(body) => body.into_estimate(),
            Err(err) => {
                tracing::warn!(error = %err, "OSRM route request failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

impl OsrmRouteResponse {
    fn into_estimate(self) -> Option<RouteEstimate> {
        if self.code != "Ok" {
            tracing::warn!(code = %self.code, "OSRM could not route");
            return None;
        }
        let route = self.routes.into_iter().next()?;
        Some(RouteEstimate {
            distance_km: route.distance / 1000.0,
            duration_minutes: route.duration / 60.0,
            source: RouteSource::Osrm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_url_uses_lng_lat_order() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://osrm.local/".to_string(),
            ..OsrmConfig::default()
        })
        .unwrap();
        let url = client.route_url(Coordinates::new(14.5, 121.0), Coordinates::new(14.6, 121.1));
        assert_eq!(
            url,
            "http://osrm.local/route/v1/car/121.000000,14.500000;121.100000,14.600000?overview=false"
        );
    }

    #[test]
    fn test_response_converted_to_km_and_minutes() {
        let body = OsrmRouteResponse {
            code: "Ok".to_string(),
            routes: vec![OsrmRoute {
                distance: 12_500.0,
                duration: 900.0,
            }],
        };
        let estimate = body.into_estimate().unwrap();
        assert_eq!(estimate.distance_km, 12.5);
        assert_eq!(estimate.duration_minutes, 15.0);
        assert_eq!(estimate.source, RouteSource::Osrm);
    }

    #[test]
    fn test_no_route_is_none() {
        let body = OsrmRouteResponse {
            code: "NoRoute".to_string(),
            routes: Vec::new(),
        };
        assert!(body.into_estimate().is_none());
    }

    #[test]
    fn test_unreachable_server_is_none() {
        let client = OsrmClient::new(OsrmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..OsrmConfig::default()
        })
        .unwrap();
        assert!(
            client
                .estimate(Coordinates::new(14.5, 121.0), Coordinates::new(14.6, 121.1))
                .is_none()
        );
    }
}

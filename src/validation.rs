//! Inbound booking request shape and validation.
//!
//! Everything here runs before any resource lookup. A request that passes
//! comes out as a [`ValidatedRequest`] with typed schedule and stops.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, MIN_LEAD_TIME_HOURS};
use crate::error::BookingError;
use crate::model::{ClientId, Contact, Coordinates, Stop, TruckId};

/// Pickup or dropoff as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRequest {
    pub location: Option<String>,
    #[serde(alias = "coords")]
    pub coordinates: Option<Coordinates>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
}

/// Booking request as submitted by the client application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub client_id: ClientId,
    #[serde(default)]
    pub truck_ids: Vec<TruckId>,
    /// Single-truck form of `truck_ids`.
    #[serde(default)]
    pub truck_id: Option<TruckId>,
    pub cargo_weight: Option<f64>,
    /// `YYYY-MM-DD`.
    pub scheduled_date: Option<String>,
    /// `HH:MM` or `HH:MM:SS`, UTC.
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub pickup: StopRequest,
    #[serde(default)]
    pub dropoff: StopRequest,
}

impl BookingRequest {
    /// Requested trucks, de-duplicated, in submission order.
    pub fn requested_trucks(&self) -> Vec<TruckId> {
        let mut trucks: Vec<TruckId> = Vec::new();
        for truck in self.truck_ids.iter().chain(self.truck_id.iter()) {
            if !truck.as_str().trim().is_empty() && !trucks.contains(truck) {
                trucks.push(truck.clone());
            }
        }
        trucks
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub client: ClientId,
    pub trucks: Vec<TruckId>,
    pub cargo_weight: f64,
    pub scheduled_at: DateTime<Utc>,
    pub pickup: Stop,
    pub dropoff: Stop,
}

pub fn validate_request(
    request: &BookingRequest,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<ValidatedRequest, BookingError> {
    let trucks = request.requested_trucks();

    let mut missing = Vec::new();
    if is_blank(Some(request.client_id.as_str())) {
        missing.push("clientId".to_string());
    }
    if trucks.is_empty() {
        missing.push("truckIds".to_string());
    }
    if request.cargo_weight.is_none() {
        missing.push("cargoWeight".to_string());
    }
    if is_blank(request.scheduled_date.as_deref()) {
        missing.push("scheduledDate".to_string());
    }
    if is_blank(request.scheduled_time.as_deref()) {
        missing.push("scheduledTime".to_string());
    }
    missing_stop_fields("pickup", &request.pickup, &mut missing);
    missing_stop_fields("dropoff", &request.dropoff, &mut missing);
    if !missing.is_empty() {
        return Err(BookingError::MissingFields { fields: missing });
    }

    let cargo_weight = request.cargo_weight.unwrap_or_default();
    if !cargo_weight.is_finite() || cargo_weight <= 0.0 {
        return Err(invalid("cargoWeight", "must be greater than zero"));
    }

    let scheduled_at = parse_schedule(
        request.scheduled_date.as_deref().unwrap_or_default(),
        request.scheduled_time.as_deref().unwrap_or_default(),
    )?;
    check_lead_time(scheduled_at, now)?;

    let pickup = validate_stop("pickup", &request.pickup, config)?;
    let dropoff = validate_stop("dropoff", &request.dropoff, config)?;

    Ok(ValidatedRequest {
        client: request.client_id.clone(),
        trucks,
        cargo_weight,
        scheduled_at,
        pickup,
        dropoff,
    })
}

/// Parse a `YYYY-MM-DD` date and `HH:MM[:SS]` time as UTC.
pub fn parse_schedule(date: &str, time: &str) -> Result<DateTime<Utc>, BookingError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|err| invalid("scheduledDate", &format!("expected YYYY-MM-DD ({err})")))?;
    let time = time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|err| invalid("scheduledTime", &format!("expected HH:MM ({err})")))?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}

/// Reject schedules less than [`MIN_LEAD_TIME_HOURS`] ahead of `now`.
pub fn check_lead_time(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), BookingError> {
    let ahead_secs = (scheduled_at - now).num_seconds();
    if ahead_secs < MIN_LEAD_TIME_HOURS * 3600 {
        return Err(BookingError::LeadTimeTooShort {
            hours_ahead: ahead_secs as f64 / 3600.0,
            required_hours: MIN_LEAD_TIME_HOURS,
        });
    }
    Ok(())
}

/// Validate one stop; missing coordinates fall back to the configured depot.
pub fn validate_stop(label: &str, stop: &StopRequest, config: &EngineConfig) -> Result<Stop, BookingError> {
    let mut missing = Vec::new();
    missing_stop_fields(label, stop, &mut missing);
    if !missing.is_empty() {
        return Err(BookingError::MissingFields { fields: missing });
    }

    let location = stop.location.as_deref().unwrap_or_default().trim().to_string();
    if location.chars().count() < config.min_location_len {
        return Err(invalid(
            &format!("{label}.location"),
            &format!("must be at least {} characters", config.min_location_len),
        ));
    }

    let coordinates = match stop.coordinates {
        Some(coords) if coords.is_valid() => coords,
        Some(_) => return Err(invalid(&format!("{label}.coordinates"), "latitude/longitude out of range")),
        None => {
            tracing::debug!(stop = label, "no coordinates supplied, using depot");
            config.depot
        }
    };

    Ok(Stop {
        location,
        coordinates,
        contact: Contact {
            name: stop.contact_name.as_deref().unwrap_or_default().trim().to_string(),
            phone: stop.contact_phone.as_deref().unwrap_or_default().trim().to_string(),
        },
    })
}

fn missing_stop_fields(label: &str, stop: &StopRequest, missing: &mut Vec<String>) {
    if is_blank(stop.location.as_deref()) {
        missing.push(format!("{label}.location"));
    }
    if is_blank(stop.contact_name.as_deref()) {
        missing.push(format!("{label}.contactName"));
    }
    if is_blank(stop.contact_phone.as_deref()) {
        missing.push(format!("{label}.contactPhone"));
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn invalid(field: &str, reason: &str) -> BookingError {
    BookingError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap()
    }

    fn stop(location: &str) -> StopRequest {
        StopRequest {
            location: Some(location.to_string()),
            coordinates: Some(Coordinates::new(36.1, -115.1)),
            contact_name: Some("Rosa".to_string()),
            contact_phone: Some("555-0101".to_string()),
        }
    }

    fn request() -> BookingRequest {
        BookingRequest {
            client_id: ClientId::new("c1"),
            truck_ids: vec![TruckId::new("t1")],
            truck_id: None,
            cargo_weight: Some(3.0),
            scheduled_date: Some("2026-04-03".to_string()),
            scheduled_time: Some("08:00".to_string()),
            pickup: stop("North Depot, Bay 4"),
            dropoff: stop("Central Market"),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let validated = validate_request(&request(), now(), &EngineConfig::default()).unwrap();
        assert_eq!(validated.trucks, vec![TruckId::new("t1")]);
        assert_eq!(validated.scheduled_at, Utc.with_ymd_and_hms(2026, 4, 3, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_fields_all_listed() {
        let mut req = request();
        req.cargo_weight = None;
        req.pickup.contact_phone = Some("  ".to_string());
        req.dropoff.location = None;
        let err = validate_request(&req, now(), &EngineConfig::default()).unwrap_err();
        match err {
            BookingError::MissingFields { fields } => {
                assert_eq!(fields, vec!["cargoWeight", "pickup.contactPhone", "dropoff.location"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ten_hours_ahead_is_too_short() {
        let mut req = request();
        let at = now() + Duration::hours(10);
        req.scheduled_date = Some(at.format("%Y-%m-%d").to_string());
        req.scheduled_time = Some(at.format("%H:%M").to_string());
        let err = validate_request(&req, now(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BookingError::LeadTimeTooShort { required_hours: 24, .. }));
    }

    #[test]
    fn test_lead_time_boundary() {
        assert!(check_lead_time(now() + Duration::hours(24), now()).is_ok());
        assert!(check_lead_time(now() + Duration::hours(24) - Duration::seconds(1), now()).is_err());
        assert!(check_lead_time(now() - Duration::hours(1), now()).is_err());
    }

    #[test]
    fn test_non_positive_cargo_rejected() {
        let mut req = request();
        req.cargo_weight = Some(0.0);
        let err = validate_request(&req, now(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BookingError::InvalidField { ref field, .. } if field == "cargoWeight"));
    }

    #[test]
    fn test_short_location_rejected() {
        let mut req = request();
        req.dropoff = stop("A1");
        let err = validate_request(&req, now(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BookingError::InvalidField { ref field, .. } if field == "dropoff.location"));
    }

    #[test]
    fn test_missing_coordinates_use_depot() {
        let config = EngineConfig::default();
        let mut req = request();
        req.pickup.coordinates = None;
        let validated = validate_request(&req, now(), &config).unwrap();
        assert_eq!(validated.pickup.coordinates, config.depot);
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let mut req = request();
        req.pickup.coordinates = Some(Coordinates::new(120.0, 10.0));
        assert!(validate_request(&req, now(), &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_malformed_time_rejected() {
        let mut req = request();
        req.scheduled_time = Some("8 o'clock".to_string());
        let err = validate_request(&req, now(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, BookingError::InvalidField { ref field, .. } if field == "scheduledTime"));
    }

    #[test]
    fn test_single_truck_form_merged() {
        let mut req = request();
        req.truck_ids = vec![TruckId::new("t1"), TruckId::new("t2"), TruckId::new("t1")];
        req.truck_id = Some(TruckId::new("t3"));
        let trucks: Vec<_> = req.requested_trucks().into_iter().map(|t| t.0).collect();
        assert_eq!(trucks, vec!["t1", "t2", "t3"]);
    }
}

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{CoreError, CoreResult};

// ============================================================================
// Reference enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub const ALL: [CabinClass; 4] = [
        CabinClass::Economy,
        CabinClass::PremiumEconomy,
        CabinClass::Business,
        CabinClass::First,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CabinClass::Economy => "Economy",
            CabinClass::PremiumEconomy => "Premium Economy",
            CabinClass::Business => "Business",
            CabinClass::First => "First",
        }
    }
}

impl FromStr for CabinClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        CabinClass::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown cabin class: {}", s.trim())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassengerType {
    Adult,
    Child,
    InfantWithoutSeat,
}

impl PassengerType {
    pub const ALL: [PassengerType; 3] = [
        PassengerType::Adult,
        PassengerType::Child,
        PassengerType::InfantWithoutSeat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PassengerType::Adult => "adult",
            PassengerType::Child => "child",
            PassengerType::InfantWithoutSeat => "infant_without_seat",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PassengerType::Adult => "Adult (18+)",
            PassengerType::Child => "Child (2-17)",
            PassengerType::InfantWithoutSeat => "Infant on lap (under 2)",
        }
    }
}

// ============================================================================
// Search input
// ============================================================================

/// Raw search input as posted by the browser. Every field is optional so that
/// a missing value surfaces as a validation error rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct SearchCriteria {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default, alias = "departureDate")]
    pub departure_date: Option<String>,
    #[serde(default, alias = "returnDate")]
    pub return_date: Option<String>,
    #[serde(default)]
    pub adults: Option<u32>,
    #[serde(default)]
    pub children: Option<u32>,
    #[serde(default)]
    pub infants: Option<u32>,
    #[serde(default, alias = "cabinClass")]
    pub cabin_class: Option<String>,
}

/// Upper bound the offers API accepts for a single request.
pub const MAX_PASSENGERS: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassengerCounts {
    pub adults: u32,
    pub children: u32,
    pub infants: u32,
}

impl PassengerCounts {
    pub fn total(&self) -> u32 {
        self.adults.saturating_add(self.children).saturating_add(self.infants)
    }

    /// One entry per traveller, adults first.
    pub fn passengers(&self) -> Vec<PassengerType> {
        std::iter::repeat(PassengerType::Adult)
            .take(self.adults as usize)
            .chain(std::iter::repeat(PassengerType::Child).take(self.children as usize))
            .chain(std::iter::repeat(PassengerType::InfantWithoutSeat).take(self.infants as usize))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
}

/// Search parameters that passed presence checks. Dates and codes are not
/// checked against a calendar or the real network; the offers API does that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightSearchParams {
    pub origin: String,
    pub destination: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub passengers: PassengerCounts,
    pub cabin_class: CabinClass,
}

impl FlightSearchParams {
    /// Outbound slice, plus the mirrored inbound slice for round trips.
    pub fn slices(&self) -> Vec<Slice> {
        let mut slices = vec![Slice {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            departure_date: self.departure_date.clone(),
        }];
        if let Some(return_date) = &self.return_date {
            slices.push(Slice {
                origin: self.destination.clone(),
                destination: self.origin.clone(),
                departure_date: return_date.clone(),
            });
        }
        slices
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl SearchCriteria {
    pub fn validate(self) -> CoreResult<FlightSearchParams> {
        let origin = present(self.origin);
        let destination = present(self.destination);
        let departure_date = present(self.departure_date);

        let missing: Vec<&str> = [
            ("origin", origin.is_none()),
            ("destination", destination.is_none()),
            ("departure_date", departure_date.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(origin), Some(destination), Some(departure_date)) = (origin, destination, departure_date) else {
            return Err(CoreError::ValidationError(format!(
                "Missing required search parameters: {}",
                missing.join(", ")
            )));
        };

        let passengers = PassengerCounts {
            adults: self.adults.unwrap_or(1),
            children: self.children.unwrap_or(0),
            infants: self.infants.unwrap_or(0),
        };
        if passengers.total() == 0 {
            return Err(CoreError::ValidationError("At least one passenger is required".to_string()));
        }
        if passengers.total() > MAX_PASSENGERS {
            return Err(CoreError::ValidationError(format!(
                "At most {MAX_PASSENGERS} passengers can be searched at once"
            )));
        }

        let cabin_class = match present(self.cabin_class) {
            Some(raw) => raw.parse()?,
            None => CabinClass::default(),
        };

        Ok(FlightSearchParams {
            origin: origin.to_uppercase(),
            destination: destination.to_uppercase(),
            departure_date,
            return_date: present(self.return_date),
            passengers,
            cabin_class,
        })
    }
}

// ============================================================================
// Offer polling
// ============================================================================

/// Upstream offer request; only the id is read, the rest is passed through.
#[derive(Debug, Clone, Deserialize)]
pub struct OfferRequest {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    #[serde(default)]
    pub offer_request_id: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferQuery {
    pub offer_request_id: String,
    pub sort: Option<String>,
    pub limit: Option<u32>,
    /// Opaque pagination cursor from a previous page's `meta.after`.
    pub after: Option<String>,
}

impl ResultsQuery {
    pub fn validate(self) -> CoreResult<OfferQuery> {
        let offer_request_id = present(self.offer_request_id)
            .ok_or_else(|| CoreError::ValidationError("offer_request_id is required".to_string()))?;

        Ok(OfferQuery {
            offer_request_id,
            sort: present(self.sort),
            limit: self.limit,
            after: present(self.after),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct OfferPage {
    pub offers: Vec<serde_json::Value>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Pending,
    Complete,
}

impl OfferPage {
    /// An empty page means the upstream is still collecting offers.
    pub fn status(&self) -> SearchStatus {
        if self.offers.is_empty() {
            SearchStatus::Pending
        } else {
            SearchStatus::Complete
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub status: SearchStatus,
    pub offers: Vec<serde_json::Value>,
    pub meta: PageMeta,
}

impl From<OfferPage> for SearchResults {
    fn from(page: OfferPage) -> Self {
        Self {
            status: page.status(),
            offers: page.offers,
            meta: page.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(json: &str) -> SearchCriteria {
        serde_json::from_str(json).expect("Failed to deserialize")
    }

    #[test]
    fn test_missing_fields_are_named() {
        let err = criteria(r#"{"origin": "JFK", "departure_date": "  "}"#).validate().unwrap_err();
        match err {
            CoreError::ValidationError(msg) => {
                assert_eq!(msg, "Missing required search parameters: destination, departure_date");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults_and_normalization() {
        let params = criteria(r#"{"origin": " jfk", "destination": "lhr", "departureDate": "2025-12-25"}"#)
            .validate()
            .unwrap();
        assert_eq!(params.origin, "JFK");
        assert_eq!(params.destination, "LHR");
        assert_eq!(params.passengers.adults, 1);
        assert_eq!(params.cabin_class, CabinClass::Economy);
        assert_eq!(params.slices().len(), 1);
    }

    #[test]
    fn test_round_trip_slices() {
        let params = criteria(
            r#"{"origin": "SFO", "destination": "NRT", "departure_date": "2025-03-01",
                "return_date": "2025-03-15", "adults": 2, "children": 1, "infants": 1,
                "cabin_class": "Premium Economy"}"#,
        )
        .validate()
        .unwrap();

        let slices = params.slices();
        assert_eq!(slices[1].origin, "NRT");
        assert_eq!(slices[1].destination, "SFO");
        assert_eq!(slices[1].departure_date, "2025-03-15");
        assert_eq!(params.cabin_class, CabinClass::PremiumEconomy);
        assert_eq!(
            params.passengers.passengers(),
            vec![
                PassengerType::Adult,
                PassengerType::Adult,
                PassengerType::Child,
                PassengerType::InfantWithoutSeat
            ]
        );
    }

    #[test]
    fn test_zero_passengers_rejected() {
        let err = criteria(r#"{"origin": "SFO", "destination": "LAX", "departure_date": "2025-01-01", "adults": 0}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn test_passenger_cap() {
        let nine = criteria(r#"{"origin": "SFO", "destination": "LAX", "departure_date": "2025-01-01",
            "adults": 5, "children": 3, "infants": 1}"#)
        .validate()
        .unwrap();
        assert_eq!(nine.passengers.total(), MAX_PASSENGERS);

        for body in [
            r#"{"origin": "SFO", "destination": "LAX", "departure_date": "2025-01-01", "adults": 10}"#,
            r#"{"origin": "SFO", "destination": "LAX", "departure_date": "2025-01-01", "adults": 50000000}"#,
            r#"{"origin": "SFO", "destination": "LAX", "departure_date": "2025-01-01", "adults": 4294967295, "children": 1}"#,
        ] {
            let err = criteria(body).validate().unwrap_err();
            assert!(matches!(err, CoreError::ValidationError(_)), "{body} should be rejected");
        }
    }

    #[test]
    fn test_total_saturates() {
        let counts = PassengerCounts {
            adults: u32::MAX,
            children: 1,
            infants: 1,
        };
        assert_eq!(counts.total(), u32::MAX);
    }

    #[test]
    fn test_unknown_cabin_class() {
        let err = "space".parse::<CabinClass>().unwrap_err();
        assert_eq!(err.message(), "Unknown cabin class: space");
    }

    #[test]
    fn test_results_query_requires_id() {
        assert!(ResultsQuery::default().validate().is_err());

        let query = ResultsQuery {
            offer_request_id: Some("orq_123".into()),
            sort: Some("total_amount".into()),
            limit: Some(20),
            after: Some(" ".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(query.offer_request_id, "orq_123");
        assert_eq!(query.after, None);
    }

    #[test]
    fn test_page_status() {
        let empty = OfferPage::default();
        assert_eq!(empty.status(), SearchStatus::Pending);

        let page = OfferPage {
            offers: vec![serde_json::json!({"id": "off_1"})],
            meta: PageMeta::default(),
        };
        let results = SearchResults::from(page);
        assert_eq!(results.status, SearchStatus::Complete);
        assert_eq!(serde_json::to_value(&results).unwrap()["status"], "complete");
    }
}

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use skyroute_core::search::{FlightSearchParams, OfferPage, OfferQuery, OfferRequest, PageMeta};
use skyroute_core::{CoreError, CoreResult, OfferProvider};
use skyroute_shared::Masked;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::app_config::DuffelConfig;

/// Thin client over the hosted flights API. Every response is relayed as-is;
/// there is no retry and no caching.
#[derive(Clone)]
pub struct DuffelClient {
    http: Client,
    base_url: String,
    access_token: Masked<String>,
    version: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    meta: Option<PageMeta>,
}

impl DuffelClient {
    pub fn new(config: &DuffelConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            version: config.version.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.access_token.expose())
            .header("Duffel-Version", &self.version)
            .header(header::ACCEPT, "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> CoreResult<Envelope<T>> {
        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::UpstreamError(format!("Flights API request failed: {e}")))?;
        read_envelope(response).await
    }
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> CoreResult<Envelope<T>> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| CoreError::UpstreamError(format!("Failed to read flights API response: {e}")))?;

    if !status.is_success() {
        let message = error_message(&body).unwrap_or_else(|| format!("Flights API returned {status}"));
        warn!("Flights API error {}: {}", status, message);
        return Err(CoreError::UpstreamError(message));
    }

    serde_json::from_str(&body)
        .map_err(|e| CoreError::UpstreamError(format!("Failed to parse flights API response: {e}")))
}

/// First `errors[].message` of an error body, if there is one.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("errors")?
        .as_array()?
        .iter()
        .find_map(|e| e.get("message").and_then(Value::as_str))
        .map(str::to_string)
}

/// Wire body for `POST /air/offer_requests`.
pub fn offer_request_payload(params: &FlightSearchParams) -> Value {
    let passengers: Vec<Value> = params
        .passengers
        .passengers()
        .into_iter()
        .map(|p| json!({ "type": p.as_str() }))
        .collect();

    json!({
        "data": {
            "slices": params.slices(),
            "passengers": passengers,
            "cabin_class": params.cabin_class.as_str(),
        }
    })
}

/// Query string for `GET /air/offers`.
pub fn offer_list_params(query: &OfferQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("offer_request_id", query.offer_request_id.clone())];
    if let Some(sort) = &query.sort {
        params.push(("sort", sort.clone()));
    }
    if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(after) = &query.after {
        params.push(("after", after.clone()));
    }
    params
}

#[async_trait]
impl OfferProvider for DuffelClient {
    async fn create_offer_request(&self, params: &FlightSearchParams) -> CoreResult<OfferRequest> {
        let builder = self
            .request(Method::POST, "/air/offer_requests")
            .query(&[("return_offers", "false")])
            .json(&offer_request_payload(params));

        let envelope: Envelope<OfferRequest> = self.send(builder).await?;
        info!(
            "Created offer request {} for {} -> {} ({} passengers)",
            envelope.data.id,
            params.origin,
            params.destination,
            params.passengers.total()
        );
        Ok(envelope.data)
    }

    async fn list_offers(&self, query: &OfferQuery) -> CoreResult<OfferPage> {
        let builder = self
            .request(Method::GET, "/air/offers")
            .query(&offer_list_params(query));

        let envelope: Envelope<Vec<Value>> = self.send(builder).await?;
        debug!("Offer request {} returned {} offers", query.offer_request_id, envelope.data.len());
        Ok(OfferPage {
            offers: envelope.data,
            meta: envelope.meta.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> CoreResult<Value> {
        let builder = self.request(Method::GET, "/air/airlines").query(&[("limit", "1")]);
        let envelope: Envelope<Value> = self.send(builder).await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyroute_core::search::SearchCriteria;

    fn params(json: &str) -> FlightSearchParams {
        serde_json::from_str::<SearchCriteria>(json).unwrap().validate().unwrap()
    }

    #[test]
    fn test_offer_request_payload() {
        let payload = offer_request_payload(&params(
            r#"{"origin": "LHR", "destination": "JFK", "departure_date": "2025-06-01",
                "return_date": "2025-06-10", "adults": 1, "infants": 1, "cabin_class": "business"}"#,
        ));

        let data = &payload["data"];
        assert_eq!(data["cabin_class"], "business");
        assert_eq!(data["slices"].as_array().unwrap().len(), 2);
        assert_eq!(data["slices"][0]["origin"], "LHR");
        assert_eq!(data["slices"][1]["origin"], "JFK");
        assert_eq!(
            data["passengers"],
            json!([{ "type": "adult" }, { "type": "infant_without_seat" }])
        );
    }

    #[test]
    fn test_offer_list_params_skip_absent() {
        let query = OfferQuery {
            offer_request_id: "orq_1".into(),
            sort: Some("total_amount".into()),
            limit: None,
            after: Some("g2wAAAACbQAAAA".into()),
        };
        let params = offer_list_params(&query);
        assert_eq!(
            params,
            vec![
                ("offer_request_id", "orq_1".to_string()),
                ("sort", "total_amount".to_string()),
                ("after", "g2wAAAACbQAAAA".to_string()),
            ]
        );
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"errors":[{"code":"invalid_auth_token","message":"The provided access token is not valid","title":"Invalid authentication"}]}"#;
        assert_eq!(error_message(body).as_deref(), Some("The provided access token is not valid"));
        assert_eq!(error_message("<html>bad gateway</html>"), None);
        assert_eq!(error_message(r#"{"errors":[]}"#), None);
    }

    #[test]
    fn test_envelope_with_meta() {
        let body = r#"{"data":[{"id":"off_1"}],"meta":{"limit":50,"after":"cursor","before":null}}"#;
        let envelope: Envelope<Vec<Value>> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.len(), 1);
        let meta = envelope.meta.unwrap();
        assert_eq!(meta.after.as_deref(), Some("cursor"));
        assert_eq!(meta.limit, Some(50));
    }
}

//! EPIAS transparency API client.
//!
//! Authentication is a one-shot CAS call that returns a `TGT-` ticket; every
//! data call is a single JSON POST carrying that ticket in the `TGT` header.
//! Nothing is retried and the ticket is never stored here: callers pass it to
//! each [`EpiasClient::execute`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::normalizer::{normalize_payload, NormalizeError};
use crate::period::{default_range, epias_datetime, MonthPeriod};
use crate::registry::{resolve, DatasetDescriptor, RequestKind};
use crate::table::NormalizedTable;

pub const TICKET_PREFIX: &str = "TGT-";
pub const TICKET_HEADER: &str = "TGT";
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const ERROR_BODY_LIMIT: usize = 500;

const TICKET_SERVICE: &str = "TGT service";
const API_SERVICE: &str = "EPIAS API";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error while {action}: {message}")]
    Network {
        action: &'static str,
        message: String,
    },
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("EPIAS response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("TGT response is invalid, check username/password and CAS URL: {body}")]
    InvalidTicket { body: String },
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),
    #[error("invalid request parameters: {0}")]
    InvalidParams(String),
    #[error("HTTP client build error: {0}")]
    HttpClientBuild(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Session credential issued by the CAS ticket service.
#[derive(Clone, PartialEq, Eq)]
pub struct Ticket(String);

impl Ticket {
    /// Trims the raw value and requires the `TGT-` prefix.
    pub fn parse(raw: &str) -> Result<Self, ClientError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.starts_with(TICKET_PREFIX) {
            return Err(ClientError::InvalidTicket {
                body: truncate_body(raw),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ticket(TGT-***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Outbound HTTP seam. Implementations perform exactly one request per call.
pub trait HttpTransport: Send + Sync {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpReply, TransportError>;
    fn post_json(&self, url: &str, ticket: &str, body: &Value) -> Result<HttpReply, TransportError>;
}

pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::HttpClientBuild(err.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "text/plain")
            .form(form)
            .send()
            .map_err(|err| TransportError(err.to_string()))?;
        reply_from(response)
    }

    fn post_json(&self, url: &str, ticket: &str, body: &Value) -> Result<HttpReply, TransportError> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(TICKET_HEADER, ticket)
            .json(body)
            .send()
            .map_err(|err| TransportError(err.to_string()))?;
        reply_from(response)
    }
}

fn reply_from(response: reqwest::blocking::Response) -> Result<HttpReply, TransportError> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|err| TransportError(err.to_string()))?;
    Ok(HttpReply { status, body })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period: Option<MonthPeriod>,
}

impl QueryParams {
    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            period: None,
        }
    }

    pub fn with_period(mut self, period: MonthPeriod) -> Self {
        self.period = Some(period);
        self
    }
}

/// Effective parameters for one request. A month label on a period dataset
/// fixes the range to that month; missing dates fall back to the last 30 days
/// and parameterless datasets use `today` for both ends.
pub fn plan_query(
    descriptor: &DatasetDescriptor,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    period: Option<&str>,
    today: NaiveDate,
) -> Result<QueryParams, ClientError> {
    match descriptor.request {
        RequestKind::NoParams => Ok(QueryParams::range(today, today)),
        RequestKind::Period => match period.map(str::trim).filter(|label| !label.is_empty()) {
            Some(label) => {
                let month = MonthPeriod::parse(label)
                    .map_err(|err| ClientError::InvalidParams(err.to_string()))?;
                Ok(QueryParams::range(month.first_day(), month.last_day()).with_period(month))
            }
            None => checked_range(start, end, today),
        },
        RequestKind::DateRange { .. } => checked_range(start, end, today),
    }
}

fn checked_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<QueryParams, ClientError> {
    let (default_start, default_end) = default_range(today);
    let params = QueryParams::range(start.unwrap_or(default_start), end.unwrap_or(default_end));
    if params.start > params.end {
        return Err(ClientError::InvalidParams(format!(
            "start date {} is after end date {}",
            params.start, params.end
        )));
    }
    Ok(params)
}

/// JSON body for one dataset request. Period datasets without an explicit
/// month use the month containing `start`.
pub fn build_request_body(
    descriptor: &DatasetDescriptor,
    params: &QueryParams,
) -> Result<Value, ClientError> {
    let mut body = Map::new();

    match descriptor.request {
        RequestKind::DateRange { extra } => {
            if params.start > params.end {
                return Err(ClientError::InvalidParams(format!(
                    "start date {} is after end date {}",
                    params.start, params.end
                )));
            }
            body.insert("startDate".to_string(), Value::String(epias_datetime(params.start)));
            body.insert("endDate".to_string(), Value::String(epias_datetime(params.end)));
            for (name, flag) in extra {
                body.insert((*name).to_string(), Value::Bool(*flag));
            }
        }
        RequestKind::Period => {
            let period = params
                .period
                .unwrap_or_else(|| MonthPeriod::containing(params.start));
            body.insert("period".to_string(), Value::String(period.epias_value()));
        }
        RequestKind::NoParams => {}
    }

    Ok(Value::Object(body))
}

#[derive(Clone)]
pub struct EpiasClient {
    base_url: String,
    cas_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl EpiasClient {
    /// Blocking reqwest transport with the fixed 30 s timeout.
    pub fn new(base_url: impl Into<String>, cas_url: impl Into<String>) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(HTTP_TIMEOUT)?;
        Ok(Self::with_transport(base_url, cas_url, Arc::new(transport)))
    }

    pub fn with_transport(
        base_url: impl Into<String>,
        cas_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            cas_url: cas_url.into(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn fetch_ticket(&self, username: &str, password: &str) -> Result<Ticket, ClientError> {
        info!(
            component = "client",
            event = "epias.ticket.request",
            cas_url = self.cas_url.as_str()
        );

        let result = self
            .transport
            .post_form(&self.cas_url, &[("username", username), ("password", password)])
            .map_err(|err| ClientError::Network {
                action: "fetching TGT",
                message: err.0,
            })
            .and_then(|reply| {
                if reply.status >= 400 {
                    return Err(ClientError::Status {
                        service: TICKET_SERVICE,
                        status: reply.status,
                        body: truncate_body(&reply.body),
                    });
                }
                Ticket::parse(&reply.body)
            });

        match &result {
            Ok(_) => info!(component = "client", event = "epias.ticket.ok"),
            Err(err) => warn!(
                component = "client",
                event = "epias.ticket.error",
                status = err.status(),
                error = %err
            ),
        }
        result
    }

    /// Looks the dataset up by name or key, then runs [`Self::execute`].
    pub fn execute_named(
        &self,
        dataset: &str,
        ticket: &Ticket,
        params: &QueryParams,
    ) -> Result<NormalizedTable, ClientError> {
        let descriptor =
            resolve(dataset).ok_or_else(|| ClientError::UnknownDataset(dataset.to_string()))?;
        self.execute(descriptor, ticket, params)
    }

    pub fn execute(
        &self,
        descriptor: &DatasetDescriptor,
        ticket: &Ticket,
        params: &QueryParams,
    ) -> Result<NormalizedTable, ClientError> {
        let body = build_request_body(descriptor, params)?;
        let url = self.endpoint_url(descriptor.path);
        info!(
            component = "client",
            event = "epias.query.start",
            dataset = descriptor.key(),
            url = url.as_str()
        );

        let result = self.post_and_normalize(descriptor, &url, ticket, &body);
        match &result {
            Ok(table) => info!(
                component = "client",
                event = "epias.query.finish",
                dataset = descriptor.key(),
                rows = table.len(),
                columns = table.columns.len()
            ),
            Err(err) => warn!(
                component = "client",
                event = "epias.query.error",
                dataset = descriptor.key(),
                status = err.status(),
                error = %err
            ),
        }
        result
    }

    fn post_and_normalize(
        &self,
        descriptor: &DatasetDescriptor,
        url: &str,
        ticket: &Ticket,
        body: &Value,
    ) -> Result<NormalizedTable, ClientError> {
        let reply = self
            .transport
            .post_json(url, ticket.as_str(), body)
            .map_err(|err| ClientError::Network {
                action: "calling EPIAS API",
                message: err.0,
            })?;

        if reply.status >= 400 {
            return Err(ClientError::Status {
                service: API_SERVICE,
                status: reply.status,
                body: truncate_body(&reply.body),
            });
        }

        let payload: Value = serde_json::from_str(&reply.body)
            .map_err(|err| ClientError::InvalidJson(err.to_string()))?;
        Ok(normalize_payload(&payload, &descriptor.table)?)
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockTransport {
        replies: Mutex<Vec<Result<HttpReply, TransportError>>>,
        json_calls: Mutex<Vec<(String, String, Value)>>,
    }

    impl MockTransport {
        fn replying(status: u16, body: &str) -> Self {
            let mock = Self::default();
            mock.replies.lock().unwrap().push(Ok(HttpReply {
                status,
                body: body.to_string(),
            }));
            mock
        }
    }

    impl HttpTransport for MockTransport {
        fn post_form(&self, _url: &str, _form: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
            self.replies.lock().unwrap().remove(0)
        }

        fn post_json(&self, url: &str, ticket: &str, body: &Value) -> Result<HttpReply, TransportError> {
            self.json_calls
                .lock()
                .unwrap()
                .push((url.to_string(), ticket.to_string(), body.clone()));
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn client(mock: Arc<MockTransport>) -> EpiasClient {
        EpiasClient::with_transport("https://api.test/natural-gas-service/", "https://cas.test/tickets", mock)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ticket() -> Ticket {
        Ticket::parse("TGT-abc").unwrap()
    }

    #[test]
    fn ticket_requires_prefix_and_is_trimmed() {
        assert_eq!(Ticket::parse("  TGT-123\n").unwrap().as_str(), "TGT-123");
        assert!(matches!(
            Ticket::parse("ST-123"),
            Err(ClientError::InvalidTicket { .. })
        ));
        assert!(Ticket::parse("   ").is_err());
        assert_eq!(format!("{:?}", ticket()), "Ticket(TGT-***)");
    }

    #[test]
    fn fetch_ticket_surfaces_status_and_truncated_body() {
        let long_body = "x".repeat(800);
        let mock = Arc::new(MockTransport::replying(401, &long_body));
        let err = client(mock).fetch_ticket("user", "pw").unwrap_err();

        assert_eq!(err.status(), Some(401));
        match err {
            ClientError::Status { body, .. } => assert_eq!(body.len(), ERROR_BODY_LIMIT),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn fetch_ticket_rejects_unexpected_body() {
        let mock = Arc::new(MockTransport::replying(201, "<html>login</html>"));
        let err = client(mock).fetch_ticket("user", "pw").unwrap_err();
        assert!(matches!(err, ClientError::InvalidTicket { .. }));
    }

    #[test]
    fn date_range_body_uses_epias_timestamps_and_static_flags() {
        let descriptor = resolve("GFM Daily Index Price").unwrap();
        let body =
            build_request_body(descriptor, &QueryParams::range(date(2024, 1, 1), date(2024, 1, 31)))
                .unwrap();
        assert_eq!(
            body,
            json!({
                "startDate": "2024-01-01T00:00:00+03:00",
                "endDate": "2024-01-31T00:00:00+03:00",
                "isTransactionPeriod": true
            })
        );
    }

    #[test]
    fn period_body_prefers_explicit_month() {
        let descriptor = resolve("System Balance").unwrap();
        let params = QueryParams::range(date(2024, 5, 20), date(2024, 5, 21));

        let derived = build_request_body(descriptor, &params).unwrap();
        assert_eq!(derived, json!({"period": "2024-05-01T00:00:00+03:00"}));

        let explicit = build_request_body(
            descriptor,
            &params.with_period(MonthPeriod::new(2023, 2).unwrap()),
        )
        .unwrap();
        assert_eq!(explicit, json!({"period": "2023-02-01T00:00:00+03:00"}));
    }

    #[test]
    fn no_param_body_is_empty_and_reversed_range_is_rejected() {
        let params = QueryParams::range(date(2024, 2, 1), date(2024, 1, 1));
        let participants = resolve("Natural Gas Market Participants").unwrap();
        assert_eq!(build_request_body(participants, &params).unwrap(), json!({}));

        let err = build_request_body(resolve("SGP Price").unwrap(), &params).unwrap_err();
        assert!(matches!(err, ClientError::InvalidParams(_)));
    }

    #[test]
    fn plan_query_applies_month_and_default_range() {
        let today = date(2024, 3, 15);

        let month = plan_query(resolve("bast").unwrap(), None, None, Some("February 2024"), today).unwrap();
        assert_eq!((month.start, month.end), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month.period, MonthPeriod::new(2024, 2));

        let defaulted = plan_query(resolve("SGP Price").unwrap(), None, None, None, today).unwrap();
        assert_eq!((defaulted.start, defaulted.end), (date(2024, 2, 14), today));

        let listing = plan_query(
            resolve("market-participant").unwrap(),
            Some(date(2020, 1, 1)),
            None,
            None,
            today,
        )
        .unwrap();
        assert_eq!((listing.start, listing.end), (today, today));

        let err = plan_query(resolve("bast").unwrap(), None, None, Some("Smarch"), today).unwrap_err();
        assert!(matches!(err, ClientError::InvalidParams(_)));
    }

    #[test]
    fn execute_posts_with_ticket_and_normalizes() {
        let mock = Arc::new(MockTransport::replying(
            200,
            r#"{"body":{"items":[{"gasDay":"2024-01-02T00:00:00+03:00","price":"10.5"},{"gasDay":"2024-01-01T00:00:00+03:00","price":"9"}]}}"#,
        ));
        let client = client(mock.clone());

        let table = client
            .execute_named(
                "SGP Price",
                &ticket(),
                &QueryParams::range(date(2024, 1, 1), date(2024, 1, 2)),
            )
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.first_date_column(), Some("gasDay"));
        let calls = mock.json_calls.lock().unwrap();
        assert_eq!(
            calls[0].0,
            "https://api.test/natural-gas-service/v1/markets/sgp/data/sgp-price"
        );
        assert_eq!(calls[0].1, "TGT-abc");
    }

    #[test]
    fn execute_maps_failures() {
        let params = QueryParams::range(date(2024, 1, 1), date(2024, 1, 2));

        let err = client(Arc::new(MockTransport::replying(500, "boom")))
            .execute_named("SGP Price", &ticket(), &params)
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("500"));

        let err = client(Arc::new(MockTransport::replying(200, "<html>")))
            .execute_named("SGP Price", &ticket(), &params)
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidJson(_)));

        let failing = MockTransport::default();
        failing
            .replies
            .lock()
            .unwrap()
            .push(Err(TransportError("connection refused".to_string())));
        let err = client(Arc::new(failing))
            .execute_named("SGP Price", &ticket(), &params)
            .unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));

        let err = client(Arc::new(MockTransport::default()))
            .execute_named("Nope", &ticket(), &params)
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownDataset(_)));
    }

    #[test]
    fn strict_dataset_missing_field_is_an_error() {
        let mock = Arc::new(MockTransport::replying(200, r#"[{"gasDay":"2024-01-01"}]"#));
        let err = client(mock)
            .execute_named(
                "SGP Total Trade Volume",
                &ticket(),
                &QueryParams::range(date(2024, 1, 1), date(2024, 1, 1)),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Normalize(NormalizeError::MissingRequiredFields { .. })
        ));
    }
}

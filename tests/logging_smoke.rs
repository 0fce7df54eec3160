use std::io;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::NaiveDate;
use natgas_dash::{
    dashboard_router, log_app_bind, log_app_start, log_config_loaded, normalize_payload, resolve,
    DashboardConfig, DashboardState, EpiasClient, EpiasConfig, HttpReply, HttpTransport,
    LoggingConfig, QueryParams, Ticket, TransportError, DEFAULT_BASE_URL, DEFAULT_CAS_URL,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use tracing::dispatcher::with_default;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriter;

const SECRET_TICKET: &str = "TGT-very-secret-ticket";
const SECRET_PASSWORD: &str = "hunter2-password";

#[derive(Clone, Default)]
struct SharedWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedWriter {
    fn output_string(&self) -> String {
        let bytes = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        String::from_utf8_lossy(&bytes).to_string()
    }
}

struct SharedWriterGuard {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self
            .inner
            .lock()
            .expect("writer lock should not be poisoned");
        out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(max_level: Level, f: impl FnOnce()) -> String {
    let writer = SharedWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_max_level(max_level)
        .with_writer(writer.clone())
        .finish();
    let dispatch = tracing::Dispatch::new(subscriber);

    with_default(&dispatch, f);
    writer.output_string()
}

fn events(logs: &str) -> Vec<Value> {
    logs.lines()
        .map(|line| serde_json::from_str(line).expect("each log line should be JSON"))
        .collect()
}

fn find_event<'a>(events: &'a [Value], name: &str) -> &'a Value {
    events
        .iter()
        .find(|event| event["fields"]["event"] == name)
        .unwrap_or_else(|| panic!("missing event {name}"))
}

struct StaticTransport(HttpReply);

impl HttpTransport for StaticTransport {
    fn post_form(&self, _url: &str, _form: &[(&str, &str)]) -> Result<HttpReply, TransportError> {
        Ok(self.0.clone())
    }

    fn post_json(&self, _url: &str, _ticket: &str, _body: &Value) -> Result<HttpReply, TransportError> {
        Ok(self.0.clone())
    }
}

fn client(status: u16, body: &str) -> EpiasClient {
    EpiasClient::with_transport(
        "http://epias.test",
        "http://cas.test",
        Arc::new(StaticTransport(HttpReply {
            status,
            body: body.to_string(),
        })),
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn query_events_carry_dataset_and_counts_but_not_the_ticket() {
    let logs = capture_logs(Level::INFO, || {
        let ticket = Ticket::parse(SECRET_TICKET).expect("ticket should parse");
        let table = client(
            200,
            r#"[{"gasDay":"2024-01-01","price":"1"},{"gasDay":"2024-01-02","price":"2"}]"#,
        )
        .execute_named(
            "SGP Price",
            &ticket,
            &QueryParams::range(date(2024, 1, 1), date(2024, 1, 2)),
        )
        .expect("query should succeed");
        assert_eq!(table.len(), 2);
    });

    let events = events(&logs);
    let start = find_event(&events, "epias.query.start");
    assert_eq!(start["fields"]["dataset"], "sgp-price");

    let finish = find_event(&events, "epias.query.finish");
    assert_eq!(finish["fields"]["component"], "client");
    assert_eq!(finish["fields"]["rows"], 2);
    assert_eq!(finish["fields"]["columns"], 2);
    assert!(!logs.contains(SECRET_TICKET));
}

#[test]
fn failed_query_logs_status_at_warn() {
    let logs = capture_logs(Level::INFO, || {
        let ticket = Ticket::parse(SECRET_TICKET).expect("ticket should parse");
        let err = client(503, "maintenance")
            .execute_named(
                "SGP Price",
                &ticket,
                &QueryParams::range(date(2024, 1, 1), date(2024, 1, 2)),
            )
            .expect_err("503 should fail");
        assert_eq!(err.status(), Some(503));
    });

    let events = events(&logs);
    let error = find_event(&events, "epias.query.error");
    assert_eq!(error["level"], "WARN");
    assert_eq!(error["fields"]["status"], 503);
    assert!(!logs.contains(SECRET_TICKET));
}

#[test]
fn ticket_events_never_include_credentials() {
    let logs = capture_logs(Level::INFO, || {
        let ticket = client(201, SECRET_TICKET)
            .fetch_ticket("analyst", SECRET_PASSWORD)
            .expect("ticket should be issued");
        assert_eq!(ticket.as_str(), SECRET_TICKET);

        client(401, "denied")
            .fetch_ticket("analyst", SECRET_PASSWORD)
            .expect_err("401 should fail");
    });

    assert!(logs.contains("\"event\":\"epias.ticket.request\""));
    assert!(logs.contains("\"event\":\"epias.ticket.ok\""));
    assert!(logs.contains("\"event\":\"epias.ticket.error\""));
    assert!(!logs.contains(SECRET_TICKET));
    assert!(!logs.contains(SECRET_PASSWORD));
}

#[test]
fn normalizer_events_report_date_column_and_strict_misses() {
    let logs = capture_logs(Level::DEBUG, || {
        let best_effort = resolve("SGP Price").expect("dataset exists");
        normalize_payload(
            &json!([{"gasDay": "2024-01-01"}, {"gasDay": "garbage"}]),
            &best_effort.table,
        )
        .expect("best-effort never fails");

        let strict = resolve("SGP Total Trade Volume").expect("dataset exists");
        normalize_payload(&json!([{"gasDay": "2024-01-01"}]), &strict.table)
            .expect_err("tradeVolume is required");
    });

    let events = events(&logs);
    let chosen = find_event(&events, "normalize.date_column");
    assert_eq!(chosen["fields"]["column"], "gasDay");
    assert_eq!(chosen["fields"]["dropped_rows"], 1);
    let missing = find_event(&events, "normalize.strict.missing");
    assert_eq!(missing["fields"]["missing"], "tradeVolume");
}

#[test]
fn server_lifecycle_helpers_emit_baseline_events() {
    let logs = capture_logs(Level::INFO, || {
        let cfg = LoggingConfig::default();
        log_app_start("dashboard_server", &cfg);
        log_config_loaded("dashboard_server", &DashboardConfig {
            epias: EpiasConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                cas_url: DEFAULT_CAS_URL.to_string(),
                username: Some("analyst".to_string()),
                password: Some(SECRET_PASSWORD.to_string()),
                ticket: Some(SECRET_TICKET.to_string()),
            },
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
        });
        log_app_bind("dashboard_server", SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080));
    });

    let events = events(&logs);
    assert_eq!(
        find_event(&events, "app.start")["fields"]["component"],
        "dashboard_server"
    );
    let loaded = find_event(&events, "config.loaded");
    assert_eq!(loaded["fields"]["credentials_configured"], true);
    assert_eq!(loaded["fields"]["ticket_configured"], true);
    assert_eq!(loaded["fields"]["dataset_count"], 41);
    let bind = find_event(&events, "app.bind");
    assert_eq!(bind["fields"]["component"], "dashboard_server");
    assert_eq!(bind["fields"]["url"], "http://127.0.0.1:8080/");
    assert!(!logs.contains(SECRET_PASSWORD));
    assert!(!logs.contains(SECRET_TICKET));
}

#[test]
fn query_route_emits_http_query_event() {
    let logs = capture_logs(Level::INFO, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("single-thread runtime should build");

        rt.block_on(async {
            let app = dashboard_router(DashboardState::new(client(200, "[]")));
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/api/query")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(
                            json!({"dataset": "sgp-price", "ticket": SECRET_TICKET}).to_string(),
                        ))
                        .expect("request should build"),
                )
                .await
                .expect("query request should succeed");

            assert_eq!(response.status(), StatusCode::OK);
        });
    });

    assert!(logs.contains("\"event\":\"http.query.request\""));
    assert!(!logs.contains(SECRET_TICKET));
}

//! Dashboard HTML page and JSON/CSV HTTP routes.
//!
//! The server keeps no session: the ticket travels in every request body and
//! each query runs one blocking EPIAS call on the blocking thread pool. The
//! query response carries the CSV of the fetched table, so a download never
//! goes back to EPIAS.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chart::render_line_chart_svg;
use crate::client::{plan_query, ClientError, EpiasClient, QueryParams, Ticket};
use crate::display::{build_display, infer_chart, value_column, ChartSeries, DisplayTable};
use crate::export::{csv_file_name, to_csv_string, ExportError};
use crate::period::{default_range, market_today, month_options, MonthPeriod};
use crate::registry::{all_datasets, resolve, DatasetDescriptor, Market, RequestKind};
use crate::table::NormalizedTable;

const MARKET_ORDER: [Market; 4] = [
    Market::SpotGas,
    Market::GasFuture,
    Market::GeneralData,
    Market::Transmission,
];

#[derive(Clone)]
pub struct DashboardState {
    client: EpiasClient,
    ticket_prefill: Option<String>,
}

impl DashboardState {
    pub fn new(client: EpiasClient) -> Self {
        Self {
            client,
            ticket_prefill: None,
        }
    }

    pub fn with_ticket_prefill(mut self, ticket: Option<String>) -> Self {
        self.ticket_prefill = ticket;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub key: &'static str,
    pub name: &'static str,
    pub label: &'static str,
    pub section: &'static str,
    pub market: &'static str,
    pub tab: &'static str,
    pub request: &'static str,
    pub strict: bool,
}

impl From<&DatasetDescriptor> for DatasetSummary {
    fn from(dataset: &DatasetDescriptor) -> Self {
        Self {
            key: dataset.key(),
            name: dataset.name,
            label: dataset.display_label(),
            section: dataset.market.section(),
            market: dataset.market.label(),
            tab: dataset.tab,
            request: request_kind_label(&dataset.request),
            strict: dataset.table.is_strict(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalogue {
    pub datasets: Vec<DatasetSummary>,
    pub months: Vec<String>,
    pub default_start: NaiveDate,
    pub default_end: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketResponse {
    pub ticket: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub dataset: String,
    #[serde(default)]
    pub ticket: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub period: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub dataset: String,
    pub rows: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub display: DisplayTable,
    pub chart: Option<ChartSeries>,
    pub chart_svg: Option<String>,
    pub csv_file_name: String,
    /// The fetched Normalized Table as CSV text.
    pub csv: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let status = match &err {
            ClientError::UnknownDataset(_) => StatusCode::NOT_FOUND,
            ClientError::InvalidParams(_) | ClientError::InvalidTicket { .. } => StatusCode::BAD_REQUEST,
            ClientError::HttpClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ClientError::Network { .. }
            | ClientError::Status { .. }
            | ClientError::InvalidJson(_)
            | ClientError::Normalize(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(get_dashboard_html))
        .route("/api/datasets", get(get_catalogue))
        .route("/api/ticket", post(post_ticket))
        .route("/api/query", post(post_query))
        .with_state(state)
}

pub fn catalogue(today: NaiveDate) -> Catalogue {
    let (default_start, default_end) = default_range(today);
    Catalogue {
        datasets: all_datasets().iter().map(DatasetSummary::from).collect(),
        months: month_options(today).iter().map(MonthPeriod::label).collect(),
        default_start,
        default_end,
    }
}

/// Builds the API response for one fetched table.
pub fn query_response(
    dataset: &DatasetDescriptor,
    params: &QueryParams,
    table: &NormalizedTable,
) -> Result<QueryResponse, ExportError> {
    let chart = infer_chart(table, &dataset.chart);
    let chart_svg = chart.as_ref().and_then(render_line_chart_svg);
    Ok(QueryResponse {
        dataset: dataset.name.to_string(),
        rows: table.len(),
        start: params.start,
        end: params.end,
        display: build_display(table, &dataset.display, value_column(table, &dataset.chart)),
        chart,
        chart_svg,
        csv_file_name: csv_file_name(dataset.name, params.start, params.end),
        csv: to_csv_string(table)?,
    })
}

pub fn render_dashboard_html(today: NaiveDate, ticket_prefill: Option<&str>) -> String {
    let (default_start, default_end) = default_range(today);
    let current_month = MonthPeriod::containing(today).label();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str("<title>Natural Gas Dashboard</title>\n");
    out.push_str("<style>:root{--bg:#f5f1e7;--bg2:#e9f0f2;--card:#ffffff;--ink:#182026;--muted:#5f6a73;--line:#d7dce1;--head:#14343f;--btn:#0c5f78;--btnhover:#094d61;--err:#a4262c}*{box-sizing:border-box}body{margin:0;color:var(--ink);font-family:\"Space Grotesk\",\"Avenir Next\",\"Segoe UI\",sans-serif;background:radial-gradient(circle at 10% 5%, #ffe7a3 0%, transparent 30%),radial-gradient(circle at 90% 0%, #b9e5f0 0%, transparent 28%),linear-gradient(160deg,var(--bg),var(--bg2));min-height:100vh}.shell{max-width:1500px;margin:0 auto;padding:24px 18px 28px}.hero{background:linear-gradient(135deg,#102f3a 0%,#24576b 100%);color:#f7fbfc;border-radius:16px;padding:18px 20px;box-shadow:0 10px 30px rgba(16,47,58,.25)}.hero h1{margin:0 0 8px;font-size:1.6rem}.hero-meta{display:flex;gap:16px;flex-wrap:wrap;font-size:.92rem;color:#dcebf0}.card{margin-top:16px;background:var(--card);border:1px solid #cbd4db;border-radius:16px;padding:14px 16px;box-shadow:0 12px 28px rgba(26,35,42,.12)}.controls{display:flex;gap:12px;flex-wrap:wrap;align-items:flex-end}label{display:flex;flex-direction:column;font-size:.78rem;color:var(--muted);gap:4px}input,select{font:inherit;padding:6px 8px;border:1px solid var(--line);border-radius:8px}button{background:linear-gradient(135deg,var(--btn),#0f7592);color:#fff;border:0;padding:8px 14px;border-radius:9px;font-weight:700;cursor:pointer}button:hover{background:var(--btnhover)}.status{margin-top:10px;font-size:.86rem}.status.error{color:var(--err)}.table-wrap{overflow:auto;max-height:65vh}table{width:100%;border-collapse:collapse}thead th{position:sticky;top:0;background:var(--head);color:#f2f7f9;font-size:.8rem;padding:9px 10px;text-align:left}tbody td{font-size:.84rem;padding:8px 10px;border-bottom:1px solid var(--line);white-space:nowrap}tbody tr:nth-child(even){background:#fafcfd}.chart{width:100%;height:auto}[hidden]{display:none!important}</style>\n");
    out.push_str("</head><body><main class=\"shell\">\n");
    out.push_str("<section class=\"hero\"><h1>Natural Gas Dashboard</h1><div class=\"hero-meta\">");
    out.push_str("<span>Natural Gas Market and Natural Gas Transmission datasets from EPIAS</span>");
    out.push_str(&format!("<span>Datasets: {}</span>", all_datasets().len()));
    out.push_str(&format!("<span>Market date: {}</span>", today.format("%Y-%m-%d")));
    out.push_str("</div></section>\n");

    out.push_str("<section class=\"card\"><div class=\"controls\">");
    out.push_str("<label>Username<input id=\"username\" autocomplete=\"username\"></label>");
    out.push_str("<label>Password<input id=\"password\" type=\"password\" autocomplete=\"current-password\"></label>");
    out.push_str("<button type=\"button\" id=\"ticket-btn\">Get TGT</button>");
    out.push_str("<label>TGT<input id=\"ticket\" size=\"48\" value=\"");
    out.push_str(&escape_html(ticket_prefill.unwrap_or("")));
    out.push_str("\"></label></div></section>\n");

    out.push_str("<section class=\"card\"><div class=\"controls\">");
    out.push_str("<label>Dataset<select id=\"dataset\">");
    for market in MARKET_ORDER {
        let mut tabs: Vec<&str> = Vec::new();
        for dataset in all_datasets().iter().filter(|d| d.market == market) {
            if !tabs.contains(&dataset.tab) {
                tabs.push(dataset.tab);
            }
        }
        for tab in tabs {
            let group = if tab == market.label() {
                market.label().to_string()
            } else {
                format!("{} / {}", market.label(), tab)
            };
            out.push_str(&format!("<optgroup label=\"{}\">", escape_html(&group)));
            for dataset in all_datasets()
                .iter()
                .filter(|d| d.market == market && d.tab == tab)
            {
                out.push_str(&format!(
                    "<option value=\"{}\" data-kind=\"{}\">{}</option>",
                    escape_html(dataset.key()),
                    request_kind_label(&dataset.request),
                    escape_html(dataset.display_label())
                ));
            }
            out.push_str("</optgroup>");
        }
    }
    out.push_str("</select></label>");

    out.push_str("<span id=\"dates-row\" class=\"controls\">");
    out.push_str(&format!(
        "<label>Start Date<input id=\"start\" type=\"date\" value=\"{}\"></label>",
        default_start.format("%Y-%m-%d")
    ));
    out.push_str(&format!(
        "<label>End Date<input id=\"end\" type=\"date\" value=\"{}\"></label>",
        default_end.format("%Y-%m-%d")
    ));
    out.push_str("</span>");

    out.push_str("<label id=\"period-row\" hidden>Period<select id=\"period\">");
    for month in month_options(today) {
        let label = month.label();
        let selected = if label == current_month { " selected" } else { "" };
        out.push_str(&format!(
            "<option{selected}>{}</option>",
            escape_html(&label)
        ));
    }
    out.push_str("</select></label>");

    out.push_str("<button type=\"button\" id=\"fetch-btn\">Fetch</button>");
    out.push_str("<button type=\"button\" id=\"export-btn\" disabled>Download CSV</button>");
    out.push_str("</div><div id=\"status\" class=\"status\">Select date range and click Fetch.</div></section>\n");

    out.push_str("<section class=\"card\" id=\"chart-card\" hidden><div id=\"chart\"></div></section>\n");
    out.push_str("<section class=\"card\" id=\"table-card\" hidden><div class=\"table-wrap\"><table id=\"data-table\"><thead></thead><tbody></tbody></table></div></section>\n");
    out.push_str("</main>\n");
    out.push_str(DASHBOARD_SCRIPT);
    out.push_str("</body></html>\n");
    out
}

const DASHBOARD_SCRIPT: &str = r##"<script>
const $ = (id) => document.getElementById(id);
const kind = () => $("dataset").selectedOptions[0].dataset.kind;
function status(message, isError) {
  $("status").textContent = message;
  $("status").className = isError ? "status error" : "status";
}
function syncKind() {
  $("period-row").hidden = kind() !== "period";
  $("dates-row").hidden = kind() !== "date_range";
}
function payload() {
  return {
    dataset: $("dataset").value,
    ticket: $("ticket").value,
    start: $("start").value || null,
    end: $("end").value || null,
    period: kind() === "period" ? $("period").value : null,
  };
}
async function post(path, body) {
  return fetch(path, {method: "POST", headers: {"Content-Type": "application/json"}, body: JSON.stringify(body)});
}
async function getTicket() {
  const res = await post("/api/ticket", {username: $("username").value, password: $("password").value});
  const body = await res.json();
  if (!res.ok) { status(body.error, true); return; }
  $("ticket").value = body.ticket;
  status("TGT acquired.", false);
}
function renderTable(display) {
  const head = document.createElement("tr");
  for (const name of display.columns) {
    const th = document.createElement("th");
    th.textContent = name;
    head.appendChild(th);
  }
  const thead = $("data-table").tHead;
  thead.replaceChildren(head);
  const tbody = $("data-table").tBodies[0];
  tbody.replaceChildren(...display.rows.map((row) => {
    const tr = document.createElement("tr");
    for (const value of row) {
      const td = document.createElement("td");
      td.textContent = value;
      tr.appendChild(td);
    }
    return tr;
  }));
}
let fetched = null;
async function runQuery() {
  if (!$("ticket").value.trim()) { status("TGT token is required.", true); return; }
  fetched = null;
  $("export-btn").disabled = true;
  status("Fetching data from EPIAS...", false);
  const res = await post("/api/query", payload());
  const body = await res.json();
  if (!res.ok) { status(body.error, true); return; }
  fetched = body.rows > 0 ? body : null;
  $("export-btn").disabled = fetched === null;
  $("chart-card").hidden = true;
  $("table-card").hidden = true;
  if (body.rows === 0) { status("No data returned for this date range.", false); return; }
  status("Rows: " + body.rows.toLocaleString(), false);
  if (body.chart_svg) {
    $("chart").innerHTML = body.chart_svg;
    $("chart-card").hidden = false;
  }
  renderTable(body.display);
  $("table-card").hidden = false;
}
function exportCsv() {
  if (!fetched) { return; }
  const link = document.createElement("a");
  link.href = URL.createObjectURL(new Blob([fetched.csv], {type: "text/csv;charset=utf-8"}));
  link.download = fetched.csv_file_name;
  link.click();
  URL.revokeObjectURL(link.href);
}
$("dataset").addEventListener("change", syncKind);
$("ticket-btn").addEventListener("click", getTicket);
$("fetch-btn").addEventListener("click", runQuery);
$("export-btn").addEventListener("click", exportCsv);
syncKind();
</script>
"##;

pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn request_kind_label(kind: &RequestKind) -> &'static str {
    match kind {
        RequestKind::DateRange { .. } => "date_range",
        RequestKind::Period => "period",
        RequestKind::NoParams => "none",
    }
}

async fn get_dashboard_html(State(state): State<DashboardState>) -> impl IntoResponse {
    Html(render_dashboard_html(
        market_today(),
        state.ticket_prefill.as_deref(),
    ))
}

async fn get_catalogue() -> impl IntoResponse {
    Json(catalogue(market_today()))
}

async fn post_ticket(
    State(state): State<DashboardState>,
    Json(request): Json<TicketRequest>,
) -> Result<Json<TicketResponse>, ApiError> {
    info!(component = "dashboard", event = "http.ticket.request");
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "username and password are required",
        ));
    }

    let client = state.client.clone();
    let ticket = tokio::task::spawn_blocking(move || {
        client.fetch_ticket(request.username.trim(), &request.password)
    })
    .await
    .map_err(|err| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))??;

    Ok(Json(TicketResponse {
        ticket: ticket.as_str().to_string(),
    }))
}

async fn post_query(
    State(state): State<DashboardState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    info!(
        component = "dashboard",
        event = "http.query.request",
        dataset = request.dataset.as_str()
    );
    let (dataset, params, table) = run_query(&state, request).await?;
    Ok(Json(query_response(dataset, &params, &table)?))
}

async fn run_query(
    state: &DashboardState,
    request: QueryRequest,
) -> Result<(&'static DatasetDescriptor, QueryParams, NormalizedTable), ApiError> {
    let dataset = resolve(&request.dataset)
        .ok_or_else(|| ClientError::UnknownDataset(request.dataset.clone()))?;
    if request.ticket.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "TGT token is required."));
    }
    let ticket = Ticket::parse(&request.ticket)?;
    let params = plan_query(
        dataset,
        request.start,
        request.end,
        request.period.as_deref(),
        market_today(),
    )?;

    let client = state.client.clone();
    let table = tokio::task::spawn_blocking(move || client.execute(dataset, &ticket, &params))
        .await
        .map_err(|err| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))??;

    Ok((dataset, params, table))
}

//! Natural-gas market dashboard core.
//!
//! - EPIAS ticket acquisition and dataset queries (blocking HTTP)
//! - Response normalization into typed tables
//! - Declarative dataset registry
//! - Display projection, SVG charts, CSV export
//! - axum dashboard routes

mod chart;
mod client;
mod config;
mod dashboard;
mod display;
mod export;
mod normalizer;
mod observability;
mod period;
mod registry;
mod table;

pub use chart::render_line_chart_svg;
pub use client::{
    build_request_body, plan_query, ClientError, EpiasClient, HttpReply, HttpTransport,
    QueryParams, ReqwestTransport, Ticket, TransportError, ERROR_BODY_LIMIT, HTTP_TIMEOUT,
    TICKET_HEADER, TICKET_PREFIX,
};
pub use config::{
    dashboard_config_from_env, epias_config_from_env, ConfigError, DashboardConfig, EpiasConfig,
    DEFAULT_BASE_URL, DEFAULT_CAS_URL, DEFAULT_DASHBOARD_ADDR,
};
pub use dashboard::{
    catalogue, dashboard_router, query_response, render_dashboard_html, ApiErrorBody, Catalogue,
    DashboardState, DatasetSummary, QueryRequest, QueryResponse, TicketRequest, TicketResponse,
};
pub use display::{
    build_display, detect_axes, format_thousands, infer_chart, value_column, ChartAxes, ChartRule,
    ChartSeries, ColumnMatcher, DisplaySchema, DisplayTable, FieldRule, PostProcess, Series,
};
pub use export::{
    csv_file_name, to_csv_bytes, to_csv_string, write_csv, write_csv_file, ExportError,
};
pub use normalizer::{
    build_table, coerce_columns, extract_records, normalize_payload, parse_date_text,
    parse_number, required_shape, Coercion, CoercionReport, FieldSpec, NormalizeError, Record,
    Strictness, TableSchema,
};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_config_loaded, logging_config_from_env,
    LogFormat, LoggingConfig, LoggingInitError,
};
pub use period::{
    default_range, epias_datetime, market_date_at, market_today, month_options,
    MonthPeriod, PeriodError,
};
pub use registry::{
    all_datasets, datasets_in_tab, resolve, DatasetDescriptor, Market, RequestKind, DATASETS,
};
pub use table::{Cell, Column, ColumnKind, NormalizedTable};

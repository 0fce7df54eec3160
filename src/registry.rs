//! Declarative dataset registry.
//!
//! Every dataset the dashboard can query is one [`DatasetDescriptor`] in
//! [`DATASETS`]: endpoint path, request shape, normalization schema, display
//! projection and chart rule. Lookups go through [`resolve`].

use serde::Serialize;

use crate::display::{ChartRule, ColumnMatcher, DisplaySchema, FieldRule, PostProcess};
use crate::normalizer::{Coercion, FieldSpec, TableSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Market {
    SpotGas,
    GasFuture,
    GeneralData,
    Transmission,
}

impl Market {
    pub fn label(self) -> &'static str {
        match self {
            Self::SpotGas => "Spot Gas Market",
            Self::GasFuture => "Gas Future Market",
            Self::GeneralData => "General Data",
            Self::Transmission => "Natural Gas Transmission",
        }
    }

    /// Top-level grouping: market datasets vs transmission-network datasets.
    pub fn section(self) -> &'static str {
        match self {
            Self::SpotGas | Self::GasFuture | Self::GeneralData => "Natural Gas Market",
            Self::Transmission => "Natural Gas Transmission",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `startDate`/`endDate` plus static boolean fields.
    DateRange { extra: &'static [(&'static str, bool)] },
    /// A single `period` field.
    Period,
    NoParams,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetDescriptor {
    pub name: &'static str,
    pub short_label: Option<&'static str>,
    pub market: Market,
    pub tab: &'static str,
    pub path: &'static str,
    pub request: RequestKind,
    pub table: TableSchema,
    pub display: DisplaySchema,
    pub chart: ChartRule,
}

impl DatasetDescriptor {
    const fn new(name: &'static str, market: Market, tab: &'static str, path: &'static str) -> Self {
        Self {
            name,
            short_label: None,
            market,
            tab,
            path,
            request: RequestKind::DateRange { extra: &[] },
            table: TableSchema::best_effort(DEFAULT_DATES),
            display: DisplaySchema::PASSTHROUGH,
            chart: ChartRule::Auto,
        }
    }

    /// Last path segment; unique across the registry.
    pub fn key(&self) -> &'static str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }

    pub fn display_label(&self) -> &'static str {
        self.short_label.unwrap_or(self.name)
    }

    pub fn takes_dates(&self) -> bool {
        matches!(self.request, RequestKind::DateRange { .. })
    }

    pub fn takes_period(&self) -> bool {
        self.request == RequestKind::Period
    }
}

const DEFAULT_DATES: &[&str] = &["gasDay", "date", "day"];
const FUTURES_DATES: &[&str] = &["transactionDate", "date", "day"];
const TRANSACTION_PERIOD: &[(&str, bool)] = &[("isTransactionPeriod", true)];

const GAS_DAY_NAMES: &[&str] = &["gasday", "gas_day", "date", "day"];
const EXACT_GAS_DAY: ColumnMatcher = ColumnMatcher::Exact(&["gasday"]);
const ANY_GAS_DAY: ColumnMatcher = ColumnMatcher::Exact(GAS_DAY_NAMES);
const TRANSACTION_DATE: ColumnMatcher = ColumnMatcher::ContainsAll(&["transaction", "date"]);
const CONTRACT_NAME: ColumnMatcher = ColumnMatcher::ContainsAll(&["contract", "name"]);

const fn rule(label: &'static str, matcher: ColumnMatcher) -> FieldRule {
    FieldRule { label, matcher }
}

const fn gas_day_and(label: &'static str, matcher: ColumnMatcher) -> [FieldRule; 2] {
    [rule("Gas Day", ANY_GAS_DAY), rule(label, matcher)]
}

const TOTAL_TRADE_VOLUME_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "gasDay",
        aliases: &[],
        coercion: Coercion::Date,
    },
    FieldSpec {
        name: "tradeVolume",
        aliases: &[],
        coercion: Coercion::Numeric,
    },
];

const MATCH_QUANTITY: &[FieldRule] = &[
    rule("Gas Day", EXACT_GAS_DAY),
    rule("Total Matching Quantity (x1000 Sm³)", ColumnMatcher::FirstNumeric),
];
const DRP_MATCH_QUANTITY: &[FieldRule] = &[
    rule("Gas Day", EXACT_GAS_DAY),
    rule("DRP Matched Quantity (x1000 Sm³)", ColumnMatcher::FirstNumeric),
];
const DAILY_MATCHED_QUANTITY: &[FieldRule] = &[
    rule("Contract", ColumnMatcher::ExactOrFirst(&["contract"])),
    rule("Day Ahead Matched Quantity (x1000 Sm³)", ColumnMatcher::FirstNumeric),
    rule("Intraday Matched Quantity (x1000 Sm³)", ColumnMatcher::FirstNumeric),
    rule("After Day Matched Quantity (x1000 Sm³)", ColumnMatcher::FirstNumeric),
    rule("Total (x1000 Sm³)", ColumnMatcher::FirstNumeric),
];
const TOTAL_TRADE_VOLUME: &[FieldRule] = &[
    rule("GasDay", EXACT_GAS_DAY),
    rule("Total Trading Volume (TL)", ColumnMatcher::Exact(&["tradevolume"])),
];
const DAILY_TRADE_VOLUME: &[FieldRule] = &[
    rule("Contract", ColumnMatcher::ExactOrFirst(&["contract"])),
    rule("Day Ahead Transaction Volume (TL)", ColumnMatcher::FirstNumeric),
    rule("Intraday Transaction Volume (TL)", ColumnMatcher::FirstNumeric),
    rule("Day after Transaction Volume (TL)", ColumnMatcher::FirstNumeric),
    rule("Total (TL)", ColumnMatcher::FirstNumeric),
];
const GRP_TRADE_VOLUME: &[FieldRule] = &[
    rule("Gas Day", EXACT_GAS_DAY),
    rule("DRP Trade Volume (TL)", ColumnMatcher::FirstNumeric),
];
const GREEN_CODE_OPERATION: &[FieldRule] = &[
    rule("Effected Gas Day", ColumnMatcher::Exact(&["gasday", "gas_day"])),
    rule("Transaction Date", TRANSACTION_DATE),
    rule("Related Contract", ColumnMatcher::ContainsAny(&["contract"])),
    rule("Transaction Quantity (x1000 Sm³)", ColumnMatcher::ContainsAny(&["quantity"])),
    rule("WAP (TL/1000Sm³)", ColumnMatcher::ContainsAny(&["wap", "weightedaverageprice"])),
];
const ADDITIONAL_NOTIFICATIONS: &[FieldRule] = &[
    rule("Date", ColumnMatcher::ContainsAny(&["date"])),
    rule("Topic", ColumnMatcher::ContainsAny(&["topic", "title"])),
    rule("Description", ColumnMatcher::ContainsAny(&["description", "detail"])),
];
const PHYSICAL_REALIZATION: &[FieldRule] = &[
    rule("Gas Day", ANY_GAS_DAY),
    rule("Physical Entry (Sm³)", ColumnMatcher::ContainsAny(&["entry"])),
    rule("Physical Exit (Sm³)", ColumnMatcher::ContainsAny(&["exit"])),
];
const VIRTUAL_REALIZATION: &[FieldRule] = &[
    rule("Gas Day", ANY_GAS_DAY),
    rule("Virtual Entry (Sm³)", ColumnMatcher::ContainsAny(&["entry"])),
    rule("Virtual Exit (Sm³)", ColumnMatcher::ContainsAny(&["exit"])),
];
const SYSTEM_BALANCE: &[FieldRule] = &gas_day_and("System Balance", ColumnMatcher::FirstUnclaimed);
const IMBALANCE_SYSTEM: &[FieldRule] =
    &gas_day_and("System Balance (stdm³)", ColumnMatcher::FirstUnclaimed);
const IMBALANCE_QUANTITIES: &[FieldRule] = &[
    rule("Gas Day", ANY_GAS_DAY),
    rule("Negative Imbalance Quantity (Sm³)", ColumnMatcher::ContainsAny(&["negative"])),
    rule("Positive Imbalance Quantity (Sm³)", ColumnMatcher::ContainsAny(&["positive"])),
];
const BAST: &[FieldRule] = &gas_day_and("BAST (TL)", ColumnMatcher::ContainsAny(&["bast"]));
const GDDK_AMOUNT: &[FieldRule] = &[
    rule("Period", ColumnMatcher::ContainsAny(&["period"])),
    rule("Version", ColumnMatcher::ContainsAny(&["version"])),
    rule("Retroactive Adjustment", ColumnMatcher::ContainsAny(&["adjust", "gddk"])),
    rule("Sum Recievable (TL)", ColumnMatcher::ContainsAny(&["receiv"])),
    rule("Retroactive Adjustment Sum Liability (TL)", ColumnMatcher::ContainsAny(&["liabil"])),
];
const TRANSACTION_HISTORY: &[FieldRule] = &[
    rule("Date", ColumnMatcher::ContainsAny(&["date", "day"])),
    rule("Hour", ColumnMatcher::ContainsAny(&["hour"])),
    rule("Contract", ColumnMatcher::ContainsAny(&["contract"])),
    rule("Price", ColumnMatcher::ContainsAny(&["price"])),
    rule("Matching Quantity", ColumnMatcher::ContainsAny(&["quantity", "match"])),
];

const GFM_DAILY_INDEX: &[FieldRule] = &[
    rule("Transaction Date", TRANSACTION_DATE),
    rule("Contract Name", CONTRACT_NAME),
    rule("DIP (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["dip", "tl"])),
    rule("DIP (USD/1000Sm³)", ColumnMatcher::ContainsAll(&["dip", "usd"])),
    rule("DIP (EUR/MWh)", ColumnMatcher::ContainsAll(&["dip", "eur"])),
];
const GFM_VOLUME: &[FieldRule] = &[
    rule("Transaction Date", TRANSACTION_DATE),
    rule("Contract Name", CONTRACT_NAME),
    rule("Trade Volume", ColumnMatcher::ContainsAny(&["volume"])),
];
const GFM_TRANSACTION_HISTORY: &[FieldRule] = &[
    rule("Transaction Date", TRANSACTION_DATE),
    rule("Transaction Hour", ColumnMatcher::ContainsAny(&["hour"])),
    rule("Contract Name", CONTRACT_NAME),
    rule("Matching Price (TL/1000Sm³)", ColumnMatcher::ContainsAny(&["price"])),
    rule("Matching Quantity (1000.Sm³)", ColumnMatcher::ContainsAny(&["quantity", "match"])),
];
const GFM_CONTRACT_PRICE_SUMMARY: &[FieldRule] = &[
    rule("Transaction Date", TRANSACTION_DATE),
    rule("Contract Code", ColumnMatcher::ContainsAll(&["contract", "code"])),
    rule("First Matching Price (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["first", "price"])),
    rule("Highest Matching Price (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["high", "price"])),
    rule("Lowest Matching Price (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["low", "price"])),
    rule("Last Matching Price (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["last", "price"])),
    rule("DIP (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["dip", "tl"])),
];
const GFM_OPEN_POSITION: &[FieldRule] = &[
    rule("Transaction Date", TRANSACTION_DATE),
    rule("Contract Name", CONTRACT_NAME),
    rule("Open Position Amount (1000.Sm³/day)", ColumnMatcher::ContainsAny(&["position"])),
];
const GFM_ORDER_PRICES: &[FieldRule] = &[
    rule("Contract Name", CONTRACT_NAME),
    rule("Delivery Period", ColumnMatcher::ContainsAll(&["delivery", "period"])),
    rule("Best Bid Price (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["best", "bid"])),
    rule("Best Offer Price (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["best", "offer"])),
    rule("Last Matching Price (TL/1000Sm³)", ColumnMatcher::ContainsAll(&["last", "match"])),
    rule("Change Rate by Last Match Price% %", ColumnMatcher::ContainsAll(&["change", "rate"])),
];

const MARKET_PARTICIPANTS: &[FieldRule] = &[
    rule("Organization Name", ColumnMatcher::ContainsAll(&["organization", "name"])),
    rule("SGM Participation", ColumnMatcher::ContainsAny(&["sgm", "sgp"])),
    rule("FGM Participation", ColumnMatcher::ContainsAny(&["fgm", "vgp"])),
    rule("Legal Entity Status", ColumnMatcher::ContainsAll(&["legal", "status"])),
];

const ENTRY_NOMINATION: &[FieldRule] =
    &gas_day_and("Gas Entry Amount (Sm³)", ColumnMatcher::ContainsAll(&["entry", "amount"]));
const EXIT_NOMINATION: &[FieldRule] =
    &gas_day_and("Gas Exit Amount (Sm³)", ColumnMatcher::ContainsAll(&["exit", "amount"]));
const TRANSFER: &[FieldRule] = &gas_day_and(
    "Transfer Quantity (Sm³)",
    ColumnMatcher::ContainsAll(&["transfer", "quantity"]),
);
const DAY_AHEAD: &[FieldRule] =
    &gas_day_and("Day Ahead Quantity (Sm³)", ColumnMatcher::ContainsAll(&["ahead", "quantity"]));
const DAY_END: &[FieldRule] =
    &gas_day_and("End Day Quantity (Sm³)", ColumnMatcher::ContainsAll(&["end", "quantity"]));
const MAX_ENTRY: &[FieldRule] =
    &gas_day_and("Maximum Entry Amount (Sm³)", ColumnMatcher::ContainsAll(&["max", "entry"]));
const MAX_EXIT: &[FieldRule] =
    &gas_day_and("Maximum Exit Amount (Sm³)", ColumnMatcher::ContainsAll(&["max", "exit"]));
const ENTRY_AMOUNT: &[FieldRule] =
    &gas_day_and("Entry Amount (Sm³)", ColumnMatcher::ContainsAll(&["entry", "amount"]));
const EXIT_AMOUNT: &[FieldRule] =
    &gas_day_and("Exit Amount (Sm³)", ColumnMatcher::ContainsAll(&["exit", "amount"]));
const STOCK_AMOUNT: &[FieldRule] =
    &gas_day_and("Stock Amount (stdm³)", ColumnMatcher::ContainsAll(&["stock", "amount"]));

const STORAGE_DATE: ColumnMatcher = ColumnMatcher::Exact(&["date", "gasday", "gas_day", "day"]);
const STORAGE_SERIES: &[FieldRule] = &[
    rule("Daily Injection Realization (Sm³)", ColumnMatcher::ContainsAny(&["injection"])),
    rule(
        "Daily Reproduction Realization (Sm³)",
        ColumnMatcher::ContainsAny(&["reproduction", "withdrawal"]),
    ),
];
const DAILY_ACTUALIZATION: &[FieldRule] = &[
    rule("Date", STORAGE_DATE),
    STORAGE_SERIES[0],
    STORAGE_SERIES[1],
];

const SGP: Market = Market::SpotGas;
const VGP: Market = Market::GasFuture;
const TRANSMISSION: Market = Market::Transmission;

const fn futures(name: &'static str, path: &'static str, display: &'static [FieldRule]) -> DatasetDescriptor {
    DatasetDescriptor {
        request: RequestKind::DateRange {
            extra: TRANSACTION_PERIOD,
        },
        table: TableSchema::best_effort(FUTURES_DATES),
        display: DisplaySchema::renaming(display),
        ..DatasetDescriptor::new(name, VGP, "Gas Future Market", path)
    }
}

const fn transmission(
    name: &'static str,
    tab: &'static str,
    path: &'static str,
    display: &'static [FieldRule],
) -> DatasetDescriptor {
    DatasetDescriptor {
        display: DisplaySchema::projected(display),
        ..DatasetDescriptor::new(name, TRANSMISSION, tab, path)
    }
}

pub static DATASETS: [DatasetDescriptor; 41] = [
    // Spot Gas Market / Price
    DatasetDescriptor::new(
        "SGP Daily Reference Price",
        SGP,
        "Price",
        "/v1/markets/sgp/data/daily-reference-price",
    ),
    DatasetDescriptor::new("SGP Price", SGP, "Price", "/v1/markets/sgp/data/sgp-price"),
    DatasetDescriptor::new(
        "SGP Balancing Gas Price",
        SGP,
        "Price",
        "/v1/markets/sgp/data/balancing-gas-price",
    ),
    DatasetDescriptor {
        table: TableSchema::best_effort(&["gasDay", "date", "day", "week"]),
        ..DatasetDescriptor::new(
            "SGP Weekly Ref Price",
            SGP,
            "Price",
            "/v1/markets/sgp/data/weekly-ref-price",
        )
    },
    // Matched Quantity
    DatasetDescriptor {
        display: DisplaySchema::renaming(MATCH_QUANTITY),
        ..DatasetDescriptor::new(
            "SGP Match Quantity",
            SGP,
            "Matched Quantity",
            "/v1/markets/sgp/data/match-quantity",
        )
    },
    DatasetDescriptor {
        display: DisplaySchema::renaming(DRP_MATCH_QUANTITY),
        ..DatasetDescriptor::new(
            "Matched Quantity for DRP",
            SGP,
            "Matched Quantity",
            "/v1/markets/sgp/data/grf-match-quantity",
        )
    },
    DatasetDescriptor {
        display: DisplaySchema::renaming(DAILY_MATCHED_QUANTITY),
        ..DatasetDescriptor::new(
            "SGP Daily Matched Quantity",
            SGP,
            "Matched Quantity",
            "/v1/markets/sgp/data/daily-matched-quantity",
        )
    },
    // Trade Volume
    DatasetDescriptor {
        table: TableSchema::strict(TOTAL_TRADE_VOLUME_FIELDS),
        display: DisplaySchema::renaming(TOTAL_TRADE_VOLUME),
        chart: ChartRule::Fixed {
            x: "gasDay",
            y: "tradeVolume",
            title: "Trade Volume (TL)",
        },
        ..DatasetDescriptor::new(
            "SGP Total Trade Volume",
            SGP,
            "Trade Volume",
            "/v1/markets/sgp/data/total-trade-volume",
        )
    },
    DatasetDescriptor {
        display: DisplaySchema::renaming(DAILY_TRADE_VOLUME),
        ..DatasetDescriptor::new(
            "SGP Daily Trade Volume",
            SGP,
            "Trade Volume",
            "/v1/markets/sgp/data/daily-trade-volume",
        )
    },
    DatasetDescriptor {
        display: DisplaySchema::renaming(GRP_TRADE_VOLUME),
        ..DatasetDescriptor::new(
            "GRP Trade Volume",
            SGP,
            "Trade Volume",
            "/v1/markets/sgp/data/grf-trade-volume",
        )
    },
    // TSO Balancing Transactions
    DatasetDescriptor {
        table: TableSchema::best_effort(&["gasDay", "transactionDate", "date", "day"]),
        display: DisplaySchema::with_fallback(GREEN_CODE_OPERATION),
        ..DatasetDescriptor::new(
            "1 Coded Transaction",
            SGP,
            "TSO Balancing Transactions",
            "/v1/markets/sgp/data/green-code-operation",
        )
    },
    DatasetDescriptor {
        table: TableSchema::dates_only(&["date", "notificationDate", "transactionDate", "gasDay", "day"]),
        display: DisplaySchema::with_fallback(ADDITIONAL_NOTIFICATIONS),
        ..DatasetDescriptor::new(
            "Announcement for TSO Transactions",
            SGP,
            "TSO Balancing Transactions",
            "/v1/markets/sgp/data/additional-notifications",
        )
    },
    // Allocation Data
    DatasetDescriptor {
        display: DisplaySchema::renaming(PHYSICAL_REALIZATION),
        ..DatasetDescriptor::new(
            "Physical Realization",
            SGP,
            "Allocation Data",
            "/v1/markets/sgp/data/physical-realization",
        )
    },
    DatasetDescriptor {
        request: RequestKind::Period,
        display: DisplaySchema::renaming(VIRTUAL_REALIZATION),
        ..DatasetDescriptor::new(
            "Virtual Realization",
            SGP,
            "Allocation Data",
            "/v1/markets/sgp/data/virtual-realization",
        )
    },
    DatasetDescriptor {
        request: RequestKind::Period,
        display: DisplaySchema::renaming(SYSTEM_BALANCE),
        ..DatasetDescriptor::new(
            "System Balance",
            SGP,
            "Allocation Data",
            "/v1/markets/sgp/data/system-direction",
        )
    },
    // Imbalance
    DatasetDescriptor {
        display: DisplaySchema::renaming(IMBALANCE_SYSTEM),
        ..DatasetDescriptor::new(
            "Imbalance System",
            SGP,
            "Imbalance",
            "/v1/markets/sgp/data/imbalance-system",
        )
    },
    DatasetDescriptor {
        request: RequestKind::Period,
        display: DisplaySchema::with_fallback(IMBALANCE_QUANTITIES),
        ..DatasetDescriptor::new(
            "SGP Imbalance Amount",
            SGP,
            "Imbalance",
            "/v1/markets/sgp/data/imbalance-amount",
        )
    },
    DatasetDescriptor {
        request: RequestKind::Period,
        display: DisplaySchema::with_fallback(IMBALANCE_QUANTITIES),
        ..DatasetDescriptor::new(
            "Shipper's Imbalance Quantity",
            SGP,
            "Imbalance",
            "/v1/markets/sgp/data/shippers-imbalance-quantity",
        )
    },
    DatasetDescriptor {
        request: RequestKind::Period,
        display: DisplaySchema::with_fallback(BAST),
        ..DatasetDescriptor::new(
            "Neutralization Item",
            SGP,
            "Neutralization Item",
            "/v1/markets/sgp/data/bast",
        )
    },
    DatasetDescriptor {
        request: RequestKind::Period,
        table: TableSchema::best_effort(&["period", "date", "day"]),
        display: DisplaySchema::with_fallback(GDDK_AMOUNT),
        ..DatasetDescriptor::new(
            "Retroactive Adjustment Item Amount",
            SGP,
            "Retroactive Adjustment Item Amount",
            "/v1/markets/sgp/data/gddk-amount",
        )
    },
    DatasetDescriptor {
        table: TableSchema::best_effort(&["date", "transactionDate", "gasDay", "day"]),
        display: DisplaySchema::with_fallback(TRANSACTION_HISTORY),
        ..DatasetDescriptor::new(
            "SGP Transaction History",
            SGP,
            "SGP Transaction History",
            "/v1/markets/sgp/data/transaction-history",
        )
    },
    // Gas Future Market
    futures("GFM Daily Index Price", "/v1/markets/vgp/data/ggf", GFM_DAILY_INDEX),
    futures(
        "GFM Trade Volume Natural Gas",
        "/v1/markets/vgp/data/vgp-volume",
        GFM_VOLUME,
    ),
    futures(
        "GFM Transaction History Natural Gas",
        "/v1/markets/vgp/data/vgp-transaction-history",
        GFM_TRANSACTION_HISTORY,
    ),
    futures(
        "GFM Contract Price Summary",
        "/v1/markets/vgp/data/contract-price-summary",
        GFM_CONTRACT_PRICE_SUMMARY,
    ),
    futures(
        "GFM Open Position (1000.Sm³/day)",
        "/v1/markets/vgp/data/open-position",
        GFM_OPEN_POSITION,
    ),
    DatasetDescriptor {
        request: RequestKind::DateRange { extra: &[] },
        ..futures(
            "GFM Order Prices",
            "/v1/markets/vgp/data/vgp-offer-price",
            GFM_ORDER_PRICES,
        )
    },
    // General Data
    DatasetDescriptor {
        request: RequestKind::NoParams,
        table: TableSchema::best_effort(&[]),
        display: DisplaySchema {
            fields: MARKET_PARTICIPANTS,
            fallback: true,
            keep_only: true,
            post: PostProcess::ParticipationFlags,
        },
        ..DatasetDescriptor::new(
            "Natural Gas Market Participants",
            Market::GeneralData,
            "General Data",
            "/v1/markets/general-data/data/market-participant",
        )
    },
    // Natural Gas Transmission
    DatasetDescriptor {
        display: DisplaySchema::with_fallback(ENTRY_NOMINATION),
        ..DatasetDescriptor::new(
            "Entry Nomination",
            TRANSMISSION,
            "Transport Nomination (TN)",
            "/v1/transmission/data/entry-nomination",
        )
    },
    DatasetDescriptor {
        display: DisplaySchema::with_fallback(EXIT_NOMINATION),
        ..DatasetDescriptor::new(
            "Exit Nomination",
            TRANSMISSION,
            "Transport Nomination (TN)",
            "/v1/transmission/data/exit-nomination",
        )
    },
    transmission("Transfer", "Virtual Trade", "/v1/transmission/data/transfer", TRANSFER),
    transmission(
        "Day Ahead (UDN)",
        "Virtual Trade",
        "/v1/transmission/data/day-ahead",
        DAY_AHEAD,
    ),
    transmission("Day End (UDN)", "Virtual Trade", "/v1/transmission/data/day-end", DAY_END),
    transmission(
        "Max Entry Amount",
        "Capacity",
        "/v1/transmission/data/max-entry-amount",
        MAX_ENTRY,
    ),
    transmission(
        "Max Exit Amount",
        "Capacity",
        "/v1/transmission/data/max-exit-amount",
        MAX_EXIT,
    ),
    transmission(
        "Entry Amount",
        "Reserve",
        "/v1/transmission/data/rezerve-entry-amount",
        ENTRY_AMOUNT,
    ),
    transmission(
        "Exit Amount",
        "Reserve",
        "/v1/transmission/data/rezerve-exit-amount",
        EXIT_AMOUNT,
    ),
    DatasetDescriptor {
        short_label: Some("Entry Amount"),
        ..transmission(
            "Actualization Entry Amount",
            "Actualization",
            "/v1/transmission/data/realization-entry-amount",
            ENTRY_AMOUNT,
        )
    },
    DatasetDescriptor {
        short_label: Some("Exit Amount"),
        ..transmission(
            "Actualization Exit Amount",
            "Actualization",
            "/v1/transmission/data/realization-exit-amount",
            EXIT_AMOUNT,
        )
    },
    transmission(
        "Stock Amount",
        "Stock Amount",
        "/v1/transmission/data/stock-amount",
        STOCK_AMOUNT,
    ),
    DatasetDescriptor {
        table: TableSchema::best_effort(&["date", "gasDay", "day"]),
        display: DisplaySchema::projected(DAILY_ACTUALIZATION),
        chart: ChartRule::Series {
            x: STORAGE_DATE,
            series: STORAGE_SERIES,
        },
        ..DatasetDescriptor::new(
            "Daily Actualization Amount",
            TRANSMISSION,
            "Storage",
            "/v1/transmission/data/daily-actualization-amount",
        )
    },
];

pub fn all_datasets() -> &'static [DatasetDescriptor] {
    &DATASETS
}

/// Looks a dataset up by its display name or key, ignoring ASCII case.
pub fn resolve(name: &str) -> Option<&'static DatasetDescriptor> {
    let wanted = name.trim();
    DATASETS.iter().find(|dataset| {
        dataset.name.eq_ignore_ascii_case(wanted) || dataset.key().eq_ignore_ascii_case(wanted)
    })
}

/// Datasets of one market tab, in registry order.
pub fn datasets_in_tab(market: Market, tab: &str) -> Vec<&'static DatasetDescriptor> {
    DATASETS
        .iter()
        .filter(|dataset| dataset.market == market && dataset.tab == tab)
        .collect()
}

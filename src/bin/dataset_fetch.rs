use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use natgas_dash::{
    all_datasets, csv_file_name, epias_config_from_env, init_logging, log_app_start,
    logging_config_from_env, market_today, plan_query, resolve, write_csv_file, EpiasClient,
    RequestKind, Ticket,
};

#[derive(Debug, Parser)]
#[command(name = "dataset_fetch")]
#[command(about = "Fetch EPIAS natural gas datasets to CSV", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the dataset catalogue grouped by section
    List,

    /// Fetch one dataset and write it as CSV.
    /// Ticket comes from EPIAS_TGT or EPIAS_USERNAME/EPIAS_PASSWORD.
    Fetch {
        /// Dataset name or key, e.g. "SGP Price" or sgp-price
        dataset: String,

        /// First day, YYYY-MM-DD (defaults to 30 days ago)
        start: Option<NaiveDate>,

        /// Last day, YYYY-MM-DD (defaults to today)
        end: Option<NaiveDate>,

        /// Month for period datasets, e.g. "March 2024"
        #[arg(long)]
        period: Option<String>,

        /// Output file (defaults to <dataset>_<start>_<end>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::List => print_catalogue(),
        Command::Fetch {
            dataset,
            start,
            end,
            period,
            out,
        } => {
            let logging_cfg = logging_config_from_env();
            init_logging(&logging_cfg)?;
            log_app_start("dataset_fetch", &logging_cfg);
            fetch(&dataset, start, end, period.as_deref(), out)?;
        }
    }

    Ok(())
}

fn fetch(
    name: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    period: Option<&str>,
    out: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = resolve(name).ok_or_else(|| format!("unknown dataset: {name}"))?;
    let params = plan_query(dataset, start, end, period, market_today())?;

    let cfg = epias_config_from_env();
    let client = EpiasClient::new(cfg.base_url.clone(), cfg.cas_url.clone())?;
    let ticket = match (&cfg.ticket, cfg.credentials()) {
        (Some(raw), _) => Ticket::parse(raw)?,
        (None, Some((username, password))) => client.fetch_ticket(username, password)?,
        (None, None) => {
            return Err("set EPIAS_TGT or EPIAS_USERNAME/EPIAS_PASSWORD".into());
        }
    };

    let table = client.execute(dataset, &ticket, &params)?;
    println!(
        "{}: {} rows, {} columns ({} to {})",
        dataset.name,
        table.len(),
        table.columns.len(),
        params.start,
        params.end
    );
    for column in &table.columns {
        println!("  {:<32} {:?}", column.name, column.kind);
    }

    let out =
        out.unwrap_or_else(|| PathBuf::from(csv_file_name(dataset.name, params.start, params.end)));
    write_csv_file(&table, &out)?;
    println!("wrote {}", out.display());

    Ok(())
}

fn print_catalogue() {
    let mut section = "";
    for dataset in all_datasets() {
        if dataset.market.section() != section {
            section = dataset.market.section();
            println!("{section}");
        }
        let kind = match dataset.request {
            RequestKind::DateRange { .. } => "range",
            RequestKind::Period => "period",
            RequestKind::NoParams => "none",
        };
        println!(
            "  {:<36} {:<7} {} / {}",
            dataset.key(),
            kind,
            dataset.market.label(),
            dataset.name
        );
    }
}

//! Binary entry point for the `flightdb` command-line tool.
#![forbid(unsafe_code)]

#[path = "cli/config.rs"]
mod config;
#[path = "cli/ui.rs"]
mod ui;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use flightdb::{
    admin::{stats, verify, StatsReport, VerifyLevel, VerifyReport, VerifySeverity},
    load::{load_source, LoadOptions, LoadReport, TableLoad},
    query::{Counts, Filter, QueryEngine, Value},
    report::{
        breakdown, headline_metrics, monthly_variation, nested_breakdown, route_legs,
        seat_occupancy, top_operators, AirportCoordinates, Coordinate, Headline, MonthlyChange,
        NestedBreakdown, OperatorShare, RouteLeg, SeatOccupancy,
    },
    schema::ensure_schema,
    source::{SourceTable, DEFAULT_DELIMITER},
    store::Store,
    views::{ensure_views, DETAILED_VIEW},
    FlightError,
};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, ConfigError};
use crate::ui::{format_duration, Theme, Tone, Ui};

const DEFAULT_DB: &str = "flights.db";

#[derive(Parser, Debug)]
#[command(
    name = "flightdb",
    version,
    about = "Load and query civil aviation movement statistics",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(long, global = true, value_name = "FILE", help = "SQLite database file")]
    db: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "Config file (defaults to $FLIGHTDB_CONFIG, then the user config dir)"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(long, global = true, value_enum, default_value_t = Theme::Auto)]
    theme: Theme,

    #[arg(long, global = true, help = "Suppress decorations and spinners")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the tables and reporting views without loading data.
    Init,
    /// Load a delimited extract; a second load of the same store is a no-op.
    Import(ImportCmd),
    /// Print matching rows of a table or view.
    Fetch(FetchCmd),
    /// Count matching rows, optionally per value of a column.
    Count(CountCmd),
    /// Sum numeric columns over matching rows.
    Sum(SumCmd),
    /// Average of one column, or of the per-row sum of several.
    Mean(MeanCmd),
    /// Sorted distinct values of a column.
    Distinct(DistinctCmd),
    /// Dashboard totals over the detailed view.
    Headline(FilterArgs),
    /// Monthly totals with month-over-month change.
    Monthly(FilterArgs),
    /// Events per value of one detailed-view column, optionally split by a second.
    Breakdown(BreakdownCmd),
    /// Operators ranked by departures.
    TopOperators(TopOperatorsCmd),
    /// Average occupied and offered seats per event.
    Occupancy(FilterArgs),
    /// Origin/destination pairs with coordinates.
    Routes(RoutesCmd),
    /// Row counts, views, load marker, and file sizes.
    Stats,
    /// Check relations and referential integrity.
    Verify(VerifyCmd),
}

#[derive(Args, Debug)]
struct ImportCmd {
    #[arg(value_name = "CSV")]
    source: PathBuf,

    #[arg(long, help = "Field delimiter (default ';')")]
    delimiter: Option<char>,

    #[arg(long, help = "Skip creating the reporting views")]
    no_views: bool,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(
        long = "filter",
        value_name = "COLUMN=VALUE",
        help = "Equality filter; repeat to AND"
    )]
    filters: Vec<String>,

    #[arg(
        long = "in",
        value_name = "COLUMN=V1,V2",
        help = "Membership filter; repeat to AND"
    )]
    in_lists: Vec<String>,

    #[arg(
        long = "where",
        value_name = "PREDICATE",
        help = "Raw SQL predicate; repeat to AND"
    )]
    predicates: Vec<String>,
}

#[derive(Args, Debug)]
struct FetchCmd {
    #[arg(value_name = "RELATION")]
    relation: String,

    #[arg(long, value_name = "col1,col2", help = "Columns to return (default all)")]
    columns: Option<String>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct CountCmd {
    #[arg(value_name = "RELATION")]
    relation: String,

    #[arg(long, value_name = "COLUMN")]
    group_by: Option<String>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct SumCmd {
    #[arg(value_name = "RELATION")]
    relation: String,

    #[arg(long, value_name = "col1,col2", help = "Columns summed per row")]
    fields: String,

    #[arg(long, value_name = "COLUMN")]
    group_by: Option<String>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct MeanCmd {
    #[arg(value_name = "RELATION")]
    relation: String,

    #[arg(
        long,
        value_name = "col1,col2",
        help = "One column, or several whose per-row sum is averaged"
    )]
    fields: String,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct DistinctCmd {
    #[arg(value_name = "RELATION")]
    relation: String,

    #[arg(value_name = "COLUMN")]
    field: String,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct BreakdownCmd {
    #[arg(value_name = "COLUMN")]
    field: String,

    #[arg(long, value_name = "COLUMN", help = "Split each group by a second column")]
    then: Option<String>,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct TopOperatorsCmd {
    #[arg(short = 'n', long, default_value_t = 5)]
    limit: usize,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct RoutesCmd {
    #[arg(
        long,
        value_name = "FILE",
        help = "CSV of code,lon,lat (defaults to [coordinates] path)"
    )]
    coordinates: Option<PathBuf>,

    #[arg(long, help = "Only print legs with both coordinates")]
    mappable: bool,

    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct VerifyCmd {
    #[arg(long, help = "Also run integrity_check and natural-key checks")]
    full: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Flight(#[from] FlightError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid filter '{0}': expected COLUMN=VALUE")]
    InvalidFilter(String),
    #[error("delimiter '{0}' must be a single ASCII character")]
    InvalidDelimiter(char),
    #[error("verification reported errors")]
    VerifyFailed,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.clone())?;
    init_tracing(&config);
    debug!(config = ?config.path(), "cli.config");

    let ui = Ui::new(cli.theme, cli.quiet);
    let db_path = cli
        .db
        .clone()
        .or_else(|| config.database_path().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));

    match &cli.command {
        Command::Init => {
            let store = Store::open(&db_path, config.store_options(true))?;
            let conn = store.connect()?;
            ensure_schema(&conn)?;
            let views = ensure_views(&conn)?;
            if cli.format == OutputFormat::Json {
                let out = serde_json::json!({
                    "db_path": db_path.display().to_string(),
                    "views": views,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                ui.say(Tone::Done, &format!("initialized {}", db_path.display()));
            }
        }
        Command::Import(cmd) => {
            let delimiter = match cmd.delimiter {
                Some(c) if c.is_ascii() => c as u8,
                Some(c) => return Err(CliError::InvalidDelimiter(c)),
                None => config.delimiter().unwrap_or(DEFAULT_DELIMITER),
            };
            let store = Store::open(&db_path, config.store_options(true))?;
            let spinner = ui.spinner(format!("loading {}", cmd.source.display()));
            let source = SourceTable::from_path(&cmd.source, delimiter)?;
            let opts = LoadOptions {
                create_views: !cmd.no_views,
                ..LoadOptions::default()
            };
            let report = load_source(&store, &source, opts)?;
            let elapsed = spinner.finish();
            emit(cli.format, &report, || {
                print_load_text(&ui, &report, &format_duration(elapsed))
            })?;
        }
        Command::Fetch(cmd) => {
            let engine = engine(&db_path, &config)?;
            let columns = cmd
                .columns
                .as_deref()
                .map(|c| split_list(c, ','))
                .unwrap_or_default();
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            let rows = engine.fetch_all(&cmd.relation, &columns, &cmd.filter.build()?)?;
            emit(cli.format, &rows, || ui.table(&rows))?;
        }
        Command::Count(cmd) => {
            let engine = engine(&db_path, &config)?;
            let counts = engine.count(
                &cmd.relation,
                &cmd.filter.build()?,
                cmd.group_by.as_deref(),
            )?;
            emit(cli.format, &counts, || print_counts_text(&ui, &counts))?;
        }
        Command::Sum(cmd) => {
            let engine = engine(&db_path, &config)?;
            let fields = split_list(&cmd.fields, ',');
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let filter = cmd.filter.build()?;
            match cmd.group_by.as_deref() {
                Some(group_by) => {
                    let groups = engine.grouped_sum(&cmd.relation, &fields, &filter, group_by)?;
                    let rows: Vec<(String, String)> = groups
                        .iter()
                        .map(|g| (display_key(&g.value), format_number(g.total)))
                        .collect();
                    emit(cli.format, &groups, || {
                        ui.fields(group_by, rows.iter().map(|(k, v)| (k.as_str(), v)))
                    })?;
                }
                None => {
                    let total = engine.sum(&cmd.relation, &fields, &filter)?;
                    emit(cli.format, &total, || println!("{}", format_number(total)))?;
                }
            }
        }
        Command::Mean(cmd) => {
            let engine = engine(&db_path, &config)?;
            let fields = split_list(&cmd.fields, ',');
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let filter = cmd.filter.build()?;
            let mean = match fields.as_slice() {
                [field] => engine.mean(&cmd.relation, field, &filter)?,
                _ => engine.mean_of_sum(&cmd.relation, &fields, &filter)?,
            };
            emit(cli.format, &mean, || match mean {
                Some(value) => println!("{}", format_number(value)),
                None => ui.say(Tone::Warn, "no matching rows"),
            })?;
        }
        Command::Distinct(cmd) => {
            let engine = engine(&db_path, &config)?;
            let values = engine.distinct(&cmd.relation, &cmd.field, &cmd.filter.build()?)?;
            emit(cli.format, &values, || {
                for value in &values {
                    println!("{value}");
                }
            })?;
        }
        Command::Headline(filter) => {
            let engine = engine(&db_path, &config)?;
            let headline = headline_metrics(&engine, &filter.build()?)?;
            emit(cli.format, &headline, || print_headline_text(&ui, &headline))?;
        }
        Command::Monthly(filter) => {
            let engine = engine(&db_path, &config)?;
            let months = monthly_variation(&engine, &filter.build()?)?;
            emit(cli.format, &months, || print_monthly_text(&ui, &months))?;
        }
        Command::Breakdown(cmd) => {
            let engine = engine(&db_path, &config)?;
            let filter = cmd.filter.build()?;
            match cmd.then.as_deref() {
                Some(inner) => {
                    let groups = nested_breakdown(&engine, &cmd.field, inner, &filter)?;
                    emit(cli.format, &groups, || print_nested_text(&ui, &groups))?;
                }
                None => {
                    let counts = breakdown(&engine, &cmd.field, &filter)?;
                    emit(cli.format, &counts, || print_counts_text(&ui, &counts))?;
                }
            }
        }
        Command::TopOperators(cmd) => {
            let engine = engine(&db_path, &config)?;
            let shares = top_operators(&engine, &cmd.filter.build()?, cmd.limit)?;
            emit(cli.format, &shares, || print_operators_text(&ui, &shares))?;
        }
        Command::Occupancy(filter) => {
            let engine = engine(&db_path, &config)?;
            let occupancy = seat_occupancy(&engine, &filter.build()?)?;
            emit(cli.format, &occupancy, || match &occupancy {
                Some(occupancy) => print_occupancy_text(&ui, occupancy),
                None => ui.say(Tone::Warn, "no matching events"),
            })?;
        }
        Command::Routes(cmd) => {
            let engine = engine(&db_path, &config)?;
            let coordinates = match cmd
                .coordinates
                .as_deref()
                .or_else(|| config.coordinates_path())
            {
                Some(path) => AirportCoordinates::from_path(path)?,
                None => AirportCoordinates::default(),
            };
            let mut legs = route_legs(&engine, &coordinates, &cmd.filter.build()?)?;
            if cmd.mappable {
                legs.retain(RouteLeg::is_mappable);
            }
            emit(cli.format, &legs, || print_routes_text(&legs))?;
        }
        Command::Stats => {
            let store = Store::open(&db_path, config.store_options(false))?;
            let report = stats(&store)?;
            emit(cli.format, &report, || print_stats_text(&ui, &report))?;
        }
        Command::Verify(cmd) => {
            let store = Store::open(&db_path, config.store_options(false))?;
            let level = if cmd.full {
                VerifyLevel::Full
            } else {
                VerifyLevel::Fast
            };
            let report = verify(&store, level)?;
            emit(cli.format, &report, || print_verify_text(&ui, &report))?;
            if !report.success {
                return Err(CliError::VerifyFailed);
            }
        }
    }
    Ok(())
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level().unwrap_or("warn")))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn engine(db_path: &Path, config: &CliConfig) -> Result<QueryEngine, CliError> {
    let store = Store::open(db_path, config.store_options(false))?;
    Ok(QueryEngine::new(store))
}

impl FilterArgs {
    /// AND of every `--filter`, `--in`, and `--where` given.
    fn build(&self) -> Result<Filter, CliError> {
        let mut filter = Filter::all();
        for pair in &self.filters {
            let (column, value) = split_pair(pair)?;
            filter = filter.and(Filter::eq(column, parse_value(value)));
        }
        for pair in &self.in_lists {
            let (column, values) = split_pair(pair)?;
            let values = split_list(values, ',');
            filter = filter.and(Filter::in_list(
                column,
                values.iter().map(|v| parse_value(v)),
            ));
        }
        Ok(filter.and(Filter::from_raw(self.predicates.iter().cloned())))
    }
}

fn split_pair(input: &str) -> Result<(&str, &str), CliError> {
    match input.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => Ok((column.trim(), value.trim())),
        _ => Err(CliError::InvalidFilter(input.to_string())),
    }
}

/// Integers stay integers so they compare numerically against INTEGER columns.
fn parse_value(input: &str) -> Value {
    input
        .parse::<i64>()
        .map(Value::Int)
        .unwrap_or_else(|_| Value::String(input.to_string()))
}

fn split_list(input: &str, delim: char) -> Vec<String> {
    input
        .split(delim)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn emit<T, F>(format: OutputFormat, value: &T, printer: F) -> Result<(), CliError>
where
    T: serde::Serialize,
    F: FnOnce(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn display_key(value: &Value) -> String {
    if value.is_null() {
        "(empty)".to_string()
    } else {
        value.to_string()
    }
}

fn describe_pass(pass: Option<TableLoad>) -> String {
    match pass {
        Some(TableLoad::Inserted(rows)) => format!("{rows} inserted"),
        Some(TableLoad::Skipped(rows)) => format!("skipped ({rows} present)"),
        None => "-".to_string(),
    }
}

fn print_load_text(ui: &Ui, report: &LoadReport, elapsed: &str) {
    if report.skipped {
        ui.say(
            Tone::Info,
            &format!(
                "load version {} already recorded; nothing written",
                report.version
            ),
        );
        return;
    }
    ui.fields(
        "Load",
        [
            ("source rows", report.source_rows.to_string()),
            ("empresas", describe_pass(report.operators)),
            ("aeroportos", describe_pass(report.airports)),
            ("voos", describe_pass(report.events)),
        ],
    );
    ui.say(Tone::Done, &format!("loaded in {elapsed}"));
}

fn print_counts_text(ui: &Ui, counts: &Counts) {
    match counts {
        Counts::Total(n) => println!("{n}"),
        Counts::Grouped(groups) => {
            let rows: Vec<(String, u64)> = groups
                .iter()
                .map(|g| (display_key(&g.value), g.count))
                .collect();
            ui.fields("Counts", rows.iter().map(|(k, n)| (k.as_str(), n)));
        }
    }
}

fn print_headline_text(ui: &Ui, headline: &Headline) {
    ui.fields(
        DETAILED_VIEW,
        [
            ("passengers", format_number(headline.passengers)),
            ("departures", format_number(headline.departures)),
            ("flight hours", format_number(headline.flight_hours)),
            ("fuel (l)", format_number(headline.fuel_litres)),
            ("distance (km)", format_number(headline.distance_km)),
            ("cargo (kg)", format_number(headline.cargo_kg)),
            ("mail (kg)", format_number(headline.mail_kg)),
            ("baggage (kg)", format_number(headline.baggage_kg)),
            (
                "passengers/departure",
                format_number(headline.passengers_per_departure),
            ),
            ("fuel/departure (l)", format_number(headline.fuel_per_departure)),
        ],
    );
}

fn print_monthly_text(ui: &Ui, months: &[MonthlyChange]) {
    ui.bullets(
        "Monthly",
        months.iter().map(|m| {
            format!(
                "{:>2}: passengers {} ({:+.1}%), departures {} ({:+.1}%), fuel {} ({:+.1}%), cargo {} ({:+.1}%)",
                m.month,
                format_number(m.passengers),
                m.passengers_pct,
                format_number(m.departures),
                m.departures_pct,
                format_number(m.fuel_litres),
                m.fuel_pct,
                format_number(m.cargo_kg),
                m.cargo_pct,
            )
        }),
    );
}

fn print_nested_text(ui: &Ui, groups: &[NestedBreakdown]) {
    for group in groups {
        let title = format!("{} ({})", display_key(&group.value), group.count);
        let rows: Vec<(String, u64)> = group
            .children
            .iter()
            .map(|child| (display_key(&child.value), child.count))
            .collect();
        ui.fields(&title, rows.iter().map(|(k, n)| (k.as_str(), n)));
    }
}

fn print_operators_text(ui: &Ui, shares: &[OperatorShare]) {
    let rows: Vec<(String, String)> = shares
        .iter()
        .map(|s| (s.operator.clone(), format_number(s.departures)))
        .collect();
    ui.fields("Departures", rows.iter().map(|(k, v)| (k.as_str(), v)));
}

fn print_occupancy_text(ui: &Ui, occupancy: &SeatOccupancy) {
    ui.fields(
        "Seats per event",
        [
            ("occupied", format_number(occupancy.occupied)),
            ("offered", format_number(occupancy.seats)),
            ("vacant", format_number(occupancy.vacant)),
        ],
    );
}

fn print_routes_text(legs: &[RouteLeg]) {
    let coord = |c: &Option<Coordinate>| match c {
        Some(c) => format!("({:.4}, {:.4})", c.lon, c.lat),
        None => "(?)".to_string(),
    };
    for leg in legs {
        println!(
            "{} {} {} -> {} {}",
            leg.month.map_or_else(|| "-".to_string(), |m| m.to_string()),
            leg.origin.code,
            coord(&leg.origin.coordinate),
            leg.destination.code,
            coord(&leg.destination.coordinate),
        );
    }
}

fn print_stats_text(ui: &Ui, report: &StatsReport) {
    ui.fields(
        "Tables",
        report.tables.iter().map(|t| {
            (
                t.name.as_str(),
                t.rows
                    .map_or_else(|| "missing".to_string(), |rows| rows.to_string()),
            )
        }),
    );
    ui.fields(
        "Views",
        report.views.iter().map(|v| {
            (
                v.name.as_str(),
                if v.exists { "present" } else { "missing" },
            )
        }),
    );
    ui.fields(
        "Load",
        [
            ("version", report.load.version.to_string()),
            (
                "loaded at",
                report
                    .load
                    .loaded_at
                    .clone()
                    .unwrap_or_else(|| "never".to_string()),
            ),
        ],
    );
    ui.fields(
        "Files",
        [
            (
                "database",
                format!(
                    "{} ({} bytes)",
                    report.filesystem.db_path, report.filesystem.db_size_bytes
                ),
            ),
            (
                "wal",
                format!(
                    "{} ({} bytes)",
                    report.filesystem.wal_path, report.filesystem.wal_size_bytes
                ),
            ),
        ],
    );
}

fn print_verify_text(ui: &Ui, report: &VerifyReport) {
    for finding in &report.findings {
        match finding.severity {
            VerifySeverity::Error => {
                ui.say(Tone::Warn, &format!("error: {}", finding.message))
            }
            VerifySeverity::Warning => ui.say(Tone::Warn, &finding.message),
        }
    }
    if report.success {
        ui.say(Tone::Done, &format!("verify ({:?}) passed", report.level));
    }
}

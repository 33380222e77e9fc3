//! `triage` command-line interface: prioritize a catalog for downlink,
//! inspect it, and apply manual updates.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use triage_catalog::{AsdpCatalog, CatalogError, MemoryCatalog};
use triage_core::{AsdpRecord, DownlinkState, MetadataValue};
use triage_planner::{DownlinkPlanner, SystemClock};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Downlink state names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StateArg {
    Untransmitted,
    Transmitted,
    Downlinked,
}

impl From<StateArg> for DownlinkState {
    fn from(state: StateArg) -> DownlinkState {
        match state {
            StateArg::Untransmitted => DownlinkState::Untransmitted,
            StateArg::Transmitted => DownlinkState::Transmitted,
            StateArg::Downlinked => DownlinkState::Downlinked,
        }
    }
}

/// Onboard downlink prioritization toolkit.
#[derive(Parser)]
#[command(name = "triage", version, about = "Onboard downlink prioritization toolkit")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce the recommended downlink order for a catalog
    Prioritize {
        /// Path to the catalog file
        catalog: PathBuf,
        /// Path to the rule configuration JSON
        rule_config: PathBuf,
        /// Path to the similarity configuration JSON
        similarity_config: PathBuf,
        /// Path the prioritized list is written to
        output_path: PathBuf,
        /// Processing time budget in seconds
        #[arg(long, default_value_t = 1e9)]
        max_time: f64,
    },

    /// List the data products in a catalog
    List {
        /// Path to the catalog file
        catalog: PathBuf,
    },

    /// Update one data product in place
    Update {
        /// Path to the catalog file
        catalog: PathBuf,
        /// Data product id
        id: i64,
        /// New science utility estimate
        #[arg(long)]
        sue: Option<f64>,
        /// New priority bin
        #[arg(long)]
        bin: Option<i64>,
        /// New downlink state
        #[arg(long, value_enum)]
        state: Option<StateArg>,
        /// Metadata field to overwrite (requires --value)
        #[arg(long, requires = "value")]
        field: Option<String>,
        /// New metadata value; parsed as integer, then float, then text
        #[arg(long, requires = "field")]
        value: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Prioritize {
            catalog,
            rule_config,
            similarity_config,
            output_path,
            max_time,
        } => cmd_prioritize(
            cli.output,
            &catalog,
            &rule_config,
            &similarity_config,
            &output_path,
            max_time,
        ),
        Commands::List { catalog } => cmd_list(cli.output, &catalog),
        Commands::Update {
            catalog,
            id,
            sue,
            bin,
            state,
            field,
            value,
        } => cmd_update(&catalog, id, sue, bin, state, field, value),
    };
    process::exit(code);
}

fn load_catalog(path: &Path) -> Result<MemoryCatalog, i32> {
    MemoryCatalog::load(path).map_err(|err| {
        error!("cannot open catalog {}: {}", path.display(), err);
        1
    })
}

fn cmd_prioritize(
    format: OutputFormat,
    catalog_path: &Path,
    rule_config: &Path,
    similarity_config: &Path,
    output_path: &Path,
    max_time: f64,
) -> i32 {
    let catalog = match load_catalog(catalog_path) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    let clock = SystemClock::new();
    let planner = DownlinkPlanner::new(&catalog, &clock);
    let ids = match planner.prioritize(Some(rule_config), Some(similarity_config), max_time) {
        Ok(ids) => ids,
        Err(err) => {
            error!("prioritization failed: {}", err);
            return err.exit_code();
        }
    };

    let rendered = match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for id in &ids {
                let _ = writeln!(out, "{}", id);
            }
            out
        }
        OutputFormat::Json => {
            let records: Result<Vec<serde_json::Value>, CatalogError> = ids
                .iter()
                .map(|id| catalog.get(*id).map(|record| record_json(&record)))
                .collect();
            match records {
                Ok(records) => {
                    let mut out = serde_json::to_string_pretty(&records)
                        .expect("JSON rendering cannot fail");
                    out.push('\n');
                    out
                }
                Err(err) => {
                    error!("cannot render prioritized list: {}", err);
                    return 1;
                }
            }
        }
    };

    if let Err(err) = fs::write(output_path, rendered) {
        error!("cannot write {}: {}", output_path.display(), err);
        return 1;
    }
    0
}

fn cmd_list(format: OutputFormat, catalog_path: &Path) -> i32 {
    let catalog = match load_catalog(catalog_path) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    match format {
        OutputFormat::Text => {
            for id in catalog.list_ids() {
                let record = catalog.get(id).expect("listed id exists");
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    record.id,
                    record.instrument_name,
                    record.asdp_type,
                    record.size,
                    record.science_utility_estimate,
                    record.priority_bin,
                    record.downlink_state.as_str(),
                );
            }
        }
        OutputFormat::Json => {
            let records: Vec<serde_json::Value> = catalog
                .list_ids()
                .into_iter()
                .map(|id| record_json(&catalog.get(id).expect("listed id exists")))
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&records).expect("JSON rendering cannot fail")
            );
        }
    }
    0
}

#[allow(clippy::too_many_arguments)]
fn cmd_update(
    catalog_path: &Path,
    id: i64,
    sue: Option<f64>,
    bin: Option<i64>,
    state: Option<StateArg>,
    field: Option<String>,
    value: Option<String>,
) -> i32 {
    let mut catalog = match load_catalog(catalog_path) {
        Ok(catalog) => catalog,
        Err(code) => return code,
    };

    let result = (|| -> Result<(), CatalogError> {
        if let Some(sue) = sue {
            catalog.update_science_utility(id, sue)?;
        }
        if let Some(bin) = bin {
            catalog.update_priority_bin(id, bin)?;
        }
        if let Some(state) = state {
            catalog.update_downlink_state(id, state.into())?;
        }
        if let (Some(field), Some(value)) = (field, value) {
            catalog.update_metadata(id, &field, parse_value(&value))?;
        }
        Ok(())
    })();

    if let Err(err) = result {
        error!("update failed: {}", err);
        return 1;
    }
    if let Err(err) = catalog.store(catalog_path) {
        error!("cannot write catalog {}: {}", catalog_path.display(), err);
        return 1;
    }
    0
}

/// Parse a command-line metadata value: integer, then float, then text.
fn parse_value(raw: &str) -> MetadataValue {
    if let Ok(int) = raw.parse::<i64>() {
        return MetadataValue::Int(int);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return MetadataValue::Float(float);
    }
    MetadataValue::Text(raw.to_string())
}

/// Render a record as a flat JSON object with plain metadata values.
fn record_json(record: &AsdpRecord) -> serde_json::Value {
    let metadata: serde_json::Map<String, serde_json::Value> = record
        .metadata
        .iter()
        .map(|(key, value)| {
            let json = match value {
                MetadataValue::Int(i) => serde_json::json!(i),
                MetadataValue::Float(f) => serde_json::json!(f),
                MetadataValue::Text(s) => serde_json::json!(s),
            };
            (key.clone(), json)
        })
        .collect();

    serde_json::json!({
        "id": record.id,
        "instrument_name": record.instrument_name,
        "type": record.asdp_type,
        "uri": record.uri,
        "size": record.size,
        "science_utility_estimate": record.science_utility_estimate,
        "priority_bin": record.priority_bin,
        "downlink_state": record.downlink_state.as_str(),
        "metadata": metadata,
    })
}

use std::io::Read;
use std::path::PathBuf;

use canopy::chart::ChartSpec;
use canopy::config::{Config, load_config, load_config_from_path};
use canopy::record::Record;
use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;

#[derive(Parser)]
#[command(
    name = "canopy",
    about = "Hierarchical chart layout generator: tabular records in, positioned treemap cells out"
)]
struct Cli {
    /// Input JSON file (array of objects); stdin if omitted
    input: Option<PathBuf>,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grouping fields, outermost first
    #[arg(long = "group-by", value_delimiter = ',', required = true)]
    group_by: Vec<String>,

    /// Numeric weight field
    #[arg(long, default_value = "value")]
    weight: String,

    /// Leaf label field
    #[arg(long)]
    label: Option<String>,

    /// Collapse threshold as a fraction of total weight
    #[arg(long)]
    threshold: Option<f64>,

    /// Layout width
    #[arg(long)]
    width: Option<f64>,

    /// Layout height
    #[arg(long)]
    height: Option<f64>,

    /// Padding between a branch and its children
    #[arg(long)]
    padding: Option<f64>,

    /// Output file; stdout if omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    let records = read_records(&cli)?;
    let spec = build_spec(&cli, &config);
    let cells = spec.compute(&records)?;

    let pretty = cli.pretty || config.output.pretty;
    let json = if pretty {
        serde_json::to_string_pretty(&cells)?
    } else {
        serde_json::to_string(&cells)?
    };
    match &cli.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

fn read_records(cli: &Cli) -> Result<Vec<Record>> {
    let raw = match &cli.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let values: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            Record::from_value(value)
                .ok_or_else(|| eyre!("input element {index} is not a JSON object"))
        })
        .collect()
}

fn build_spec(cli: &Cli, config: &Config) -> ChartSpec {
    let mut spec = ChartSpec::from_config(config);
    spec.group_by = cli.group_by.clone();
    spec.weight_field = cli.weight.clone();
    spec.label_field = cli.label.clone();
    if let Some(threshold) = cli.threshold {
        spec.threshold = (threshold > 0.0).then_some(threshold);
    }
    if let Some(width) = cli.width {
        spec.bounds.width = width;
    }
    if let Some(height) = cli.height {
        spec.bounds.height = height;
    }
    if let Some(padding) = cli.padding {
        spec.padding = padding;
    }
    spec
}

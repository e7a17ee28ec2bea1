use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use svgflat::{Options, flatten_svg_with_options};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "svgflat")]
#[command(about = "Bake SVG transforms and flatten groups", long_about = None)]
struct Cli {
    /// Input file (use - for stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output file (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Precision for baked coordinates (decimal places)
    #[arg(short, long, default_value = "6")]
    precision: u8,

    /// Leave the viewBox origin and document size as they are
    #[arg(long)]
    keep_viewbox_origin: bool,

    /// Omit the XML declaration
    #[arg(long)]
    no_xml_declaration: bool,

    /// Convert filled shapes to outlines with this stroke width
    #[arg(long, value_name = "WIDTH")]
    fill_to_stroke: Option<f64>,

    /// Print size comparison and a summary of what was flattened
    #[arg(short, long)]
    stats: bool,

    /// Log progress (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    // Read input
    let input = if cli.input.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&cli.input)?
    };

    let input_len = input.len();

    let options = Options {
        precision: cli.precision,
        normalize_viewbox: !cli.keep_viewbox_origin,
        xml_declaration: !cli.no_xml_declaration,
        fill_to_stroke: cli.fill_to_stroke,
    };

    let (output, report) = flatten_svg_with_options(&input, &options)?;
    let output_len = output.len();

    // Write output
    if cli.output.as_os_str() == "-" {
        io::stdout().write_all(output.as_bytes())?;
    } else {
        fs::write(&cli.output, &output)?;
    }

    if cli.stats {
        eprintln!("{} -> {} bytes", input_len, output_len);
        eprintln!("{}", report);
        for (color, count) in &report.colors {
            eprintln!("  {:>6}  {}", count, color);
        }
    }

    Ok(())
}

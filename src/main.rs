use anyhow::{Context, bail};
use clap::Parser;
use cutlist_packer::api::OptimizeResponse;
use cutlist_packer::config::{DEFAULT_MAX_INSTANCES, DEFAULT_SHEET_HEIGHT, DEFAULT_SHEET_WIDTH};
use cutlist_packer::render;
use cutlist_packer::{PackingEngine, PackingResult, PieceRequest, Rect};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cutlist_packer",
    about = "Pack rectangular cut pieces onto fixed-size sheets"
)]
struct Cli {
    /// Sheet dimensions (WxH, e.g. 2050x3050)
    #[arg(long, default_value_t = default_sheet())]
    sheet: String,

    /// Cut pieces as WxH:qty (e.g. 800x600:3 400.5x300:5)
    #[arg(long = "cuts", num_args = 1.., required = true)]
    cuts: Vec<String>,

    /// Reject jobs with more expanded pieces than this
    #[arg(long, default_value_t = DEFAULT_MAX_INSTANCES)]
    max_pieces: usize,

    /// Show ASCII layout of each sheet
    #[arg(long)]
    layout: bool,

    /// Print the result as JSON instead of text
    #[arg(long, conflicts_with = "layout")]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_sheet() -> String {
    format!("{DEFAULT_SHEET_WIDTH}x{DEFAULT_SHEET_HEIGHT}")
}

fn parse_dimensions(s: &str) -> anyhow::Result<Rect> {
    let Some((w, h)) = s.split_once('x') else {
        bail!("invalid dimensions '{s}', expected WxH");
    };
    let width = w
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid width in '{s}'"))?;
    let height = h
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid height in '{s}'"))?;
    Ok(Rect::new(width, height))
}

fn parse_cut(index: usize, s: &str) -> anyhow::Result<PieceRequest> {
    let Some((dims, qty)) = s.split_once(':') else {
        bail!("invalid cut '{s}', expected WxH:qty");
    };
    let rect = parse_dimensions(dims)?;
    let qty = qty
        .trim()
        .parse::<i64>()
        .with_context(|| format!("invalid quantity in '{s}'"))?;
    Ok(PieceRequest::from_raw(index, rect.width, rect.height, qty)?)
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn summary_line(result: &PackingResult) -> String {
    format!(
        "Summary: {} sheet{} used, {} piece{}, {:.2}% utilization, {:.2}% waste",
        result.sheet_count(),
        plural(result.sheet_count()),
        result.piece_count(),
        plural(result.piece_count()),
        result.utilization_percent(),
        result.waste_percent(),
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let sheet = parse_dimensions(&cli.sheet)?;
    let requests = cli
        .cuts
        .iter()
        .enumerate()
        .map(|(i, c)| parse_cut(i, c))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let result = PackingEngine::new(sheet, requests)
        .with_max_instances(cli.max_pieces)
        .pack()
        .context("cannot pack cut list")?;

    if cli.json {
        let response = OptimizeResponse::from(&result);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    for (i, layout) in result.sheets.iter().enumerate() {
        println!(
            "Sheet {} ({:.1}% used):",
            i + 1,
            layout.utilization_percent()
        );
        for p in &layout.placements {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("  {} @ ({}, {}){}", p.footprint(), p.x, p.y, rot);
        }
        if cli.layout {
            print!("{}", render::render_sheet(layout));
        }
        println!();
    }

    if !result.unplaceable.is_empty() {
        println!("Unplaceable (larger than {} sheet):", sheet);
        for u in &result.unplaceable {
            println!("  {}x{} (cut #{})", u.width, u.height, u.request_index + 1);
        }
        println!();
    }

    println!("{}", summary_line(&result));

    Ok(())
}

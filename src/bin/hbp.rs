use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use hbp_rs::dispatch::{MenuChoice, Query, QueryOutcome, RawFields, execute};
use hbp_rs::menu::{ChartOutput, run_menu};
use hbp_rs::validate::{parse_year_text, text_input};
use hbp_rs::viz::{ChartSink, PlottersRenderer, render_all};
use hbp_rs::web::{FormRequest, handle_form};
use hbp_rs::{Config, Dataset, QueryEngine, storage};
use log::{error, info};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hbp",
    version,
    about = "Query, rank & chart national blood-pressure statistics"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// CSV dataset (default: HBPdata.csv).
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// JSON config file; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for chart images (default: static).
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    /// Demographic risk threshold in percent (default 30).
    #[arg(long, global = true)]
    threshold: Option<f64>,
    /// Chart width in pixels.
    #[arg(long, global = true)]
    width: Option<u32>,
    /// Chart height in pixels.
    #[arg(long, global = true)]
    height: Option<u32>,
    /// TrueType font for chart text.
    #[arg(long, global = true)]
    font: Option<PathBuf>,
    /// Do not write chart images.
    #[arg(long, global = true, default_value_t = false)]
    no_plots: bool,
    /// Debug-level logging unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive numbered menu (default).
    Menu,
    /// Run a single query and print the result.
    Query(QueryArgs),
    /// Run the web form handler on JSON fields (argument or stdin) and print the view.
    Form {
        /// e.g. '{"menu":"(1)","country":"Algeria","gender":"Male"}'
        json: Option<String>,
    },
    /// List the countries in the dataset.
    Countries,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Menu number 1-6.
    #[arg(short, long)]
    menu: String,
    #[arg(short, long)]
    country: Option<String>,
    #[arg(short, long)]
    gender: Option<String>,
    #[arg(short, long)]
    year: Option<String>,
    /// Print the result as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Save the result (.csv for rankings, otherwise JSON).
    #[arg(long)]
    out: Option<PathBuf>,
}

fn build_config(g: &GlobalArgs) -> Result<Config> {
    let mut cfg = match &g.config {
        Some(p) => Config::from_json_file(p)?,
        None => Config::default(),
    };
    if let Some(p) = &g.data {
        cfg.data_path = p.clone();
    }
    if let Some(p) = &g.out_dir {
        cfg.out_dir = p.clone();
    }
    if let Some(t) = g.threshold {
        cfg.risk_threshold = t;
    }
    if let Some(w) = g.width {
        cfg.width = w;
    }
    if let Some(h) = g.height {
        cfg.height = h;
    }
    if let Some(f) = &g.font {
        cfg.font_path = Some(f.clone());
    }
    if g.no_plots {
        cfg.plots = false;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn renderer(cfg: &Config) -> Option<PlottersRenderer> {
    if !cfg.plots {
        return None;
    }
    let mut r = PlottersRenderer::new(cfg.width, cfg.height);
    if let Some(f) = &cfg.font_path {
        r = r.with_font(f);
    }
    Some(r)
}

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(cli) {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cfg = build_config(&cli.global)?;
    // Without the dataset nothing else can work.
    let data = Dataset::from_csv_path(&cfg.data_path)?;
    info!("dataset {} ready ({} rows)", cfg.data_path.display(), data.len());
    let engine = QueryEngine::new(&data).with_risk_threshold(cfg.risk_threshold);
    let sink = renderer(&cfg);

    match cli.cmd.unwrap_or(Command::Menu) {
        Command::Menu => cmd_menu(&engine, sink.as_ref(), &cfg),
        Command::Query(args) => cmd_query(&engine, sink.as_ref(), &cfg, args),
        Command::Form { json } => cmd_form(&engine, sink.as_ref(), &cfg, json),
        Command::Countries => {
            for c in data.countries() {
                println!("{c}");
            }
            Ok(())
        }
    }
}

fn cmd_menu(engine: &QueryEngine<'_>, sink: Option<&PlottersRenderer>, cfg: &Config) -> Result<()> {
    let charts = sink.map(|s| ChartOutput {
        sink: s as &dyn ChartSink,
        out_dir: cfg.out_dir.as_path(),
    });
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    run_menu(engine, charts.as_ref(), &mut input, &mut out)
}

fn cmd_query(
    engine: &QueryEngine<'_>,
    sink: Option<&PlottersRenderer>,
    cfg: &Config,
    args: QueryArgs,
) -> Result<()> {
    let choice: MenuChoice = args.menu.parse()?;
    let raw = RawFields {
        country: args.country.as_deref().map(text_input).unwrap_or_default(),
        gender: args.gender.as_deref().map(text_input).unwrap_or_default(),
        year: args.year.as_deref().map(parse_year_text).unwrap_or_default(),
    };
    let query = Query::from_raw(choice, engine.dataset(), &raw)?;
    let outcome = execute(engine, &query)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.summary());
    }

    if let Some(path) = args.out.as_ref() {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("json")
            .to_ascii_lowercase();
        match (ext.as_str(), &outcome) {
            ("csv", QueryOutcome::CountryRanking(r)) => storage::save_country_ranking_csv(r, path)?,
            ("csv", QueryOutcome::YearRanking(r)) => storage::save_year_ranking_csv(r, path)?,
            ("csv", _) => bail!("CSV export is only available for rankings (menu 3 and 5)"),
            ("json", _) => storage::save_json(&outcome, path)?,
            (other, _) => bail!("unsupported format: {}", other),
        }
        eprintln!("Saved result to {}", path.display());
    }

    if let Some(s) = sink {
        for name in render_all(s, &outcome.charts(), &cfg.out_dir) {
            eprintln!("Wrote chart to {}", cfg.out_dir.join(name).display());
        }
    }
    Ok(())
}

fn cmd_form(
    engine: &QueryEngine<'_>,
    sink: Option<&PlottersRenderer>,
    cfg: &Config,
    json: Option<String>,
) -> Result<()> {
    let body = match json {
        Some(s) => s,
        None => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s)?;
            s
        }
    };
    let request: FormRequest = serde_json::from_str(&body).context("form body is not valid JSON")?;
    let view = handle_form(
        engine,
        sink.map(|s| s as &dyn ChartSink),
        &cfg.out_dir,
        &request,
    );
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

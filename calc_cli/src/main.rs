//! # Windcalc CLI Application
//!
//! Command-line front end for the winding process calculator. Runs single or
//! full calculations, keeps a history file under the data directory and
//! exports it as JSON or CSV.
//!
//! ```text
//! calc_cli single --param a-film --n 2 --a-h-change 5 --a-h-bare 1 --paper-h 0.2 --save
//! calc_cli full --preset "1.35 paper" --b-h-change 4 --b-h-bare 1 --center-paper-h 0.05
//! calc_cli history export --format csv
//! ```

use std::collections::HashSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use calc_core::calculations::{generate_formulas_markdown, CalcInput, ParamType, StandardType};
use calc_core::dispatch::{dispatch, CalcRequest, CalcResult};
use calc_core::export::{export_file, select_for_export, summarize, ExportFormat};
use calc_core::history::{search, FileBackend, HistoryItem, HistoryStore};
use calc_core::presets::{find_preset, PRESETS};
use calc_core::Settings;

const RULE: &str = "═══════════════════════════════════════";

#[derive(Parser)]
#[command(name = "calc_cli")]
#[command(about = "Windcalc - winding process calculator", long_about = None)]
struct Cli {
    /// Directory holding the history file
    #[arg(long, global = true, env = "WINDCALC_DATA_DIR", default_value = ".windcalc")]
    data_dir: PathBuf,

    /// Settings file (defaults to <data-dir>/settings.json)
    #[arg(long, global = true, env = "WINDCALC_CONFIG")]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one parameter
    Single {
        /// a_film, b_film, a_die or b_die
        #[arg(short, long)]
        param: ParamType,

        #[command(flatten)]
        calc: CalcArgs,
    },
    /// Compute every parameter (or a selection) from one input set
    Full {
        /// Restrict to these parameters (comma separated)
        #[arg(long, value_delimiter = ',')]
        select: Vec<ParamType>,

        #[command(flatten)]
        calc: CalcArgs,
    },
    /// Run a JSON request from a file, or stdin when no file is given
    Request {
        file: Option<PathBuf>,

        /// Record the calculation in history
        #[arg(long)]
        save: bool,
    },
    /// Inspect and manage calculation history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// List the input presets
    Presets,
    /// Print the formula reference
    Formulas,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List stored calculations, newest first
    List {
        /// Filter by date, input values or parameter name
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Delete calculations by id
    Delete {
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Delete every stored calculation
    Clear,
    /// Export history to a file
    Export {
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// Output path (defaults to a timestamped name in the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Export only these ids
        #[arg(long, value_delimiter = ',')]
        ids: Vec<Uuid>,
    },
}

#[derive(Args)]
struct CalcArgs {
    /// shen_bian or heng_bian (defaults to the configured standard)
    #[arg(short, long)]
    standard: Option<StandardType>,

    /// Apply a named preset before the explicit inputs
    #[arg(long)]
    preset: Vec<String>,

    /// Record the calculation in history
    #[arg(long)]
    save: bool,

    #[command(flatten)]
    inputs: InputArgs,
}

#[derive(Args)]
struct InputArgs {
    /// Conductor count
    #[arg(long)]
    n: Option<f64>,
    #[arg(long)]
    a_h_change: Option<f64>,
    #[arg(long)]
    a_h_bare: Option<f64>,
    #[arg(long)]
    b_h_change: Option<f64>,
    #[arg(long)]
    b_h_bare: Option<f64>,
    #[arg(long)]
    paper_h: Option<f64>,
    #[arg(long)]
    center_paper_h: Option<f64>,
    #[arg(long)]
    a_shrink: Option<f64>,
    #[arg(long)]
    b_shrink: Option<f64>,
    #[arg(long)]
    a_reserve: Option<f64>,
    #[arg(long)]
    b_reserve: Option<f64>,
}

impl From<&InputArgs> for CalcInput {
    fn from(args: &InputArgs) -> Self {
        CalcInput {
            n: args.n,
            a_h_change: args.a_h_change,
            a_h_bare: args.a_h_bare,
            b_h_change: args.b_h_change,
            b_h_bare: args.b_h_bare,
            paper_h: args.paper_h,
            center_paper_h: args.center_paper_h,
            a_shrink: args.a_shrink,
            b_shrink: args.b_shrink,
            a_reserve: args.a_reserve,
            b_reserve: args.b_reserve,
        }
    }
}

impl CalcArgs {
    /// Presets first, then explicit flags on top
    fn inputs(&self) -> Result<CalcInput> {
        let mut inputs = CalcInput::default();
        for label in &self.preset {
            let preset = find_preset(label).with_context(|| format!("unknown preset '{}'", label))?;
            inputs = preset.apply(&inputs);
        }
        Ok(inputs.merged_with(&CalcInput::from(&self.inputs)))
    }
}

struct App {
    settings: Settings,
    data_dir: PathBuf,
    json: bool,
}

impl App {
    fn store(&self) -> HistoryStore {
        let backend = FileBackend::new(&self.data_dir, &self.settings.history.storage_key);
        debug!(path = %backend.path().display(), "using history file");
        HistoryStore::with_settings(Arc::new(backend), &self.settings.history)
    }

    async fn calculate(&self, request: CalcRequest, save: bool) -> Result<()> {
        let result = dispatch(&request);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&request, &result);
        }

        if !save {
            return Ok(());
        }
        match HistoryItem::for_success(request, result) {
            Some(item) => {
                let id = item.id;
                self.store().add(item).await;
                if !self.json {
                    println!();
                    println!("Saved to history as {}", id);
                }
            }
            None => {
                if !self.json {
                    println!();
                }
                eprintln!("Calculation failed; nothing saved to history");
            }
        }
        Ok(())
    }

    async fn history(&self, command: HistoryCommands) -> Result<()> {
        let store = self.store();

        match command {
            HistoryCommands::List { search: term } => {
                let items = store.init().await;
                let shown = search(&items, term.as_deref().unwrap_or(""));
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&shown)?);
                } else {
                    print_history(&shown);
                    if !shown.is_empty() {
                        println!();
                        println!(
                            "{} of {} stored (newest {} kept)",
                            shown.len(),
                            items.len(),
                            store.max_items()
                        );
                    }
                }
            }
            HistoryCommands::Delete { ids } => {
                let ids: HashSet<Uuid> = ids.into_iter().collect();
                let before = store.init().await.len();
                let after = store.delete(&ids).await.len();
                println!("Deleted {} item(s), {} remaining", before - after, after);
            }
            HistoryCommands::Clear => {
                store.clear().await;
                println!("History cleared");
            }
            HistoryCommands::Export { format, out, ids } => {
                let ids: HashSet<Uuid> = ids.into_iter().collect();
                let items = store.init().await;
                let selected = select_for_export(&items, &ids);
                if selected.is_empty() {
                    bail!("nothing to export");
                }

                let file = export_file(&selected, format, &self.settings.export, Local::now())?;
                let path = out.unwrap_or_else(|| PathBuf::from(&file.file_name));
                fs::write(&path, file.contents.as_bytes())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("Exported {} item(s) to {}", selected.len(), path.display());
            }
        }
        Ok(())
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("settings.json"));
    Settings::load_or_default(&path).with_context(|| format!("failed to load settings from {}", path.display()))
}

fn read_request(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    let app = App {
        settings,
        data_dir: cli.data_dir,
        json: cli.json,
    };

    match cli.command {
        Commands::Single { param, calc } => {
            let standard = calc.standard.unwrap_or(app.settings.default_standard);
            let request = CalcRequest::single(standard, param, calc.inputs()?);
            app.calculate(request, calc.save).await
        }
        Commands::Full { select, calc } => {
            let standard = calc.standard.unwrap_or(app.settings.default_standard);
            let inputs = calc.inputs()?;
            let request = if select.is_empty() {
                CalcRequest::full(standard, inputs)
            } else {
                CalcRequest::full_selected(standard, select, inputs)
            };
            app.calculate(request, calc.save).await
        }
        Commands::Request { file, save } => {
            let blob = read_request(file.as_deref())?;
            let request: CalcRequest = serde_json::from_str(&blob).context("invalid request JSON")?;
            app.calculate(request, save).await
        }
        Commands::History { command } => app.history(command).await,
        Commands::Presets => {
            if app.json {
                let presets: Vec<_> = PRESETS.iter().map(|p| (p.label, &p.values)).collect();
                println!("{}", serde_json::to_string_pretty(&presets)?);
            } else {
                for preset in PRESETS.iter() {
                    let values: Vec<String> = preset
                        .values
                        .entries()
                        .into_iter()
                        .map(|(field, value)| format!("{} = {}", field.key(), value))
                        .collect();
                    println!("  {:<20} {}", preset.label, values.join(", "));
                }
            }
            Ok(())
        }
        Commands::Formulas => {
            print!("{}", generate_formulas_markdown());
            Ok(())
        }
    }
}

fn print_result(request: &CalcRequest, result: &CalcResult) {
    println!("{}", RULE);
    println!("  {} - {}", request.standard.label(), request.mode.target_label());
    println!("{}", RULE);
    println!();

    match result {
        CalcResult::Success { results, skipped } => {
            for r in results {
                println!("  {:<28} {} {}", r.label, r.output.value, r.output.unit);
            }
            if !skipped.is_empty() {
                println!();
                println!("Skipped:");
                for s in skipped {
                    println!("  {:<28} {}", s.label, s.reason.message);
                }
            }
        }
        CalcResult::Failure { error } => {
            println!("  Calculation failed [{}]", error.code);
            println!("  {}", error.message);
        }
    }
}

fn print_history(items: &[&HistoryItem]) {
    if items.is_empty() {
        println!("No calculations in history");
        return;
    }
    for item in items {
        let summary = summarize(item);
        println!(
            "{}  {}  {:<26} {}",
            item.id,
            item.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            summary.title,
            summary.result_summary
        );
    }
}

// Entry point and high-level CLI flow.
//
// - Loads every configured dataset once at startup; any failure aborts.
// - Interactive mode shows the option menu and the active table, then
//   reads one choice at a time until the user quits.
// - With `--select` (or an export flag) the choices are applied in order
//   and only the final view is printed.
use clap::Parser;
use cpk_dashboard::config::Config;
use cpk_dashboard::prompt::{apply_choice, Step};
use cpk_dashboard::resolver::{Dashboard, SelectionEvent, View};
use cpk_dashboard::{loader, output, util, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cpk-dashboard",
    version,
    about = "Browse route and unit cost-per-kilometer tables in the terminal"
)]
struct Cli {
    /// TOML file describing the options; the stock CPK dashboard otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory relative data paths are read from
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Option to select (number, key or label); repeatable, disables the prompt
    #[arg(short, long = "select", value_name = "OPTION")]
    select: Vec<String>,

    /// Page of the final view to print (1-based)
    #[arg(long, default_value_t = 1)]
    page: usize,

    #[arg(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    export_json: Option<PathBuf>,

    /// Do not draw bar charts
    #[arg(long)]
    no_chart: bool,
}

impl Cli {
    fn interactive(&self) -> bool {
        self.select.is_empty() && self.export_csv.is_none() && self.export_json.is_none()
    }
}

fn init_tracing() {
    // Logs go to stderr so they never interleave with rendered tables.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

/// Read a single line of input after printing the prompt.
///
/// Returns `None` at end of input.
fn read_choice() -> io::Result<Option<String>> {
    print!("Enter choice: ");
    io::stdout().flush()?;
    let mut buf = String::new();
    if io::stdin().read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

fn print_header(config: &Config) {
    println!("{}", config.title);
    if let Some(sub) = &config.subtitle {
        println!("{}", sub);
    }
    println!();
}

fn print_view(view: &View<'_>, page: usize, charts: bool) {
    println!("{}\n", view.descriptor.title);
    println!("{}\n", output::render_table(view, page));
    if charts {
        if let Some(chart) = output::render_chart(view) {
            println!("{}", chart);
        }
    }
}

fn interactive(config: &Config, dash: &mut Dashboard, charts: bool) -> Result<()> {
    let mut page = 0usize;
    loop {
        print_header(config);
        println!("{}\n", output::render_menu(dash.registry(), dash.selection()));
        print_view(&dash.view(), page, charts);
        println!("Select an option (number, key or label), [n]ext / [p]revious page, [q]uit");
        let Some(choice) = read_choice()? else {
            break;
        };
        match apply_choice(dash, page, &choice) {
            Step::Quit => break,
            Step::Show { page: next } => page = next,
        }
        println!();
    }
    println!("Exiting the program.");
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::builtin(),
    };
    if let Some(dir) = cli.data_dir.clone() {
        config = config.with_data_dir(dir);
    }
    debug!(data_dir = %config.data_dir.display(), options = config.options.len(), "config ready");

    let (registry, report) = loader::build_registry(&config)?;
    println!(
        "Processing datasets... ({} rows loaded across {} options)",
        util::format_int(report.total_rows),
        util::format_int(report.options)
    );
    if !report.empty_tables.is_empty() {
        println!("Note: no rows for {}.", report.empty_tables.join(", "));
    }
    println!();

    let mut dash = Dashboard::new(registry);
    let charts = !cli.no_chart;
    if cli.interactive() {
        return interactive(&config, &mut dash, charts);
    }

    for s in &cli.select {
        dash.handle(&SelectionEvent::from_input(s));
    }
    let view = dash.view();
    print_header(&config);
    print_view(&view, cli.page.saturating_sub(1), charts);
    if let Some(path) = &cli.export_csv {
        output::write_csv(path, &view)?;
        println!("(Full table exported to {})", path.display());
    }
    if let Some(path) = &cli.export_json {
        output::write_json(path, &view)?;
        println!("(View exported to {})", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

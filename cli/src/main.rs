use std::{
    fs,
    io::Read as _,
    path::{Path, PathBuf},
};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use flotilla_compiler::backend::{Backend as _, DotBackend, DotOptions};
use miette::{Context as _, IntoDiagnostic as _, Result};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, prelude::*};

#[derive(Parser)]
#[command(name = "flotilla")]
#[command(version)]
#[command(about = "Fleet topology compiler")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv, -vvvv).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Plan(PlanArgs),
    Render(RenderArgs),
}

/// Print a layered orchestration plan.
#[derive(Args)]
struct PlanArgs {
    /// Orchestration mode.
    #[arg(long, value_enum, default_value_t = Mode::Startup)]
    mode: Mode,

    /// Target node ID for restart mode (e.g. `sor-01`).
    #[arg(long)]
    target: Option<String>,

    /// Plan view.
    #[arg(long, value_enum, default_value_t = View::Concrete)]
    view: View,

    /// Topology file (`-` or absent reads standard input).
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

/// Render the graph as Graphviz DOT.
#[derive(Args)]
struct RenderArgs {
    /// Graph view.
    #[arg(long, value_enum, default_value_t = View::Concrete)]
    view: View,

    /// Do not group co-located nodes into clusters.
    #[arg(long)]
    no_clusters: bool,

    /// Topology file (`-` or absent reads standard input).
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Startup,
    Shutdown,
    Restart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum View {
    Concrete,
    Logical,
}

fn main() -> Result<()> {
    miette::set_panic_hook();
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Command::Plan(args) => plan(args),
        Command::Render(args) => render(args),
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::try_from_default_env().into_diagnostic()?
    } else {
        let level = match verbose {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("error,flotilla={level},flotilla_={level}"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_fmt::layer())
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read `{}`", path.display())),
        _ => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .into_diagnostic()
                .wrap_err("failed to read standard input")?;
            Ok(source)
        }
    }
}

fn plan(args: PlanArgs) -> Result<()> {
    if args.mode == Mode::Restart && args.view == View::Logical {
        return Err(miette::miette!(
            "restart mode is not compatible with the logical view"
        ));
    }

    let source = read_source(args.file.as_deref())?;
    let graph = flotilla_compiler::compile(&source)?;
    let graph = match args.view {
        View::Concrete => graph,
        View::Logical => graph.logical_view(),
    };

    match args.mode {
        Mode::Startup => print_layers("Startup", &graph.startup_order()),
        Mode::Shutdown => print_layers("Shutdown", &graph.shutdown_order()),
        Mode::Restart => {
            let Some(target) = args.target.as_deref() else {
                return Err(miette::miette!("--target is required for restart mode"));
            };
            let subgraph = graph.subgraph_for(target).into_diagnostic()?;
            print_layers("Restart", &subgraph.startup_order());
        }
    }
    Ok(())
}

fn render(args: RenderArgs) -> Result<()> {
    let source = read_source(args.file.as_deref())?;
    let graph = flotilla_compiler::compile(&source)?;

    let (graph, cluster_host_groups) = match args.view {
        View::Concrete => (graph, !args.no_clusters),
        // Co-location does not apply to the logical view.
        View::Logical => (graph.logical_view(), false),
    };

    let backend = DotBackend {
        options: DotOptions {
            cluster_host_groups,
        },
    };
    let dot = backend.emit(&graph).into_diagnostic()?;
    print!("{dot}");
    Ok(())
}

fn print_layers(plan: &str, layers: &[Vec<String>]) {
    if layers.is_empty() {
        println!("  No operations required.");
        return;
    }
    for (index, layer) in layers.iter().enumerate() {
        println!(
            "  {plan} Layer {} (concurrent): [ {} ]",
            index + 1,
            layer.join(", ")
        );
    }
}

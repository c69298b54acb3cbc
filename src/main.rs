use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use theremin_lab::{
    events_table, gestures, midi, sync, trace, validate_input, ArtifactLog, ArtifactOptions, Config,
    GestureAnalyzer, ImageFormat, SyncAnalyzer, TraceAnalyzer,
};

/// Web Theremin analysis toolkit
#[derive(Parser)]
#[command(name = "theremin-lab")]
#[command(about = "Timing, gesture detection and frame-rate analysis for Web Theremin captures")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by the analysis commands
#[derive(Args)]
struct CommonArgs {
    /// Custom configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chart format (defaults to the configured format)
    #[arg(long, value_enum)]
    format: Option<ImageFormat>,

    /// Skip the Markdown report
    #[arg(long)]
    no_report: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure gesture and keyboard timing against the metronome in a MIDI capture
    Sync {
        /// Input MIDI file
        input: PathBuf,

        /// Output directory for the chart and report
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Skip the analysis chart
        #[arg(long)]
        no_graph: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Convert a MIDI file into a CSV event table
    ToCsv {
        /// Input MIDI file
        input: PathBuf,

        /// Output CSV file (defaults to the input with a .csv extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyse frame rate in a Chrome DevTools performance trace
    Trace {
        /// Trace JSON file
        input: PathBuf,

        /// Output directory for charts and report
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Skip the charts
        #[arg(long)]
        no_plot: bool,

        /// Target FPS used to grade the capture
        #[arg(long)]
        target_fps: Option<f64>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Measure gesture detection per section of a test plan
    Gestures {
        /// MIDI event table (CSV)
        events: PathBuf,

        /// Gesture plan (JSON)
        plan: PathBuf,

        /// Output directory for section charts and report
        #[arg(short, long, default_value = "plots")]
        output: PathBuf,

        /// Skip the section charts
        #[arg(long)]
        no_plots: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => theremin_lab::config::load_config(path)?,
        None => Config::default(),
    })
}

fn artifact_options(
    config: &Config,
    common: &CommonArgs,
    output_dir: PathBuf,
    charts: bool,
) -> ArtifactOptions {
    ArtifactOptions {
        output_dir,
        format: common.format.unwrap_or(config.output.image_format),
        charts,
        report: !common.no_report,
    }
}

fn finish(artifacts: ArtifactLog, output_dir: &Path) -> anyhow::Result<()> {
    if !artifacts.written.is_empty() {
        log::info!("Analysis complete, files saved to {}", output_dir.display());
    }
    if !artifacts.is_success() {
        let failed: Vec<&str> = artifacts.failed.iter().map(|f| f.artifact.as_str()).collect();
        anyhow::bail!("{} artifact(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose && cli.quiet {
        anyhow::bail!("Cannot specify both --verbose and --quiet");
    }
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Sync {
            input,
            output_dir,
            no_graph,
            common,
        } => {
            let config = load_config(common.config.as_deref())?;
            validate_input(&[&input], &config)?;
            let options = artifact_options(&config, &common, output_dir, !no_graph);

            log::info!("Processing {}...", input.display());
            let analyzer = SyncAnalyzer::new(config);
            let analysis = analyzer.analyze_file(&input)?;

            sync::print_role_summary("Theremin (Pinch Gesture)", &analysis.gesture);
            sync::print_role_summary("MIDI Keyboard (Control)", &analysis.control);

            let artifacts = analyzer.export(&analysis, &options);
            finish(artifacts, &options.output_dir)?;
        }
        Commands::ToCsv { input, output } => {
            let output = output.unwrap_or_else(|| events_table::default_csv_path(&input));
            log::info!("Processing {}...", input.display());

            let messages = midi::read_midi_file(&input)?;
            let rows = events_table::rows_from_messages(&messages);
            events_table::write_events_csv(&rows, &output)?;
            log::info!("Wrote {} events to {}", rows.len(), output.display());
        }
        Commands::Trace {
            input,
            output,
            no_plot,
            target_fps,
            common,
        } => {
            let mut config = load_config(common.config.as_deref())?;
            if let Some(fps) = target_fps {
                config.trace.target_fps = fps;
            }
            validate_input(&[&input], &config)?;
            let options = artifact_options(&config, &common, output, !no_plot);

            log::info!("Processing {}...", input.display());
            let analyzer = TraceAnalyzer::new(config);
            let analysis = analyzer.analyze_file(&input)?;
            trace::print_trace_summary(&analysis);

            let artifacts = analyzer.export(&analysis, &options);
            finish(artifacts, &options.output_dir)?;
        }
        Commands::Gestures {
            events,
            plan,
            output,
            no_plots,
            common,
        } => {
            let config = load_config(common.config.as_deref())?;
            validate_input(&[&events, &plan], &config)?;
            let options = artifact_options(&config, &common, output, !no_plots);

            log::info!("Analysing gesture detection in {}...", events.display());
            let analyzer = GestureAnalyzer::new(config);
            let analysis = analyzer.analyze_files(&events, &plan)?;
            gestures::print_detection_summary(&analysis);

            let artifacts = analyzer.export(&analysis, &options);
            finish(artifacts, &options.output_dir)?;
        }
        Commands::ValidateConfig { config } => {
            let config = theremin_lab::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}

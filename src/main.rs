use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use battle_judge::battle::{self, transport, BattleSession};
use battle_judge::config::Settings;
use battle_judge::output;

const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 4;
const EXIT_IO: i32 = 5;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum ResultsFormat {
    Table,
    Tsv,
    Csv,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the round formats available to a battle
    Presets,
    /// Interactively create a battle configuration file
    Setup {
        /// Where to write the battle file (asked interactively if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate a battle configuration file and show its round sequence
    Check {
        /// Battle configuration JSON
        path: PathBuf,
    },
    /// Judge a battle in the terminal
    Judge {
        /// Battle configuration JSON
        path: PathBuf,

        /// Where to write the judged battle (defaults to reports_dir/battle-<time>.json)
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
    /// Print the results of a judged battle
    Results {
        /// Judged battle report JSON
        path: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ResultsFormat::Table)]
        format: ResultsFormat,
    },
}

#[derive(Parser, Debug)]
#[command(name = "battle-judge")]
#[command(about = "Score freestyle rap battles round by round", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/battle-judge/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    battle_judge::logging::init(cli.verbose);

    // Load settings
    let config_path = cli.config.map(PathBuf::from);
    let settings = match battle_judge::config::load_settings(config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate settings at startup
    if let Err(errors) = battle_judge::config::validate_settings(&settings) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let use_colors = settings.colors.unwrap_or_else(output::should_use_colors);

    let code = match cli.command {
        Commands::Presets => {
            print_presets(&settings);
            EXIT_SUCCESS
        }
        Commands::Setup { out } => {
            match battle_judge::config::wizard::run_setup_wizard(out, settings.catalogue()) {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => {
                    eprintln!("Setup failed: {:#}", e);
                    EXIT_IO
                }
            }
        }
        Commands::Check { path } => check(&settings, &path),
        Commands::Judge { path, report } => judge(&settings, &path, report).await,
        Commands::Results { path, format } => results(&path, format, use_colors),
    };

    std::process::exit(code);
}

fn print_presets(settings: &Settings) {
    let catalogue = settings.catalogue();
    for preset in catalogue.presets() {
        println!(
            "{:<14} {} x {}",
            preset.name, preset.turns_per_mc, preset.patterns_per_turn
        );
    }
}

fn check(settings: &Settings, path: &Path) -> i32 {
    let setup = match transport::load_config(path, settings.catalogue()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid battle file: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    let names: Vec<&str> = setup.contestants().iter().map(|c| c.name.as_str()).collect();
    println!("MCs: {}", names.join(", "));

    let session = BattleSession::start(&setup);
    println!("Rounds ({}):", session.round_keys().len());
    for (idx, key) in session.round_keys().iter().enumerate() {
        let Some(round) = session.round_config(key) else {
            continue;
        };
        let bonuses: Vec<&str> = battle::BonusCategory::ALL
            .iter()
            .filter(|c| round.is_enabled(**c))
            .map(|c| c.label())
            .collect();
        println!(
            "{:>3}. {} ({} x {}){}",
            idx + 1,
            session.round_label(key),
            round.turns_per_mc,
            round.patterns_per_turn,
            if bonuses.is_empty() {
                String::new()
            } else {
                format!(" [{}]", bonuses.join(", "))
            }
        );
    }
    EXIT_SUCCESS
}

async fn judge(settings: &Settings, path: &Path, report: Option<PathBuf>) -> i32 {
    let setup = match transport::load_config(path, settings.catalogue()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid battle file: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    let report_path =
        report.unwrap_or_else(|| transport::default_report_path(&settings.reports_dir()));
    let theme = battle_judge::tui::resolve_theme(settings.colors);
    let app = battle_judge::tui::App::new(BattleSession::start(&setup), report_path, theme);

    match battle_judge::tui::run_tui(app).await {
        Ok(app) if app.report_saved => {
            println!("Battle report written to {}", app.report_path.display());
            EXIT_SUCCESS
        }
        Ok(_) => {
            eprintln!("Battle not finished; no report written.");
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Terminal error: {:#}", e);
            EXIT_IO
        }
    }
}

fn results(path: &Path, format: ResultsFormat, use_colors: bool) -> i32 {
    let session = match transport::load_report(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid battle report: {:#}", e);
            return EXIT_CONFIG;
        }
    };

    let rows = battle::export_rows(&session);
    match format {
        ResultsFormat::Table => {
            println!("{}", output::format_results_table(&rows, use_colors));
            println!();
            println!("{}", output::format_ranking(&battle::ranking(&session), use_colors));
            println!();
            let winner = battle::winner(&session).map(|c| c.name.as_str());
            println!("{}", output::format_winner_line(winner, use_colors));
        }
        ResultsFormat::Tsv => println!("{}", output::format_tsv(&rows)),
        ResultsFormat::Csv => match output::format_csv(&rows) {
            Ok(csv) => println!("{}", csv),
            Err(e) => {
                eprintln!("CSV export failed: {:#}", e);
                return EXIT_IO;
            }
        },
    }
    EXIT_SUCCESS
}

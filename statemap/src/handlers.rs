use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use statemap_core::explore::{DiscoveryConfig, DiscoveryReport, DiscoverySession, Strategy};
use statemap_core::merge::load_seed;
use statemap_core::model::GraphDocument;
use statemap_driver::{ReplayDriver, ReplayScript};

pub fn print_banner() {
    println!("{}", "  statemap".bright_cyan().bold());
    println!("{}", "  UI state machine discovery".bright_blue());
    println!();
}

/// Expand `~` in a user-supplied output path.
pub fn resolve_output_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

pub fn strategy_for(use_bfs: bool) -> Strategy {
    if use_bfs { Strategy::Bfs } else { Strategy::Dfs }
}

/// Load and parse a replay script file.
pub fn load_script(path: &Path) -> Result<ReplayScript, String> {
    ReplayScript::from_file(path)
        .map_err(|err| format!("Failed to load replay script {}: {}", path.display(), err))
}

pub async fn handle_discover(args: &ArgMatches, quiet: bool) {
    tracing_subscriber::fmt::init();

    let script_path = args.get_one::<PathBuf>("script").unwrap();
    let output = args.get_one::<String>("output").unwrap();
    let max_states = *args.get_one::<usize>("max-states").unwrap();
    let use_bfs = args.get_flag("use-bfs");

    let script = match load_script(script_path) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("{} {}", "[!]".red().bold(), err);
            std::process::exit(1);
        }
    };
    let base_url = script.start_url.clone();

    let driver = match ReplayDriver::new(script) {
        Ok(driver) => driver,
        Err(err) => {
            eprintln!("{} Invalid replay script: {}", "[!]".red().bold(), err);
            std::process::exit(1);
        }
    };

    let mut config = DiscoveryConfig::default()
        .with_strategy(strategy_for(use_bfs))
        .with_max_states(max_states);
    if let Some(secs) = args.get_one::<u64>("timeout") {
        config = config.with_timeout(Duration::from_secs(*secs));
    }

    let spinner = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting discovery...");
        Some(pb)
    };
    if let Some(pb) = spinner.clone() {
        config = config.with_progress(Arc::new(move |count, id| {
            pb.set_message(format!("Exploring... {} states ({})", count, id));
            pb.tick();
        }));
    }

    let session = match args.get_one::<PathBuf>("seed") {
        Some(seed_path) => {
            let seed_json = match fs::read_to_string(seed_path) {
                Ok(content) => content,
                Err(err) => {
                    eprintln!(
                        "{} Failed to read seed file {}: {}",
                        "[!]".red().bold(),
                        seed_path.display(),
                        err
                    );
                    std::process::exit(1);
                }
            };
            let seed = match load_seed(&seed_json) {
                Ok(seed) => seed,
                Err(err) => {
                    eprintln!("{} {}", "[!]".red().bold(), err);
                    std::process::exit(1);
                }
            };
            DiscoverySession::with_graph(driver, config, seed)
        }
        None => DiscoverySession::new(driver, config),
    };

    let report = match session.run().await {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{} Discovery failed: {}", "[!]".red().bold(), err);
            std::process::exit(1);
        }
    };

    if let Some(pb) = &spinner {
        pb.finish_with_message(format!(
            "Discovery complete! {} states, {} transitions",
            report.graph.state_count(),
            report.graph.transition_count()
        ));
    }

    let document = GraphDocument::from_graph(&report.graph, &base_url);
    let json = match document.to_json_pretty() {
        Ok(json) => json,
        Err(err) => {
            eprintln!("{} Failed to serialize graph: {}", "[!]".red().bold(), err);
            std::process::exit(1);
        }
    };

    let output_path = resolve_output_path(output);
    if let Err(err) = fs::write(&output_path, json) {
        eprintln!(
            "{} Failed to write {}: {}",
            "[!]".red().bold(),
            output_path.display(),
            err
        );
        std::process::exit(1);
    }

    if !quiet {
        print_summary(&report, &output_path);
    }
}

fn print_summary(report: &DiscoveryReport, output_path: &Path) {
    println!();
    println!("{}", "═".repeat(60).bright_blue().bold());
    println!("{}", "  DISCOVERY SUMMARY".bright_white().bold());
    println!("{}", "═".repeat(60).bright_blue().bold());
    println!("  {} {}", "Strategy:".bright_cyan(), report.strategy);
    println!(
        "  {} {}",
        "States discovered:".bright_cyan(),
        report.graph.state_count()
    );
    println!(
        "  {} {}",
        "Transitions found:".bright_cyan(),
        report.graph.transition_count()
    );
    println!(
        "  {} {} ({} failed)",
        "Actions attempted:".bright_cyan(),
        report.actions_attempted,
        report.actions_failed
    );
    println!(
        "  {} {:.2}s",
        "Duration:".bright_cyan(),
        report.duration.as_secs_f64()
    );
    println!("  {}", "State types:".bright_cyan());
    for (state_type, count) in report.graph.state_type_distribution() {
        println!("      {:<12} {}", state_type, count);
    }
    println!(
        "  {} {}",
        "Graph saved to:".bright_cyan(),
        output_path.display()
    );
}

pub fn handle_inspect(args: &ArgMatches) {
    let path = args.get_one::<PathBuf>("FILE").unwrap();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!(
                "{} Failed to read {}: {}",
                "[!]".red().bold(),
                path.display(),
                err
            );
            std::process::exit(1);
        }
    };
    let document = match GraphDocument::from_json(&content) {
        Ok(document) => document,
        Err(err) => {
            eprintln!("{} Not a valid graph document: {}", "[!]".red().bold(), err);
            std::process::exit(1);
        }
    };

    println!("{} {}", "Base URL:".bright_cyan(), document.base_url);
    println!("{} {}", "Graph type:".bright_cyan(), document.graph_type);
    println!(
        "{} {}",
        "States:".bright_cyan(),
        document.statistics.state_count
    );
    println!(
        "{} {}",
        "Transitions:".bright_cyan(),
        document.statistics.transition_count
    );
    println!("{}", "State types:".bright_cyan());
    for (state_type, count) in &document.statistics.state_types {
        println!("    {:<12} {}", state_type, count);
    }
    println!();
    for node in &document.nodes {
        let manually = match node.discovered_manually {
            Some(true) => " (manual)".yellow().to_string(),
            _ => String::new(),
        };
        println!(
            "  {} {}{}",
            format!("[{}]", node.state_type).green(),
            node.id,
            manually
        );
    }
}

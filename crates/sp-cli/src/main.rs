//! SelectProxy CLI
//!
//! CLI tool for compiling proxy profiles into PAC scripts and replaying
//! browser event traces through the override engine.

mod replay;

use std::fs;
use std::path::Path;

use clap::{Parser, Subcommand};
use ts_rs::TS;

use sp_compiler::{load_profile, parse_storage, parse_targets, render_pac, suggest_targets};
use sp_core::memory::SinkEvent;
use sp_core::policy::RouteReason;
use sp_core::url::hostname;
use sp_core::{Message, Profile, Response, RoutingPolicy};

#[derive(Parser)]
#[command(name = "sp-cli")]
#[command(about = "SelectProxy profile compiler and tools")]
struct Cli {
    /// Log engine activity (debug level; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a profile document into a PAC script
    Compile {
        /// Profile JSON file
        #[arg(short, long)]
        profile: String,

        /// Host forced through the proxy (repeatable)
        #[arg(long = "override")]
        overrides: Vec<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show how hosts or URLs would be routed
    Route {
        /// Profile JSON file
        #[arg(short, long)]
        profile: String,

        /// Host forced through the proxy (repeatable)
        #[arg(long = "override")]
        overrides: Vec<String>,

        /// Hosts or URLs to evaluate
        #[arg(required = true)]
        hosts: Vec<String>,
    },

    /// Replay a browser event trace through the engine
    Replay {
        /// Event trace (JSON array or one event per line)
        #[arg(short, long)]
        events: String,

        /// Extension storage dump with profiles, activeProfile and proxyEnabled
        #[arg(short, long)]
        storage: Option<String>,

        /// Run events as interleaved tasks instead of one after another
        #[arg(long)]
        concurrent: bool,

        /// Print the final PAC script
        #[arg(long)]
        pac: bool,
    },

    /// Suggest target entries for a page URL
    Suggest {
        /// Page URL
        url: String,

        /// Current target list text
        #[arg(short, long, default_value = "")]
        targets: String,
    },

    /// Export TypeScript bindings for the control-channel messages
    Bindings {
        /// Output directory
        #[arg(short, long, default_value = "bindings")]
        out_dir: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match cli.command {
        Commands::Compile {
            profile,
            overrides,
            output,
        } => cmd_compile(&profile, &overrides, output.as_deref()),
        Commands::Route {
            profile,
            overrides,
            hosts,
        } => cmd_route(&profile, &overrides, &hosts),
        Commands::Replay {
            events,
            storage,
            concurrent,
            pac,
        } => cmd_replay(&events, storage.as_deref(), concurrent, pac),
        Commands::Suggest { url, targets } => cmd_suggest(&url, &targets),
        Commands::Bindings { out_dir } => cmd_bindings(&out_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn read_profile(path: &str) -> Result<Profile, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    let mut profile = load_profile(&content)
        .map_err(|e| format!("Invalid profile '{}': {}", path, e))?;

    if profile.name.is_empty() {
        profile.name = Path::new(path)
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
    }
    Ok(profile)
}

fn cmd_compile(
    profile_path: &str,
    overrides: &[String],
    output: Option<&str>,
) -> Result<(), String> {
    let profile = read_profile(profile_path)?;
    let policy = RoutingPolicy::for_profile(&profile, overrides);
    let script = render_pac(&policy);

    match output {
        Some(path) => {
            fs::write(path, &script)
                .map_err(|e| format!("Failed to write '{}': {}", path, e))?;
            println!("Compiled profile '{}' to '{}'", profile.name, path);
            println!("  Mode:       {}", profile.mode.as_str());
            println!("  Directive:  {}", display_directive(&policy));
            println!("  Targets:    {}", policy.targets().len());
            println!("  Overrides:  {}", policy.override_count());
            println!("  Size:       {} bytes", script.len());
        }
        None => print!("{script}"),
    }

    Ok(())
}

fn cmd_route(profile_path: &str, overrides: &[String], hosts: &[String]) -> Result<(), String> {
    let profile = read_profile(profile_path)?;
    let policy = RoutingPolicy::for_profile(&profile, overrides);

    println!(
        "Profile '{}' ({}), directive: {}",
        profile.name,
        profile.mode.as_str(),
        display_directive(&policy)
    );
    for input in hosts {
        let host = if input.contains("://") {
            hostname(input)
        } else {
            input.to_ascii_lowercase()
        };
        let (route, reason) = policy.decide_with_reason(&host);
        let reason = match reason {
            RouteReason::Override => "tab override",
            RouteReason::TargetMatched => "target matched",
            RouteReason::TargetNotMatched => "no target matched",
        };
        println!("  {:<32} {:<28} ({})", host, route.as_pac_result(), reason);
    }

    Ok(())
}

fn cmd_replay(
    events_path: &str,
    storage_path: Option<&str>,
    concurrent: bool,
    show_pac: bool,
) -> Result<(), String> {
    let trace = fs::read_to_string(events_path)
        .map_err(|e| format!("Failed to read '{}': {}", events_path, e))?;
    let events = replay::parse_trace(&trace)?;

    let storage = match storage_path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read '{}': {}", path, e))?;
            parse_storage(&content).map_err(|e| format!("Invalid storage '{}': {}", path, e))?
        }
        None => Default::default(),
    };

    let event_count = events.len();
    let report = replay::replay(storage, events, concurrent)?;

    println!("Replayed {} events{}", event_count, if concurrent { " (concurrent)" } else { "" });
    for (idx, response) in &report.responses {
        if *response != Response::None {
            println!("  [{}] -> {}", idx, response.to_json());
        }
    }
    println!("  Power:        {}", report.power.profile().unwrap_or("off"));
    println!("  Tabs:         {:?}", report.enabled_tabs);
    println!("  Overrides:    {}", report.override_hosts.join(", "));
    println!("  Recomputes:   {} ({} installs)", report.recomputes, report.installs);

    match &report.final_event {
        Some(SinkEvent::Installed(policy)) => {
            println!("  Policy:       installed, directive {}", display_directive(policy));
            if show_pac {
                println!();
                print!("{}", render_pac(policy));
            }
        }
        Some(SinkEvent::Cleared) => println!("  Policy:       cleared"),
        None => println!("  Policy:       none"),
    }

    Ok(())
}

fn cmd_suggest(url: &str, targets_text: &str) -> Result<(), String> {
    let host = hostname(url);
    if host.is_empty() {
        return Err(format!("No hostname in '{}'", url));
    }

    let existing = parse_targets(targets_text);
    let suggested = suggest_targets(url, &existing);
    if suggested.is_empty() {
        println!("Nothing to add for {host}");
    } else {
        for entry in suggested {
            println!("{entry}");
        }
    }
    Ok(())
}

fn cmd_bindings(out_dir: &str) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("Failed to create '{}': {}", out_dir, e))?;
    Message::export_all_to(out_dir)
        .map_err(|e| format!("Failed to export Message: {}", e))?;
    Response::export_all_to(out_dir)
        .map_err(|e| format!("Failed to export Response: {}", e))?;
    println!("Exported TypeScript bindings to '{}'", out_dir);
    Ok(())
}

fn display_directive(policy: &RoutingPolicy) -> &str {
    if policy.directive().is_empty() {
        "DIRECT (no upstream configured)"
    } else {
        policy.directive().as_str()
    }
}

use quiver_core::{score, Distance, DistancePreset, SessionId, ShootingSession, SystemClock};
use quiver_host::{
    config::{check_arrows, RecorderConfig},
    run_recorder, summarize_sessions, summarize_volleys, CanvasGeometry, HistoryFilter, InputMode,
    LogStore,
};
use serde::Serialize;
use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

/// Output of `history --json`.
#[derive(Serialize)]
struct HistoryReport {
    log_file: String,
    records: Vec<quiver_core::VolleyRecord>,
    volleys: Vec<quiver_host::VolleySummary>,
    sessions: Vec<quiver_host::SessionSummary>,
}

/// Flags shared by the subcommands. Each command ignores the ones it has no
/// use for.
#[derive(Default)]
struct Flags {
    log: Option<String>,
    arrows: Option<String>,
    distance: Option<String>,
    preset: Option<String>,
    session: Option<String>,
    canvas: bool,
    json: bool,
    positional: Vec<String>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let command = &args[1];
    let flags = parse_flags(&args[2..]).unwrap_or_else(|e| {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    });
    let config = RecorderConfig::from_env();

    let result = match command.as_str() {
        "score" => score_command(&flags),
        "record" => record_command(&flags, &config),
        "history" => history_command(&flags, &config),
        "distances" => distances_command(&flags, &config),

        "--help" | "-h" | "help" => {
            print_usage(&args[0]);
            std::process::exit(0);
        }

        _ => {
            eprintln!("❌ Unknown command: {}", command);
            print_usage(&args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <command> [options]", program);
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  score <x> <y>");
    eprintln!("      Print the ring score of one landing point (target units, -10..10)");
    eprintln!();
    eprintln!("  record [--arrows <3|6>] [--distance <m>] [--preset <p>] [--log <file>]");
    eprintln!("         [--canvas]");
    eprintln!("      Record volleys interactively and append them to the log");
    eprintln!("      - --arrows: arrows per volley (default: $QUIVER_ARROWS or 6)");
    eprintln!("      - --distance: shooting distance in metres, must be in the preset");
    eprintln!("      - --preset: standard (18-70 m) or mobile (18-90 m)");
    eprintln!("      - --canvas: read 500x500 canvas pixels instead of target units");
    eprintln!();
    eprintln!("  history [--log <file>] [--session <id>] [--distance <m>] [--json]");
    eprintln!("      List logged arrows with per-volley and per-session totals");
    eprintln!();
    eprintln!("  distances [--preset <p>]");
    eprintln!("      List the distances a preset offers");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIVER_LOG_FILE  log path (default: storico_frecce.csv)");
    eprintln!("  QUIVER_ARROWS    default arrows per volley");
    eprintln!("  QUIVER_PRESET    default distance preset");
    eprintln!("  RUST_LOG         log filter, e.g. RUST_LOG=quiver_host=debug");
}

fn parse_flags(args: &[String]) -> Result<Flags, String> {
    let mut flags = Flags::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} requires a value", name))
        };

        match arg.as_str() {
            "--log" | "-l" => flags.log = Some(value("--log")?),
            "--arrows" | "-a" => flags.arrows = Some(value("--arrows")?),
            "--distance" | "-d" => flags.distance = Some(value("--distance")?),
            "--preset" | "-p" => flags.preset = Some(value("--preset")?),
            "--session" | "-s" => flags.session = Some(value("--session")?),
            "--canvas" => flags.canvas = true,
            "--json" => flags.json = true,
            _ => flags.positional.push(arg.clone()),
        }
    }

    Ok(flags)
}

fn log_path(flags: &Flags, config: &RecorderConfig) -> PathBuf {
    flags
        .log
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.log_file.clone())
}

fn preset(flags: &Flags, config: &RecorderConfig) -> Result<DistancePreset, String> {
    match &flags.preset {
        Some(p) => DistancePreset::from_str(p),
        None => Ok(config.preset),
    }
}

fn score_command(flags: &Flags) -> Result<(), Box<dyn std::error::Error>> {
    let [x, y] = flags.positional.as_slice() else {
        return Err("score expects exactly two coordinates: score <x> <y>".into());
    };
    let x: f64 = x.parse().map_err(|e| format!("invalid x '{}': {}", x, e))?;
    let y: f64 = y.parse().map_err(|e| format!("invalid y '{}': {}", y, e))?;

    let d = (x * x + y * y).sqrt();
    println!("🎯 ({}, {}) is {:.2} from the centre: {} points", x, y, d, score(x, y));
    Ok(())
}

fn record_command(
    flags: &Flags,
    config: &RecorderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let arrows = match &flags.arrows {
        Some(a) => {
            let arrows = a
                .parse()
                .map_err(|e| format!("invalid --arrows '{}': {}", a, e))?;
            check_arrows(arrows)?
        }
        None => config.arrows,
    };
    let preset = preset(flags, config)?;
    let distance = match &flags.distance {
        Some(d) => preset.distance(d)?,
        None => preset.default_distance(),
    };
    let mode = if flags.canvas {
        InputMode::Canvas(CanvasGeometry::default())
    } else {
        InputMode::Target
    };

    let mut store = LogStore::open(log_path(flags, config))?;
    let clock = SystemClock;
    let mut session = ShootingSession::start(arrows, distance, &clock)?;

    tracing::info!(
        "Starting session {} at {} m with {} arrows per volley",
        session.session_id(),
        distance,
        arrows
    );

    println!("🏹 Quiver volley recorder");
    println!("{}", "=".repeat(70));
    println!("  Log file: {}", store.path().display());
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let outcome = run_recorder(stdin.lock(), &mut stdout, &mut session, mode, &clock, &mut store)?;

    println!();
    println!(
        "💾 Saved {} volley(s), {} arrow(s) to {}",
        outcome.volleys_saved,
        outcome.arrows_saved,
        store.path().display()
    );
    println!("{}", "=".repeat(70));
    Ok(())
}

fn history_command(
    flags: &Flags,
    config: &RecorderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = log_path(flags, config);
    let store = LogStore::existing(&path)?;

    let filter = HistoryFilter {
        session_id: flags.session.as_deref().map(SessionId::new),
        distance: flags
            .distance
            .as_deref()
            .map(Distance::from_str)
            .transpose()?,
    };
    let records = filter.apply(store.read_all()?);
    let volleys = summarize_volleys(&records);
    let sessions = summarize_sessions(&records);

    if flags.json {
        let report = HistoryReport {
            log_file: path.display().to_string(),
            records,
            volleys,
            sessions,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("📋 History from {}", path.display());
    println!("{}", "=".repeat(70));
    if records.is_empty() {
        println!("  No arrows recorded yet.");
        return Ok(());
    }

    for volley in &volleys {
        let scores: Vec<String> = volley.scores.iter().map(|s| s.to_string()).collect();
        println!(
            "  {}  {}  volley {:>2}  {:>3} m  [{}]  total {}",
            volley.timestamp.format("%Y-%m-%d %H:%M"),
            volley.session_id,
            volley.volley_number,
            volley.distance,
            scores.join(" "),
            volley.total
        );
    }

    println!();
    println!("Sessions:");
    for session in &sessions {
        println!(
            "  {}  {:>3} m  {} volleys, {} arrows, total {}, avg {:.2}, 10s: {}, misses: {}",
            session.session_id,
            session.distance,
            session.volleys,
            session.arrows,
            session.total,
            session.average,
            session.tens,
            session.misses
        );
    }
    println!("{}", "=".repeat(70));
    Ok(())
}

fn distances_command(
    flags: &Flags,
    config: &RecorderConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let preset = preset(flags, config)?;
    let listed: Vec<String> = preset.distances().map(|d| format!("{} m", d)).collect();
    println!("📏 {} preset: {}", preset, listed.join(", "));
    Ok(())
}

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use jiff::tz::TimeZone;
use jiff::Zoned;
use serde_json::json;
use shelly_sched::config::ScheduleFile;
use shelly_sched::{
    agenda, parse_instant, parse_time_of_day, process_time_zone, LightAction, Pattern, Repeater,
    ScheduleError,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "shelly-sched",
    about = "Recurring light schedules for Shelly dimmers",
    version
)]
struct Cli {
    /// Recurrence pattern (e.g., "second monday of every month")
    pattern: Option<String>,

    /// Evaluate as of this instant instead of the current time
    #[arg(long)]
    now: Option<String>,

    /// Start of the activation window (defaults to --now)
    #[arg(long)]
    start: Option<String>,

    /// End of the activation window, exclusive
    #[arg(long)]
    expires: Option<String>,

    /// Last recorded run; duration patterns count from --start without it
    #[arg(long)]
    last_run: Option<String>,

    /// Time of day to fire on matching dates (e.g., "07:30", "6:45 PM")
    #[arg(long)]
    at: Option<String>,

    /// Number of occurrences to show
    #[arg(short, long, default_value = "1")]
    n: u32,

    /// Show the latest occurrence at or before --now instead
    #[arg(long, conflicts_with = "n")]
    prev: bool,

    /// IANA time zone to evaluate in (defaults to the system zone)
    #[arg(long)]
    tz: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Validate the pattern without computing
    #[arg(long)]
    check: bool,

    /// Trigger file: print its agenda
    #[arg(long, conflicts_with = "pattern")]
    config: Option<PathBuf>,

    /// Run the named trigger's action against the configured device now
    #[arg(long, requires = "config")]
    fire: Option<String>,

    /// Print the configured device's status
    #[arg(long, requires = "config", conflicts_with = "fire")]
    status: bool,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let tz = match cli.tz.as_deref() {
        Some(name) => or_exit(time_zone(name)),
        None => process_time_zone(),
    };
    let now = match cli.now.as_deref() {
        Some(text) => or_exit(parse_instant(text, &tz)),
        None => Zoned::now().with_time_zone(tz.clone()),
    };

    if let Some(ref path) = cli.config {
        run_config(&cli, path, &tz, &now);
        return;
    }

    let expression = match cli.pattern {
        Some(ref expr) => expr.as_str(),
        None => {
            eprintln!("error: no pattern provided (or use --config FILE)");
            process::exit(2);
        }
    };

    let pattern = or_exit(Pattern::parse(expression));

    if cli.check {
        println!("\u{2713} valid");
        process::exit(0);
    }

    let repeater = or_exit(build_repeater(&cli, pattern, &tz, &now));
    let time_of_day = match cli.at.as_deref() {
        Some(text) => Some(or_exit(parse_time_of_day(text))),
        None => None,
    };

    let results: Vec<Zoned> = if cli.prev {
        or_exit(repeater.prev_run(&now)).into_iter().collect()
    } else {
        let mut n = cli.n as usize;
        if n > 1000 {
            eprintln!("warning: capped at 1000 occurrences");
            n = 1000;
        }
        let occurrences = match time_of_day {
            Some(time) => repeater.occurrences_at(time, &now),
            None => repeater.occurrences(&now),
        };
        or_exit(occurrences.take(n).collect::<Result<Vec<_>, _>>())
    };

    if results.is_empty() {
        eprintln!("no occurrences in the activation window");
        process::exit(0);
    }

    if cli.json {
        let iso_strings: Vec<String> = results.iter().map(|z| z.to_string()).collect();
        println!("{}", json!(iso_strings));
    } else {
        for z in &results {
            println!("{z}");
        }
    }
}

fn build_repeater(
    cli: &Cli,
    pattern: Pattern,
    tz: &TimeZone,
    now: &Zoned,
) -> Result<Repeater, ScheduleError> {
    let start = match cli.start.as_deref() {
        Some(text) => parse_instant(text, tz)?,
        None => now.clone(),
    };
    let mut repeater = Repeater::new(pattern, start.clone()).in_time_zone(tz.clone());
    if let Some(text) = cli.expires.as_deref() {
        repeater = repeater.expiring(parse_instant(text, tz)?);
    }
    match cli.last_run.as_deref() {
        Some(text) => repeater = repeater.with_last_run(parse_instant(text, tz)?),
        None if pattern.is_duration() => repeater = repeater.with_last_run(start),
        None => {}
    }
    Ok(repeater)
}

fn run_config(cli: &Cli, path: &Path, tz: &TimeZone, now: &Zoned) {
    let file = or_exit(ScheduleFile::load(path));

    if cli.status {
        let status = or_exit(file.dimmer().and_then(|d| d.status()));
        if cli.json {
            println!("{}", json!(status));
        } else {
            println!("device: {}", status.device_id());
            println!("on: {}", status.is_on());
            println!("brightness: {}", status.brightness());
            if let Some(watts) = status.power() {
                println!("power: {watts} W");
            }
            for fault in status.faults() {
                println!("fault: {fault}");
            }
        }
        return;
    }

    let triggers = or_exit(file.build(tz, now));

    if let Some(ref name) = cli.fire {
        let dimmer = or_exit(file.dimmer());
        let Some(trigger) = triggers.into_iter().find(|t| t.name() == name.as_str()) else {
            eprintln!("error: no trigger named '{name}'");
            process::exit(1);
        };
        let mut trigger = trigger.map_action(|command| LightAction::new(dimmer.clone(), command));
        let command = *trigger.action().command();
        or_exit(trigger.fire(now.clone()));
        info!(trigger = %name, %command, "fired");
        println!("{name}: {command}");
        return;
    }

    let agenda = agenda(&triggers, now);
    for skipped in agenda.skipped() {
        let name = triggers[skipped.index].name();
        warn!(trigger = %name, error = %skipped.error, "skipping trigger");
    }

    if cli.json {
        let entries: Vec<_> = agenda
            .pending()
            .iter()
            .map(|p| {
                let trigger = &triggers[p.index];
                json!({
                    "name": trigger.name(),
                    "at": p.at.to_string(),
                    "pattern": trigger.repeater().pattern().to_string(),
                    "action": trigger.action(),
                })
            })
            .collect();
        println!("{}", json!(entries));
    } else {
        for p in agenda.pending() {
            let trigger = &triggers[p.index];
            println!(
                "{}  {}  {} ({})",
                p.at,
                trigger.name(),
                trigger.action(),
                trigger.repeater().pattern()
            );
        }
    }

    if agenda.is_empty() {
        eprintln!("no upcoming triggers");
    }
    if !agenda.skipped().is_empty() {
        process::exit(1);
    }
}

fn time_zone(name: &str) -> Result<TimeZone, ScheduleError> {
    if name.eq_ignore_ascii_case("utc") {
        return Ok(TimeZone::UTC);
    }
    TimeZone::get(name).map_err(|e| ScheduleError::config(format!("time zone '{name}': {e}")))
}

fn or_exit<T>(result: Result<T, ScheduleError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{}", e.display_rich());
            process::exit(1);
        }
    }
}

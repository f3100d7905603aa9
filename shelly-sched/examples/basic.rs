//! Basic walkthrough: parse a pattern, bind it to a window, query it.

use jiff::civil::time;
use jiff::tz::TimeZone;
use jiff::Zoned;
use shelly_sched::{parse_instant, Pattern, Repeater, ScheduleError, ScheduledTrigger};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pattern: Pattern = "2nd mon of every month".parse()?;
    println!("Parsed: {pattern}");

    let start: Zoned = parse_instant("2024-01-01T00:00:00Z", &TimeZone::UTC)?;
    let expires = parse_instant("2025-01-01T00:00:00Z", &TimeZone::UTC)?;
    let repeater = Repeater::new(pattern, start.clone()).expiring(expires);

    if let Some(next) = repeater.next_run(&start)? {
        println!("Next after {start}: {next}");
    }

    println!("\nFirst 5 at 07:30:");
    for at in repeater.occurrences_at(time(7, 30, 0, 0), &start).take(5) {
        println!("  {}", at?);
    }

    // Duration patterns measure from the last recorded run.
    let mut hourly = Repeater::new("every 90 minutes".parse()?, start.clone())
        .with_last_run(start.clone());
    let first = hourly.next_run(&start)?.ok_or("window closed")?;
    hourly.record_fire(first.clone());
    println!("\nEvery 90m: {first}, then {:?}", hourly.next_run(&first)?);

    // A trigger's action can be any closure.
    let mut trigger = ScheduledTrigger::new("greet", time(9, 0, 0, 0), repeater, || -> Result<(), ScheduleError> {
        println!("\nhello from the trigger");
        Ok(())
    });
    if let Some(at) = trigger.next_fire(&start)? {
        trigger.fire(at)?;
        println!("last run now {:?}", trigger.repeater().last_run());
    }

    Ok(())
}

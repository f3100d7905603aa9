#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = shelly_sched::Pattern::parse(s);
        let _ = shelly_sched::parse_time_of_day(s);
        let _ = shelly_sched::parse_instant(s, &jiff::tz::TimeZone::UTC);
    }
});

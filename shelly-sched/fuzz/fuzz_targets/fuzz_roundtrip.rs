#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(pattern) = shelly_sched::Pattern::parse(s) {
            let displayed = pattern.to_string();
            let reparsed = shelly_sched::Pattern::parse(&displayed)
                .expect("display output must be parseable");
            assert_eq!(pattern, reparsed, "'{displayed}' re-parsed differently");
        }
    }
});

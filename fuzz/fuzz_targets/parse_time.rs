#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    use tzdb::parse::{parse_time_seconds, split_time_suffix};

    if let Ok((time, _)) = std::str::from_utf8(data).map_err(|_| ()).and_then(|data| split_time_suffix(data).map_err(|_| ())) {
        let _ = parse_time_seconds(time);
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    use tzdb::{compile_str, CompilerConfig};

    if let Ok(data) = std::str::from_utf8(data) {
        let _ = compile_str(data, "2020a", &CompilerConfig::default());
    }
});

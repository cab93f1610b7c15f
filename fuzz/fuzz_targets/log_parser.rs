#![no_main]

use hbgraph::log_reader::{parse_log, LogContext};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Arbitrary log text must produce records or an error, never a panic
        let context = LogContext { pid: 1, tid: 2 };
        let _ = parse_log(input, Path::new("fuzz-1-2.txt"), Some(context));
        let _ = parse_log(input, Path::new("fuzz.txt"), None);
    }
});

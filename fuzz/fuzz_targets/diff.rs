#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    jsondiff_fuzz::fuzz_diff(data);
});

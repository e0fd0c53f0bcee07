// SPDX-License-Identifier: AGPL-3.0-or-later
#![no_main]

use fdk_core::DriverPath;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    let path = DriverPath::new(input);

    for seg in path.segments() {
        assert!(!seg.is_empty());
        assert!(!seg.contains('/'));
        assert!(seg != "." && seg != "..");
    }

    // Normalization is idempotent.
    assert_eq!(DriverPath::new(path.to_path_string()), path);
    assert_eq!(DriverPath::new(path.to_relative_string()), path);
});

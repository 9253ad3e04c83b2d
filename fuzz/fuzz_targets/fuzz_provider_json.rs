// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Feed arbitrary provider responses through every formatter

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;

use wicosintx::lookups::{email, ip, phone};
use wicosintx::probe;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = probe::person_targets(text);
        let _ = probe::username_targets(text);
    }

    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let _ = ip::format_ipinfo(&value);
    let _ = ip::format_abstract_ip(&value);
    let _ = ip::format_shodan(&value);
    let _ = ip::format_censys(&value);
    let _ = email::format_dehashed(&value);
    let _ = email::format_abstract_email(&value);
    let _ = phone::format_veriphone(&value);
    let _ = phone::format_abstract_phone(&value);
});

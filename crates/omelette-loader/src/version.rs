// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Version ordering for `latest()` resolution.
//!
//! Bundled versions are loose: `1.0.0`, `v2.1.3`, `1.0.0rc1`, `1.0.0-beta.2`.
//! Each dot-separated component is a leading decimal number plus a lexical
//! suffix. Numbers compare numerically, so `1.10.0 > 1.2.0`. On equal numbers
//! a bare component beats a suffixed one (`1.0.0 > 1.0.0rc1`) and two
//! suffixes compare as strings.
//!
//! Missing components count as `0` (`1.2 == 1.2.0`). A component with no
//! leading digits sorts below every numeric component.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Matches registry keys that carry a semver-like version
static SEMVER_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)~(.*)@v?(\d+\.\d+\.\d+[^/]*)$").unwrap());

/// Whether `key` is a `owner~repo@<semver>` registry key
pub fn is_semver_key(key: &str) -> bool {
    SEMVER_KEY.is_match(key)
}

#[derive(Debug, PartialEq, Eq)]
struct Component<'a> {
    number: Option<u64>,
    suffix: &'a str,
}

impl<'a> Component<'a> {
    const ZERO: Component<'static> = Component {
        number: Some(0),
        suffix: "",
    };

    fn parse(part: &'a str) -> Self {
        let digits = part.bytes().take_while(u8::is_ascii_digit).count();
        let number = match digits {
            0 => None,
            _ => Some(part[..digits].parse().unwrap_or(u64::MAX)),
        };
        Self {
            number,
            suffix: &part[digits..],
        }
    }

    fn compare(&self, other: &Component<'_>) -> Ordering {
        match (self.number, other.number) {
            (Some(a), Some(b)) if a != b => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            _ => match (self.suffix.is_empty(), other.suffix.is_empty()) {
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                _ => self.suffix.cmp(other.suffix),
            },
        }
    }
}

/// Compare two version strings, ascending.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a: Vec<Component<'_>> = strip_v(a).split('.').map(Component::parse).collect();
    let b: Vec<Component<'_>> = strip_v(b).split('.').map(Component::parse).collect();

    for i in 0..a.len().max(b.len()) {
        let left = a.get(i).unwrap_or(&Component::ZERO);
        let right = b.get(i).unwrap_or(&Component::ZERO);
        match left.compare(right) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

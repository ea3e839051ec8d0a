// vectorlink: a distributed overlay IP path-vector router
// Copyright (C) 2026 The vectorlink Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Structured logging setup (spec.md §6 CLI debug levels, §7 "silent drops
//! with debug logging"). Configured programmatically with `log4rs` rather
//! than from a `log4rs.yml` file, since this crate ships as a single
//! self-contained binary.

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

/// Maps the CLI's `--debug` level (spec.md §6: 1-4, increasing verbosity)
/// onto a `log` level filter. `None` (no `--debug` flag) behaves like
/// level 1.
fn level_for(debug: Option<u8>) -> LevelFilter {
    match debug.unwrap_or(1) {
        0 | 1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(debug: Option<u8>) {
    let encoder = PatternEncoder::new("{d(%H:%M:%S%.3f)} {l} [{T}] {m}{n}");
    let appender = ConsoleAppender::builder()
        .encoder(Box::new(encoder))
        .build();

    let config = LogConfig::builder()
        .appender(Appender::builder().build("console", Box::new(appender)))
        .build(Root::builder().appender("console").build(level_for(debug)))
        .expect("static logging config is always valid");

    if log4rs::init_config(config).is_err() {
        // A previous call (e.g. in tests) already installed a logger.
        log::debug!("logger already initialized, skipping");
    }
}

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
//! Command-line argument parsing (spec.md §6 "CLI"):
//! `configFile delta runLength [static] [debug|debugg|debuggg|debugggg] [enFA]`.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "vectorlinkd", about = "Overlay path-vector router daemon")]
pub struct Cli {
    /// Path to the line-oriented config file (hostIp/myIp/prefix/neighbor/destination).
    pub config_file: PathBuf,

    /// Inter-packet interval of the traffic generator, in seconds.
    pub delta: f64,

    /// Total traffic-generation duration, in seconds.
    pub run_length: f64,

    /// Disable dynamic per-link delay perturbation.
    #[arg(long = "static")]
    pub static_delay: bool,

    /// Debug verbosity: accepts `1`..`4` or the literal tokens
    /// `debug`/`debugg`/`debuggg`/`debugggg` used by the original CLI.
    #[arg(long, value_parser = parse_debug_level)]
    pub debug: Option<u8>,

    /// Enable link-failure advertisement emission.
    #[arg(long = "en-fa")]
    pub enable_fa: bool,
}

fn parse_debug_level(s: &str) -> Result<u8, String> {
    match s {
        "1" | "debug" => Ok(1),
        "2" | "debugg" => Ok(2),
        "3" | "debuggg" => Ok(3),
        "4" | "debugggg" => Ok(4),
        other => Err(format!(
            "expected 1-4 or debug/debugg/debuggg/debugggg, got {other:?}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_both_numeric_and_word_debug_levels() {
        assert_eq!(parse_debug_level("2").unwrap(), 2);
        assert_eq!(parse_debug_level("debuggg").unwrap(), 3);
        assert!(parse_debug_level("5").is_err());
    }

    #[test]
    fn parses_minimal_positional_args() {
        let cli = Cli::parse_from(["vectorlinkd", "router.conf", "1.0", "30.0"]);
        assert_eq!(cli.delta, 1.0);
        assert_eq!(cli.run_length, 30.0);
        assert!(!cli.static_delay);
        assert!(!cli.enable_fa);
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::parse_from([
            "vectorlinkd",
            "router.conf",
            "1.0",
            "30.0",
            "--static",
            "--debug",
            "debuggg",
            "--en-fa",
        ]);
        assert!(cli.static_delay);
        assert!(cli.enable_fa);
        assert_eq!(cli.debug, Some(3));
    }
}

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
//! Configuration-file parser. This module is plumbing that turns a
//! line-oriented `key: value` text file into the immutable [`Config`]
//! descriptor every component is constructed from.

use std::fs;
use std::path::Path;

use vectorlink_wire::{OverlayAddr, Prefix};

use crate::error::ConfigError;

/// One `neighbor: <overlayIp> <hostIp> <delay>` entry. Its position in
/// [`Config::neighbors`] is the stable link index used everywhere a link is
/// named.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborConfig {
    pub overlay_ip: OverlayAddr,
    pub host_ip: String,
    pub delay: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host_ip: String,
    pub my_ip: OverlayAddr,
    pub prefixes: Vec<Prefix>,
    pub neighbors: Vec<NeighborConfig>,
    pub destinations: Vec<OverlayAddr>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut host_ip = None;
        let mut my_ip = None;
        let mut prefixes = Vec::new();
        let mut neighbors = Vec::new();
        let mut destinations = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| ConfigError::MalformedLine(line_no, "key: value", line.to_string()))?;
            let key = key.trim();
            let value = value.trim();

            match key {
                "hostIp" => host_ip = Some(value.to_string()),
                "myIp" => {
                    my_ip = Some(
                        value
                            .parse()
                            .map_err(|e| ConfigError::BadAddr(line_no, e))?,
                    )
                }
                "prefix" => {
                    let prefix: Prefix = value.parse().map_err(|_| {
                        ConfigError::MalformedLine(line_no, "prefix", value.to_string())
                    })?;
                    prefixes.push(prefix);
                }
                "neighbor" => {
                    let fields: Vec<&str> = value.split_whitespace().collect();
                    if fields.len() != 3 {
                        return Err(ConfigError::MalformedLine(
                            line_no,
                            "neighbor",
                            value.to_string(),
                        ));
                    }
                    let overlay_ip = fields[0]
                        .parse()
                        .map_err(|e| ConfigError::BadAddr(line_no, e))?;
                    let delay: f64 = fields[2].parse().map_err(|_| {
                        ConfigError::BadDelay(line_no, value.to_string(), fields[2].to_string())
                    })?;
                    neighbors.push(NeighborConfig {
                        overlay_ip,
                        host_ip: fields[1].to_string(),
                        delay,
                    });
                }
                "destination" => {
                    let addr = value
                        .parse()
                        .map_err(|e| ConfigError::BadAddr(line_no, e))?;
                    destinations.push(addr);
                }
                other => {
                    log::warn!("config line {line_no}: ignoring unknown key {other:?}");
                }
            }
        }

        Ok(Config {
            host_ip: host_ip.ok_or(ConfigError::MissingKey("hostIp"))?,
            my_ip: my_ip.ok_or(ConfigError::MissingKey("myIp"))?,
            prefixes,
            neighbors,
            destinations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_config() {
        let text = "\
hostIp: 10.0.0.1
myIp: 1.1.0.1
prefix: 1.1.0.0/16
neighbor: 1.1.0.2 10.0.0.2 0.1
neighbor: 1.1.0.3 10.0.0.3 0.2
destination: 1.1.0.3
";
        let cfg = Config::parse(text).unwrap();
        assert_eq!(cfg.host_ip, "10.0.0.1");
        assert_eq!(cfg.my_ip, "1.1.0.1".parse().unwrap());
        assert_eq!(cfg.prefixes, vec!["1.1.0.0/16".parse().unwrap()]);
        assert_eq!(cfg.neighbors.len(), 2);
        assert_eq!(cfg.neighbors[0].delay, 0.1);
        assert_eq!(cfg.neighbors[1].overlay_ip, "1.1.0.3".parse().unwrap());
        assert_eq!(cfg.destinations, vec!["1.1.0.3".parse().unwrap()]);
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let text = "\
# a comment
hostIp: 10.0.0.1

myIp: 1.1.0.1
";
        let cfg = Config::parse(text).unwrap();
        assert_eq!(cfg.my_ip, "1.1.0.1".parse().unwrap());
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let text = "myIp: 1.1.0.1\n";
        assert!(matches!(
            Config::parse(text),
            Err(ConfigError::MissingKey("hostIp"))
        ));
    }

    #[test]
    fn malformed_neighbor_line_is_an_error() {
        let text = "\
hostIp: 10.0.0.1
myIp: 1.1.0.1
neighbor: 1.1.0.2 10.0.0.2
";
        assert!(Config::parse(text).is_err());
    }

    #[test]
    fn unknown_key_is_ignored_not_fatal() {
        let text = "\
hostIp: 10.0.0.1
myIp: 1.1.0.1
futureFeature: 42
";
        assert!(Config::parse(text).is_ok());
    }
}

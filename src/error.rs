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
//! Fatal, setup-time error types. Per spec.md §7, configuration errors and
//! unresolvable neighbor host names are fatal at startup; nothing below
//! this layer ever crosses a queue.

use vectorlink_wire::{AddrParseError, WireError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing required key {0:?}")]
    MissingKey(&'static str),
    #[error("line {0}: malformed {1:?} line: {2:?}")]
    MalformedLine(usize, &'static str, String),
    #[error("line {0}: {1}")]
    BadAddr(usize, #[source] AddrParseError),
    #[error("line {0}: malformed delay {2:?} in neighbor line: {1:?}")]
    BadDelay(usize, String, String),
}

#[derive(Debug, thiserror::Error)]
pub enum SubstrateError {
    #[error("could not bind UDP socket on {0}: {1}")]
    Bind(String, #[source] std::io::Error),
    #[error("could not resolve neighbor host {0:?}: {1}")]
    UnresolvableHost(String, #[source] std::io::Error),
    #[error("neighbor host {0:?} resolved to no addresses")]
    NoAddressForHost(String),
    #[error("datagram from unconfigured host {0}")]
    UnknownHost(std::net::SocketAddr),
    #[error("malformed datagram: {0}")]
    MalformedDatagram(#[source] WireError),
}

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
//! vectorlink: an overlay IP path-vector router.
//!
//! The crate is organized around the three subsystems that cooperate to
//! forward and route overlay traffic — [`forwarder`], [`router`] and
//! [`substrate`] — plus the ambient plumbing that turns them into a
//! runnable daemon: [`config`], [`cli`], [`logging`] and [`appgen`].

pub mod appgen;
pub mod blocking_queue;
pub mod cli;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod logging;
pub mod router;
pub mod substrate;

pub use config::Config;
pub use forwarder::Forwarder;
pub use router::Router;
pub use substrate::Substrate;

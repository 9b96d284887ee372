// PortLand: Simulating a Scalable Fault-Tolerant Layer 2 Data Center Fabric
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Simulation parameters of the fabric

/// Default number of events processed before giving up.
pub const DEFAULT_STOP_AFTER: usize = 100_000;

/// Configuration of a [`Network`](crate::fabric::Network)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FabricConfig {
    /// Maximum number of events processed by a single operation. If set to `None`, the queue runs
    /// until it is empty.
    pub stop_after: Option<usize>,
    /// Seed for the random upstream port selection. If set to `None`, the seed is taken from the
    /// operating system, and runs are not reproducible.
    pub seed: Option<u64>,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self { stop_after: Some(DEFAULT_STOP_AFTER), seed: None }
    }
}

impl FabricConfig {
    /// Default configuration with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed), ..Default::default() }
    }
}

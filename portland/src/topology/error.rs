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

//! Module that contains definitions for the error class

use crate::fabric::NetworkError;
use thiserror::Error;

/// Error while building a topology
#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    /// Error propagated from the network
    #[error("Network Error: {0}")]
    NetworkError(#[from] NetworkError),
    /// The fat-tree parameter must be even and in range
    #[error("Invalid fat-tree parameter k = {0}: must be even and between 2 and {max}", max = super::MAX_K)]
    InvalidK(usize),
    /// The location does not exist in the topology
    #[error("No such location in the fat-tree: pod {pod}, position {position}, port {port}")]
    InvalidLocation {
        /// Pod
        pod: usize,
        /// Position inside the pod (or index of the core switch)
        position: usize,
        /// Port of the edge switch
        port: usize,
    },
}

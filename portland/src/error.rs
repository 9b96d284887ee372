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

//! Module containing all error types

use crate::fabric::{DeviceError, FabricManagerError, NetworkError};
use crate::topology::TopologyError;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error propagated from the fabric
    #[error("Network Error: {0}")]
    NetworkError(#[from] NetworkError),
    /// Error while building the topology
    #[error("Topology Error: {0}")]
    TopologyError(#[from] TopologyError),
}

impl From<DeviceError> for Error {
    fn from(cause: DeviceError) -> Self {
        Self::NetworkError(NetworkError::DeviceError(cause))
    }
}

impl From<FabricManagerError> for Error {
    fn from(cause: FabricManagerError) -> Self {
        Self::NetworkError(NetworkError::FabricManagerError(cause))
    }
}

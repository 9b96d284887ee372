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

//! Module containing all type definitions

use crate::fabric::host::Host;
use crate::fabric::message::FabricMessage;
use crate::fabric::switch::Switch;
use petgraph::prelude::*;
use petgraph::stable_graph::StableGraph;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

type IndexType = u32;
/// Device Identification (and index into the graph). Both switches and hosts are devices.
pub type DeviceId = NodeIndex<IndexType>;
/// Switch Identification
pub type SwitchId = DeviceId;
/// Host Identification
pub type HostId = DeviceId;
/// Physical link graph of the fabric
pub type FabricGraph = StableGraph<(), (), Undirected, IndexType>;

/// # MAC Address
/// 48 bit hardware address. The same type is used for the actual (burned-in) address of a host
/// and for the positional pseudo MAC address, see [`Pmac`](crate::fabric::Pmac).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The broadcast address `ff:ff:ff:ff:ff:ff`
    pub const BROADCAST: Self = Self([0xff; 6]);
    /// The zero address `00:00:00:00:00:00`
    pub const ZERO: Self = Self([0x00; 6]);

    /// Create a new address from its six octets
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Return the six octets of the address.
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Returns true if the address is the broadcast address
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({})", self)
    }
}

impl FromStr for MacAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets = s
            .split(':')
            .map(|o| u8::from_str_radix(o, 16).map_err(|_| AddressParseError(s.to_string())))
            .collect::<Result<Vec<u8>, _>>()?;
        if octets.len() != 6 {
            return Err(AddressParseError(s.to_string()));
        }
        let mut bytes = [0u8; 6];
        bytes.copy_from_slice(&octets);
        Ok(Self(bytes))
    }
}

/// Error returned when a MAC address cannot be parsed.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid MAC address: {0}")]
pub struct AddressParseError(pub String);

/// # Switch Tier
/// Layer of the fat-tree in which a switch is placed. The numeric codes follow the PortLand
/// convention, `1` for edge, `2` for aggregation and `3` for core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Top-of-rack switch, hosts are attached to its lower ports
    Edge,
    /// Switch connecting the edge switches of one pod
    Aggregation,
    /// Switch connecting all pods together
    Core,
}

impl Tier {
    /// Numeric code of the tier
    pub fn code(&self) -> u8 {
        match self {
            Self::Edge => 1,
            Self::Aggregation => 2,
            Self::Core => 3,
        }
    }

    /// Get the tier from its numeric code. Returns `None` for an unknown code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Edge),
            2 => Some(Self::Aggregation),
            3 => Some(Self::Core),
            _ => None,
        }
    }
}

/// Identity of a switch in the fat-tree. It never changes once the switch is installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SwitchIdentity {
    /// Layer of the switch
    pub tier: Tier,
    /// Pod number
    pub pod: u8,
    /// Position inside the pod (or index of the core switch)
    pub position: u8,
}

impl SwitchIdentity {
    /// Identity of an edge switch
    pub fn edge(pod: u8, position: u8) -> Self {
        Self { tier: Tier::Edge, pod, position }
    }

    /// Identity of an aggregation switch
    pub fn aggregation(pod: u8, position: u8) -> Self {
        Self { tier: Tier::Aggregation, pod, position }
    }

    /// Identity of a core switch
    pub fn core(pod: u8, position: u8) -> Self {
        Self { tier: Tier::Core, pod, position }
    }
}

impl fmt::Display for SwitchIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SW{}-{}-{}", self.tier.code(), self.pod, self.position)
    }
}

/// # Port Reference
/// Every switch has two independently indexed groups of ports. Lower (south-bound) ports face
/// the hosts or the lower tier, upper (north-bound) ports face the higher tier. A host has a
/// single network interface, which is treated as its upper port `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PortRef {
    /// South-bound port
    Lower(usize),
    /// North-bound port
    Upper(usize),
}

impl PortRef {
    /// Index of the port inside its group
    pub fn index(&self) -> usize {
        match self {
            Self::Lower(i) | Self::Upper(i) => *i,
        }
    }

    /// Returns true if the port is a north-bound port
    pub fn is_upper(&self) -> bool {
        matches!(self, Self::Upper(_))
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lower(i) => write!(f, "lower[{}]", i),
            Self::Upper(i) => write!(f, "upper[{}]", i),
        }
    }
}

/// One end of a physical link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Device owning the port
    pub device: DeviceId,
    /// Port on the device
    pub port: PortRef,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(device: DeviceId, port: PortRef) -> Self {
        Self { device, port }
    }
}

/// Result of looking up a device in the [`Network`](crate::fabric::Network): either a switch, a
/// host, or nothing.
#[derive(Debug)]
pub enum NetworkDevice<'a> {
    /// PortLand switch
    Switch(&'a Switch),
    /// End host
    Host(&'a Host),
    /// None was found
    None,
}

/// Reason why a switch dropped a frame. Drops are the normal way of absorbing failures in the
/// fabric, they are counted but never propagated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DropReason {
    /// No PMAC could be found or allocated for the source or destination
    Unresolved,
    /// The frame carries neither ARP nor IPv4
    UnsupportedProtocol,
    /// The destination PMAC is not known at the edge switch
    UnknownPmac,
    /// The frame arrived on a port the tier should never receive on
    ProtocolViolation,
    /// The computed output port does not exist
    InvalidPort,
}

/// Fabric Manager Errors
#[derive(Error, Debug, PartialEq)]
pub enum FabricManagerError {
    /// The message kind is not accepted by the fabric manager
    #[error("Fabric manager cannot handle the message: {0:?}")]
    UnexpectedMessage(FabricMessage),
    /// The switch is not registered with the fabric manager
    #[error("Switch {0:?} is not registered with the fabric manager")]
    UnknownSwitch(SwitchId),
}

/// Device Errors
#[derive(Error, Debug, PartialEq)]
pub enum DeviceError {
    /// The port does not exist on the device
    #[error("Port {0} does not exist on the device")]
    InvalidPort(PortRef),
    /// The port is already connected to a link
    #[error("Port {0} is already connected")]
    PortAlreadyConnected(PortRef),
    /// The host is not attached to any switch
    #[error("Host is not connected to the fabric")]
    NotConnected,
}

/// Network Errors
#[derive(Error, Debug, PartialEq)]
pub enum NetworkError {
    /// Device Error which cannot be handled
    #[error("Device Error: {0}")]
    DeviceError(#[from] DeviceError),
    /// Fabric manager error
    #[error("Fabric Manager Error: {0}")]
    FabricManagerError(#[from] FabricManagerError),
    /// Device is not present in the topology
    #[error("Network device was not found in topology: {0:?}")]
    DeviceNotFound(DeviceId),
    /// Device name is not present in the topology
    #[error("Network device name was not found in topology: {0}")]
    DeviceNameNotFound(String),
    /// Device must be a switch
    #[error("Network device is not a switch: {0:?}")]
    DeviceIsNotASwitch(DeviceId),
    /// Device must be a host
    #[error("Network device is not a host: {0:?}")]
    DeviceIsNotAHost(DeviceId),
    /// A link must connect a lower port with an upper port
    #[error("Invalid link: {0:?} -> {1:?}")]
    InvalidLink(Endpoint, Endpoint),
    /// Event processing did not terminate
    #[error("Network cannot converge in the given time!")]
    NoConvergence,
}

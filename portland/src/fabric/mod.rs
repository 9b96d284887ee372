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

#![deny(missing_docs, missing_debug_implementations)]

//! # Fabric
//!
//! Simulation of a PortLand data center fabric: switches arranged as a three-tier fat-tree, which
//! forward frames based on positional pseudo MAC addresses (PMACs), and a logically centralized
//! fabric manager, which resolves IP addresses to PMACs.
//!
//! ## Example usage
//!
//! The following example builds a fat-tree with `k = 4`, and sends data between two hosts in
//! different pods. The first ARP request of `a` misses at the fabric manager, which floods it
//! through all core switches. The reply of `b` resolves the address, and the queued data is
//! delivered.
//!
//! ```rust
//! use portland::fabric::FabricConfig;
//! use portland::topology::FatTree;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tree = FatTree::build(4, FabricConfig::with_seed(1))?;
//!     let a = tree.host(0, 0, 0)?;
//!     let b = tree.host(1, 1, 1)?;
//!     let b_ip = tree.net().get_host(b)?.ip();
//!
//!     tree.net_mut().send(a, b_ip, b"hello".to_vec())?;
//!
//!     let inbox = tree.net().get_host(b)?.inbox();
//!     assert_eq!(inbox.len(), 1);
//!     assert_eq!(inbox[0].data, b"hello".to_vec());
//!     assert!(tree.net().fabric_manager().is_registered(b_ip));
//!     Ok(())
//! }
//! ```
//!
//! ## Structure
//!
//! - [`pmac`]: Encoding, decoding and the output port computation.
//! - [`PmacTable`]: Local table of an edge switch.
//! - [`FabricManager`]: The directory, mapping IP addresses to PMACs.
//! - [`Switch`] together with its tier specific [`ForwardingPolicy`].
//! - [`Host`]: End host with a minimal ARP client.
//! - [`Network`]: Owns all devices, and delivers frames between them.

pub mod config;
pub(crate) mod event;
pub mod fabric_manager;
pub mod frame;
pub mod host;
pub mod message;
pub(crate) mod network;
pub mod pmac;
pub mod pmac_table;
pub mod policy;
pub mod printer;
pub mod switch;
pub(crate) mod types;

pub use event::{Event, EventQueue};

pub use config::FabricConfig;
pub use fabric_manager::{FabricManager, FabricManagerStats};
pub use frame::{ArpOperation, ArpPacket, Frame, FrameMetadata, Ipv4Packet, Payload};
pub use host::{Host, HostStats};
pub use message::FabricMessage;
pub use network::Network;
pub use pmac::Pmac;
pub use pmac_table::{PmacEntry, PmacTable};
pub use policy::{AggregationPolicy, CorePolicy, EdgePolicy, ForwardingContext, ForwardingPolicy};
pub use switch::{Port, PortStats, Switch, SwitchStats};
pub use types::{
    AddressParseError, DeviceError, DeviceId, DropReason, Endpoint, FabricGraph,
    FabricManagerError, HostId, MacAddress, NetworkDevice, NetworkError, PortRef, SwitchId,
    SwitchIdentity, Tier,
};

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

#![deny(missing_docs)]

//! # PortLand: A Scalable Fault-Tolerant Layer 2 Data Center Fabric
//! This is a library for simulating the PortLand data center fabric. Hosts keep their actual
//! hardware address, while the switches rewrite it to a hierarchical *pseudo MAC address* (PMAC),
//! which encodes the location of the host in the fat-tree. This allows switches to forward with
//! tiny tables, without any broadcast based learning.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`Fabric`](fabric)**: The simulator itself. It contains the [PMAC codec](fabric::pmac),
//!   the [PMAC table](fabric::PmacTable) of the edge switches, the
//!   [fabric manager](fabric::FabricManager), the [switches](fabric::Switch) with their
//!   tier specific [forwarding policies](fabric::ForwardingPolicy), minimal
//!   [end hosts](fabric::Host), and the [network](fabric::Network) delivering the frames between
//!   them.
//!
//! - **[`Topology`](topology)**: Builders for the topologies in which PortLand operates, most
//!   importantly the [fat-tree](topology::FatTree).
//!
//! ## Usage
//!
//! Build a topology, attach the hosts, and let them send data. Address resolution happens
//! automatically through the fabric manager.
//!
//! ```
//! use portland::fabric::FabricConfig;
//! use portland::topology::FatTree;
//! use portland::Error;
//!
//! fn main() -> Result<(), Error> {
//!     let mut tree = FatTree::build(4, FabricConfig::with_seed(0))?;
//!     let a = tree.host(0, 0, 0)?;
//!     let b = tree.host(3, 1, 0)?;
//!     let b_ip = tree.net().get_host(b)?.ip();
//!
//!     tree.net_mut().send(a, b_ip, vec![42])?;
//!
//!     assert_eq!(tree.net().get_host(b)?.inbox().len(), 1);
//!     Ok(())
//! }
//! ```

mod error;
pub mod fabric;
pub mod topology;

// test modules
mod test;

pub use error::Error;

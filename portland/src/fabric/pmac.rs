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

//! # Pseudo MAC Codec
//!
//! A PMAC encodes the location of a host in the fat-tree. The six octets are laid out as
//!
//! ```text
//! [reserved][pod][position][port][vmid (2 bytes)]
//! ```
//!
//! Only `pod`, `position` and `port` are used for forwarding. Every function in this module is
//! pure.

use crate::fabric::types::{MacAddress, PortRef, Tier};
use rand::Rng;
use std::fmt;

/// Pseudo MAC address of a host, encoding its position in the fabric.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pmac(MacAddress);

impl Pmac {
    /// The unresolved sentinel. It must always be treated as a miss, never as a destination.
    pub const BROADCAST: Self = Self(MacAddress::BROADCAST);

    /// Interpret any MAC address as a PMAC.
    pub fn from_mac(mac: MacAddress) -> Self {
        Self(mac)
    }

    /// Return the underlying MAC address.
    pub fn mac(&self) -> MacAddress {
        self.0
    }

    /// Returns true if this PMAC is the unresolved (broadcast) sentinel.
    pub fn is_broadcast(&self) -> bool {
        self.0.is_broadcast()
    }

    /// Pod number encoded in the PMAC
    pub fn pod(&self) -> u8 {
        self.0.octets()[1]
    }

    /// Position of the edge switch encoded in the PMAC
    pub fn position(&self) -> u8 {
        self.0.octets()[2]
    }

    /// Port of the edge switch to which the host is attached
    pub fn port(&self) -> u8 {
        self.0.octets()[3]
    }

    /// Virtual machine id
    pub fn vmid(&self) -> u16 {
        let b = self.0.octets();
        u16::from_be_bytes([b[4], b[5]])
    }
}

impl From<Pmac> for MacAddress {
    fn from(pmac: Pmac) -> Self {
        pmac.0
    }
}

impl fmt::Display for Pmac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Pmac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pmac({})", self.0)
    }
}

/// Encode the PMAC of a host attached to port `in_port` of the edge switch at `(pod, position)`.
/// The vmid field is always `1`.
pub fn encode(pod: u8, position: u8, in_port: u8) -> Pmac {
    Pmac(MacAddress::new([0, pod, position, in_port, 0, 1]))
}

/// Decode a PMAC into `(pod, position, device_port)`.
pub fn decode(pmac: Pmac) -> (u8, u8, u8) {
    (pmac.pod(), pmac.position(), pmac.port())
}

/// Compute the output port of a switch for the destination `dst`.
///
/// - *Core*: downstream to the port of the destination pod.
/// - *Aggregation*: downstream to the destination edge switch if it is in the same pod,
///   otherwise upstream to a random core switch.
/// - *Edge*: downstream to the host if it is attached to this switch, otherwise upstream to a
///   random aggregation switch.
///
/// All upstream ports are equivalent for reachability, choosing one uniformly at random spreads
/// the load over all paths. `None` is returned if an upstream port is needed but the switch has
/// none.
pub fn output_port<R: Rng + ?Sized>(
    tier: Tier,
    pod: u8,
    position: u8,
    dst: Pmac,
    num_upper: usize,
    rng: &mut R,
) -> Option<PortRef> {
    let (dst_pod, dst_position, dst_port) = decode(dst);
    match tier {
        Tier::Core => Some(PortRef::Lower(dst_pod as usize)),
        Tier::Aggregation if pod == dst_pod => Some(PortRef::Lower(dst_position as usize)),
        Tier::Edge if pod == dst_pod && position == dst_position => {
            Some(PortRef::Lower(dst_port as usize))
        }
        Tier::Aggregation | Tier::Edge => random_upper(num_upper, rng),
    }
}

fn random_upper<R: Rng + ?Sized>(num_upper: usize, rng: &mut R) -> Option<PortRef> {
    if num_upper == 0 {
        None
    } else {
        Some(PortRef::Upper(rng.gen_range(0, num_upper)))
    }
}

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

//! Messages exchanged between the switches and the fabric manager.

use crate::fabric::pmac::Pmac;
use std::net::Ipv4Addr;

/// Message between a switch and the fabric manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FabricMessage {
    /// Register the PMAC of a newly seen host (switch to fabric manager).
    MacRegister {
        /// IP of the host
        host_ip: Ipv4Addr,
        /// PMAC assigned by the edge switch
        pmac: Pmac,
    },
    /// Ask for the PMAC of `dst_ip` (switch to fabric manager).
    ArpRequest {
        /// IP of the host asking
        src_ip: Ipv4Addr,
        /// PMAC of the host asking
        src_pmac: Pmac,
        /// IP to resolve
        dst_ip: Ipv4Addr,
    },
    /// Answer to an `ArpRequest` (fabric manager to switch). `dst_pmac` is
    /// [`Pmac::BROADCAST`] if the address is not yet known.
    ArpResponse {
        /// IP of the host asking
        src_ip: Ipv4Addr,
        /// PMAC of the host asking
        src_pmac: Pmac,
        /// IP to resolve
        dst_ip: Ipv4Addr,
        /// Resolved PMAC, or the broadcast sentinel
        dst_pmac: Pmac,
    },
    /// Instruct a core switch to flood an ARP request for `dst_ip` (fabric manager to switch).
    ArpFlood {
        /// IP to resolve
        dst_ip: Ipv4Addr,
        /// IP of the host asking
        src_ip: Ipv4Addr,
        /// PMAC of the host asking
        src_pmac: Pmac,
    },
    /// Empty acknowledgement
    Ack,
}

impl FabricMessage {
    /// Returns the name of the message kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MacRegister { .. } => "MAC_REGISTER",
            Self::ArpRequest { .. } => "ARP_REQUEST",
            Self::ArpResponse { .. } => "ARP_RESPONSE",
            Self::ArpFlood { .. } => "ARP_FLOOD",
            Self::Ack => "ACK",
        }
    }
}

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

//! # Fabric Manager
//!
//! The fabric manager is the authoritative directory of the fabric. It maps the IP address of every
//! host to its PMAC, and knows all switches. Edge switches register newly seen hosts and ask for
//! the PMAC of destinations they do not know. If the fabric manager does not know the destination
//! either, it instructs all core switches to flood an ARP request, and answers the query with the
//! broadcast sentinel. The query is not tracked: the host retries ARP, and the next query hits once
//! the destination's edge switch has registered it.

use crate::fabric::event::{Event, EventQueue};
use crate::fabric::message::FabricMessage;
use crate::fabric::pmac::Pmac;
use crate::fabric::types::{FabricManagerError, SwitchId, SwitchIdentity, Tier};
use log::*;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Counters of the fabric manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FabricManagerStats {
    /// Number of `MacRegister` messages handled
    pub registrations: usize,
    /// Number of `ArpRequest` messages handled
    pub queries: usize,
    /// Queries answered from the directory
    pub hits: usize,
    /// Queries that caused a flood
    pub misses: usize,
    /// Number of `ArpFlood` messages sent to core switches
    pub floods: usize,
    /// Messages rejected
    pub rejected: usize,
}

/// Fabric manager directory
#[derive(Debug, Clone, Default)]
pub struct FabricManager {
    switches: HashMap<SwitchId, SwitchIdentity>,
    directory: HashMap<Ipv4Addr, Pmac>,
    stats: FabricManagerStats,
}

impl FabricManager {
    /// Create a new fabric manager without any switches or entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a switch. Registering the same switch twice has no effect.
    pub fn add_switch(&mut self, switch: SwitchId, identity: SwitchIdentity) {
        if self.switches.contains_key(&switch) {
            info!("Fabric manager has already registered switch {}", identity);
        } else {
            debug!("Adding switch {} to the fabric manager", identity);
            self.switches.insert(switch, identity);
        }
    }

    /// Handle a message from a switch and return the response. Flood requests resulting from a
    /// directory miss are pushed onto `queue`.
    pub fn receive_from_switch(
        &mut self,
        switch: SwitchId,
        message: FabricMessage,
        queue: &mut EventQueue,
    ) -> Result<FabricMessage, FabricManagerError> {
        if !self.switches.contains_key(&switch) {
            self.stats.rejected += 1;
            warn!("Fabric manager received a message from an unknown switch {:?}", switch);
            return Err(FabricManagerError::UnknownSwitch(switch));
        }
        match message {
            FabricMessage::MacRegister { host_ip, pmac } => {
                self.stats.registrations += 1;
                debug!("FM: Event=PMAC Register, ip={}, pmac={}", host_ip, pmac);
                self.directory.insert(host_ip, pmac);
                Ok(FabricMessage::Ack)
            }
            FabricMessage::ArpRequest { src_ip, src_pmac, dst_ip } => {
                self.stats.queries += 1;
                debug!("FM: Event=PMAC Query, src={}/{}, dst=unknown/{}", src_pmac, src_ip, dst_ip);
                let dst_pmac = match self.directory.get(&dst_ip) {
                    Some(pmac) => {
                        self.stats.hits += 1;
                        *pmac
                    }
                    None => {
                        self.stats.misses += 1;
                        let flood = FabricMessage::ArpFlood { dst_ip, src_ip, src_pmac };
                        self.flood_arp_request(flood, switch, queue);
                        Pmac::BROADCAST
                    }
                };
                Ok(FabricMessage::ArpResponse { src_ip, src_pmac, dst_ip, dst_pmac })
            }
            message => {
                self.stats.rejected += 1;
                warn!("Fabric manager received an unexpected {} message", message.kind());
                Err(FabricManagerError::UnexpectedMessage(message))
            }
        }
    }

    /// Send the flood request to every core switch except `exclude`. Aggregation and edge switches
    /// never receive a flood from the fabric manager. Returns the number of recipients.
    pub fn flood_arp_request(
        &mut self,
        flood: FabricMessage,
        exclude: SwitchId,
        queue: &mut EventQueue,
    ) -> usize {
        let mut recipients = self
            .switches
            .iter()
            .filter(|(id, identity)| identity.tier == Tier::Core && **id != exclude)
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        // deterministic order, independent of the hash map
        recipients.sort();
        for core in recipients.iter() {
            queue.push_back(Event::FabricManager(*core, flood.clone()));
        }
        self.stats.floods += recipients.len();
        recipients.len()
    }

    /// Returns true if a PMAC is known for the IP
    pub fn is_registered(&self, ip: Ipv4Addr) -> bool {
        self.directory.contains_key(&ip)
    }

    /// Returns the PMAC of the IP, or [`Pmac::BROADCAST`] if it is not known.
    pub fn pmac_for(&self, ip: Ipv4Addr) -> Pmac {
        self.directory.get(&ip).copied().unwrap_or(Pmac::BROADCAST)
    }

    /// Returns the IP registered with the PMAC.
    pub fn ip_for(&self, pmac: Pmac) -> Option<Ipv4Addr> {
        self.directory.iter().find(|(_, p)| **p == pmac).map(|(ip, _)| *ip)
    }

    /// Returns true if the PMAC is registered for any IP
    pub fn is_pmac_registered(&self, pmac: Pmac) -> bool {
        self.ip_for(pmac).is_some()
    }

    /// Returns the identity of a registered switch
    pub fn get_switch(&self, switch: SwitchId) -> Option<SwitchIdentity> {
        self.switches.get(&switch).copied()
    }

    /// Returns all registered switches
    pub fn switches(&self) -> &HashMap<SwitchId, SwitchIdentity> {
        &self.switches
    }

    /// Returns the directory, mapping IP addresses to PMACs
    pub fn directory(&self) -> &HashMap<Ipv4Addr, Pmac> {
        &self.directory
    }

    /// Number of directory entries
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    /// Returns true if the directory is empty
    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Returns the counters of the fabric manager
    pub fn stats(&self) -> FabricManagerStats {
        self.stats
    }
}

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

//! # PMAC Table
//!
//! Local cache of an edge switch, mapping the actual address and the IP address of every attached
//! host to its PMAC and ingress port. Entries are keyed by the PMAC, and two secondary indices
//! allow lookups by IP address and by actual MAC address.

use crate::fabric::pmac::Pmac;
use crate::fabric::types::MacAddress;
use std::collections::{hash_map::Values, HashMap};
use std::net::Ipv4Addr;

/// Entry of the PMAC table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmacEntry {
    /// Pseudo MAC address assigned to the host
    pub pmac: Pmac,
    /// Actual MAC address of the host
    pub amac: MacAddress,
    /// IP address of the host
    pub ip: Ipv4Addr,
    /// Lower port on which the host is attached
    pub port: usize,
}

/// PMAC table of an edge switch. At most one entry exists per PMAC.
#[derive(Debug, Clone, Default)]
pub struct PmacTable {
    entries: HashMap<Pmac, PmacEntry>,
    by_ip: HashMap<Ipv4Addr, Pmac>,
    by_amac: HashMap<MacAddress, Pmac>,
}

impl PmacTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new entry. An existing entry with the same PMAC is overwritten, and its secondary
    /// keys are removed. Entries under a different PMAC that share the actual address or the IP
    /// address of the new entry are evicted, so every address is indexed exactly once.
    pub fn add(&mut self, pmac: Pmac, amac: MacAddress, ip: Ipv4Addr, port: usize) {
        let stale = [self.by_amac.get(&amac).copied(), self.by_ip.get(&ip).copied()];
        for old_pmac in stale.iter().flatten().filter(|p| **p != pmac) {
            if let Some(old) = self.entries.remove(old_pmac) {
                self.unindex(&old);
            }
        }
        if let Some(old) = self.entries.insert(pmac, PmacEntry { pmac, amac, ip, port }) {
            self.unindex(&old);
        }
        self.by_ip.insert(ip, pmac);
        self.by_amac.insert(amac, pmac);
    }

    /// Remove the entry of the host with the actual address `amac`. Returns the removed entry.
    pub fn remove(&mut self, amac: MacAddress) -> Option<PmacEntry> {
        let pmac = self.by_amac.get(&amac).copied()?;
        let entry = self.entries.remove(&pmac)?;
        self.unindex(&entry);
        Some(entry)
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_ip.clear();
        self.by_amac.clear();
    }

    /// Get the port on which the host with the given PMAC is attached.
    pub fn find_port(&self, pmac: Pmac) -> Option<usize> {
        self.entries.get(&pmac).map(|e| e.port)
    }

    /// Get the port on which the host with the given IP is attached.
    pub fn find_port_by_ip(&self, ip: Ipv4Addr) -> Option<usize> {
        self.lookup_ip(ip).map(|e| e.port)
    }

    /// Get the actual address of the host with the given PMAC.
    pub fn find_amac(&self, pmac: Pmac) -> Option<MacAddress> {
        self.entries.get(&pmac).map(|e| e.amac)
    }

    /// Get the actual address of the host with the given IP.
    pub fn find_amac_by_ip(&self, ip: Ipv4Addr) -> Option<MacAddress> {
        self.lookup_ip(ip).map(|e| e.amac)
    }

    /// Get the PMAC of the host with the given actual address.
    pub fn find_pmac(&self, amac: MacAddress) -> Option<Pmac> {
        self.by_amac.get(&amac).copied()
    }

    /// Get the PMAC of the host with the given IP address.
    pub fn find_pmac_by_ip(&self, ip: Ipv4Addr) -> Option<Pmac> {
        self.by_ip.get(&ip).copied()
    }

    /// Get the entire entry for a PMAC
    pub fn get(&self, pmac: Pmac) -> Option<&PmacEntry> {
        self.entries.get(&pmac)
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries (in arbitrary order)
    pub fn iter(&self) -> Values<'_, Pmac, PmacEntry> {
        self.entries.values()
    }

    fn lookup_ip(&self, ip: Ipv4Addr) -> Option<&PmacEntry> {
        self.by_ip.get(&ip).and_then(|pmac| self.entries.get(pmac))
    }

    /// Remove the secondary keys of `entry`, but only if they still point to its PMAC. Another
    /// entry may have taken over the IP or the actual address in the meantime.
    fn unindex(&mut self, entry: &PmacEntry) {
        if self.by_ip.get(&entry.ip) == Some(&entry.pmac) {
            self.by_ip.remove(&entry.ip);
        }
        if self.by_amac.get(&entry.amac) == Some(&entry.pmac) {
            self.by_amac.remove(&entry.amac);
        }
    }
}

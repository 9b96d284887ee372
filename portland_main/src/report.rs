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

//! Summary of a simulation run, stored as json

use portland::topology::FatTree;

use serde::Serialize;
use std::collections::BTreeMap;

/// Result type that contains the entire output
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Parameter k of the fat-tree
    pub k: usize,
    /// Seed used for the run, if any
    pub seed: Option<u64>,
    /// Number of flows sent by the hosts
    pub sent: usize,
    /// Number of packets which arrived at their destination host
    pub delivered: usize,
    /// Number of packets still waiting for the address resolution
    pub pending: usize,
    /// Total number of events processed by the network
    pub num_events: usize,
    /// Counters of the fabric manager
    pub fabric_manager: FabricManagerReport,
    /// Counters of every switch, sorted by name
    pub switches: Vec<SwitchReport>,
}

/// Counters of the fabric manager
#[derive(Debug, Clone, Serialize)]
pub struct FabricManagerReport {
    directory_size: usize,
    registrations: usize,
    queries: usize,
    hits: usize,
    misses: usize,
    floods: usize,
    rejected: usize,
}

/// Counters of a single switch
#[derive(Debug, Clone, Serialize)]
pub struct SwitchReport {
    name: String,
    identity: String,
    received: usize,
    transmitted: usize,
    dropped: BTreeMap<String, usize>,
    pmac_entries: usize,
}

impl Report {
    /// Collect the counters of all devices in the fat-tree
    pub fn new(tree: &FatTree, seed: Option<u64>, sent: usize) -> Self {
        let net = tree.net();
        let fm = net.fabric_manager();
        let fm_stats = fm.stats();

        let hosts = net.hosts().into_iter().filter_map(|h| net.get_host(h).ok()).collect::<Vec<_>>();
        let delivered = hosts.iter().map(|h| h.inbox().len()).sum();
        let pending = hosts.iter().map(|h| h.total_pending()).sum();

        let mut switches = net
            .switches()
            .into_iter()
            .filter_map(|s| net.get_switch(s).ok())
            .map(|s| SwitchReport {
                name: s.name().to_string(),
                identity: s.identity().to_string(),
                received: s.stats().received,
                transmitted: s.stats().transmitted,
                dropped: s
                    .stats()
                    .drops
                    .iter()
                    .map(|(reason, n)| (format!("{:?}", reason), *n))
                    .collect(),
                pmac_entries: s.pmac_table().len(),
            })
            .collect::<Vec<_>>();
        switches.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            k: tree.k(),
            seed,
            sent,
            delivered,
            pending,
            num_events: net.num_events_processed(),
            fabric_manager: FabricManagerReport {
                directory_size: fm.len(),
                registrations: fm_stats.registrations,
                queries: fm_stats.queries,
                hits: fm_stats.hits,
                misses: fm_stats.misses,
                floods: fm_stats.floods,
                rejected: fm_stats.rejected,
            },
            switches,
        }
    }

    /// One-line summary of the run
    pub fn summary(&self) -> String {
        let dropped: usize = self.switches.iter().flat_map(|s| s.dropped.values()).sum();
        format!(
            "[k={}, events={}] delivered {}/{}, pending {}, dropped {}, directory {} (hits={}, misses={}, floods={})",
            self.k,
            self.num_events,
            self.delivered,
            self.sent,
            self.pending,
            dropped,
            self.fabric_manager.directory_size,
            self.fabric_manager.hits,
            self.fabric_manager.misses,
            self.fabric_manager.floods,
        )
    }
}

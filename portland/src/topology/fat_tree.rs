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

//! # Fat-Tree
//!
//! A fat-tree with parameter `k` has `k` pods. Each pod contains `k/2` edge and `k/2` aggregation
//! switches, and `(k/2)^2` core switches connect the pods. Every switch has `k` ports, half of
//! them pointing down and half of them pointing up (core switches only have `k` lower ports).
//!
//! The wiring is chosen such that the PMAC forwarding works without any configuration:
//!
//! - Upper port `j` of edge switch `e` in pod `p` is connected to lower port `e` of aggregation
//!   switch `j` in pod `p`.
//! - Upper port `i` of aggregation switch `a` in pod `p` is connected to lower port `p` of core
//!   switch `a * k/2 + i`.
//!
//! Host `h` of edge switch `e` in pod `p` is attached to lower port `h` of the edge switch, and has
//! the IP address `10.p.e.(h + 2)`.

use super::TopologyError;
use crate::fabric::{
    DeviceError, Endpoint, FabricConfig, HostId, MacAddress, Network, NetworkError, PortRef,
    SwitchId, SwitchIdentity,
};
use itertools::iproduct;
use log::*;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Largest supported fat-tree parameter. The index of every core switch must fit into one octet.
pub const MAX_K: usize = 32;

/// Fat-tree topology, wrapping the [`Network`].
#[derive(Debug)]
pub struct FatTree {
    k: usize,
    net: Network,
    edges: Vec<Vec<SwitchId>>,
    aggregations: Vec<Vec<SwitchId>>,
    cores: Vec<SwitchId>,
    hosts: HashMap<(usize, usize, usize), HostId>,
}

impl FatTree {
    /// Create all switches and links of the fat-tree, without any hosts.
    pub fn new(k: usize, config: FabricConfig) -> Result<Self, TopologyError> {
        if k < 2 || k % 2 != 0 || k > MAX_K {
            return Err(TopologyError::InvalidK(k));
        }
        let half = k / 2;
        let mut net = Network::new(config);

        let mut edges = Vec::with_capacity(k);
        let mut aggregations = Vec::with_capacity(k);
        for pod in 0..k {
            edges.push(
                (0..half)
                    .map(|e| {
                        let id = SwitchIdentity::edge(pod as u8, e as u8);
                        net.add_switch(format!("edge-{}-{}", pod, e), id, half, half)
                    })
                    .collect::<Vec<_>>(),
            );
            aggregations.push(
                (0..half)
                    .map(|a| {
                        let id = SwitchIdentity::aggregation(pod as u8, a as u8);
                        net.add_switch(format!("agg-{}-{}", pod, a), id, half, half)
                    })
                    .collect::<Vec<_>>(),
            );
        }
        let cores = (0..half * half)
            .map(|c| {
                let id = SwitchIdentity::core(k as u8, c as u8);
                net.add_switch(format!("core-{}", c), id, k, 0)
            })
            .collect::<Vec<_>>();

        for (pod, e, j) in iproduct!(0..k, 0..half, 0..half) {
            net.add_link(
                Endpoint::new(edges[pod][e], PortRef::Upper(j)),
                Endpoint::new(aggregations[pod][j], PortRef::Lower(e)),
            )?;
        }
        for (pod, a, i) in iproduct!(0..k, 0..half, 0..half) {
            net.add_link(
                Endpoint::new(aggregations[pod][a], PortRef::Upper(i)),
                Endpoint::new(cores[a * half + i], PortRef::Lower(pod)),
            )?;
        }

        info!("Created a fat-tree with k = {}: {} switches", k, net.switches().len());
        Ok(Self { k, net, edges, aggregations, cores, hosts: HashMap::new() })
    }

    /// Create the fat-tree including `k/2` hosts on every edge switch. The host at port `h` of
    /// edge switch `e` in pod `p` is called `host-p-e-h`, has the IP address `10.p.e.(h + 2)` and
    /// the hardware address `02:00:00:p:e:(h + 2)`.
    pub fn build(k: usize, config: FabricConfig) -> Result<Self, TopologyError> {
        let mut tree = Self::new(k, config)?;
        let half = k / 2;
        for (pod, e, h) in iproduct!(0..k, 0..half, 0..half) {
            let amac = MacAddress::new([0x02, 0, 0, pod as u8, e as u8, h as u8 + 2]);
            let ip = Ipv4Addr::new(10, pod as u8, e as u8, h as u8 + 2);
            tree.add_host(pod, e, h, amac, ip)?;
        }
        Ok(tree)
    }

    /// Attach a new host to port `port` of the edge switch `edge` in pod `pod`.
    pub fn add_host(
        &mut self,
        pod: usize,
        edge: usize,
        port: usize,
        amac: MacAddress,
        ip: Ipv4Addr,
    ) -> Result<HostId, TopologyError> {
        let switch = self.edge(pod, edge)?;
        if port >= self.k / 2 {
            return Err(TopologyError::InvalidLocation { pod, position: edge, port });
        }
        if self.hosts.contains_key(&(pod, edge, port)) {
            let err = DeviceError::PortAlreadyConnected(PortRef::Lower(port));
            return Err(NetworkError::from(err).into());
        }
        let host = self.net.add_host(format!("host-{}-{}-{}", pod, edge, port), amac, ip);
        self.net.attach_host(host, switch, port)?;
        self.hosts.insert((pod, edge, port), host);
        Ok(host)
    }

    /// The parameter `k`
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the network
    pub fn net(&self) -> &Network {
        &self.net
    }

    /// Returns the network for sending data
    pub fn net_mut(&mut self) -> &mut Network {
        &mut self.net
    }

    /// Consume the topology and return the network
    pub fn into_net(self) -> Network {
        self.net
    }

    /// Edge switch `position` of pod `pod`
    pub fn edge(&self, pod: usize, position: usize) -> Result<SwitchId, TopologyError> {
        self.edges
            .get(pod)
            .and_then(|p| p.get(position))
            .copied()
            .ok_or(TopologyError::InvalidLocation { pod, position, port: 0 })
    }

    /// Aggregation switch `position` of pod `pod`
    pub fn aggregation(&self, pod: usize, position: usize) -> Result<SwitchId, TopologyError> {
        self.aggregations
            .get(pod)
            .and_then(|p| p.get(position))
            .copied()
            .ok_or(TopologyError::InvalidLocation { pod, position, port: 0 })
    }

    /// Core switch `index`
    pub fn core(&self, index: usize) -> Result<SwitchId, TopologyError> {
        self.cores
            .get(index)
            .copied()
            .ok_or(TopologyError::InvalidLocation { pod: self.k, position: index, port: 0 })
    }

    /// Host attached to port `port` of edge switch `edge` in pod `pod`
    pub fn host(&self, pod: usize, edge: usize, port: usize) -> Result<HostId, TopologyError> {
        self.hosts
            .get(&(pod, edge, port))
            .copied()
            .ok_or(TopologyError::InvalidLocation { pod, position: edge, port })
    }

    /// All edge switches, pod by pod
    pub fn edges(&self) -> impl Iterator<Item = SwitchId> + '_ {
        self.edges.iter().flatten().copied()
    }

    /// All aggregation switches, pod by pod
    pub fn aggregations(&self) -> impl Iterator<Item = SwitchId> + '_ {
        self.aggregations.iter().flatten().copied()
    }

    /// All core switches
    pub fn cores(&self) -> &[SwitchId] {
        &self.cores
    }

    /// All hosts, sorted by their location
    pub fn hosts(&self) -> Vec<HostId> {
        let mut hosts = self.hosts.iter().collect::<Vec<_>>();
        hosts.sort();
        hosts.into_iter().map(|(_, id)| *id).collect()
    }
}

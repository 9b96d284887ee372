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

//! Test the fat-tree builder.

use crate::fabric::{Endpoint, FabricConfig, MacAddress, PortRef, SwitchIdentity, Tier};
use crate::topology::{FatTree, TopologyError, MAX_K};
use std::net::Ipv4Addr;

#[test]
fn test_invalid_k() {
    for k in [0, 1, 3, 5, MAX_K + 2].iter() {
        assert_eq!(FatTree::new(*k, FabricConfig::default()).err(), Some(TopologyError::InvalidK(*k)));
    }
    assert!(FatTree::new(2, FabricConfig::default()).is_ok());
    assert!(FatTree::new(MAX_K, FabricConfig::default()).is_ok());
}

#[test]
fn test_size() {
    let tree = FatTree::build(4, FabricConfig::with_seed(0)).unwrap();
    assert_eq!(tree.k(), 4);
    assert_eq!(tree.edges().count(), 8);
    assert_eq!(tree.aggregations().count(), 8);
    assert_eq!(tree.cores().len(), 4);
    assert_eq!(tree.hosts().len(), 16);
    assert_eq!(tree.net().switches().len(), 20);
    assert_eq!(tree.net().fabric_manager().switches().len(), 20);
    // edge-agg, agg-core and host links
    assert_eq!(tree.net().links().count(), 16 + 16 + 16);
    assert_eq!(tree.net().get_topology().edge_count(), 48);
}

#[test]
fn test_identities() {
    let tree = FatTree::build(4, FabricConfig::with_seed(0)).unwrap();
    let net = tree.net();
    let edge = net.get_switch(tree.edge(3, 1).unwrap()).unwrap();
    assert_eq!(edge.identity(), SwitchIdentity::edge(3, 1));
    assert_eq!(edge.name(), "edge-3-1");
    assert_eq!(edge.num_lower_ports(), 2);
    assert_eq!(edge.num_upper_ports(), 2);

    let agg = net.get_switch(tree.aggregation(2, 0).unwrap()).unwrap();
    assert_eq!(agg.identity(), SwitchIdentity::aggregation(2, 0));
    assert_eq!(agg.tier(), Tier::Aggregation);

    let core = net.get_switch(tree.core(3).unwrap()).unwrap();
    assert_eq!(core.identity(), SwitchIdentity::core(4, 3));
    assert_eq!(core.num_lower_ports(), 4);
    assert_eq!(core.num_upper_ports(), 0);
}

#[test]
fn test_wiring() {
    let k = 6;
    let half = k / 2;
    let tree = FatTree::new(k, FabricConfig::with_seed(0)).unwrap();
    let net = tree.net();
    for pod in 0..k {
        for e in 0..half {
            let edge = net.get_switch(tree.edge(pod, e).unwrap()).unwrap();
            for j in 0..half {
                let peer = edge.port(PortRef::Upper(j)).unwrap().peer();
                let expected = Endpoint::new(tree.aggregation(pod, j).unwrap(), PortRef::Lower(e));
                assert_eq!(peer, Some(expected));
            }
        }
        for a in 0..half {
            let agg = net.get_switch(tree.aggregation(pod, a).unwrap()).unwrap();
            for i in 0..half {
                let peer = agg.port(PortRef::Upper(i)).unwrap().peer();
                let expected = Endpoint::new(tree.core(a * half + i).unwrap(), PortRef::Lower(pod));
                assert_eq!(peer, Some(expected));
            }
        }
    }
}

#[test]
fn test_hosts() {
    let tree = FatTree::build(4, FabricConfig::with_seed(0)).unwrap();
    let h = tree.net().get_host(tree.host(2, 1, 0).unwrap()).unwrap();
    assert_eq!(h.ip(), Ipv4Addr::new(10, 2, 1, 2));
    assert_eq!(h.amac(), MacAddress::new([0x02, 0, 0, 2, 1, 2]));
    assert_eq!(h.name(), "host-2-1-0");
    assert_eq!(h.uplink(), Some(Endpoint::new(tree.edge(2, 1).unwrap(), PortRef::Lower(0))));

    assert_eq!(
        tree.host(4, 0, 0).err(),
        Some(TopologyError::InvalidLocation { pod: 4, position: 0, port: 0 })
    );
}

#[test]
fn test_switch_and_host_addresses_are_distinct() {
    let tree = FatTree::build(4, FabricConfig::with_seed(0)).unwrap();
    let net = tree.net();
    let mut addresses: Vec<MacAddress> =
        net.switches().into_iter().map(|s| net.get_switch(s).unwrap().address()).collect();
    addresses.extend(net.hosts().into_iter().map(|h| net.get_host(h).unwrap().amac()));
    let num = addresses.len();
    addresses.sort();
    addresses.dedup();
    assert_eq!(addresses.len(), num);

    let agg = net.get_switch(tree.aggregation(0, 0).unwrap()).unwrap();
    let host = net.get_host(tree.host(0, 0, 0).unwrap()).unwrap();
    assert_ne!(agg.address(), host.amac());
}

#[test]
fn test_add_host_errors() {
    let mut tree = FatTree::new(4, FabricConfig::with_seed(0)).unwrap();
    let amac = MacAddress::new([0x02, 0, 0, 0, 0, 1]);
    let ip = Ipv4Addr::new(10, 0, 0, 2);
    assert_eq!(
        tree.add_host(0, 0, 2, amac, ip).err(),
        Some(TopologyError::InvalidLocation { pod: 0, position: 0, port: 2 })
    );
    assert_eq!(
        tree.add_host(0, 2, 0, amac, ip).err(),
        Some(TopologyError::InvalidLocation { pod: 0, position: 2, port: 0 })
    );
    assert!(tree.add_host(0, 0, 0, amac, ip).is_ok());
    assert!(tree.add_host(0, 0, 0, amac, ip).is_err());
}

#[test]
fn test_all_hosts_reach_each_other() {
    let mut tree = FatTree::build(4, FabricConfig::with_seed(3)).unwrap();
    let hosts = tree.hosts();
    let ips: Vec<Ipv4Addr> =
        hosts.iter().map(|h| tree.net().get_host(*h).unwrap().ip()).collect();
    for (i, src) in hosts.iter().enumerate() {
        let dst = ips[(i + 5) % hosts.len()];
        tree.net_mut().send(*src, dst, vec![i as u8]).unwrap();
    }
    for (i, h) in hosts.iter().enumerate() {
        let inbox = tree.net().get_host(*h).unwrap().inbox();
        let sender = (i + hosts.len() - 5) % hosts.len();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].data, vec![sender as u8]);
        assert_eq!(inbox[0].src, ips[sender]);
    }
    // every host was resolved through the fabric manager
    assert_eq!(tree.net().fabric_manager().len(), 16);
}

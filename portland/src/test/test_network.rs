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

//! Test the network transport, and the complete address resolution between hosts.

use crate::fabric::pmac;
use crate::fabric::printer;
use crate::fabric::{
    ArpPacket, DeviceError, DropReason, Endpoint, EventQueue, FabricConfig, FabricMessage, Frame,
    MacAddress, Network, NetworkDevice, NetworkError, Payload, PortRef, SwitchIdentity, Tier,
};
use crate::topology::FatTree;
use lazy_static::lazy_static;
use std::net::Ipv4Addr;

lazy_static! {
    static ref IP_A: Ipv4Addr = Ipv4Addr::new(10, 0, 1, 2);
    static ref IP_B: Ipv4Addr = Ipv4Addr::new(10, 0, 2, 5);
    static ref AMAC_A: MacAddress = MacAddress::new([0x02, 0, 0, 0, 0, 0x0a]);
    static ref AMAC_B: MacAddress = MacAddress::new([0x02, 0, 0, 0, 0, 0x0b]);
}

/// Fat-tree with `k = 4`, and only two hosts: A at port 0 of edge switch 0 in pod 0, and B at
/// port 1 of edge switch 1 in pod 1.
fn get_test_tree() -> FatTree {
    let mut tree = FatTree::new(4, FabricConfig::with_seed(7)).unwrap();
    tree.add_host(0, 0, 0, *AMAC_A, *IP_A).unwrap();
    tree.add_host(1, 1, 1, *AMAC_B, *IP_B).unwrap();
    tree
}

#[test]
fn test_first_frame_end_to_end() {
    let mut tree = get_test_tree();
    let a = tree.host(0, 0, 0).unwrap();
    let b = tree.host(1, 1, 1).unwrap();
    let edge_a = tree.edge(0, 0).unwrap();
    let edge_b = tree.edge(1, 1).unwrap();
    let pmac_a = pmac::encode(0, 0, 0);
    let pmac_b = pmac::encode(1, 1, 1);
    assert_eq!(pmac_a.mac().octets(), [0, 0, 0, 0, 0, 1]);

    tree.net_mut().send(a, *IP_B, b"hello".to_vec()).unwrap();
    let net = tree.net();

    // the first ARP request of A was dropped, and flooded through all core switches
    assert_eq!(net.get_switch(edge_a).unwrap().stats().dropped(DropReason::Unresolved), 1);
    assert_eq!(net.fabric_manager().stats().misses, 1);
    assert_eq!(net.fabric_manager().stats().floods, 4);

    // both hosts are registered
    assert_eq!(net.fabric_manager().pmac_for(*IP_A), pmac_a);
    assert_eq!(net.fabric_manager().pmac_for(*IP_B), pmac_b);
    assert_eq!(net.get_switch(edge_a).unwrap().pmac_table().find_amac(pmac_a), Some(*AMAC_A));
    assert_eq!(net.get_switch(edge_b).unwrap().pmac_table().find_amac(pmac_b), Some(*AMAC_B));

    // the hosts only know each other by their PMAC
    assert_eq!(net.get_host(a).unwrap().resolve(*IP_B), Some(pmac_b.mac()));
    assert_eq!(net.get_host(b).unwrap().resolve(*IP_A), Some(pmac_a.mac()));

    // the data was delivered exactly once
    let inbox = net.get_host(b).unwrap().inbox();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].src, *IP_A);
    assert_eq!(inbox[0].data, b"hello".to_vec());
    assert_eq!(net.get_host(a).unwrap().num_pending(*IP_B), 0);

    // a later query of edge switch A hits
    let mut fm = net.fabric_manager().clone();
    let mut queue = EventQueue::new();
    let query = FabricMessage::ArpRequest { src_ip: *IP_A, src_pmac: pmac_a, dst_ip: *IP_B };
    assert_eq!(
        fm.receive_from_switch(edge_a, query, &mut queue),
        Ok(FabricMessage::ArpResponse {
            src_ip: *IP_A,
            src_pmac: pmac_a,
            dst_ip: *IP_B,
            dst_pmac: pmac_b
        })
    );
    assert!(queue.is_empty());
}

#[test]
fn test_reverse_direction_needs_no_arp() {
    let mut tree = get_test_tree();
    let a = tree.host(0, 0, 0).unwrap();
    let b = tree.host(1, 1, 1).unwrap();
    tree.net_mut().send(a, *IP_B, vec![1]).unwrap();
    tree.net_mut().send(b, *IP_A, vec![2]).unwrap();
    tree.net_mut().send(a, *IP_B, vec![3]).unwrap();

    let net = tree.net();
    assert_eq!(net.get_host(b).unwrap().stats().arp_requests, 0);
    assert_eq!(net.get_host(a).unwrap().stats().arp_requests, 1);
    let data_a: Vec<_> = net.get_host(a).unwrap().inbox().iter().map(|p| p.data.clone()).collect();
    let data_b: Vec<_> = net.get_host(b).unwrap().inbox().iter().map(|p| p.data.clone()).collect();
    assert_eq!(data_a, vec![vec![2]]);
    assert_eq!(data_b, vec![vec![1], vec![3]]);
    assert_eq!(net.fabric_manager().stats().misses, 1);
}

#[test]
fn test_unknown_destination_stays_pending() {
    let mut tree = get_test_tree();
    let a = tree.host(0, 0, 0).unwrap();
    let unknown = Ipv4Addr::new(10, 3, 0, 2);

    tree.net_mut().send(a, unknown, vec![1]).unwrap();
    tree.net_mut().send(a, unknown, vec![2]).unwrap();
    assert_eq!(tree.net().get_host(a).unwrap().num_pending(unknown), 2);
    assert_eq!(tree.net().get_host(a).unwrap().stats().arp_requests, 1);

    assert_eq!(tree.net_mut().retransmit_arp(a), Ok(1));
    assert_eq!(tree.net().get_host(a).unwrap().num_pending(unknown), 2);
    assert_eq!(tree.net().get_host(a).unwrap().total_pending(), 2);
    assert_eq!(tree.net().get_host(a).unwrap().stats().arp_requests, 2);
    assert_eq!(tree.net().fabric_manager().stats().misses, 2);
    assert!(!tree.net().fabric_manager().is_registered(unknown));
}

#[test]
fn test_retransmit_resolves_late_host() {
    let mut tree = get_test_tree();
    let a = tree.host(0, 0, 0).unwrap();
    let ip_c = Ipv4Addr::new(10, 3, 1, 3);

    // C is not yet attached
    tree.net_mut().send(a, ip_c, vec![1]).unwrap();
    let c = tree.add_host(3, 1, 1, MacAddress::new([0x02, 0, 0, 0, 0, 0x0c]), ip_c).unwrap();
    assert_eq!(tree.net_mut().retransmit_arp(a), Ok(1));

    assert_eq!(tree.net().get_host(c).unwrap().inbox().len(), 1);
    assert_eq!(tree.net().get_host(a).unwrap().num_pending(ip_c), 0);
    assert_eq!(tree.net_mut().retransmit_arp(a), Ok(0));
}

#[test]
fn test_inject() {
    let mut tree = get_test_tree();
    let edge = tree.edge(2, 0).unwrap();
    let amac = MacAddress::new([0x02, 0, 0, 0, 0, 0x0d]);
    let ip = Ipv4Addr::new(10, 2, 0, 2);
    let arp = ArpPacket::request(amac, ip, *IP_A);
    let frame = Frame::new(amac, MacAddress::BROADCAST, Payload::Arp(arp));

    // nobody is attached to this port, the answer of A gets lost at the edge switch.
    tree.net_mut().inject(edge, PortRef::Lower(0), frame).unwrap();
    assert_eq!(tree.net().fabric_manager().pmac_for(ip), pmac::encode(2, 0, 0));
    let stats = tree.net().get_switch(edge).unwrap().port(PortRef::Lower(0)).unwrap().stats();
    assert_eq!(stats.rx_packets, 1);
    assert!(stats.tx_dropped >= 1);

    // frames can only be injected into switches
    let host = tree.host(0, 0, 0).unwrap();
    let frame = Frame::new(amac, amac, Payload::Raw { ether_type: 0x88cc, data: vec![] });
    assert_eq!(
        tree.net_mut().inject(host, PortRef::Lower(0), frame),
        Err(NetworkError::DeviceIsNotASwitch(host))
    );
}

#[test]
fn test_no_convergence() {
    let mut tree = get_test_tree();
    let a = tree.host(0, 0, 0).unwrap();
    tree.net_mut().set_stop_after(Some(3));
    assert_eq!(tree.net_mut().send(a, *IP_B, vec![1]), Err(NetworkError::NoConvergence));
}

#[test]
fn test_lookup_and_printer() {
    let mut tree = get_test_tree();
    let a = tree.host(0, 0, 0).unwrap();
    tree.net_mut().send(a, *IP_B, vec![1]).unwrap();
    let net = tree.net();

    assert_eq!(net.get_switch_id("edge-0-0"), Ok(tree.edge(0, 0).unwrap()));
    assert_eq!(net.get_switch_id("core-3"), Ok(tree.core(3).unwrap()));
    assert_eq!(net.get_host_id("host-1-1-1"), Ok(tree.host(1, 1, 1).unwrap()));
    assert_eq!(
        net.get_switch_id("edge-9-9"),
        Err(NetworkError::DeviceNameNotFound("edge-9-9".to_string()))
    );
    assert_eq!(net.get_device_name(a), Ok("host-0-0-0"));
    assert_eq!(net.get_switch(a).map(|_| ()), Err(NetworkError::DeviceIsNotASwitch(a)));
    let core = tree.core(0).unwrap();
    assert_eq!(net.get_host(core).map(|_| ()), Err(NetworkError::DeviceIsNotAHost(core)));
    assert!(matches!(net.get_device(a), NetworkDevice::Host(h) if h.ip() == *IP_A));
    assert!(matches!(net.get_device(core), NetworkDevice::Switch(s) if s.tier() == Tier::Core));
    assert!(matches!(net.get_device(999.into()), NetworkDevice::None));
    assert_eq!(net.get_host(999.into()).map(|_| ()), Err(NetworkError::DeviceNotFound(999.into())));
    assert_eq!(net.switches().len(), 20);
    assert_eq!(net.hosts(), vec![a, tree.host(1, 1, 1).unwrap()]);

    assert_eq!(
        printer::directory(net),
        vec![
            "10.0.1.2 -> 00:00:00:00:00:01".to_string(),
            "10.0.2.5 -> 00:01:01:01:00:01".to_string()
        ]
    );
    assert_eq!(
        printer::pmac_table(net, tree.edge(0, 0).unwrap()),
        Ok(vec!["00:00:00:00:00:01 -> 02:00:00:00:00:0a (10.0.1.2), port 0".to_string()])
    );
    assert!(printer::pmac_table(net, a).is_err());
}

#[test]
fn test_link_errors() {
    let mut net = Network::new(FabricConfig::with_seed(0));
    let edge = net.add_switch("edge", SwitchIdentity::edge(0, 0), 2, 1);
    let agg = net.add_switch("agg", SwitchIdentity::aggregation(0, 0), 1, 0);
    let h1 = net.add_host("h1", *AMAC_A, *IP_A);
    let h2 = net.add_host("h2", *AMAC_B, *IP_B);

    // links must go from an upper port to a lower port
    let up = Endpoint::new(edge, PortRef::Upper(0));
    let down = Endpoint::new(agg, PortRef::Lower(0));
    assert_eq!(net.add_link(down, up), Err(NetworkError::InvalidLink(down, up)));
    assert_eq!(
        net.add_link(up, Endpoint::new(agg, PortRef::Lower(3))),
        Err(NetworkError::DeviceError(DeviceError::InvalidPort(PortRef::Lower(3))))
    );
    assert_eq!(net.add_link(up, down), Ok(()));
    assert_eq!(
        net.add_link(up, down),
        Err(NetworkError::DeviceError(DeviceError::PortAlreadyConnected(PortRef::Upper(0))))
    );

    // hosts
    assert_eq!(
        net.send(h1, *IP_B, vec![]),
        Err(NetworkError::DeviceError(DeviceError::NotConnected))
    );
    assert_eq!(net.attach_host(h1, edge, 0), Ok(()));
    assert_eq!(
        net.attach_host(h1, edge, 1),
        Err(NetworkError::DeviceError(DeviceError::PortAlreadyConnected(PortRef::Upper(0))))
    );
    assert_eq!(
        net.attach_host(h2, edge, 0),
        Err(NetworkError::DeviceError(DeviceError::PortAlreadyConnected(PortRef::Lower(0))))
    );
    assert_eq!(net.attach_host(h2, h1, 0), Err(NetworkError::DeviceIsNotASwitch(h1)));
    assert_eq!(net.links().count(), 2);
    assert_eq!(net.get_topology().edge_count(), 2);
}

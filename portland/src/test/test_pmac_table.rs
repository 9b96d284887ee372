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

//! Test the PMAC table and its secondary indices.

use crate::fabric::pmac;
use crate::fabric::{MacAddress, PmacTable};
use std::net::Ipv4Addr;

fn amac(x: u8) -> MacAddress {
    MacAddress::new([0x02, 0, 0, 0, 0, x])
}

#[test]
fn test_add_and_find() {
    let mut t = PmacTable::new();
    assert!(t.is_empty());
    let p = pmac::encode(0, 1, 0);
    let ip = Ipv4Addr::new(10, 0, 1, 2);
    t.add(p, amac(1), ip, 0);

    assert_eq!(t.len(), 1);
    assert_eq!(t.find_port(p), Some(0));
    assert_eq!(t.find_port_by_ip(ip), Some(0));
    assert_eq!(t.find_amac(p), Some(amac(1)));
    assert_eq!(t.find_amac_by_ip(ip), Some(amac(1)));
    assert_eq!(t.find_pmac(amac(1)), Some(p));
    assert_eq!(t.find_pmac_by_ip(ip), Some(p));

    assert_eq!(t.find_amac(pmac::encode(0, 1, 1)), None);
    assert_eq!(t.find_pmac_by_ip(Ipv4Addr::new(10, 0, 1, 3)), None);
    assert_eq!(t.find_pmac(amac(2)), None);
}

#[test]
fn test_overwrite_keeps_indices_consistent() {
    let mut t = PmacTable::new();
    let p = pmac::encode(0, 1, 0);
    let old_ip = Ipv4Addr::new(10, 0, 1, 2);
    let new_ip = Ipv4Addr::new(10, 0, 1, 9);
    t.add(p, amac(1), old_ip, 0);
    // a new host appears on the same port
    t.add(p, amac(2), new_ip, 0);

    assert_eq!(t.len(), 1);
    assert_eq!(t.find_amac(p), Some(amac(2)));
    assert_eq!(t.find_pmac_by_ip(new_ip), Some(p));
    assert_eq!(t.find_pmac_by_ip(old_ip), None);
    assert_eq!(t.find_pmac(amac(1)), None);
    assert_eq!(t.find_pmac(amac(2)), Some(p));
}

#[test]
fn test_remove() {
    let mut t = PmacTable::new();
    let p0 = pmac::encode(0, 1, 0);
    let p1 = pmac::encode(0, 1, 1);
    let ip0 = Ipv4Addr::new(10, 0, 1, 2);
    let ip1 = Ipv4Addr::new(10, 0, 1, 3);
    t.add(p0, amac(1), ip0, 0);
    t.add(p1, amac(2), ip1, 1);

    let removed = t.remove(amac(1)).unwrap();
    assert_eq!(removed.pmac, p0);
    assert_eq!(removed.ip, ip0);
    assert_eq!(t.len(), 1);
    assert_eq!(t.find_pmac_by_ip(ip0), None);
    assert_eq!(t.find_amac(p0), None);
    assert_eq!(t.find_pmac_by_ip(ip1), Some(p1));
    assert!(t.remove(amac(1)).is_none());

    t.clear();
    assert!(t.is_empty());
    assert_eq!(t.find_pmac(amac(2)), None);
}

#[test]
fn test_moved_host_evicts_old_entry() {
    let mut t = PmacTable::new();
    let p0 = pmac::encode(0, 0, 0);
    let p1 = pmac::encode(0, 0, 1);
    let old_ip = Ipv4Addr::new(10, 0, 0, 2);
    let new_ip = Ipv4Addr::new(10, 0, 0, 3);
    t.add(p0, amac(9), old_ip, 0);
    // same host shows up on another port with a new IP
    t.add(p1, amac(9), new_ip, 1);

    assert_eq!(t.len(), 1);
    assert_eq!(t.find_amac(p0), None);
    assert_eq!(t.find_pmac_by_ip(old_ip), None);
    assert_eq!(t.find_pmac(amac(9)), Some(p1));

    assert_eq!(t.remove(amac(9)).map(|e| e.pmac), Some(p1));
    assert!(t.is_empty());
}

#[test]
fn test_reused_ip_evicts_old_entry() {
    let mut t = PmacTable::new();
    let p0 = pmac::encode(0, 0, 0);
    let p1 = pmac::encode(0, 0, 1);
    let ip = Ipv4Addr::new(10, 0, 0, 2);
    t.add(p0, amac(1), ip, 0);
    t.add(p1, amac(2), ip, 1);

    assert_eq!(t.len(), 1);
    assert_eq!(t.find_pmac(amac(1)), None);
    assert_eq!(t.find_pmac_by_ip(ip), Some(p1));
    assert_eq!(t.iter().map(|e| e.pmac).collect::<Vec<_>>(), vec![p1]);
}

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

//! Module defining an end host, attached to a single edge switch.
//!
//! Hosts are unaware of PortLand. They use their actual hardware address, and resolve IP
//! addresses with plain ARP. Data sent to an unresolved address is queued until the ARP reply
//! arrives.

use crate::fabric::event::{Event, EventQueue};
use crate::fabric::frame::{ArpPacket, Frame, Ipv4Packet, Payload};
use crate::fabric::types::{DeviceError, Endpoint, HostId, MacAddress, PortRef};
use log::*;
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

/// Counters of a host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Frames sent
    pub sent: usize,
    /// Frames received (including ignored ones)
    pub received: usize,
    /// ARP requests sent
    pub arp_requests: usize,
    /// ARP replies sent
    pub arp_replies: usize,
}

/// End host
#[derive(Debug, Clone)]
pub struct Host {
    name: String,
    host_id: HostId,
    amac: MacAddress,
    ip: Ipv4Addr,
    uplink: Option<Endpoint>,
    arp_cache: HashMap<Ipv4Addr, MacAddress>,
    pending: BTreeMap<Ipv4Addr, Vec<Vec<u8>>>,
    inbox: Vec<Ipv4Packet>,
    stats: HostStats,
}

impl Host {
    pub(crate) fn new(name: String, host_id: HostId, amac: MacAddress, ip: Ipv4Addr) -> Self {
        Self {
            name,
            host_id,
            amac,
            ip,
            uplink: None,
            arp_cache: HashMap::new(),
            pending: BTreeMap::new(),
            inbox: Vec::new(),
            stats: HostStats::default(),
        }
    }

    /// Return the name of the host
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Return the ID of the host
    pub fn host_id(&self) -> HostId {
        self.host_id
    }

    /// Return the actual hardware address of the host
    pub fn amac(&self) -> MacAddress {
        self.amac
    }

    /// Return the IP address of the host
    pub fn ip(&self) -> Ipv4Addr {
        self.ip
    }

    /// Return the edge switch port the host is attached to
    pub fn uplink(&self) -> Option<Endpoint> {
        self.uplink
    }

    /// Return the hardware address learned for `ip`.
    pub fn resolve(&self, ip: Ipv4Addr) -> Option<MacAddress> {
        self.arp_cache.get(&ip).copied()
    }

    /// Number of data packets waiting for the resolution of `ip`
    pub fn num_pending(&self, ip: Ipv4Addr) -> usize {
        self.pending.get(&ip).map(|p| p.len()).unwrap_or(0)
    }

    /// Number of data packets waiting for any address resolution
    pub fn total_pending(&self) -> usize {
        self.pending.values().map(|p| p.len()).sum()
    }

    /// IPv4 packets delivered to this host
    pub fn inbox(&self) -> &[Ipv4Packet] {
        &self.inbox
    }

    /// Return the counters of the host
    pub fn stats(&self) -> HostStats {
        self.stats
    }

    pub(crate) fn attach(&mut self, uplink: Endpoint) -> Result<(), DeviceError> {
        if self.uplink.is_some() {
            return Err(DeviceError::PortAlreadyConnected(PortRef::Upper(0)));
        }
        self.uplink = Some(uplink);
        Ok(())
    }

    /// Send `data` to `dst_ip`. If the destination is not yet resolved, the data is queued and an
    /// ARP request is broadcast (only for the first queued packet).
    pub fn send_to(
        &mut self,
        dst_ip: Ipv4Addr,
        data: Vec<u8>,
        queue: &mut EventQueue,
    ) -> Result<(), DeviceError> {
        let uplink = self.uplink.ok_or(DeviceError::NotConnected)?;
        if let Some(dst_mac) = self.resolve(dst_ip) {
            let packet = Ipv4Packet { src: self.ip, dst: dst_ip, data };
            self.transmit(uplink, Frame::new(self.amac, dst_mac, Payload::Ipv4(packet)), queue);
            return Ok(());
        }
        let waiting = self.pending.entry(dst_ip).or_insert_with(Vec::new);
        waiting.push(data);
        if waiting.len() == 1 {
            self.send_arp_request(uplink, dst_ip, queue);
        }
        Ok(())
    }

    /// Broadcast a new ARP request for every destination that still has queued data. Returns the
    /// number of requests sent.
    pub fn retransmit_arp(&mut self, queue: &mut EventQueue) -> Result<usize, DeviceError> {
        let uplink = self.uplink.ok_or(DeviceError::NotConnected)?;
        let targets = self.pending.keys().copied().collect::<Vec<_>>();
        for target in targets.iter() {
            self.send_arp_request(uplink, *target, queue);
        }
        Ok(targets.len())
    }

    /// Handle a frame arriving from the edge switch.
    pub fn receive_frame(
        &mut self,
        frame: Frame,
        queue: &mut EventQueue,
    ) -> Result<(), DeviceError> {
        self.stats.received += 1;
        if frame.dst != self.amac && !frame.dst.is_broadcast() {
            trace!("{}: ignoring frame for {}", self.name, frame.dst);
            return Ok(());
        }
        match frame.payload {
            Payload::Arp(arp) if arp.target_ip == self.ip => {
                self.learn(arp.sender_ip, arp.sender_hw, queue)?;
                if arp.is_request() {
                    let uplink = self.uplink.ok_or(DeviceError::NotConnected)?;
                    let reply = ArpPacket::reply(self.amac, self.ip, arp.sender_hw, arp.sender_ip);
                    debug!("{}: answering ARP request from {}", self.name, arp.sender_ip);
                    self.stats.arp_replies += 1;
                    let frame = Frame::new(self.amac, arp.sender_hw, Payload::Arp(reply));
                    self.transmit(uplink, frame, queue);
                }
            }
            Payload::Ipv4(packet) if packet.dst == self.ip => {
                debug!("{}: received {} bytes from {}", self.name, packet.data.len(), packet.src);
                self.inbox.push(packet);
            }
            _ => trace!("{}: ignoring frame from {}", self.name, frame.src),
        }
        Ok(())
    }

    /// Store the address in the ARP cache and send all data waiting for it.
    fn learn(
        &mut self,
        ip: Ipv4Addr,
        mac: MacAddress,
        queue: &mut EventQueue,
    ) -> Result<(), DeviceError> {
        self.arp_cache.insert(ip, mac);
        if let Some(waiting) = self.pending.remove(&ip) {
            let uplink = self.uplink.ok_or(DeviceError::NotConnected)?;
            debug!("{}: {} resolved to {}, sending {} packets", self.name, ip, mac, waiting.len());
            for data in waiting {
                let packet = Ipv4Packet { src: self.ip, dst: ip, data };
                self.transmit(uplink, Frame::new(self.amac, mac, Payload::Ipv4(packet)), queue);
            }
        }
        Ok(())
    }

    fn send_arp_request(&mut self, uplink: Endpoint, target: Ipv4Addr, queue: &mut EventQueue) {
        debug!("{}: Who has {}?", self.name, target);
        let request = ArpPacket::request(self.amac, self.ip, target);
        self.stats.arp_requests += 1;
        let frame = Frame::new(self.amac, MacAddress::BROADCAST, Payload::Arp(request));
        self.transmit(uplink, frame, queue);
    }

    fn transmit(&mut self, uplink: Endpoint, frame: Frame, queue: &mut EventQueue) {
        self.stats.sent += 1;
        queue.push_back(Event::Frame(uplink, frame));
    }
}

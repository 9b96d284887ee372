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

//! # Ethernet Frames
//!
//! Frames are not serialized. They carry a typed payload, and [`FrameMetadata`] extracts the
//! fields the switches need for their forwarding decision.

use crate::fabric::types::MacAddress;
use std::net::Ipv4Addr;

/// EtherType of IPv4
pub const ETHERTYPE_IPV4: u16 = 0x0800;
/// EtherType of ARP
pub const ETHERTYPE_ARP: u16 = 0x0806;

const ETHERNET_HEADER_LEN: usize = 14;
const ARP_LEN: usize = 28;
const IPV4_HEADER_LEN: usize = 20;

/// ARP operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArpOperation {
    /// Who has `target_ip`?
    Request,
    /// `sender_ip` is at `sender_hw`
    Reply,
}

/// ARP packet (IPv4 over Ethernet)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpPacket {
    /// Request or reply
    pub operation: ArpOperation,
    /// Hardware address of the sender
    pub sender_hw: MacAddress,
    /// IP address of the sender
    pub sender_ip: Ipv4Addr,
    /// Hardware address of the target (zero in requests)
    pub target_hw: MacAddress,
    /// IP address of the target
    pub target_ip: Ipv4Addr,
}

impl ArpPacket {
    /// Create an ARP request asking for `target_ip`
    pub fn request(sender_hw: MacAddress, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            operation: ArpOperation::Request,
            sender_hw,
            sender_ip,
            target_hw: MacAddress::ZERO,
            target_ip,
        }
    }

    /// Create an ARP reply
    pub fn reply(
        sender_hw: MacAddress,
        sender_ip: Ipv4Addr,
        target_hw: MacAddress,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self { operation: ArpOperation::Reply, sender_hw, sender_ip, target_hw, target_ip }
    }

    /// Returns true if this is a request
    pub fn is_request(&self) -> bool {
        self.operation == ArpOperation::Request
    }
}

/// IPv4 packet. Only the addresses are modelled, the rest is opaque data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet {
    /// Source address
    pub src: Ipv4Addr,
    /// Destination address
    pub dst: Ipv4Addr,
    /// Payload
    pub data: Vec<u8>,
}

/// Payload of an Ethernet frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// ARP packet
    Arp(ArpPacket),
    /// IPv4 packet
    Ipv4(Ipv4Packet),
    /// Any other protocol
    Raw {
        /// EtherType of the payload
        ether_type: u16,
        /// Opaque bytes
        data: Vec<u8>,
    },
}

/// Ethernet frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Source hardware address
    pub src: MacAddress,
    /// Destination hardware address
    pub dst: MacAddress,
    /// Typed payload
    pub payload: Payload,
}

impl Frame {
    /// Create a new frame
    pub fn new(src: MacAddress, dst: MacAddress, payload: Payload) -> Self {
        Self { src, dst, payload }
    }

    /// EtherType (protocol number) of the frame
    pub fn ether_type(&self) -> u16 {
        match &self.payload {
            Payload::Arp(_) => ETHERTYPE_ARP,
            Payload::Ipv4(_) => ETHERTYPE_IPV4,
            Payload::Raw { ether_type, .. } => *ether_type,
        }
    }

    /// Size of the frame on the wire in bytes
    pub fn size(&self) -> usize {
        ETHERNET_HEADER_LEN
            + match &self.payload {
                Payload::Arp(_) => ARP_LEN,
                Payload::Ipv4(p) => IPV4_HEADER_LEN + p.data.len(),
                Payload::Raw { data, .. } => data.len(),
            }
    }

    /// Returns a reference to the ARP packet, if the frame carries one.
    pub fn arp(&self) -> Option<&ArpPacket> {
        match &self.payload {
            Payload::Arp(arp) => Some(arp),
            _ => None,
        }
    }
}

/// Fields of a frame relevant for the forwarding decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    /// Source hardware address (the actual address when received from a host)
    pub src_amac: MacAddress,
    /// Destination hardware address (a PMAC inside the fabric)
    pub dst_mac: MacAddress,
    /// EtherType
    pub protocol: u16,
    /// Source IP address (ARP sender or IPv4 source)
    pub src_ip: Option<Ipv4Addr>,
    /// Destination IP address (ARP target or IPv4 destination)
    pub dst_ip: Option<Ipv4Addr>,
    /// Whether the frame is an ARP request
    pub is_arp_request: bool,
}

impl FrameMetadata {
    /// Extract the metadata of a frame
    pub fn parse(frame: &Frame) -> Self {
        let (src_ip, dst_ip, is_arp_request) = match &frame.payload {
            Payload::Arp(arp) => (Some(arp.sender_ip), Some(arp.target_ip), arp.is_request()),
            Payload::Ipv4(ip) => (Some(ip.src), Some(ip.dst), false),
            Payload::Raw { .. } => (None, None, false),
        };
        Self {
            src_amac: frame.src,
            dst_mac: frame.dst,
            protocol: frame.ether_type(),
            src_ip,
            dst_ip,
            is_arp_request,
        }
    }

    /// Returns the source and destination IP, if both are present.
    pub fn ips(&self) -> Option<(Ipv4Addr, Ipv4Addr)> {
        Some((self.src_ip?, self.dst_ip?))
    }
}

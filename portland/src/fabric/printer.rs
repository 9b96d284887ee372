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

//! # Helper (printer) functions for the Network
//! Module containing helper functions to get formatted strings about the fabric, with the names of
//! the devices inserted.

use crate::fabric::event::Event;
use crate::fabric::frame::{Frame, Payload};
use crate::fabric::message::FabricMessage;
use crate::fabric::network::Network;
use crate::fabric::types::{NetworkError, SwitchId};

/// Returns a formatted string for a frame.
pub fn frame(frame: &Frame) -> String {
    let payload = match &frame.payload {
        Payload::Arp(arp) if arp.is_request() => {
            format!("ARP who-has {} tell {} ({})", arp.target_ip, arp.sender_ip, arp.sender_hw)
        }
        Payload::Arp(arp) => format!(
            "ARP {} is-at {} (to {} at {})",
            arp.sender_ip, arp.sender_hw, arp.target_ip, arp.target_hw
        ),
        Payload::Ipv4(p) => format!("IPv4 {} -> {}, {} bytes", p.src, p.dst, p.data.len()),
        Payload::Raw { ether_type, data } => {
            format!("type {:#06x}, {} bytes", ether_type, data.len())
        }
    };
    format!("[{} -> {}] {}", frame.src, frame.dst, payload)
}

/// Returns a formatted string for a fabric manager message.
pub fn message(message: &FabricMessage) -> String {
    match message {
        FabricMessage::MacRegister { host_ip, pmac } => {
            format!("MAC_REGISTER {} at {}", host_ip, pmac)
        }
        FabricMessage::ArpRequest { src_ip, dst_ip, .. } => {
            format!("ARP_REQUEST {} from {}", dst_ip, src_ip)
        }
        FabricMessage::ArpResponse { dst_ip, dst_pmac, .. } => {
            format!("ARP_RESPONSE {} is at {}", dst_ip, dst_pmac)
        }
        FabricMessage::ArpFlood { dst_ip, src_ip, src_pmac } => {
            format!("ARP_FLOOD who-has {} tell {} ({})", dst_ip, src_ip, src_pmac)
        }
        FabricMessage::Ack => String::from("ACK"),
    }
}

/// Returns a formatted string for an event, with the name of the target device.
pub fn event(net: &Network, event: &Event) -> Result<String, NetworkError> {
    Ok(match event {
        Event::Frame(endpoint, f) => format!(
            "{} (port {}) <- {}",
            net.get_device_name(endpoint.device)?,
            endpoint.port,
            frame(f)
        ),
        Event::FabricManager(switch, msg) => {
            format!("FM -> {}: {}", net.get_device_name(*switch)?, message(msg))
        }
    })
}

/// Get a vector of strings, one line per entry of the PMAC table of the switch, sorted by PMAC.
pub fn pmac_table(net: &Network, switch: SwitchId) -> Result<Vec<String>, NetworkError> {
    let mut entries = net.get_switch(switch)?.pmac_table().iter().collect::<Vec<_>>();
    entries.sort_by_key(|e| e.pmac);
    Ok(entries
        .into_iter()
        .map(|e| format!("{} -> {} ({}), port {}", e.pmac, e.amac, e.ip, e.port))
        .collect())
}

/// Get a vector of strings, one line per directory entry of the fabric manager, sorted by IP.
pub fn directory(net: &Network) -> Vec<String> {
    let mut entries = net.fabric_manager().directory().iter().collect::<Vec<_>>();
    entries.sort();
    entries.into_iter().map(|(ip, pmac)| format!("{} -> {}", ip, pmac)).collect()
}

/// Returns a one-line summary of the counters of the switch.
pub fn switch_stats(net: &Network, switch: SwitchId) -> Result<String, NetworkError> {
    let s = net.get_switch(switch)?;
    let stats = s.stats();
    let mut drops = stats.drops.iter().collect::<Vec<_>>();
    drops.sort();
    Ok(format!(
        "{} ({}): received {}, transmitted {}, dropped {:?}",
        s.name(),
        s.identity(),
        stats.received,
        stats.transmitted,
        drops
    ))
}

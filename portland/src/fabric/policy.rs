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

//! # Forwarding Policies
//!
//! Every tier of the fat-tree has its own forwarding behavior. The behavior is chosen once, when
//! the switch is created, and it is represented as a [`ForwardingPolicy`]. A policy never sends
//! anything by itself. It only returns the list of frames to transmit (or the reason for dropping
//! the frame), and the [`Switch`](crate::fabric::switch::Switch) takes care of the ports.

use crate::fabric::event::EventQueue;
use crate::fabric::fabric_manager::FabricManager;
use crate::fabric::frame::{ArpPacket, Frame, FrameMetadata, Payload};
use crate::fabric::message::FabricMessage;
use crate::fabric::pmac::{self, Pmac};
use crate::fabric::pmac_table::PmacTable;
use crate::fabric::types::{DropReason, MacAddress, PortRef, SwitchId, SwitchIdentity, Tier};
use log::*;
use rand::rngs::StdRng;
use std::convert::TryFrom;
use std::fmt;
use std::net::Ipv4Addr;

/// Result of a forwarding decision: either the frames to transmit, or the reason for the drop.
pub type Verdict = Result<Vec<(PortRef, Frame)>, DropReason>;

/// State of the switch that a policy may use and modify while handling one frame.
#[derive(Debug)]
pub struct ForwardingContext<'a> {
    /// ID of the switch
    pub switch: SwitchId,
    /// Identity of the switch
    pub identity: SwitchIdentity,
    /// Number of lower ports
    pub num_lower: usize,
    /// Number of upper ports
    pub num_upper: usize,
    /// PMAC table of the switch
    pub table: &'a mut PmacTable,
    /// The fabric manager
    pub fabric_manager: &'a mut FabricManager,
    /// Queue for events caused by the fabric manager
    pub queue: &'a mut EventQueue,
    /// Random source for choosing upstream ports
    pub rng: &'a mut StdRng,
}

impl<'a> ForwardingContext<'a> {
    /// Compute the output port for `dst`. Returns `None` if the port does not exist on this switch.
    pub fn output_port(&mut self, dst: Pmac) -> Option<PortRef> {
        let id = self.identity;
        let rng = &mut *self.rng;
        let port = pmac::output_port(id.tier, id.pod, id.position, dst, self.num_upper, rng)?;
        let num_ports = if port.is_upper() { self.num_upper } else { self.num_lower };
        if port.index() < num_ports {
            Some(port)
        } else {
            None
        }
    }

    /// Register a newly seen host with the fabric manager.
    pub fn update_fabric_manager(&mut self, ip: Ipv4Addr, pmac: Pmac) {
        let msg = FabricMessage::MacRegister { host_ip: ip, pmac };
        let fm = &mut *self.fabric_manager;
        if let Err(e) = fm.receive_from_switch(self.switch, msg, &mut *self.queue) {
            warn!("{}: Cannot register {} at the fabric manager: {}", self.identity, ip, e);
        }
    }

    /// Ask the fabric manager for the PMAC of `dst_ip`. Returns [`Pmac::BROADCAST`] if the
    /// destination is unknown (or if the fabric manager did not answer properly).
    pub fn query_fabric_manager(
        &mut self,
        dst_ip: Ipv4Addr,
        src_ip: Ipv4Addr,
        src_pmac: Pmac,
    ) -> Pmac {
        let msg = FabricMessage::ArpRequest { src_ip, src_pmac, dst_ip };
        match self.fabric_manager.receive_from_switch(self.switch, msg, &mut *self.queue) {
            Ok(FabricMessage::ArpResponse { dst_pmac, .. }) => dst_pmac,
            Ok(response) => {
                warn!("{}: Unexpected {} from the fabric manager", self.identity, response.kind());
                Pmac::BROADCAST
            }
            Err(e) => {
                warn!("{}: Fabric manager query failed: {}", self.identity, e);
                Pmac::BROADCAST
            }
        }
    }

    /// Copy the frame to every lower port
    pub fn flood_lower(&self, frame: &Frame) -> Vec<(PortRef, Frame)> {
        (0..self.num_lower).map(|i| (PortRef::Lower(i), frame.clone())).collect()
    }
}

/// Tier specific forwarding behavior of a switch.
pub trait ForwardingPolicy: fmt::Debug {
    /// The tier this policy implements
    fn tier(&self) -> Tier;

    /// Handle a frame that arrived on the lower port `in_port`.
    fn south_ingress(
        &self,
        ctx: &mut ForwardingContext<'_>,
        in_port: usize,
        meta: &FrameMetadata,
        frame: Frame,
    ) -> Verdict;

    /// Handle a frame that arrived on the upper port `in_port`.
    fn north_ingress(
        &self,
        ctx: &mut ForwardingContext<'_>,
        in_port: usize,
        meta: &FrameMetadata,
        frame: Frame,
    ) -> Verdict;

    /// Handle a message sent by the fabric manager. By default, messages are ignored.
    fn fabric_manager_message(
        &self,
        ctx: &mut ForwardingContext<'_>,
        message: FabricMessage,
    ) -> Verdict {
        debug!("{}: Ignoring {} from the fabric manager", ctx.identity, message.kind());
        Ok(Vec::new())
    }
}

/// Create the policy for a tier
pub fn policy_for(tier: Tier) -> Box<dyn ForwardingPolicy> {
    match tier {
        Tier::Edge => Box::new(EdgePolicy),
        Tier::Aggregation => Box::new(AggregationPolicy),
        Tier::Core => Box::new(CorePolicy),
    }
}

/// Edge switches assign PMACs to their hosts, and translate between actual addresses and PMACs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgePolicy;

impl EdgePolicy {
    /// Lookup the PMAC of the source, or allocate (and register) a new one.
    fn source_pmac(
        &self,
        ctx: &mut ForwardingContext<'_>,
        in_port: usize,
        amac: MacAddress,
        ip: Ipv4Addr,
    ) -> Result<Pmac, DropReason> {
        if let Some(pmac) = ctx.table.find_pmac_by_ip(ip) {
            return Ok(pmac);
        }
        let port = u8::try_from(in_port).map_err(|_| DropReason::InvalidPort)?;
        let pmac = pmac::encode(ctx.identity.pod, ctx.identity.position, port);
        debug!("{}: Event=New PMAC, ip={}, amac={}, pmac={}", ctx.identity, ip, amac, pmac);
        ctx.table.add(pmac, amac, ip, in_port);
        ctx.update_fabric_manager(ip, pmac);
        Ok(pmac)
    }

    /// Lookup the PMAC of the destination, first locally and then at the fabric manager.
    fn destination_pmac(
        &self,
        ctx: &mut ForwardingContext<'_>,
        dst_ip: Ipv4Addr,
        src_ip: Ipv4Addr,
        src_pmac: Pmac,
    ) -> Pmac {
        match ctx.table.find_pmac_by_ip(dst_ip) {
            Some(pmac) => pmac,
            None => ctx.query_fabric_manager(dst_ip, src_ip, src_pmac),
        }
    }
}

impl ForwardingPolicy for EdgePolicy {
    fn tier(&self) -> Tier {
        Tier::Edge
    }

    fn south_ingress(
        &self,
        ctx: &mut ForwardingContext<'_>,
        in_port: usize,
        meta: &FrameMetadata,
        mut frame: Frame,
    ) -> Verdict {
        let (src_ip, dst_ip) = meta.ips().ok_or(DropReason::UnsupportedProtocol)?;
        let src_pmac = self.source_pmac(ctx, in_port, meta.src_amac, src_ip)?;
        let dst_pmac = self.destination_pmac(ctx, dst_ip, src_ip, src_pmac);
        if dst_pmac.is_broadcast() {
            // the fabric manager floods the request, and the destination will answer it.
            debug!("{}: Event=Unresolved, dst={}", ctx.identity, dst_ip);
            return Err(DropReason::Unresolved);
        }
        let port = ctx.output_port(dst_pmac).ok_or(DropReason::InvalidPort)?;
        let dst_mac = match port {
            // destination is attached to this very switch
            PortRef::Lower(_) => ctx.table.find_amac(dst_pmac).ok_or(DropReason::UnknownPmac)?,
            PortRef::Upper(_) => dst_pmac.mac(),
        };
        frame.src = src_pmac.mac();
        frame.dst = dst_mac;
        if let Payload::Arp(arp) = &mut frame.payload {
            arp.sender_hw = src_pmac.mac();
            if !arp.is_request() {
                arp.target_hw = dst_mac;
            }
        }
        Ok(vec![(port, frame)])
    }

    fn north_ingress(
        &self,
        ctx: &mut ForwardingContext<'_>,
        _in_port: usize,
        meta: &FrameMetadata,
        mut frame: Frame,
    ) -> Verdict {
        if meta.dst_mac.is_broadcast() {
            return Ok(ctx.flood_lower(&frame));
        }
        let dst_pmac = Pmac::from_mac(meta.dst_mac);
        let dst_amac = match ctx.table.find_amac(dst_pmac) {
            Some(amac) => amac,
            None => {
                warn!("{}: Received a frame for the unknown PMAC {}", ctx.identity, dst_pmac);
                return Err(DropReason::UnknownPmac);
            }
        };
        let port = match ctx.output_port(dst_pmac) {
            Some(port @ PortRef::Lower(_)) => port,
            _ => return Err(DropReason::InvalidPort),
        };
        frame.dst = dst_amac;
        if let Payload::Arp(arp) = &mut frame.payload {
            if !arp.is_request() {
                arp.sender_hw = meta.src_amac;
                arp.target_hw = dst_amac;
            }
        }
        Ok(vec![(port, frame)])
    }
}

/// Aggregation switches forward purely based on the destination PMAC.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationPolicy;

impl ForwardingPolicy for AggregationPolicy {
    fn tier(&self) -> Tier {
        Tier::Aggregation
    }

    fn south_ingress(
        &self,
        ctx: &mut ForwardingContext<'_>,
        _in_port: usize,
        meta: &FrameMetadata,
        frame: Frame,
    ) -> Verdict {
        let port = ctx.output_port(Pmac::from_mac(meta.dst_mac)).ok_or(DropReason::InvalidPort)?;
        Ok(vec![(port, frame)])
    }

    fn north_ingress(
        &self,
        ctx: &mut ForwardingContext<'_>,
        _in_port: usize,
        meta: &FrameMetadata,
        frame: Frame,
    ) -> Verdict {
        if meta.dst_mac.is_broadcast() {
            // ARP flood initiated by a core switch
            return Ok(ctx.flood_lower(&frame));
        }
        match ctx.output_port(Pmac::from_mac(meta.dst_mac)) {
            Some(port @ PortRef::Lower(_)) => Ok(vec![(port, frame)]),
            Some(PortRef::Upper(_)) => {
                warn!("{}: Frame from a core switch for another pod: {}", ctx.identity, meta.dst_mac);
                Err(DropReason::ProtocolViolation)
            }
            None => Err(DropReason::InvalidPort),
        }
    }
}

/// Core switches forward downstream to the pod of the destination, and they flood ARP requests on
/// behalf of the fabric manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorePolicy;

impl ForwardingPolicy for CorePolicy {
    fn tier(&self) -> Tier {
        Tier::Core
    }

    fn south_ingress(
        &self,
        ctx: &mut ForwardingContext<'_>,
        _in_port: usize,
        meta: &FrameMetadata,
        frame: Frame,
    ) -> Verdict {
        let port = ctx.output_port(Pmac::from_mac(meta.dst_mac)).ok_or(DropReason::InvalidPort)?;
        Ok(vec![(port, frame)])
    }

    fn north_ingress(
        &self,
        ctx: &mut ForwardingContext<'_>,
        in_port: usize,
        _meta: &FrameMetadata,
        _frame: Frame,
    ) -> Verdict {
        warn!("{}: Core switch received a frame on upper port {}", ctx.identity, in_port);
        Err(DropReason::ProtocolViolation)
    }

    fn fabric_manager_message(
        &self,
        ctx: &mut ForwardingContext<'_>,
        message: FabricMessage,
    ) -> Verdict {
        match message {
            FabricMessage::ArpFlood { dst_ip, src_ip, src_pmac } => {
                debug!(
                    "{}: Event=Init Flood, src={}/{}, dst={}/{}",
                    ctx.identity,
                    src_pmac,
                    src_ip,
                    MacAddress::BROADCAST,
                    dst_ip
                );
                let arp = ArpPacket::request(src_pmac.mac(), src_ip, dst_ip);
                let frame = Frame::new(src_pmac.mac(), MacAddress::BROADCAST, Payload::Arp(arp));
                Ok(ctx.flood_lower(&frame))
            }
            message => {
                warn!("{}: Unexpected {} from the fabric manager", ctx.identity, message.kind());
                Err(DropReason::ProtocolViolation)
            }
        }
    }
}

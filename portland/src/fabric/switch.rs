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

//! Module defining a PortLand switch.

use crate::fabric::event::{Event, EventQueue};
use crate::fabric::fabric_manager::FabricManager;
use crate::fabric::frame::{Frame, FrameMetadata, ETHERTYPE_ARP, ETHERTYPE_IPV4};
use crate::fabric::message::FabricMessage;
use crate::fabric::pmac_table::PmacTable;
use crate::fabric::policy::{policy_for, ForwardingContext, ForwardingPolicy, Verdict};
use crate::fabric::types::{
    DeviceError, DropReason, Endpoint, MacAddress, PortRef, SwitchId, SwitchIdentity, Tier,
};
use log::*;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// First octet of every switch address. Hosts use `0x02`, and PMACs always start with `0x00`.
pub const SWITCH_ADDRESS_PREFIX: u8 = 0x06;

/// Counters of a single port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    /// Frames received
    pub rx_packets: u64,
    /// Bytes received
    pub rx_bytes: u64,
    /// Frames transmitted
    pub tx_packets: u64,
    /// Bytes transmitted
    pub tx_bytes: u64,
    /// Frames that could not be transmitted
    pub tx_dropped: u64,
}

/// Port of a switch
#[derive(Debug, Clone, Default)]
pub struct Port {
    peer: Option<Endpoint>,
    stats: PortStats,
}

impl Port {
    /// The endpoint at the other side of the link, if the port is connected
    pub fn peer(&self) -> Option<Endpoint> {
        self.peer
    }

    /// Counters of the port
    pub fn stats(&self) -> PortStats {
        self.stats
    }
}

/// Counters of a switch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchStats {
    /// Number of frames received
    pub received: usize,
    /// Number of frames transmitted
    pub transmitted: usize,
    /// Number of dropped frames, by reason
    pub drops: HashMap<DropReason, usize>,
}

impl SwitchStats {
    /// Number of frames dropped for the given reason
    pub fn dropped(&self, reason: DropReason) -> usize {
        self.drops.get(&reason).copied().unwrap_or(0)
    }

    /// Total number of dropped frames
    pub fn total_dropped(&self) -> usize {
        self.drops.values().sum()
    }
}

/// PortLand switch
#[derive(Debug)]
pub struct Switch {
    /// Name of the switch
    name: String,
    /// ID of the switch
    switch_id: SwitchId,
    /// Tier, pod and position
    identity: SwitchIdentity,
    /// Own hardware address of the switch
    address: MacAddress,
    /// South-bound ports
    lower_ports: Vec<Port>,
    /// North-bound ports
    upper_ports: Vec<Port>,
    /// PMAC table (only used by edge switches)
    table: PmacTable,
    /// Tier specific forwarding behavior
    policy: Box<dyn ForwardingPolicy>,
    /// Random source for the upstream port selection
    rng: StdRng,
    /// Counters
    stats: SwitchStats,
    /// Frames addressed to the switch itself
    inbox: Vec<Frame>,
}

impl Switch {
    pub(crate) fn new(
        name: String,
        switch_id: SwitchId,
        identity: SwitchIdentity,
        num_lower: usize,
        num_upper: usize,
        rng: StdRng,
    ) -> Self {
        let idx = switch_id.index();
        let address =
            MacAddress::new([SWITCH_ADDRESS_PREFIX, 0, 0, 0, (idx >> 8) as u8, idx as u8]);
        Self {
            name,
            switch_id,
            identity,
            address,
            lower_ports: vec![Port::default(); num_lower],
            upper_ports: vec![Port::default(); num_upper],
            table: PmacTable::new(),
            policy: policy_for(identity.tier),
            rng,
            stats: SwitchStats::default(),
            inbox: Vec::new(),
        }
    }

    /// Return the ID of the switch
    pub fn switch_id(&self) -> SwitchId {
        self.switch_id
    }

    /// Return the name of the switch
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Return the identity (tier, pod and position) of the switch
    pub fn identity(&self) -> SwitchIdentity {
        self.identity
    }

    /// Return the tier of the switch
    pub fn tier(&self) -> Tier {
        self.policy.tier()
    }

    /// Return the own hardware address of the switch
    pub fn address(&self) -> MacAddress {
        self.address
    }

    /// Return the PMAC table
    pub fn pmac_table(&self) -> &PmacTable {
        &self.table
    }

    /// Return the PMAC table for modification
    pub fn pmac_table_mut(&mut self) -> &mut PmacTable {
        &mut self.table
    }

    /// Number of lower ports
    pub fn num_lower_ports(&self) -> usize {
        self.lower_ports.len()
    }

    /// Number of upper ports
    pub fn num_upper_ports(&self) -> usize {
        self.upper_ports.len()
    }

    /// Get a port
    pub fn port(&self, port: PortRef) -> Option<&Port> {
        match port {
            PortRef::Lower(i) => self.lower_ports.get(i),
            PortRef::Upper(i) => self.upper_ports.get(i),
        }
    }

    /// Return the counters of the switch
    pub fn stats(&self) -> &SwitchStats {
        &self.stats
    }

    /// Return all frames that were addressed to the switch itself
    pub fn inbox(&self) -> &[Frame] {
        &self.inbox
    }

    fn port_mut(&mut self, port: PortRef) -> Option<&mut Port> {
        match port {
            PortRef::Lower(i) => self.lower_ports.get_mut(i),
            PortRef::Upper(i) => self.upper_ports.get_mut(i),
        }
    }

    /// Connect the port to `peer`. A port can only be connected once.
    pub(crate) fn connect(&mut self, port: PortRef, peer: Endpoint) -> Result<(), DeviceError> {
        let p = self.port_mut(port).ok_or(DeviceError::InvalidPort(port))?;
        if p.peer.is_some() {
            return Err(DeviceError::PortAlreadyConnected(port));
        }
        p.peer = Some(peer);
        Ok(())
    }

    /// Handle a frame received on `port`. Returns the number of transmitted frames, or the reason
    /// why the frame was dropped.
    pub fn receive_frame(
        &mut self,
        port: PortRef,
        frame: Frame,
        fabric_manager: &mut FabricManager,
        queue: &mut EventQueue,
    ) -> Result<usize, DropReason> {
        let result = self.process_frame(port, frame, fabric_manager, queue);
        self.record_drop(result)
    }

    /// Handle a message sent by the fabric manager. Only core switches react on `ArpFlood`.
    pub fn receive_from_fabric_manager(
        &mut self,
        message: FabricMessage,
        fabric_manager: &mut FabricManager,
        queue: &mut EventQueue,
    ) -> Result<usize, DropReason> {
        let mut ctx = ForwardingContext {
            switch: self.switch_id,
            identity: self.identity,
            num_lower: self.lower_ports.len(),
            num_upper: self.upper_ports.len(),
            table: &mut self.table,
            fabric_manager: &mut *fabric_manager,
            queue: &mut *queue,
            rng: &mut self.rng,
        };
        let verdict = self.policy.fabric_manager_message(&mut ctx, message);
        let result = self.transmit(verdict, queue);
        self.record_drop(result)
    }

    fn record_drop(&mut self, result: Result<usize, DropReason>) -> Result<usize, DropReason> {
        if let Err(reason) = result {
            debug!("{}: Event=Drop packet, reason={:?}", self.identity, reason);
            *self.stats.drops.entry(reason).or_insert(0) += 1;
        }
        result
    }

    fn process_frame(
        &mut self,
        port: PortRef,
        frame: Frame,
        fabric_manager: &mut FabricManager,
        queue: &mut EventQueue,
    ) -> Result<usize, DropReason> {
        let size = frame.size() as u64;
        match self.port_mut(port) {
            Some(p) => {
                p.stats.rx_packets += 1;
                p.stats.rx_bytes += size;
            }
            None => {
                debug!("{}: Frame received on the unknown port {}", self.identity, port);
                return Err(DropReason::InvalidPort);
            }
        }
        self.stats.received += 1;

        if frame.dst == self.address {
            self.inbox.push(frame);
            return Ok(0);
        }

        let meta = FrameMetadata::parse(&frame);
        if meta.protocol != ETHERTYPE_ARP && meta.protocol != ETHERTYPE_IPV4 {
            warn!("{}: Protocol unsupported: {:#06x}", self.identity, meta.protocol);
        }
        debug!(
            "{}: Event=Received packet, src={}, dst={}, protocol={:#06x}, in-port={}, from_upper={}, is_arp_request={}",
            self.identity,
            meta.src_amac,
            meta.dst_mac,
            meta.protocol,
            port.index(),
            port.is_upper(),
            meta.is_arp_request
        );

        let mut ctx = ForwardingContext {
            switch: self.switch_id,
            identity: self.identity,
            num_lower: self.lower_ports.len(),
            num_upper: self.upper_ports.len(),
            table: &mut self.table,
            fabric_manager: &mut *fabric_manager,
            queue: &mut *queue,
            rng: &mut self.rng,
        };
        let verdict = match port {
            PortRef::Lower(i) => self.policy.south_ingress(&mut ctx, i, &meta, frame),
            PortRef::Upper(i) => self.policy.north_ingress(&mut ctx, i, &meta, frame),
        };
        self.transmit(verdict, queue)
    }

    fn transmit(&mut self, verdict: Verdict, queue: &mut EventQueue) -> Result<usize, DropReason> {
        Ok(verdict?
            .into_iter()
            .map(|(port, frame)| self.output_packet(port, frame, queue))
            .filter(|sent| *sent)
            .count())
    }

    /// Transmit a frame on the given port. Returns `false` if the port does not exist, or if it is
    /// not connected.
    pub(crate) fn output_packet(
        &mut self,
        port: PortRef,
        frame: Frame,
        queue: &mut EventQueue,
    ) -> bool {
        let ports = if port.is_upper() { &mut self.upper_ports } else { &mut self.lower_ports };
        let p = match ports.get_mut(port.index()) {
            Some(p) => p,
            None => {
                debug!("{}: can't forward to bad port {}", self.identity, port);
                return false;
            }
        };
        match p.peer {
            Some(peer) => {
                debug!(
                    "{}: Event=Transmit Packet, src={}, dst={}, protocol={:#06x}, out-port={}, to_upper={}",
                    self.identity,
                    frame.src,
                    frame.dst,
                    frame.ether_type(),
                    port.index(),
                    port.is_upper()
                );
                p.stats.tx_packets += 1;
                p.stats.tx_bytes += frame.size() as u64;
                self.stats.transmitted += 1;
                queue.push_back(Event::Frame(peer, frame));
                true
            }
            None => {
                trace!("{}: port {} is not connected", self.identity, port);
                p.stats.tx_dropped += 1;
                false
            }
        }
    }
}

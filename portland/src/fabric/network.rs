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

//! # Top-level Network module
//!
//! This module owns all switches, hosts and the fabric manager, and delivers the frames between
//! them.

use crate::fabric::config::FabricConfig;
use crate::fabric::event::{Event, EventQueue};
use crate::fabric::fabric_manager::FabricManager;
use crate::fabric::frame::Frame;
use crate::fabric::host::Host;
use crate::fabric::printer;
use crate::fabric::switch::Switch;
use crate::fabric::types::{
    DeviceError, DeviceId, Endpoint, FabricGraph, HostId, MacAddress, NetworkDevice,
    NetworkError, PortRef, SwitchId, SwitchIdentity,
};

use log::*;
use rand::prelude::*;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// # Network struct
/// The struct contains the physical links, all switches and hosts, and the fabric manager. Every
/// transmission is an event in the queue. Operations on the network (like sending data from a
/// host) enqueue the first event, and then process the queue until it is empty.
///
/// The fabric manager is owned by the network, and lent to the switch that handles the current
/// event. Therefore, only one switch can interact with the fabric manager at a time. Messages sent
/// by the fabric manager to the switches (ARP floods) are enqueued as events as well.
///
/// ```rust
/// # use portland::fabric::{Network, FabricConfig, SwitchIdentity};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut net = Network::new(FabricConfig::with_seed(42));
/// let edge = net.add_switch("edge", SwitchIdentity::edge(0, 0), 2, 0);
/// let a = net.add_host("a", "02:00:00:00:00:0a".parse()?, "10.0.0.2".parse()?);
/// let b = net.add_host("b", "02:00:00:00:00:0b".parse()?, "10.0.0.3".parse()?);
/// net.attach_host(a, edge, 0)?;
/// net.attach_host(b, edge, 1)?;
///
/// // `b` is not yet known, so the data stays queued at `a`.
/// net.send(a, "10.0.0.3".parse()?, vec![1, 2, 3])?;
/// assert_eq!(net.get_host(b)?.inbox().len(), 0);
/// // the ARP request of `b` resolves both directions.
/// net.send(b, "10.0.0.2".parse()?, vec![4])?;
/// assert_eq!(net.get_host(b)?.inbox().len(), 1);
/// assert_eq!(net.get_host(a)?.inbox().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Network {
    graph: FabricGraph,
    links: Vec<(Endpoint, Endpoint)>,
    switches: HashMap<SwitchId, Switch>,
    hosts: HashMap<HostId, Host>,
    fabric_manager: FabricManager,
    queue: EventQueue,
    config: FabricConfig,
    rng: StdRng,
    num_events: usize,
}

impl Default for Network {
    fn default() -> Self {
        Self::new(FabricConfig::default())
    }
}

impl Network {
    /// Generate an empty network
    pub fn new(config: FabricConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            graph: FabricGraph::default(),
            links: Vec::new(),
            switches: HashMap::new(),
            hosts: HashMap::new(),
            fabric_manager: FabricManager::new(),
            queue: EventQueue::new(),
            config,
            rng,
            num_events: 0,
        }
    }

    /// Add a new switch with `num_lower` south-bound and `num_upper` north-bound ports. The switch
    /// is registered with the fabric manager. This function returns the ID of the switch.
    pub fn add_switch<S: Into<String>>(
        &mut self,
        name: S,
        identity: SwitchIdentity,
        num_lower: usize,
        num_upper: usize,
    ) -> SwitchId {
        let switch_id = self.graph.add_node(());
        let rng = StdRng::seed_from_u64(self.rng.gen());
        let switch = Switch::new(name.into(), switch_id, identity, num_lower, num_upper, rng);
        self.fabric_manager.add_switch(switch_id, identity);
        self.switches.insert(switch_id, switch);
        switch_id
    }

    /// Add a new host. The host must be attached to an edge switch with
    /// [`Network::attach_host`] before it can send anything.
    pub fn add_host<S: Into<String>>(&mut self, name: S, amac: MacAddress, ip: Ipv4Addr) -> HostId {
        let host_id = self.graph.add_node(());
        self.hosts.insert(host_id, Host::new(name.into(), host_id, amac, ip));
        host_id
    }

    /// Connect two switches. `south` is an upper port of the lower switch, and `north` is a lower
    /// port of the upper switch.
    pub fn add_link(&mut self, south: Endpoint, north: Endpoint) -> Result<(), NetworkError> {
        if !south.port.is_upper() || north.port.is_upper() || south.device == north.device {
            return Err(NetworkError::InvalidLink(south, north));
        }
        self.check_port_free(south)?;
        self.check_port_free(north)?;
        self.get_switch_mut(south.device)?.connect(south.port, north)?;
        self.get_switch_mut(north.device)?.connect(north.port, south)?;
        self.graph.add_edge(south.device, north.device, ());
        self.links.push((south, north));
        Ok(())
    }

    /// Attach a host to the lower port `port` of an edge switch.
    pub fn attach_host(
        &mut self,
        host: HostId,
        switch: SwitchId,
        port: usize,
    ) -> Result<(), NetworkError> {
        let host_end = Endpoint::new(host, PortRef::Upper(0));
        let switch_end = Endpoint::new(switch, PortRef::Lower(port));
        if self.get_host(host)?.uplink().is_some() {
            return Err(DeviceError::PortAlreadyConnected(host_end.port).into());
        }
        self.check_port_free(switch_end)?;
        self.get_switch_mut(switch)?.connect(switch_end.port, host_end)?;
        self.get_host_mut(host)?.attach(switch_end)?;
        self.graph.add_edge(switch, host, ());
        self.links.push((host_end, switch_end));
        Ok(())
    }

    /// Send data from `host` to `dst_ip`, and process all resulting events. If `dst_ip` is not yet
    /// resolved, the data remains queued at the host until an ARP reply arrives.
    pub fn send(
        &mut self,
        host: HostId,
        dst_ip: Ipv4Addr,
        data: Vec<u8>,
    ) -> Result<(), NetworkError> {
        self.get_host(host)?;
        let h = self.hosts.get_mut(&host).ok_or(NetworkError::DeviceNotFound(host))?;
        h.send_to(dst_ip, data, &mut self.queue)?;
        self.do_queue()
    }

    /// Let the host retry the ARP resolution of all destinations with queued data, and process all
    /// resulting events. Returns the number of ARP requests sent.
    pub fn retransmit_arp(&mut self, host: HostId) -> Result<usize, NetworkError> {
        self.get_host(host)?;
        let h = self.hosts.get_mut(&host).ok_or(NetworkError::DeviceNotFound(host))?;
        let num_requests = h.retransmit_arp(&mut self.queue)?;
        self.do_queue()?;
        Ok(num_requests)
    }

    /// Deliver a raw frame to a port of a switch, as if it was received on that port, and process
    /// all resulting events.
    pub fn inject(
        &mut self,
        switch: SwitchId,
        port: PortRef,
        frame: Frame,
    ) -> Result<(), NetworkError> {
        self.get_switch(switch)?;
        self.queue.push_back(Event::Frame(Endpoint::new(switch, port), frame));
        self.do_queue()
    }

    /// Returns a reference to the network device.
    pub fn get_device(&self, id: DeviceId) -> NetworkDevice<'_> {
        match self.switches.get(&id) {
            Some(s) => NetworkDevice::Switch(s),
            None => match self.hosts.get(&id) {
                Some(h) => NetworkDevice::Host(h),
                None => NetworkDevice::None,
            },
        }
    }

    /// Returns a reference to a switch
    pub fn get_switch(&self, id: SwitchId) -> Result<&Switch, NetworkError> {
        match self.get_device(id) {
            NetworkDevice::Switch(s) => Ok(s),
            NetworkDevice::Host(_) => Err(NetworkError::DeviceIsNotASwitch(id)),
            NetworkDevice::None => Err(NetworkError::DeviceNotFound(id)),
        }
    }

    /// Returns a reference to a host
    pub fn get_host(&self, id: HostId) -> Result<&Host, NetworkError> {
        match self.get_device(id) {
            NetworkDevice::Host(h) => Ok(h),
            NetworkDevice::Switch(_) => Err(NetworkError::DeviceIsNotAHost(id)),
            NetworkDevice::None => Err(NetworkError::DeviceNotFound(id)),
        }
    }

    /// Get the ID of the switch with the given name. If multiple switches have the same name, then
    /// the first occurrence is returned.
    pub fn get_switch_id(&self, name: impl AsRef<str>) -> Result<SwitchId, NetworkError> {
        self.switches
            .values()
            .find(|s| s.name() == name.as_ref())
            .map(|s| s.switch_id())
            .ok_or_else(|| NetworkError::DeviceNameNotFound(name.as_ref().to_string()))
    }

    /// Get the ID of the host with the given name.
    pub fn get_host_id(&self, name: impl AsRef<str>) -> Result<HostId, NetworkError> {
        self.hosts
            .values()
            .find(|h| h.name() == name.as_ref())
            .map(|h| h.host_id())
            .ok_or_else(|| NetworkError::DeviceNameNotFound(name.as_ref().to_string()))
    }

    /// Returns the name of the device, if the ID was found.
    pub fn get_device_name(&self, id: DeviceId) -> Result<&str, NetworkError> {
        match self.get_device(id) {
            NetworkDevice::Switch(s) => Ok(s.name()),
            NetworkDevice::Host(h) => Ok(h.name()),
            NetworkDevice::None => Err(NetworkError::DeviceNotFound(id)),
        }
    }

    /// Returns the fabric manager
    pub fn fabric_manager(&self) -> &FabricManager {
        &self.fabric_manager
    }

    /// Returns a sorted list of all switch IDs
    pub fn switches(&self) -> Vec<SwitchId> {
        let mut switches = self.switches.keys().copied().collect::<Vec<_>>();
        switches.sort();
        switches
    }

    /// Returns a sorted list of all host IDs
    pub fn hosts(&self) -> Vec<HostId> {
        let mut hosts = self.hosts.keys().copied().collect::<Vec<_>>();
        hosts.sort();
        hosts
    }

    /// Returns an iterator over all links, as `(south, north)` endpoints. For host links, `south`
    /// is the host.
    pub fn links(&self) -> std::slice::Iter<'_, (Endpoint, Endpoint)> {
        self.links.iter()
    }

    /// Returns the physical topology
    pub fn get_topology(&self) -> &FabricGraph {
        &self.graph
    }

    /// Returns the configuration of the network
    pub fn config(&self) -> &FabricConfig {
        &self.config
    }

    /// Configure the maximum number of events a single operation may process. If set to None, the
    /// queue will continue running until it is empty.
    pub fn set_stop_after(&mut self, stop_after: Option<usize>) {
        self.config.stop_after = stop_after;
    }

    /// Returns the total number of events processed since the network was created.
    pub fn num_events_processed(&self) -> usize {
        self.num_events
    }

    /// Execute the queue
    fn do_queue(&mut self) -> Result<(), NetworkError> {
        let mut remaining_iter = self.config.stop_after;
        while !self.queue.is_empty() {
            if let Some(rem) = remaining_iter {
                if rem == 0 {
                    debug!("Network cannot converge! {} events remain", self.queue.len());
                    return Err(NetworkError::NoConvergence);
                }
                remaining_iter = Some(rem - 1);
            }
            self.do_queue_step()?;
        }
        Ok(())
    }

    /// Executes one single step. If the result is Ok(true), then a step is successfully executed.
    /// If the result is Ok(false), then there was no event present in the queue.
    fn do_queue_step(&mut self) -> Result<bool, NetworkError> {
        let event = match self.queue.pop_front() {
            Some(event) => event,
            None => return Ok(false),
        };
        self.log_event(&event)?;
        self.num_events += 1;
        match event {
            Event::Frame(endpoint, frame) => {
                if let Some(s) = self.switches.get_mut(&endpoint.device) {
                    // drops are counted by the switch
                    let fm = &mut self.fabric_manager;
                    let _ = s.receive_frame(endpoint.port, frame, fm, &mut self.queue);
                } else if let Some(h) = self.hosts.get_mut(&endpoint.device) {
                    h.receive_frame(frame, &mut self.queue)?;
                } else {
                    return Err(NetworkError::DeviceNotFound(endpoint.device));
                }
            }
            Event::FabricManager(switch, message) => {
                let s = self.switches.get_mut(&switch).ok_or(NetworkError::DeviceNotFound(switch))?;
                let fm = &mut self.fabric_manager;
                let _ = s.receive_from_fabric_manager(message, fm, &mut self.queue);
            }
        }
        Ok(true)
    }

    fn log_event(&self, event: &Event) -> Result<(), NetworkError> {
        trace!("{}", printer::event(self, event)?);
        Ok(())
    }

    fn check_port_free(&self, endpoint: Endpoint) -> Result<(), NetworkError> {
        let switch = self.get_switch(endpoint.device)?;
        match switch.port(endpoint.port) {
            Some(p) if p.peer().is_some() => {
                Err(DeviceError::PortAlreadyConnected(endpoint.port).into())
            }
            Some(_) => Ok(()),
            None => Err(DeviceError::InvalidPort(endpoint.port).into()),
        }
    }

    fn get_switch_mut(&mut self, id: SwitchId) -> Result<&mut Switch, NetworkError> {
        if self.hosts.contains_key(&id) {
            return Err(NetworkError::DeviceIsNotASwitch(id));
        }
        self.switches.get_mut(&id).ok_or(NetworkError::DeviceNotFound(id))
    }

    fn get_host_mut(&mut self, id: HostId) -> Result<&mut Host, NetworkError> {
        if self.switches.contains_key(&id) {
            return Err(NetworkError::DeviceIsNotAHost(id));
        }
        self.hosts.get_mut(&id).ok_or(NetworkError::DeviceNotFound(id))
    }
}

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

//! Module for defining events

use crate::fabric::frame::Frame;
use crate::fabric::message::FabricMessage;
use crate::fabric::types::{Endpoint, SwitchId};
use std::collections::VecDeque;

/// Event to handle
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Frame arriving at the endpoint `#0`.
    Frame(Endpoint, Frame),
    /// Message from the fabric manager delivered to switch `#0`.
    FabricManager(SwitchId, FabricMessage),
}

/// Event queue for enqueuing events. Events are processed in FIFO order.
pub type EventQueue = VecDeque<Event>;

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

use portland::fabric::{printer, FabricConfig, HostId};
use portland::topology::FatTree;

use clap::{Parser, Subcommand};
use log::*;
use rand::prelude::*;
use std::error::Error;

mod report;
use report::Report;

fn main() -> Result<(), Box<dyn Error>> {
    // initialize the env logger
    pretty_env_logger::init();

    // run clap
    let args = CommandLineArguments::parse();

    let config = FabricConfig { stop_after: Some(args.stop_after), seed: args.seed };
    let mut tree = FatTree::build(args.k, config)?;
    info!(
        "Fat-tree with k = {}: {} switches, {} hosts, {} links",
        tree.k(),
        tree.net().switches().len(),
        tree.net().hosts().len(),
        tree.net().links().len()
    );

    let flows = match args.cmd {
        MainCommand::Run { flows, size } => random_flows(&tree, args.seed, flows, size)?,
        MainCommand::Ping { src, dst } => {
            let src = tree.net().get_host_id(src)?;
            let dst = tree.net().get_host_id(dst)?;
            vec![(src, dst, b"ping".to_vec())]
        }
    };

    let mut sent = 0;
    for (src, dst, data) in flows {
        let dst_ip = tree.net().get_host(dst)?.ip();
        debug!("{} -> {}", tree.net().get_device_name(src)?, dst_ip);
        tree.net_mut().send(src, dst_ip, data)?;
        sent += 1;
    }

    // retry the address resolution of all flows still waiting
    for round in 0..args.retries {
        let mut retransmitted = 0;
        for host in tree.hosts() {
            retransmitted += tree.net_mut().retransmit_arp(host)?;
        }
        if retransmitted == 0 {
            break;
        }
        info!("Retry round {}: {} ARP requests retransmitted", round + 1, retransmitted);
    }

    info!("Directory:\n    {}", printer::directory(tree.net()).join("\n    "));
    for switch in tree.net().switches() {
        debug!("{}", printer::switch_stats(tree.net(), switch)?);
    }

    let report = Report::new(&tree, args.seed, sent);
    println!("{}", report.summary());
    if report.delivered < sent {
        warn!("{} of {} flows were not delivered", sent - report.delivered, sent);
    }

    if let Some(json_file) = args.json_filename.as_ref() {
        let result_str = serde_json::to_string_pretty(&report)?;
        std::fs::write(json_file, result_str)?;
    }

    Ok(())
}

/// Pick `n` random pairs of distinct hosts.
fn random_flows(
    tree: &FatTree,
    seed: Option<u64>,
    n: usize,
    size: usize,
) -> Result<Vec<(HostId, HostId, Vec<u8>)>, Box<dyn Error>> {
    let hosts = tree.hosts();
    if hosts.len() < 2 {
        return Err("At least two hosts are required to generate traffic".into());
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok((0..n)
        .map(|_| {
            let src = rng.gen_range(0, hosts.len());
            let dst = (src + rng.gen_range(1, hosts.len())) % hosts.len();
            let data = (0..size).map(|_| rng.gen::<u8>()).collect();
            (hosts[src], hosts[dst], data)
        })
        .collect())
}

/// This binary builds a k-ary fat-tree running PortLand, sends traffic between its hosts and
/// reports the statistics of the switches and the fabric manager.
#[derive(Parser, Debug)]
#[clap(name = "PortLand (Binary)", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Parameter k of the fat-tree (even, between 2 and 32)
    #[clap(short = 'k', long, default_value = "4")]
    k: usize,
    /// Random seed, to get reproducable runs
    #[clap(short = 's', long)]
    seed: Option<u64>,
    /// Maximum number of events processed per operation
    #[clap(long, default_value = "100000")]
    stop_after: usize,
    /// Number of ARP retransmission rounds for unresolved destinations
    #[clap(short = 'r', long, default_value = "3")]
    retries: usize,
    /// Store the result summary in a json file
    #[clap(long = "json")]
    json_filename: Option<String>,
    /// Traffic to send
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Send data between random pairs of hosts
    #[clap(name = "run")]
    Run {
        /// Number of flows
        #[clap(short = 'n', long, default_value = "16")]
        flows: usize,
        /// Payload size of every flow in bytes
        #[clap(long, default_value = "64")]
        size: usize,
    },
    /// Send a single packet between two hosts, selected by name (e.g., `host-0-0-0`)
    #[clap(name = "ping")]
    Ping {
        /// Name of the source host
        src: String,
        /// Name of the destination host
        dst: String,
    },
}

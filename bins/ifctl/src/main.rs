//! ifctl - show interface configuration and hardware offload settings.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ifinfo::ethtool::{ControlSocket, Offload};
use ifinfo::netlink::ConnectionPool;
use ifinfo::{Family, Interface};

#[derive(Parser)]
#[command(name = "ifctl", version, about = "Interface configuration query tool")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show link and address information for a device.
    #[command(visible_alias = "s")]
    Show {
        /// Device name
        device: String,
    },

    /// Show configured addresses for a device.
    #[command(visible_alias = "a", visible_alias = "addr")]
    Addresses {
        /// Device name
        device: String,
    },

    /// List known devices.
    #[command(visible_alias = "l")]
    List {
        /// Only devices that are administratively up.
        #[arg(long)]
        active: bool,
    },

    /// Show driver name and bus information.
    Driver {
        /// Device name
        device: String,
    },

    /// Show or toggle hardware offloads.
    #[command(visible_alias = "k")]
    Offload {
        /// Device name
        device: String,

        /// Toggle TCP segmentation offload (on/off).
        #[arg(long)]
        tso: Option<String>,

        /// Toggle UDP fragmentation offload (on/off).
        #[arg(long)]
        ufo: Option<String>,

        /// Toggle generic segmentation offload (on/off).
        #[arg(long)]
        gso: Option<String>,

        /// Toggle scatter-gather (on/off).
        #[arg(long)]
        sg: Option<String>,
    },

    /// Show interrupt coalescing parameters.
    #[command(visible_alias = "c")]
    Coalesce {
        /// Device name
        device: String,
    },

    /// Show ring buffer sizes.
    #[command(visible_alias = "g")]
    Rings {
        /// Device name
        device: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Show { device } => show(&device, cli.json).await,
        Command::Addresses { device } => addresses(&device, cli.json).await,
        Command::List { active } => list(active, cli.json),
        Command::Driver { device } => driver(&device, cli.json),
        Command::Offload {
            device,
            tso,
            ufo,
            gso,
            sg,
        } => offload(&device, cli.json, &[
            (Offload::Tso, tso),
            (Offload::Ufo, ufo),
            (Offload::Gso, gso),
            (Offload::Sg, sg),
        ]),
        Command::Coalesce { device } => coalesce(&device, cli.json),
        Command::Rings { device } => rings(&device, cli.json),
    }
}

async fn show(device: &str, json: bool) -> anyhow::Result<()> {
    let pool = ConnectionPool::new();
    let mut iface = Interface::new(device, pool);
    iface
        .refresh()
        .await
        .with_context(|| format!("querying {device}"))?;
    let record = iface.record();

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    let index = record.index.unwrap_or(-1);
    print!("{}: {}", index, record.name);
    if let Some(hw) = &record.hw_address {
        print!("  link/{}", hw);
    }
    println!();
    print_addresses(record);
    Ok(())
}

async fn addresses(device: &str, json: bool) -> anyhow::Result<()> {
    let pool = ConnectionPool::new();
    let mut iface = Interface::new(device, pool);
    iface
        .query_addresses(Family::V4)
        .await
        .with_context(|| format!("querying {device}"))?;
    iface.query_addresses(Family::V6).await?;
    let record = iface.record();

    if json {
        let all: Vec<_> = record
            .ipv4_addresses
            .iter()
            .chain(&record.ipv6_addresses)
            .collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    print_addresses(record);
    Ok(())
}

fn print_addresses(record: &ifinfo::InterfaceRecord) {
    for addr in record.ipv4_addresses.iter().chain(&record.ipv6_addresses) {
        let family = match addr.family {
            Family::V4 => "inet",
            Family::V6 => "inet6",
        };
        print!("    {} {}/{}", family, addr.local, addr.prefix_len);
        if let Some(peer) = &addr.peer {
            print!(" peer {}", peer);
        }
        if let Some(brd) = &addr.broadcast {
            print!(" brd {}", brd);
        }
        println!(" scope {}", addr.scope);
    }
}

fn list(active: bool, json: bool) -> anyhow::Result<()> {
    let devices = if active {
        ifinfo::devices::get_active_devices()?
    } else {
        ifinfo::devices::get_devices()?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else {
        for name in devices {
            println!("{}", name);
        }
    }
    Ok(())
}

fn driver(device: &str, json: bool) -> anyhow::Result<()> {
    let socket = ControlSocket::open()?;
    let info = socket
        .driver_info(device)
        .with_context(|| format!("no driver information for {device}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("driver: {}", info.driver);
        println!("version: {}", info.version);
        println!("firmware-version: {}", info.fw_version);
        println!("bus-info: {}", info.bus_info);
    }
    Ok(())
}

fn offload(
    device: &str,
    json: bool,
    requests: &[(Offload, Option<String>)],
) -> anyhow::Result<()> {
    let socket = ControlSocket::open()?;

    for (which, toggle) in requests {
        if let Some(toggle) = toggle {
            let enable = parse_toggle(toggle)?;
            socket
                .set_offload(device, *which, enable)
                .with_context(|| format!("setting {:?} on {device}", which))?;
        }
    }

    let settings: Vec<(&str, Option<bool>)> = [
        ("tcp-segmentation-offload", Offload::Tso),
        ("udp-fragmentation-offload", Offload::Ufo),
        ("generic-segmentation-offload", Offload::Gso),
        ("scatter-gather", Offload::Sg),
    ]
    .into_iter()
    .map(|(label, which)| (label, socket.offload(device, which).ok()))
    .collect();

    if json {
        let map: serde_json::Map<_, _> = settings
            .iter()
            .map(|(label, state)| ((*label).to_string(), serde_json::json!(state)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        println!("Offload settings for {}:", device);
        for (label, state) in settings {
            let state = match state {
                Some(true) => "on",
                Some(false) => "off",
                None => "unavailable",
            };
            println!("\t{}: {}", label, state);
        }
    }
    Ok(())
}

fn coalesce(device: &str, json: bool) -> anyhow::Result<()> {
    let socket = ControlSocket::open()?;
    let coal = socket
        .coalesce(device)
        .with_context(|| format!("no coalesce parameters for {device}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&coal)?);
    } else {
        println!("Coalesce parameters for {}:", device);
        println!("\trx-usecs: {}", coal.rx_coalesce_usecs);
        println!("\trx-frames: {}", coal.rx_max_coalesced_frames);
        println!("\ttx-usecs: {}", coal.tx_coalesce_usecs);
        println!("\ttx-frames: {}", coal.tx_max_coalesced_frames);
        println!("\tadaptive-rx: {}", coal.use_adaptive_rx_coalesce != 0);
        println!("\tadaptive-tx: {}", coal.use_adaptive_tx_coalesce != 0);
    }
    Ok(())
}

fn rings(device: &str, json: bool) -> anyhow::Result<()> {
    let socket = ControlSocket::open()?;
    let ring = socket
        .ring_param(device)
        .with_context(|| format!("no ring parameters for {device}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ring)?);
    } else {
        println!("Ring parameters for {}:", device);
        println!("\trx: {} (max {})", ring.rx_pending, ring.rx_max_pending);
        println!("\ttx: {} (max {})", ring.tx_pending, ring.tx_max_pending);
    }
    Ok(())
}

fn parse_toggle(value: &str) -> anyhow::Result<bool> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => bail!("expected 'on' or 'off', got '{other}'"),
    }
}

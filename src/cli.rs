//! CLI argument parsing

use ch9121_core::{NetworkMode, UartFraming};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::Ipv4Addr;

const BACKEND_HELP: &str =
    "Backend to use: serial:dev=<path>[,baud=<n>][,pin=rts|dtr|gpio][,gpiochip=<n>][,line=<n>][,active=low|high] or dummy";

/// Parse "stop,check,data" (e.g. "1,4,8")
fn parse_framing(s: &str) -> Result<UartFraming, String> {
    let fields: Vec<&str> = s.split(',').map(str::trim).collect();
    let [stop, check, data] = fields.as_slice() else {
        return Err(format!(
            "Expected stop,check,data (e.g. 1,4,8), got '{}'",
            s
        ));
    };

    let field = |name: &str, value: &str| {
        value
            .parse::<u8>()
            .map_err(|e| format!("Invalid {} value '{}': {}", name, value, e))
    };

    Ok(UartFraming {
        stop_bits: field("stop bits", *stop)?,
        check: field("check", *check)?,
        data_bits: field("data bits", *data)?,
    })
}

#[derive(Parser)]
#[command(name = "ch9121")]
#[command(author, version, about = "CH9121 UART-to-Ethernet bridge configuration tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// How long to wait for each reply, in milliseconds (0 waits forever)
    #[arg(long, default_value_t = 1000, global = true)]
    pub timeout_ms: u32,

    /// Interval between receive buffer polls, in milliseconds
    #[arg(long, default_value_t = 10, global = true)]
    pub poll_ms: u32,

    /// Settle time after switching the CFG0 pin, in milliseconds
    #[arg(long, default_value_t = 10, global = true)]
    pub settle_ms: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the full device configuration
    Show {
        #[arg(short, long, help = BACKEND_HELP)]
        backend: String,
    },

    /// Print a single setting
    Get {
        #[arg(short, long, help = BACKEND_HELP)]
        backend: String,

        /// Setting to read
        #[arg(value_enum)]
        setting: Setting,

        /// UART port for per-port settings
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
        port: u8,
    },

    /// Change settings, save them and restart the chip
    Set {
        #[arg(short, long, help = BACKEND_HELP)]
        backend: String,

        #[command(flatten)]
        args: SetArgs,
    },

    /// List available backends
    ListBackends,
}

/// Readable settings
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Setting {
    /// Device IP address
    Ip,
    /// Subnet mask
    Subnet,
    /// Gateway address
    Gateway,
    /// Device MAC address
    Mac,
    /// Chip firmware version
    Version,
    /// Network mode of the port
    Mode,
    /// Local (device) port number
    LocalPort,
    /// Destination IP address
    DestIp,
    /// Destination port number
    DestPort,
    /// UART baud rate
    Baud,
    /// UART stop bits, check and data bits
    Framing,
    /// UART packet timeout
    Timeout,
    /// Port 2 enable flag
    Port2,
}

impl Setting {
    /// Whether the setting belongs to a UART port
    pub fn is_per_port(self) -> bool {
        matches!(
            self,
            Setting::Mode
                | Setting::LocalPort
                | Setting::DestIp
                | Setting::DestPort
                | Setting::Baud
                | Setting::Framing
                | Setting::Timeout
        )
    }
}

/// Network mode argument
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    TcpServer,
    TcpClient,
    UdpServer,
    UdpClient,
}

impl From<ModeArg> for NetworkMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::TcpServer => NetworkMode::TcpServer,
            ModeArg::TcpClient => NetworkMode::TcpClient,
            ModeArg::UdpServer => NetworkMode::UdpServer,
            ModeArg::UdpClient => NetworkMode::UdpClient,
        }
    }
}

/// On/off switch argument
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        self == Switch::On
    }
}

/// Settings accepted by `set`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Enable or disable DHCP
    #[arg(long, value_enum)]
    pub dhcp: Option<Switch>,

    /// Device IP address
    #[arg(long)]
    pub ip: Option<Ipv4Addr>,

    /// Subnet mask
    #[arg(long)]
    pub subnet: Option<Ipv4Addr>,

    /// Gateway address
    #[arg(long)]
    pub gateway: Option<Ipv4Addr>,

    /// Enable or disable UART port 2
    #[arg(long, value_enum)]
    pub enable_port2: Option<Switch>,

    /// UART port the per-port options below apply to
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub port: u8,

    /// Network mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Local (device) port number
    #[arg(long)]
    pub local_port: Option<u16>,

    /// Destination IP address
    #[arg(long)]
    pub dest_ip: Option<Ipv4Addr>,

    /// Destination port number
    #[arg(long)]
    pub dest_port: Option<u16>,

    /// UART baud rate
    #[arg(long)]
    pub baud: Option<u32>,

    /// UART framing as stop,check,data (check: 0 even, 1 odd, 2 mark, 3 space, 4 none)
    #[arg(long, value_parser = parse_framing)]
    pub framing: Option<UartFraming>,

    /// UART packet timeout, in units of 5 ms
    #[arg(long)]
    pub timeout: Option<u32>,
}

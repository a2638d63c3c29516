use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "targetsync",
    about = "Keep a load-balancer target set in step with a service catalog",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    #[arg(long, env = "CONFIG_FILE", help = "Path to the JSON config file")]
    pub config: PathBuf,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "BIND_ADDRESS", help = "Address for the readiness probe server")]
    pub bind_address: Option<SocketAddr>,

    #[arg(
        long,
        env = "LOCAL_ADDR",
        help = "Register this address in the destination once it appears in the source"
    )]
    pub local_addr: Option<String>,
}

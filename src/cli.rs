//! # The Command-Line Arguments

use crate::constants::{DEFAULT_PORT, MAX_CONNECTIONS};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "rescache-server")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum number of simultaneous client connections
    #[arg(short, long, default_value_t = MAX_CONNECTIONS)]
    pub max_conn: usize,
}

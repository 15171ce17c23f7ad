//! An interactive line client for the cache server

use anyhow::Result;
use clap::Parser;
use rescache::client::Client;
use rescache::config::init_logging;
use rescache::constants::DEFAULT_PORT;
use std::io::{stdout, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(name = "rescache-cli")]
#[command(author, version, about = "Issue commands to a rescache server", long_about = None)]
struct Cli {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);

    let mut client = Client::connect(&addr).await?;
    println!("Connected to {addr}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first() {
            None => {}
            Some(first) if first.eq_ignore_ascii_case("QUIT") => break,
            Some(first) if first.eq_ignore_ascii_case("HELP") => print_help(),
            Some(_) => match client.request(&parts).await {
                Ok(reply) => println!("{reply}"),
                Err(err) => {
                    eprintln!("Command failed: {err}");
                    break;
                }
            },
        }
        prompt();
    }

    Ok(())
}

fn prompt() {
    print!("rescache> ");
    stdout().flush().expect("flush stdout");
}

fn print_help() {
    println!(
        r#"Available commands:
  PING [message]
  ECHO message
  SET key value [EX seconds | PX millis]
  GET key
  DEL key [key ...]
  LPUSH key value [value ...]
  LPOP key
  HELP
  QUIT"#
    );
}

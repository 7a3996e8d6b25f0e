//! Memory Client CLI Tool
//!
//! Minimal terminal client for playing or debugging a Memory Rush server.
//! Every server line is printed as received; every stdin line is sent as-is.
//!
//! Usage:
//!   cargo run --bin memory-rush
//!   cargo run --bin memory-client -- --addr 127.0.0.1:8090
//!
//! Then type `FLIP:<index>`, `CHAT:<text>`, or `QUIT`.

use anyhow::{Context, Result};
use clap::Parser;
use memory_rush::protocol::ClientCommand;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "memory-client")]
#[command(about = "Interactive line client for the Memory Rush game server")]
struct Cli {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8090")]
    addr: String,

    /// Send a chat line right after connecting
    #[arg(long)]
    greeting: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let stream = TcpStream::connect(&cli.addr)
        .await
        .with_context(|| format!("Failed to connect to {}", cli.addr))?;
    println!("Connected to {}", cli.addr);

    let (reader, mut writer) = stream.into_split();

    if let Some(greeting) = &cli.greeting {
        let line = format!("{}\n", ClientCommand::Chat(greeting.clone()));
        writer.write_all(line.as_bytes()).await?;
    }

    let mut server_lines = BufReader::new(reader).lines();
    let mut input_lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = server_lines.next_line() => match line? {
                Some(line) => println!("< {}", line),
                None => {
                    println!("Server closed the connection");
                    break;
                }
            },
            line = input_lines.next_line() => match line? {
                Some(line) => {
                    writer.write_all(format!("{}\n", line).as_bytes()).await?;
                    if ClientCommand::parse(&line) == Some(ClientCommand::Quit) {
                        break;
                    }
                }
                None => {
                    writer
                        .write_all(format!("{}\n", ClientCommand::Quit).as_bytes())
                        .await?;
                    break;
                }
            },
        }
    }

    Ok(())
}

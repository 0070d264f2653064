// CLI entry point for the blastbots client.
//
// Validates the options (usage to stdout, non-zero exit on any config
// error), connects to the game server and the GUI, and runs the two
// handlers. Everything past argument parsing is in the library so the
// integration tests can drive a whole client in-process.

use std::process::exit;

use blastbots_client::{run, split_host_port, ClientConfig};
use blastbots_protocol::ByteString;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

#[derive(Parser, Debug)]
#[command(name = "blastbots-client", disable_version_flag = true)]
#[command(about = "GUI proxy for the blastbots multiplayer game")]
struct Cli {
    /// GUI endpoint: <hostname>:<port>, <IPv4>:<port> or <IPv6>:<port>.
    #[arg(short = 'd', long)]
    gui_address: String,

    /// Player name, at most 255 bytes.
    #[arg(short = 'n', long)]
    player_name: String,

    /// Local UDP port to listen on for GUI input.
    #[arg(short = 'p', long)]
    port: u16,

    /// Server endpoint: <hostname>:<port>, <IPv4>:<port> or <IPv6>:<port>.
    #[arg(short = 's', long)]
    server_address: String,
}

fn usage_and_exit(code: i32) -> ! {
    let mut cmd = Cli::command();
    let _ = cmd.print_help();
    exit(code);
}

fn parse_config() -> ClientConfig {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => usage_and_exit(0),
        Err(_) => usage_and_exit(1),
    };

    let Ok(player_name) = ByteString::try_from(cli.player_name.as_str()) else {
        usage_and_exit(1);
    };
    let Some((gui_host, gui_port)) = split_host_port(&cli.gui_address) else {
        usage_and_exit(1);
    };
    let Some((server_host, server_port)) = split_host_port(&cli.server_address) else {
        usage_and_exit(1);
    };

    ClientConfig {
        gui_host,
        gui_port,
        player_name,
        port: cli.port,
        server_host,
        server_port,
    }
}

fn main() {
    let config = parse_config();
    env_logger::init();

    if let Err(e) = run(config) {
        eprintln!("{e}");
        exit(1);
    }
}

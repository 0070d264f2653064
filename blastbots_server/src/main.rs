// CLI entry point for the blastbots game server.
//
// Parses and validates the server options, then starts the acceptor and
// game-manager threads and parks forever. The CLI contract: `--help`
// prints usage to stdout and exits 0; a missing or out-of-range option
// prints usage to stdout and exits non-zero — which is why parsing goes
// through `try_parse` instead of letting clap write to stderr.

use std::process::exit;
use std::time::{SystemTime, UNIX_EPOCH};

use blastbots_protocol::ByteString;
use blastbots_server::{start_server, ServerConfig};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "blastbots-server", disable_version_flag = true)]
#[command(about = "Authoritative server for the blastbots multiplayer game")]
struct Cli {
    /// Turns until a placed bomb explodes.
    #[arg(short = 'b', long, value_parser = clap::value_parser!(u16).range(1..))]
    bomb_timer: u16,

    /// Number of players a game needs.
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..))]
    players_count: u8,

    /// Turn length in milliseconds.
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u64).range(1..))]
    turn_duration: u64,

    /// Arm length of the explosion cross.
    #[arg(short = 'e', long)]
    explosion_radius: u16,

    /// Blocks placed at game start.
    #[arg(short = 'k', long)]
    initial_blocks: u16,

    /// Turns per game.
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u16).range(1..))]
    game_length: u16,

    /// Server name, at most 255 bytes.
    #[arg(short = 'n', long)]
    server_name: String,

    /// TCP port to accept connections on.
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Seed for board generation; defaults to the current Unix time.
    #[arg(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    seed: Option<u32>,

    /// Board width.
    #[arg(short = 'x', long, value_parser = clap::value_parser!(u16).range(1..))]
    size_x: u16,

    /// Board height.
    #[arg(short = 'y', long, value_parser = clap::value_parser!(u16).range(1..))]
    size_y: u16,
}

fn usage_and_exit(code: i32) -> ! {
    let mut cmd = Cli::command();
    let _ = cmd.print_help();
    exit(code);
}

fn parse_config() -> ServerConfig {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => usage_and_exit(0),
        Err(_) => usage_and_exit(1),
    };

    let Ok(server_name) = ByteString::try_from(cli.server_name.as_str()) else {
        usage_and_exit(1);
    };

    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or_default()
    });

    ServerConfig {
        bomb_timer: cli.bomb_timer,
        players_count: cli.players_count,
        turn_duration: cli.turn_duration,
        explosion_radius: cli.explosion_radius,
        initial_blocks: cli.initial_blocks,
        game_length: cli.game_length,
        server_name,
        port: cli.port,
        seed,
        size_x: cli.size_x,
        size_y: cli.size_y,
    }
}

fn main() {
    let config = parse_config();
    env_logger::init();

    let (handle, addr) = match start_server(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to start server: {e}");
            exit(1);
        }
    };

    info!("listening on {addr}");
    handle.join();
    // The manager loops forever; getting here means it died.
    eprintln!("game manager terminated unexpectedly");
    exit(1);
}

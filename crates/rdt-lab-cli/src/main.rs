//! Reference harness: a fixed message exchange between a client and a
//! server over two TCP links, driven by the full stop-and-wait-with-timeout
//! engine.

mod channel;

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use rdt_lab_engine::{RdtConfig, RdtError, RdtLevel, RdtSession};

use crate::channel::TcpChannelPort;

const CLIENT_MESSAGE: &[u8] = b"MSG_FROM_CLIENT";
const SERVER_MESSAGE: &[u8] = b"MSG_FROM_SERVER";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "RDT lab reference harness",
    long_about = "Runs a fixed demonstration exchange over two TCP links.\n\
                  The client sends a message, pauses, then receives the\n\
                  server's reply; the server does the mirror image.\n\
                  Exits with status 2 when the exchange times out."
)]
struct Args {
    /// Endpoint role.
    #[arg(value_enum)]
    role: Role,
    /// Server host name or address.
    server: String,
    /// Base port; the harness uses `port` and `port + 1`, one per
    /// directional link.
    port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    Client,
    Server,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let timed_out = err
                .downcast_ref::<RdtError>()
                .is_some_and(RdtError::is_timeout);
            error!("{err:#}");
            if timed_out {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(args: Args) -> Result<()> {
    let (outbound, inbound) = open_links(&args)?;
    let mut session = RdtSession::new(
        RdtLevel::StopAndWaitTimeout,
        harness_config(),
        outbound,
        inbound,
    );

    match args.role {
        Role::Client => {
            session.send(CLIENT_MESSAGE)?;
            info!("sent {}", String::from_utf8_lossy(CLIENT_MESSAGE));
            thread::sleep(Duration::from_secs(2));
            let reply = session.receive()?;
            info!("received {}", String::from_utf8_lossy(&reply));
        }
        Role::Server => {
            thread::sleep(Duration::from_secs(1));
            let message = session.receive()?;
            info!("received {}", String::from_utf8_lossy(&message));
            session.send(SERVER_MESSAGE)?;
            info!("sent {}", String::from_utf8_lossy(SERVER_MESSAGE));
        }
    }

    session.close();
    Ok(())
}

/// Two directional links, ports crossed between the roles: the server's
/// send link listens on `port` and its receive link on `port + 1`; the
/// client connects the mirror image.
fn open_links(args: &Args) -> Result<(TcpChannelPort, TcpChannelPort)> {
    match args.role {
        Role::Server => {
            let outbound = TcpChannelPort::listen(args.port)?;
            let inbound = TcpChannelPort::listen(args.port + 1)?;
            Ok((outbound, inbound))
        }
        Role::Client => {
            let inbound = TcpChannelPort::connect(&args.server, args.port)?;
            let outbound = TcpChannelPort::connect(&args.server, args.port + 1)?;
            Ok((outbound, inbound))
        }
    }
}

/// Generous wall-clock budgets: the demo endpoints deliberately pause
/// between steps.
fn harness_config() -> RdtConfig {
    RdtConfig {
        receive_timeout_ms: 4000,
        timeout_interval_ms: 500,
        max_retries: 5,
    }
}

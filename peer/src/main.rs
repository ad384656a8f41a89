//! Test peer for the motion streamer
//!
//! Connects over TCP simulation or RFCOMM, sends a command string and logs
//! every frame it receives.

use anyhow::{anyhow, Context, Result};
use bluer::rfcomm::{SocketAddr, Stream as RfcommStream};
use bluer::Address;
use clap::Parser;
use edroid_shared::service::DEFAULT_CHANNEL;
use edroid_shared::{Command, Frame, FrameDecoder, SampleRate};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "edroid-peer", about = "Connect to a motion streamer and log its frames")]
struct Cli {
    /// Connect over TCP to this address
    #[arg(long, value_name = "ADDR", conflicts_with = "rfcomm")]
    tcp: Option<String>,

    /// Connect over RFCOMM to this Bluetooth address
    #[arg(long, value_name = "MAC")]
    rfcomm: Option<String>,

    /// RFCOMM channel of the streamer's service
    #[arg(long, default_value_t = DEFAULT_CHANNEL, value_parser = clap::value_parser!(u8).range(1..=30))]
    channel: u8,

    /// Averaging window to request, a power of two from 2 to 128
    #[arg(long)]
    window: Option<usize>,

    /// Output rate to request in Hz (100, 50, 25, 20 or 10)
    #[arg(long)]
    rate: Option<u32>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Raw command bytes sent after the window and rate requests
    #[arg(default_value = "R")]
    commands: String,
}

enum Target {
    Tcp(String),
    Rfcomm { address: Address, channel: u8 },
}

struct PeerArgs {
    target: Target,
    commands: Vec<u8>,
    frames: Option<u64>,
}

impl TryFrom<Cli> for PeerArgs {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self> {
        let target = match cli.rfcomm {
            Some(mac) => {
                let address = mac
                    .parse()
                    .map_err(|e| anyhow!("invalid Bluetooth address '{}': {}", mac, e))?;
                Target::Rfcomm {
                    address,
                    channel: cli.channel,
                }
            }
            None => Target::Tcp(cli.tcp.unwrap_or_else(|| "127.0.0.1:9000".into())),
        };

        let mut commands = Vec::new();
        if let Some(samples) = cli.window {
            let command = Command::window(samples)
                .ok_or_else(|| anyhow!("window must be a power of two from 2 to 128"))?;
            commands.push(command.to_byte());
        }
        if let Some(hz) = cli.rate {
            let rate = SampleRate::from_hz(hz).ok_or_else(|| anyhow!("unsupported rate {} Hz", hz))?;
            commands.push(Command::Rate(rate).to_byte());
        }
        commands.extend_from_slice(cli.commands.as_bytes());

        Ok(PeerArgs {
            target,
            commands,
            frames: cli.frames,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = PeerArgs::try_from(Cli::parse())?;

    match &args.target {
        Target::Tcp(addr) => {
            let stream = TcpStream::connect(addr)
                .await
                .with_context(|| format!("connect to {}", addr))?;
            info!("Connected to {}", addr);
            run_peer(stream, &args).await
        }
        Target::Rfcomm { address, channel } => {
            let stream = RfcommStream::connect(SocketAddr::new(*address, *channel))
                .await
                .with_context(|| format!("RFCOMM connect to {} channel {}", address, channel))?;
            info!("[BT] Connected to {} channel {}", address, channel);
            run_peer(stream, &args).await
        }
    }
}

async fn run_peer<S>(mut stream: S, args: &PeerArgs) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&args.commands).await?;
    stream.flush().await?;
    info!("Sent commands {:?}", String::from_utf8_lossy(&args.commands));

    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; 4096];
    let mut received: u64 = 0;
    let mut last_number: Option<u8> = None;

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => {
                info!("Streamer closed the connection");
                break;
            }
            Ok(n) => {
                decoder.extend(&buf[..n]);

                // Process all complete frames
                while let Some(frame) = decoder.decode_next() {
                    if let Some(last) = last_number {
                        if frame.frame_number() != last.wrapping_add(1) {
                            warn!("Gap: frame {} after {}", frame.frame_number(), last);
                        }
                    }
                    last_number = Some(frame.frame_number());
                    log_frame(&frame);

                    received += 1;
                    if args.frames.is_some_and(|limit| received >= limit) {
                        info!("Received {} frames", received);
                        return Ok(());
                    }
                }
            }
            Err(e) => {
                warn!("Read error: {}", e);
                break;
            }
        }
    }

    info!("Received {} frames", received);
    Ok(())
}

fn log_frame(frame: &Frame) {
    let accel = frame.accelerometer();
    let mag = frame.magnetometer();
    info!(
        "#{:3} accel=({:4},{:4},{:4}) mag=({:5},{:5},{:5}) voltage={}",
        frame.frame_number(),
        accel.x,
        accel.y,
        accel.z,
        mag.x,
        mag.y,
        mag.z,
        frame.voltage()
    );
}

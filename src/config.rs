//! Streamer configuration and command-line flags

use crate::connection::RestartPolicy;
use crate::sampling::{AveragerConfig, Normalization};
use crate::transport::RfcommConfig;
use clap::Parser;
use edroid_shared::service::DEFAULT_CHANNEL;
use edroid_shared::SessionConfig;

/// Bluetooth transport mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BluetoothMode {
    /// Use real RFCOMM Bluetooth (requires BlueZ)
    #[default]
    Rfcomm,
    /// Use TCP simulation (for development)
    TcpSimulation,
}

/// Bluetooth configuration
#[derive(Debug, Clone)]
pub struct BluetoothConfig {
    /// Bluetooth transport mode
    pub mode: BluetoothMode,
    /// Service record and channel for RFCOMM mode
    pub rfcomm: RfcommConfig,
    /// TCP simulation address (when mode is TcpSimulation)
    pub tcp_address: String,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            mode: BluetoothMode::Rfcomm,
            rfcomm: RfcommConfig::default(),
            tcp_address: "127.0.0.1:9000".into(),
        }
    }
}

/// Configuration for the streaming device
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// Peer link configuration
    pub bluetooth: BluetoothConfig,
    /// Initial window and rate, changed later by peer commands
    pub session: SessionConfig,
    /// Sample normalization behaviour
    pub averager: AveragerConfig,
    /// What happens after a session ends
    pub restart: RestartPolicy,
    /// Rate of the simulated motion source
    pub simulated_sensor_hz: u32,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            bluetooth: BluetoothConfig::default(),
            session: SessionConfig::default(),
            averager: AveragerConfig::default(),
            restart: RestartPolicy::AfterSession,
            simulated_sensor_hz: 200,
        }
    }
}

/// Command-line flags of the streaming device
#[derive(Parser, Debug)]
#[command(name = "edroid-device", about = "Stream averaged motion frames to one paired peer")]
pub struct Cli {
    /// Serve over TCP on this address instead of RFCOMM
    #[arg(long, value_name = "ADDR")]
    pub tcp: Option<String>,

    /// RFCOMM channel to register the service on
    #[arg(long, default_value_t = DEFAULT_CHANNEL, value_parser = clap::value_parser!(u8).range(1..=30))]
    pub channel: u8,

    /// Scale readings by the sensor-reported range instead of the running maximum
    #[arg(long)]
    pub range_normalization: bool,

    /// Advance the averaging window on accelerometer samples alone
    #[arg(long)]
    pub no_magnetometer: bool,

    /// Serve a single peer and exit
    #[arg(long)]
    pub once: bool,

    /// Rate of the simulated motion source
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u32).range(1..=10_000))]
    pub sensor_hz: u32,
}

impl From<Cli> for StreamerConfig {
    fn from(cli: Cli) -> Self {
        let mut config = Self::default();

        if let Some(address) = cli.tcp {
            config.bluetooth.mode = BluetoothMode::TcpSimulation;
            config.bluetooth.tcp_address = address;
        }
        config.bluetooth.rfcomm.channel = cli.channel;
        if cli.range_normalization {
            config.averager.normalization = Normalization::SensorRange;
        }
        config.averager.track_magnetometer = !cli.no_magnetometer;
        if cli.once {
            config.restart = RestartPolicy::Once;
        }
        config.simulated_sensor_hz = cli.sensor_hz;
        config
    }
}

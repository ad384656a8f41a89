mod command;
mod config;
mod connection;
mod control;
mod emitter;
mod error;
mod sampling;
mod status;
mod transport;

use anyhow::Result;
use command::CommandInterpreter;
use clap::Parser;
use config::{BluetoothMode, Cli, StreamerConfig};
use connection::Lifecycle;
use control::StreamControl;
use emitter::FrameEmitter;
use sampling::{SampleAverager, SensorFeed, SharedAverager, SimulatedSensor};
use status::{LogReporter, StatusReporter};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use transport::{ListenerFactory, RfcommListenerFactory, TcpListenerFactory};

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = StreamerConfig::from(Cli::parse());

    info!("eDroid streamer starting");
    info!(
        "  window {} samples, rate {}",
        config.session.average_samples_amount, config.session.samples_per_second
    );

    let control = Arc::new(StreamControl::new(config.session));
    let reporter: Arc<dyn StatusReporter> = Arc::new(LogReporter);
    let interpreter = Arc::new(CommandInterpreter::new(control.clone(), reporter.clone()));
    let averager: SharedAverager = Arc::new(Mutex::new(SampleAverager::new(
        config.session.average_samples_amount,
        config.averager,
    )));

    let shutdown = CancellationToken::new();

    // Motion source
    let sensor = SimulatedSensor::new(SensorFeed::new(averager.clone()), config.simulated_sensor_hz);
    let sensor_handle = tokio::spawn(sensor.run(shutdown.child_token()));

    match config.bluetooth.mode {
        BluetoothMode::Rfcomm => {
            let factory = RfcommListenerFactory::new(config.bluetooth.rfcomm.clone());
            run_link(factory, &config, control, interpreter, reporter, averager, &shutdown).await
        }
        BluetoothMode::TcpSimulation => {
            let factory = TcpListenerFactory::new(config.bluetooth.tcp_address.clone());
            run_link(factory, &config, control, interpreter, reporter, averager, &shutdown).await
        }
    }

    shutdown.cancel();
    let _ = sensor_handle.await;

    info!("Streamer stopped");
    Ok(())
}

/// Serve peers over one transport until Ctrl-C
///
/// Link failures are reported through the lifecycle and never end the process,
/// except in single-session mode.
async fn run_link<F: ListenerFactory>(
    factory: F,
    config: &StreamerConfig,
    control: Arc<StreamControl>,
    interpreter: Arc<CommandInterpreter>,
    reporter: Arc<dyn StatusReporter>,
    averager: SharedAverager,
    shutdown: &CancellationToken,
) {
    info!("Peer link: {}", factory.name());

    let lifecycle = Lifecycle::new(factory, control.clone(), interpreter, reporter, config.restart);
    let active = lifecycle.active_session();

    let emitter = FrameEmitter::new(averager, control, active.clone());
    let emitter_handle = tokio::spawn(emitter.run(shutdown.child_token()));

    lifecycle
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot listen for Ctrl-C: {}", e);
            }
        })
        .await;

    shutdown.cancel();
    let session = active.read().await.clone();
    if let Some(session) = session {
        session.close().await;
    }
    let _ = emitter_handle.await;
}

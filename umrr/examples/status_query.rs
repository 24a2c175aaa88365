//! Status query and parameter write against the loopback simulator

use tracing_subscriber::EnvFilter;
use umrr::simulator::Simulator;
use umrr::{Access, DataFormat, LoopbackTransport, ProtocolVersion, Sensor, SensorConfig, Value};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=umrr=trace shows every frame
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let version = match std::env::var("UAT_VERSION").as_deref() {
        Ok("4") => ProtocolVersion::V4,
        _ => ProtocolVersion::V1,
    };

    let (host, radar) = LoopbackTransport::pair();
    let simulator = Simulator::new(radar).with_parameter(2010, 3042, Value::Integer(42));
    tokio::spawn(simulator.run());

    let sensor = Sensor::new(host, SensorConfig::default().with_uat_version(version))?;
    println!("Using {}", version);

    let status = sensor
        .request_status(2010, 3042, 0, DataFormat::Integer)
        .await?;
    status.ensure_success()?;
    println!("Status 3042: {:?}", status.value());

    let written = sensor
        .request_parameter(2010, 4, Value::Float(1.25), 0, DataFormat::Float, Access::ReadWrite)
        .await?;
    println!("Parameter 4 now {:?}", written.value());

    println!(
        "Routed {} frames, dropped {}",
        sensor.stats().routed(),
        sensor.stats().unrouted()
    );
    Ok(())
}

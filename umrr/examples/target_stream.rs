//! Target list decoding from a simulated object stream

use std::time::Duration;

use tracing_subscriber::EnvFilter;
use umrr::simulator::Simulator;
use umrr::{CanMessage, LoopbackTransport, ObjectListLayout, Sensor, SensorConfig, Signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Header: object count in byte 0, cycle counter in bytes 1-2.
    // Objects: range in cm, signed speed in cm/s.
    let layout = ObjectListLayout::new(0x400, Signal::new(0, 8)?)
        .with_header_signal("cycle", Signal::new(8, 16)?)
        .with_object_signal("range_m", Signal::new(0, 16)?.scaled(0.01, 0.0))
        .with_object_signal("speed_mps", Signal::new(16, 16)?.signed().scaled(0.01, 0.0));

    let (host, radar) = LoopbackTransport::pair();
    let config = SensorConfig::default()
        .with_object_layout(layout)
        .with_target_timeout(Duration::from_secs(1));
    let sensor = Sensor::new(host, config)?;
    let simulator = Simulator::new(radar);

    for cycle in 0u16..3 {
        let [lo, hi] = cycle.to_le_bytes();
        let header = CanMessage::new(0x400, [2, lo, hi, 0, 0, 0, 0, 0].into());
        let range = 1500 + cycle * 25;
        let [r0, r1] = range.to_le_bytes();
        let objects = [
            CanMessage::new(0x401, [r0, r1, 0x9C, 0xFF, 0, 0, 0, 0].into()),
            CanMessage::new(0x402, [0x20, 0x03, 0x32, 0x00, 0, 0, 0, 0].into()),
        ];
        simulator.send_target_list(header, &objects).await?;

        let list = sensor.receive_target_list().await?;
        println!("{} cycle {:?}", list, list.header.get("cycle"));
        for object in &list.objects {
            println!(
                "  0x{:03X}: range {:?} m, speed {:?} m/s",
                object.id,
                object.get("range_m"),
                object.get("speed_mps")
            );
        }
    }

    Ok(())
}

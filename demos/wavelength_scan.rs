//! Cornerstone 260 Hardware Smoke Test
//!
//! Run with: cargo run --example wavelength_scan -- /dev/ttyUSB0

use std::time::Duration;

use cornerstone260::Cornerstone260;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    println!("=== Cornerstone 260 Smoke Test ===\n");
    println!("Opening {port}...");

    let mut mono = Cornerstone260::open(&port, Duration::from_secs(5))?;
    println!("  ✓ Port opened\n");

    println!("Device: {}", mono.info()?);

    let grating = mono.grating()?;
    println!(
        "Grating {} ({} l/mm, '{}')",
        grating.number, grating.lines, grating.label
    );
    println!("Filter position: {}", mono.filter()?);
    println!("Output port: {}", mono.outport()?);
    println!("Shutter closed: {}", mono.shuttered()?);

    println!("\nScanning 500 -> 520 nm in 5 nm steps");
    for target in (500..=520).step_by(5) {
        let reached = mono.goto(f64::from(target))?;
        println!("  asked {target} nm, device at {reached:.3} nm");
    }

    println!("\nClosing shutter");
    mono.set_shutter(true)?;
    println!("Shutter closed: {}", mono.shuttered()?);

    mono.disconnect()?;
    println!("\nDone.");
    Ok(())
}

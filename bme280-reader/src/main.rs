use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use bme280::{Bme280, Bme280Builder, SlaveAddress, dew_point, frost_point};
use clap::Parser;
use linux_embedded_hal::{Delay, I2cdev};

/// Periodically print the readings of a BME280 sensor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long, default_value = "/dev/i2c-1")]
    path: String,
    /// 7-bit device address, decimal or 0x-prefixed hex
    #[arg(short, long, default_value = "0x77", value_parser = parse_address)]
    address: u8,
    /// Seconds between readings
    #[arg(short, long, default_value_t = 5)]
    interval: u64,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    log::info!("Arguments: {args:#?}");
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            log::info!("Received Ctrl+C, stopping...");
            running.store(false, Ordering::Relaxed);
        }) {
            log::warn!("Could not set Ctrl-C handler: {e}");
        }
    }
    let bus = match bme280::linux::open(&args.path) {
        Ok(bus) => bus,
        Err(e) => {
            log::error!("[BME] {}: {e}", args.path);
            std::process::exit(1);
        }
    };
    let mut bme = match Bme280Builder::default()
        .with_address(SlaveAddress::from_bits(args.address))
        .build(&bus, &mut Delay)
    {
        Ok(bme) => bme,
        Err(e) => {
            log::error!("[BME] 0x{:02x}: {e}", args.address);
            std::process::exit(1);
        }
    };
    println!(
        "[BME] {:?} found at address 0x{:02x}",
        bme.chip(),
        bme.get_address()
    );

    let interval = Duration::from_secs(args.interval);
    while running.load(Ordering::Relaxed) {
        let start = Instant::now();
        if let Err(e) = report(&mut bme) {
            log::error!("[BME] 0x{:02x}: {e}", bme.get_address());
            std::process::exit(1);
        }
        // Sleep in short steps so Ctrl+C is honored quickly
        while running.load(Ordering::Relaxed) && start.elapsed() < interval {
            std::thread::sleep((interval - start.elapsed()).min(Duration::from_millis(100)));
        }
    }
    log::info!("Bus transactions: {:?}", bus.stats());
}

fn report(bme: &mut Bme280<'_, I2cdev>) -> Result<(), bme280::Error<linux_embedded_hal::I2CError>> {
    let temperature = bme.read_temperature()?;
    let pressure = bme.read_pressure()?;
    if bme.chip().has_humidity() {
        let humidity = bme.read_humidity()?;
        let dew = dew_point(temperature, humidity);
        let frost = frost_point(temperature, dew);
        println!(
            "T = {temperature:.1} °C, P = {pressure:.1} hPa, RH = {humidity:.1} %, Dew = {dew:.1} °C, Frost = {frost:.1} °C"
        );
    } else {
        println!("T = {temperature:.1} °C, P = {pressure:.1} hPa");
    }
    Ok(())
}

//! Show command implementation

use ch9121_core::{ConfigReader, Transport};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

/// Read and print the whole configuration
pub fn cmd_show<T, P, D>(reader: &mut ConfigReader<T, P, D>) -> Result<(), Box<dyn std::error::Error>>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    log::info!("Reading CH9121 configuration...");
    let summary = reader.summary()?;
    println!("{}", summary);
    Ok(())
}

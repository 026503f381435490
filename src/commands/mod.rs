//! CLI command implementations
//!
//! Each command works against any backend: it only needs a [`Transport`],
//! a CFG0 [`OutputPin`] and a [`DelayNs`], which the backend dispatcher
//! hands to [`execute`].

mod get;
mod list;
mod set;
mod show;

use ch9121_core::{ConfigReader, ConfigWriter, Port, SessionConfig, Transport};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::cli::{SetArgs, Setting};

pub use get::cmd_get;
pub use list::list_backends;
pub use set::cmd_set;
pub use show::cmd_show;

/// A command that needs a device
pub enum Action<'a> {
    /// Print the full configuration
    Show,
    /// Print one setting
    Get { setting: Setting, port: Port },
    /// Stage and commit settings
    Set(&'a SetArgs),
}

/// Run `action` on a freshly opened backend
pub fn execute<T, P, D>(
    action: &Action<'_>,
    transport: T,
    pin: P,
    delay: D,
    config: SessionConfig,
) -> Result<(), Box<dyn std::error::Error>>
where
    T: Transport,
    P: OutputPin,
    D: DelayNs,
{
    match action {
        Action::Show => {
            let mut reader = ConfigReader::new(transport, pin, delay, config);
            cmd_show(&mut reader)
        }
        Action::Get { setting, port } => {
            let mut reader = ConfigReader::new(transport, pin, delay, config);
            let value = cmd_get(&mut reader, *setting, *port)?;
            println!("{}", value);
            Ok(())
        }
        Action::Set(args) => {
            let mut writer = ConfigWriter::new(transport, pin, delay, config);
            cmd_set(&mut writer, args)
        }
    }
}

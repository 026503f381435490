//! Backend registration and dispatch
//!
//! A backend supplies the three things a configuration session needs: the
//! serial transport, the CFG0 pin driver and a delay source. Backends are
//! feature-gated; the backend string selects one at runtime.

use ch9121_core::SessionConfig;

use crate::commands::{self, Action};

/// Information about a backend
pub struct BackendInfo {
    /// Name used in the backend string
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// Get information about all backends enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "serial")]
    backends.push(BackendInfo {
        name: "serial",
        description: "USB serial adapter, CFG0 on RTS/DTR or a GPIO line (dev=<port>)",
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        name: "dummy",
        description: "In-memory CH9121 emulator for testing",
    });

    backends
}

/// Comma-separated list of backend names
pub fn backend_names_short() -> String {
    let backends = available_backends();
    let names: Vec<&str> = backends.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Parse a backend string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_backend_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the selected backend and run `action` against it
#[allow(unused_variables, unused_mut)]
pub fn run_with_backend(
    backend: &str,
    mut config: SessionConfig,
    action: &Action<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (name, options) = parse_backend_string(backend);

    match name {
        #[cfg(feature = "serial")]
        "serial" => {
            let serial_options = ch9121_serial::parse_options(&options)
                .map_err(|e| format!("Invalid serial parameters: {}", e))?;

            log::info!("Opening serial backend on {}...", serial_options.device);

            let link = ch9121_serial::open_link(&serial_options).map_err(|e| {
                format!(
                    "Failed to open serial backend: {}\n\
                     Make sure the device exists and you have read/write permissions.\n\
                     You may need to: sudo usermod -aG dialout $USER",
                    e
                )
            })?;

            config = config.with_active_low(serial_options.active_low);
            commands::execute(action, link.transport, link.pin, link.delay, config)
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            let chip = ch9121_dummy::DummyCh9121::new_default();
            commands::execute(
                action,
                chip.transport(),
                chip.mode_pin(),
                ch9121_dummy::NoDelay,
                config,
            )
        }

        _ => Err(unknown_backend_error(name)),
    }
}

fn unknown_backend_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown backend: {}\n\n", name);
    msg.push_str(&format!("Available backends: {}", backend_names_short()));
    msg.push_str("\nUse 'ch9121 list-backends' for more details");
    msg.into()
}

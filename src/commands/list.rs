//! List commands implementation

use crate::backends;

/// List all backends compiled into this binary
pub fn list_backends() {
    println!("Available backends:");
    println!();
    for backend in backends::available_backends() {
        println!("  {:<8} - {}", backend.name, backend.description);
    }
    println!();
    println!("Serial options (serial:dev=<port>,...):");
    println!("  dev=<path>          Serial device (required)");
    println!("  baud=<n>            Baud rate (default 9600)");
    println!("  pin=rts|dtr|gpio    Output wired to CFG0 (default rts)");
    println!("  gpiochip=<n|path>   GPIO chip for pin=gpio");
    println!("  line=<n>            GPIO line offset for pin=gpio");
    println!("  active=low|high     CFG0 level selecting configuration mode (default low)");
}

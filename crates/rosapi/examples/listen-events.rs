//! Stream router log entries live over a dedicated channel.
//!
//! ```sh
//! cargo run --example listen-events -- 192.168.88.1 admin password
//! ```

use std::time::Duration;

use rosapi::client::{connect, ClientError, Credentials};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let host = argv.next().unwrap_or_else(|| "192.168.88.1".to_string());
    let user = argv.next().unwrap_or_else(|| "admin".to_string());
    let password = argv.next().unwrap_or_default();

    let conn = connect(&host, &Credentials::new(user, password))?;
    let channel = conn.open_channel_with(None, false)?;
    let entries = channel.data();

    let listen = channel.submit("/log/listen");

    // Print entries for ten seconds, then interrupt the listen.
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    while std::time::Instant::now() < deadline {
        if let Some(entry) = entries.recv_timeout(Duration::from_millis(250)) {
            let message = entry.event.attr("message").unwrap_or("");
            let topics = entry.event.attr("topics").unwrap_or("");
            println!("[{topics}] {message}");
        }
    }

    channel.submit("/cancel").wait()?;
    match listen.wait() {
        Ok(_) => {}
        Err(ClientError::Trap(trap)) => println!("listen interrupted: {trap}"),
        Err(err) => return Err(err.into()),
    }

    conn.close();
    Ok(())
}

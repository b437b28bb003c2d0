//! Connect to a router, run one command, print the records.
//!
//! ```sh
//! cargo run --example run-command -- 192.168.88.1 admin password
//! ```

use rosapi::client::{connect, Credentials};
use rosapi::proto::args_from_pairs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let host = argv.next().unwrap_or_else(|| "192.168.88.1".to_string());
    let user = argv.next().unwrap_or_else(|| "admin".to_string());
    let password = argv.next().unwrap_or_default();

    let conn = connect(&host, &Credentials::new(user, password))?;
    let channel = conn.open_channel()?;

    let command = "/interface/print";
    let args = args_from_pairs([("stats", "")], command);
    let reply = channel.submit_with_args(command, &args).wait()?;

    for record in reply.record_maps() {
        let name = record.get("name").map(String::as_str).unwrap_or("?");
        let running = record.get("running").map(String::as_str).unwrap_or("?");
        println!("{name}: running={running}");
    }

    conn.close();
    Ok(())
}

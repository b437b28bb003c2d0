use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rosapi_client::ClientError;

use crate::cmd::ListenArgs;
use crate::exit::{client_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_event_record, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let conn = args.connect.establish()?;

    let channel = conn
        .open_channel_with(None, false)
        .map_err(|err| client_error("open channel failed", err))?;
    let data = channel.data();

    let handle = channel.submit_with_args(&args.command, &args.words);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        match data.recv_timeout(Duration::from_millis(200)) {
            Some(event) => {
                print_event_record(&event, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            None => {
                if !conn.connected() {
                    return Err(CliError::new(FAILURE, "connection closed"));
                }
            }
        }
    }

    // Stop the listen; it settles with its interrupt trap.
    let _ = channel.submit("/cancel");
    match handle.wait_timeout(Duration::from_secs(2)) {
        Ok(_) | Err(ClientError::Trap(_)) => {}
        Err(err) => return Err(client_error("listen failed", err)),
    }

    conn.close();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

use crate::cmd::{parse_duration, RunArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_reply, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.wait_timeout)?;
    let conn = args.connect.establish()?;

    let channel = conn
        .open_channel()
        .map_err(|err| client_error("open channel failed", err))?;

    let reply = channel
        .submit_with_args(&args.command, &args.words)
        .wait_timeout(wait_timeout)
        .map_err(|err| client_error("command failed", err))?;

    print_reply(&reply, format);

    conn.close();
    Ok(SUCCESS)
}

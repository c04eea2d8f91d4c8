//! The `send` subcommand: a one-shot control-socket client.
//!
//! Useful for scripting and for poking a running daemon by hand:
//!
//! ```text
//! sidecar send '{"command": "ping"}'
//! ```

use anyhow::Result;

#[cfg(unix)]
pub fn run(request: &str) -> Result<()> {
    use anyhow::Context as _;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;

    let config = crate::config::cfg();
    let path = config.socket_path();

    let mut stream = UnixStream::connect(&path)
        .with_context(|| format!("failed to connect to {} (is the daemon running?)", path.display()))?;
    stream.write_all(request.as_bytes())?;
    stream.shutdown(std::net::Shutdown::Write)?;

    let mut reply = String::new();
    stream.read_to_string(&mut reply)?;
    println!("{reply}");
    Ok(())
}

#[cfg(not(unix))]
pub fn run(_request: &str) -> Result<()> {
    anyhow::bail!("the control socket is unix-only; use the HTTP endpoint instead")
}

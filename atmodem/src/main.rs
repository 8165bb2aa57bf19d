//! Hayes-compatible modem on the terminal: `AT` commands on stdin, calls
//! placed as TCP connections (`ATD host:port`).

mod backend;
mod config;
mod error;
mod runtime;
mod signals;
mod tty;

use std::io;
use std::os::fd::AsFd;

use anyhow::{Context, Result};
use atmodem_core::Modem;
use env_logger::Env;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};

use crate::backend::Backend;
use crate::config::ModemConfig;
use crate::runtime::{DIALLER_TOKEN, Runtime};
use crate::signals::SignalPipe;
use crate::tty::DteMode;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let config = ModemConfig::load();
    log::debug!("using {config:?}");

    let signals = SignalPipe::register(&[SIGTERM, SIGHUP, SIGINT])
        .context("failed to register signal handlers")?;
    let mut runtime = Runtime::new(config.tick())
        .context("failed to create event loop")?
        .with_translate_lf(config.translate_lf)
        .with_signals(signals);

    let dialler = Backend::from_config(&config, runtime.registry(), DIALLER_TOKEN)
        .context("failed to set up dialler")?;
    let mut modem = Modem::new(io::stdout(), dialler)
        .with_info(config.info())
        .with_registers(config.registers())
        .with_echo(config.echo)
        .with_verbose(config.verbose);

    let terminal = io::stdin();
    let mode =
        DteMode::enter(terminal.as_fd()).context("failed to set up terminal")?;
    log::debug!("raw terminal input: {}", mode.is_raw());

    let mut stdin = io::stdin();
    runtime
        .run(&mut modem, &mut stdin)
        .context("modem loop failed")?;
    Ok(())
}

#![doc = "Routes omniverse protocol messages between the configured EVM chains."]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use clap::Parser;

mod cli;
mod loader;
mod router;
mod scheduler;

#[cfg(test)]
mod test_utils;

fn main() {
    omni_cli::backtrace::enable();

    if let Err(err) = cli::Cli::parse().run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

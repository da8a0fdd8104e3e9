use crate::cli::Cli;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

/// Write a completion script for the given shell to stdout
pub fn execute(shell: Shell) {
    generate(shell, &mut Cli::command(), "locsites", &mut io::stdout());
}

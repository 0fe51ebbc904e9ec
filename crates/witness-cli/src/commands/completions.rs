//! Shell completions command implementation

use crate::Result;
use clap::Args;
use clap_complete::{generate, Shell};
use std::io;

/// Arguments for the completions command
#[derive(Debug, Clone, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write completions for `command` to stdout
pub async fn completions_command(args: CompletionsArgs, mut command: clap::Command) -> Result<()> {
    let name = command.get_name().to_string();
    generate(args.shell, &mut command, name, &mut io::stdout());
    Ok(())
}

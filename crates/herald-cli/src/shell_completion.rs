use clap::CommandFactory;
use clap_complete::{
    generate,
    shells::{Bash, Fish, Zsh},
};

use crate::{Cli, CliShellCompletion};

/// Binary name baked into generated completion scripts.
pub const SHELL_COMPLETION_COMMAND_NAME: &str = "herald";

pub fn render_shell_completion(shell: CliShellCompletion) -> String {
    let mut command = Cli::command();
    let mut script = Vec::new();
    match shell {
        CliShellCompletion::Bash => {
            generate(Bash, &mut command, SHELL_COMPLETION_COMMAND_NAME, &mut script)
        }
        CliShellCompletion::Zsh => {
            generate(Zsh, &mut command, SHELL_COMPLETION_COMMAND_NAME, &mut script)
        }
        CliShellCompletion::Fish => {
            generate(Fish, &mut command, SHELL_COMPLETION_COMMAND_NAME, &mut script)
        }
    }
    String::from_utf8_lossy(&script).into_owned()
}

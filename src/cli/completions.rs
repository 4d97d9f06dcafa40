use clap::Parser;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    banana completions bash > ~/.bash_completion.d/banana\n\n\
                  Generate zsh completions:\n    banana completions zsh > ~/.zfunc/_banana\n\n\
                  Generate fish completions:\n    banana completions fish > ~/.config/fish/completions/banana.fish\n\n\
                  Generate PowerShell completions:\n    banana completions powershell")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}

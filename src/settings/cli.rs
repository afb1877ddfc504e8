use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "feedline", about = "Social feed API server")]
pub struct Cli {
    /// Path to a settings file; defaults to settings/dev.toml (debug) or settings/release.toml.
    #[arg(long)]
    pub settings: Option<String>,
}

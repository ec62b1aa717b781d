use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[clap(author, about, version)]
pub struct Args {
    /// Optional path to overwrite the config
    #[arg(short, long, default_value = "ragmark.toml")]
    pub config_path: PathBuf,

    /// Evaluate a single test (default), the retrieval suite, or the answer suite
    #[arg(short, long, default_value = "single")]
    pub mode: ModeArgs,

    /// Which test case to evaluate when running a single test
    #[arg(short, long, required_if_eq("mode", "single"))]
    pub test_index: Option<usize>,

    /// Print the configuration and exit
    #[arg(long)]
    pub print_config: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum ModeArgs {
    #[default]
    Single,
    Retrieval,
    Answers,
}

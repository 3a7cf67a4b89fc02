use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;


pub use args::{AddArgs, InitArgs, MessageIdArg, ThreadIdArg};

#[derive(Debug, Parser)]
#[command(name = "mailthread")]
#[command(about = "Mail message index with reference-based threading", version)]
pub struct Cli {
    #[arg(long, default_value = ".mailthread")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Init(InitArgs),
    Add(AddArgs),
    Show(MessageIdArg),
    Thread(ThreadIdArg),
    Status,
}

use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Create the index without ghost documents (stash-based threading).
    #[arg(long, default_value_t = false)]
    pub legacy: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Message files or directories to add. Directories are walked recursively.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Skip files whose path (relative to the walked directory) matches this glob.
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Args)]
pub struct MessageIdArg {
    /// Message id without angle brackets.
    pub message_id: String,
}

#[derive(Debug, Args)]
pub struct ThreadIdArg {
    pub thread_id: String,
}

use std::path::PathBuf;

use clap::{ArgAction, Parser as ClapParser, ValueEnum};
use tracing::Level;

#[derive(ClapParser)]
#[command(name = "quarry", version, about = "quarry query execution host")]
pub struct CLI {
    #[command(flatten)]
    pub opts: Options,
}

#[derive(ClapParser, Debug, Clone)]
pub struct Options {
    #[arg(
        long = "wasm-dir",
        value_name = "WASM_DIRECTORY",
        default_value = "./wasm",
        help = "Directory holding the guest modules (<short_name>-server.wasm).",
        help_heading = "Host options",
        env = "QUARRY_WASM_DIR"
    )]
    pub wasm_dir: PathBuf,
    #[arg(
        long = "fixture",
        value_name = "FIXTURE_FILE_PATH",
        help = "JSON history fixture loaded into the in-memory store at startup.",
        long_help = "Receives a `HistoryFixture` in json format: blocks, action traces, accounts, contract rows and secondary-index entries. Without it the host serves an empty history and every request fails with `database is empty`.",
        help_heading = "Host options",
        env = "QUARRY_FIXTURE"
    )]
    pub fixture: Option<PathBuf>,
    #[arg(
        long = "console",
        action = ArgAction::SetTrue,
        help = "Forward guest print_range output to stderr.",
        help_heading = "Host options",
        env = "QUARRY_CONSOLE"
    )]
    pub console: bool,
    #[arg(
        long = "http.addr",
        value_name = "ADDRESS",
        default_value = "0.0.0.0",
        help_heading = "HTTP options",
        env = "QUARRY_HTTP_ADDR"
    )]
    pub http_addr: String,
    #[arg(
        long = "http.port",
        value_name = "PORT",
        default_value = "8880",
        help_heading = "HTTP options",
        env = "QUARRY_HTTP_PORT"
    )]
    pub http_port: String,
    #[arg(
        long = "log.level",
        default_value = "info",
        value_name = "LOG_LEVEL",
        help = "The verbosity level used for logs.",
        long_help = "Possible values: info, debug, trace, warn, error",
        help_heading = "Node options",
        env = "QUARRY_LOG_LEVEL"
    )]
    pub log_level: Level,
    #[arg(
        long = "log.color",
        default_value = "auto",
        value_name = "COLOR",
        help = "Whether to color the logs.",
        help_heading = "Node options",
        env = "QUARRY_LOG_COLOR"
    )]
    pub log_color: LogColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogColor {
    Always,
    Never,
    Auto,
}

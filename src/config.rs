// ABOUTME: Version and REPL banner constants

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_BANNER: &str = "Mal [Rust]";
pub const REPL_PROMPT: &str = "user> ";

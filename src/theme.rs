/// Terminal styling for the chat session.
///
/// Colors are plain ANSI sequences; they are dropped when stdout is not a
/// terminal or `NO_COLOR` is set.
use std::io::stdout;

use crossterm::tty::IsTty;

// ---------------------------------------------------------------------------
// ANSI color helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";
pub const BLUE: &str = "\x1b[34m";
pub const BOLD_CYAN: &str = "\x1b[1;36m";
pub const BOLD_YELLOW: &str = "\x1b[1;33m";

pub fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && stdout().is_tty()
}

pub fn paint(color: &str, text: &str) -> String {
    if color_enabled() {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

// ---------------------------------------------------------------------------
// Chat chrome
// ---------------------------------------------------------------------------

pub fn input_prompt() -> String {
    paint(YELLOW, "You: ")
}

pub fn assistant_label() -> String {
    paint(BOLD_YELLOW, "Assistant:")
}

pub fn status(text: &str) {
    println!("{}", paint(BLUE, text));
}

pub fn success(text: &str) {
    println!("{}", paint(GREEN, text));
}

pub fn failure(text: &str) {
    eprintln!("{}", paint(RED, text));
}

/// Startup line shown once discovery has finished.
pub fn print_startup_banner(stack_name: &str, model: &str) {
    let version = env!("CARGO_PKG_VERSION");
    let width = crossterm::terminal::size()
        .map(|(cols, _)| usize::from(cols).clamp(20, 72))
        .unwrap_or(72);
    println!();
    println!(
        "  {}  {}",
        paint(BOLD_CYAN, &format!("serverless-scout v{version}")),
        paint(DIM, &format!("stack {stack_name} · {model}"))
    );
    println!("  {}", paint(DIM, "Ask about the stack, or type exit to quit."));
    println!("  {}", paint(DIM, &"━".repeat(width.saturating_sub(4))));
    println!();
}

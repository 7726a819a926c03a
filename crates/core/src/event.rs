/// Commands accepted from the control surface.
///
/// Sources:
/// - console input   → every variant, via [`Command::parse`]
/// - Ctrl-C handler  → `Shutdown`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Pause or resume ingest.
    Toggle,
    /// Empty the window and publish the empty state promptly.
    Reset,
    /// Log the current run-state and window size.
    Status,
    /// Stop both periodic tasks and exit.
    Shutdown,
}

impl Command {
    /// Parse one line of console input. Unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "t" | "toggle" | "p" | "pause" => Some(Self::Toggle),
            "r" | "reset" => Some(Self::Reset),
            "s" | "status" => Some(Self::Status),
            "q" | "quit" | "exit" => Some(Self::Shutdown),
            _ => None,
        }
    }
}

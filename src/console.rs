use std::io::{self, Write};

/// Receives the status strings written during boot
pub trait Console {
    fn display(&mut self, message: &str);
}

/// Writes straight to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn display(&mut self, message: &str) {
        let mut stdout = io::stdout().lock();
        if let Err(err) = stdout.write_all(message.as_bytes()).and_then(|_| stdout.flush()) {
            log::error!("failed to write to console: {}", err);
        }
    }
}

/// Records every message, in order
impl Console for Vec<String> {
    fn display(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}

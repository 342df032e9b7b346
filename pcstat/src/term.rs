/// Width of the terminal on stdout, in columns.
///
/// Returns `None` when stdout is not a terminal, or the terminal doesn't report a size.
pub fn terminal_columns() -> Option<usize> {
    let ws = rustix::termios::tcgetwinsize(std::io::stdout()).ok()?;
    match ws.ws_col {
        0 => None,
        cols => Some(cols as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_columns() {
        // under `cargo test` stdout is usually captured, so either answer is fine
        if let Some(cols) = terminal_columns() {
            assert!(cols > 0);
        }
    }
}

//! Terminal detection.

use std::io::IsTerminal;

/// Check if stdout is a TTY.
#[must_use]
pub fn stdout_is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Check if stderr is a TTY.
#[must_use]
pub fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Check if color should be enabled.
#[must_use]
pub fn should_use_color(no_color_flag: bool) -> bool {
    color_allowed(no_color_flag, |key| std::env::var(key).ok()) && stdout_is_tty()
}

/// Check if color should be enabled for stderr.
#[must_use]
pub fn should_color_stderr(no_color_flag: bool) -> bool {
    color_allowed(no_color_flag, |key| std::env::var(key).ok()) && stderr_is_tty()
}

/// Flag and environment checks, without the TTY test.
#[must_use]
pub fn color_allowed(no_color_flag: bool, env: impl Fn(&str) -> Option<String>) -> bool {
    if no_color_flag {
        return false;
    }

    if env("NO_COLOR").is_some() {
        return false;
    }

    !env("TERM").is_some_and(|t| t == "dumb")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_and_env_disable_color() {
        assert!(!color_allowed(true, |_| None));
        assert!(!color_allowed(false, |k| (k == "NO_COLOR").then(String::new)));
        assert!(!color_allowed(false, |k| (k == "TERM").then(|| "dumb".to_string())));
        assert!(color_allowed(false, |k| (k == "TERM").then(|| "xterm-256color".to_string())));
    }
}

//! Confirmation prompts for destructive operations.
//!
//! Prune, decay and destroy confirm every deletion unless `--yes` was
//! given. The prompt is a capability object injected into the lifecycle
//! operations, so tests can script answers.

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

/// Confirmation capability.
pub trait Prompt {
    /// Show `message` and return whether the action is confirmed.
    fn confirm(&self, message: &str) -> bool;
}

/// Interactive `[y/N]` prompt on stdin. Anything but `y`/`yes` declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractivePrompt;

impl Prompt for InteractivePrompt {
    fn confirm(&self, message: &str) -> bool {
        print!("{message} [y/N] ");
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Non-interactive confirmation for `--yes`: echoes the message, confirms.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&self, message: &str) -> bool {
        println!("{message}");
        true
    }
}

/// Silent confirmation, used by autoprune/autodecay after a backup.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysYes;

impl Prompt for AlwaysYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }
}

/// Mock prompt with a fixed answer, recording every question asked.
/// Cloning creates a new handle to the same recorded questions.
#[derive(Debug, Clone)]
pub struct MockPrompt {
    answer: bool,
    asked: Arc<Mutex<Vec<String>>>,
}

impl MockPrompt {
    /// A prompt answering yes to everything.
    pub fn yes() -> Self {
        Self {
            answer: true,
            asked: Arc::default(),
        }
    }

    /// A prompt answering no to everything.
    pub fn no() -> Self {
        Self {
            answer: false,
            asked: Arc::default(),
        }
    }

    /// The questions asked, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompt for MockPrompt {
    fn confirm(&self, message: &str) -> bool {
        self.asked.lock().unwrap().push(message.to_string());
        self.answer
    }
}

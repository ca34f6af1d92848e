//! Fail-fast command batches.
//!
//! A [`CommandBatch`] is one transactional unit of the generated script: its
//! commands are chained with `&&` so the first failing command stops the rest
//! of the line.

use std::fmt;

/// Characters that never need quoting in a POSIX shell word.
const SHELL_SAFE: &[char] = &['_', '@', '%', '+', '=', ':', ',', '.', '/', '-'];

/// Quote a single shell word.
///
/// Words made only of alphanumerics and `_@%+=:,./-` are returned bare so the
/// generated commands stay readable; anything else is wrapped in single
/// quotes with embedded quotes escaped as `'\''`.
///
/// # Examples
///
/// ```
/// use rebuilder::batch::shell_quote;
///
/// assert_eq!(shell_quote("build/app-unsigned.apk"), "build/app-unsigned.apk");
/// assert_eq!(shell_quote("my app.apk"), "'my app.apk'");
/// assert_eq!(shell_quote("it's"), r"'it'\''s'");
/// ```
#[must_use]
pub fn shell_quote(word: &str) -> String {
    let is_safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SHELL_SAFE.contains(&c));
    if is_safe {
        return word.to_owned();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

/// An ordered sequence of shell commands executed as one fail-fast chain.
///
/// Batches are built by a single stage call and are not modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandBatch {
    commands: Vec<String>,
}

impl CommandBatch {
    /// Create a batch from already formatted commands.
    #[must_use]
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    /// The commands in execution order.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Number of commands in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch holds no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Render the batch as a single script line, without the terminator.
    ///
    /// The line starts with the `:` no-op so an empty batch still yields a
    /// valid shell line.
    ///
    /// # Examples
    ///
    /// ```
    /// use rebuilder::batch::CommandBatch;
    ///
    /// assert_eq!(CommandBatch::default().to_script_line(), ": ");
    ///
    /// let batch = CommandBatch::new(vec!["true".to_owned(), "echo ok".to_owned()]);
    /// assert_eq!(batch.to_script_line(), ": && true && echo ok");
    /// ```
    #[must_use]
    pub fn to_script_line(&self) -> String {
        if self.commands.is_empty() {
            return ": ".to_owned();
        }
        let mut line = String::from(":");
        for command in &self.commands {
            line.push_str(" && ");
            line.push_str(command);
        }
        line
    }
}

impl From<Vec<String>> for CommandBatch {
    fn from(commands: Vec<String>) -> Self {
        Self::new(commands)
    }
}

impl fmt::Display for CommandBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_script_line())
    }
}

/// Format a progress line announcing a step.
pub(crate) fn echo(message: &str) -> String {
    format!("echo {}", shell_quote(message))
}

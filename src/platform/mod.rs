//! Host capabilities the engine consumes but does not implement.
//!
//! Script output is routed through a [`ConsoleProvider`]; regular
//! expressions are delegated to a [`PatternMatcher`]. Both are trait objects
//! owned by the interpreter so hosts can swap them.

use std::cell::RefCell;
use std::rc::Rc;

mod std_impl;

pub use std_impl::StdConsoleProvider;

#[cfg(feature = "regex")]
pub use std_impl::FancyRegexMatcher;

/// Log level for console output.
///
/// Maps to the different console methods: console.log(), console.warn(), etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// console.log() - general output
    Log,
    /// console.info() - informational messages
    Info,
    /// console.debug() - debug messages
    Debug,
    /// console.warn() - warnings
    Warn,
    /// console.error() - errors and unhandled task faults
    Error,
}

/// Trait for handling console output.
pub trait ConsoleProvider {
    /// Write a message at the specified log level.
    fn write(&self, level: ConsoleLevel, message: &str);
}

/// A console provider that discards all output.
pub struct NoOpConsoleProvider;

impl ConsoleProvider for NoOpConsoleProvider {
    fn write(&self, _level: ConsoleLevel, _message: &str) {}
}

/// Console provider that records every line in memory.
///
/// Clones share the same buffer, so a host can keep one handle and give
/// the other to the interpreter.
#[derive(Debug, Clone, Default)]
pub struct BufferedConsole {
    lines: Rc<RefCell<Vec<(ConsoleLevel, String)>>>,
}

impl BufferedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in emission order, without levels.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn entries(&self) -> Vec<(ConsoleLevel, String)> {
        self.lines.borrow().clone()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl ConsoleProvider for BufferedConsole {
    fn write(&self, level: ConsoleLevel, message: &str) {
        self.lines.borrow_mut().push((level, message.to_string()));
    }
}

/// Result of one pattern match attempt.
///
/// Offsets are character offsets into the subject text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternMatch {
    pub matched: bool,
    pub start: usize,
    pub end: usize,
    /// Group 0 is the whole match; unmatched groups are `None`.
    pub captures: Vec<Option<String>>,
    /// Named groups in pattern order.
    pub named_captures: Vec<(String, Option<String>)>,
}

impl PatternMatch {
    pub fn no_match() -> Self {
        Self::default()
    }
}

/// The regular-expression capability.
pub trait PatternMatcher {
    /// Search `text` from character offset `from` for the first match of
    /// `pattern` compiled with `flags` (`i`, `m`, `s`; `g`/`y` are handled
    /// by the caller). Errors carry a message for a SyntaxError.
    fn match_pattern(
        &self,
        text: &str,
        pattern: &str,
        flags: &str,
        from: usize,
    ) -> Result<PatternMatch, String>;
}

/// Matcher used when the `regex` feature is off.
pub struct NoPatternMatcher;

impl PatternMatcher for NoPatternMatcher {
    fn match_pattern(
        &self,
        _text: &str,
        _pattern: &str,
        _flags: &str,
        _from: usize,
    ) -> Result<PatternMatch, String> {
        Err("regular expressions are not available in this build".to_string())
    }
}

/// Default matcher for the enabled feature set.
pub fn default_pattern_matcher() -> Box<dyn PatternMatcher> {
    #[cfg(feature = "regex")]
    {
        Box::new(FancyRegexMatcher::new())
    }
    #[cfg(not(feature = "regex"))]
    {
        Box::new(NoPatternMatcher)
    }
}

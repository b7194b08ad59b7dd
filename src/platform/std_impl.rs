//! Standard library implementations of the platform traits.

use super::{ConsoleLevel, ConsoleProvider};

#[cfg(feature = "regex")]
use super::{PatternMatch, PatternMatcher};

/// Console provider using std print macros.
///
/// Writes to stdout for Log/Info/Debug and stderr for Warn/Error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdConsoleProvider;

impl StdConsoleProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ConsoleProvider for StdConsoleProvider {
    fn write(&self, level: ConsoleLevel, message: &str) {
        match level {
            ConsoleLevel::Log | ConsoleLevel::Info | ConsoleLevel::Debug => {
                println!("{message}");
            }
            ConsoleLevel::Warn | ConsoleLevel::Error => {
                eprintln!("{message}");
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FancyRegexMatcher - pattern matching backed by the fancy-regex crate
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "regex")]
mod regex_impl {
    use super::*;
    use rustc_hash::FxHashMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Pattern matcher using the `fancy-regex` crate, which also covers
    /// lookaround and backreferences. Compiled patterns are cached per
    /// `(pattern, flags)`.
    #[derive(Debug, Default)]
    pub struct FancyRegexMatcher {
        cache: RefCell<FxHashMap<(String, String), Rc<fancy_regex::Regex>>>,
    }

    impl FancyRegexMatcher {
        pub fn new() -> Self {
            Self::default()
        }

        fn compile(&self, pattern: &str, flags: &str) -> Result<Rc<fancy_regex::Regex>, String> {
            let key = (pattern.to_string(), flags.to_string());
            if let Some(regex) = self.cache.borrow().get(&key) {
                return Ok(Rc::clone(regex));
            }

            let mut regex_pattern = js_regex_to_rust(pattern);
            let prefix: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
            if !prefix.is_empty() {
                regex_pattern = format!("(?{}){}", prefix, regex_pattern);
            }

            let regex = fancy_regex::Regex::new(&regex_pattern)
                .map_err(|e| format!("Invalid regular expression: /{}/: {}", pattern, e))?;
            let regex = Rc::new(regex);
            self.cache.borrow_mut().insert(key, Rc::clone(&regex));
            Ok(regex)
        }
    }

    fn byte_offset(text: &str, char_offset: usize) -> Option<usize> {
        if char_offset == 0 {
            return Some(0);
        }
        text.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .nth(char_offset)
    }

    fn char_offset(text: &str, byte_offset: usize) -> usize {
        text.get(..byte_offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(0)
    }

    impl PatternMatcher for FancyRegexMatcher {
        fn match_pattern(
            &self,
            text: &str,
            pattern: &str,
            flags: &str,
            from: usize,
        ) -> Result<PatternMatch, String> {
            let regex = self.compile(pattern, flags)?;
            let Some(start_byte) = byte_offset(text, from) else {
                return Ok(PatternMatch::no_match());
            };
            let caps = match regex.captures_from_pos(text, start_byte) {
                Ok(Some(caps)) => caps,
                Ok(None) => return Ok(PatternMatch::no_match()),
                Err(e) => return Err(e.to_string()),
            };
            let full = caps.get(0).ok_or("No match found")?;
            let captures = caps
                .iter()
                .map(|m| m.map(|c| c.as_str().to_string()))
                .collect();
            let named_captures = regex
                .capture_names()
                .enumerate()
                .filter_map(|(i, name)| {
                    name.map(|n| (n.to_string(), caps.get(i).map(|c| c.as_str().to_string())))
                })
                .collect();
            Ok(PatternMatch {
                matched: true,
                start: char_offset(text, full.start()),
                end: char_offset(text, full.end()),
                captures,
                named_captures,
            })
        }
    }

    /// Convert a JavaScript regex pattern to the fancy-regex dialect.
    ///
    /// Inside a character class JS treats `[` as a literal; the Rust
    /// syntax needs it escaped. `(?<name>` is accepted by both.
    fn js_regex_to_rust(pattern: &str) -> String {
        let mut result = String::with_capacity(pattern.len() + 16);
        let mut chars = pattern.chars().peekable();
        let mut in_char_class = false;
        let mut char_class_start = false; // True right after [ or [^

        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(c);
                    result.push(next);
                    char_class_start = false;
                    continue;
                }
            }

            if !in_char_class {
                if c == '[' {
                    in_char_class = true;
                    char_class_start = true;
                }
                result.push(c);
                continue;
            }

            if char_class_start {
                match c {
                    // still at the start: a following ] is literal
                    '^' => result.push(c),
                    ']' => {
                        result.push_str("\\]");
                        char_class_start = false;
                    }
                    '[' => {
                        result.push_str("\\[");
                        char_class_start = false;
                    }
                    _ => {
                        result.push(c);
                        char_class_start = false;
                    }
                }
            } else if c == ']' {
                in_char_class = false;
                result.push(c);
            } else if c == '[' {
                result.push_str("\\[");
            } else {
                result.push(c);
            }
        }

        result
    }

}

#[cfg(feature = "regex")]
pub use regex_impl::FancyRegexMatcher;

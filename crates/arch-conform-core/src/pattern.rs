//! Package patterns for layer, slice and subject selection.
//!
//! A pattern is a `.` separated list of tokens matched against the segments
//! of a package path:
//!
//! | Token   | Matches                                   |
//! |---------|-------------------------------------------|
//! | `name`  | exactly the segment `name`                |
//! | `*`     | any single segment                        |
//! | `(*)`   | any single segment, captured as slice key |
//! | `..`    | zero or more segments                     |
//!
//! Examples: `com.example.controllers` (that package only),
//! `com.example.controllers..` (the package and everything below it),
//! `com.example.(*)..` (one slice per first segment after `com.example`).

use miette::Diagnostic;

/// One parsed pattern token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Any,
    Capture,
    AnyDepth,
}

/// A validated package pattern.
///
/// Parsed once and reused for every node. Matching is purely structural:
/// the same pattern and package always give the same answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePattern {
    raw: String,
    tokens: Vec<Token>,
}

/// A successful match of a [`PackagePattern`] against a package path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<'a> {
    captured: Option<&'a str>,
}

impl<'a> PatternMatch<'a> {
    /// Returns the segment consumed by the `(*)` capture group, if the
    /// pattern has one.
    #[must_use]
    pub fn captured(&self) -> Option<&'a str> {
        self.captured
    }
}

impl PackagePattern {
    /// Parses a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern is empty, contains an invalid
    /// segment or separator, or declares more than one capture group.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let tokens = tokenize(pattern)?;
        if tokens.iter().filter(|t| **t == Token::Capture).count() > 1 {
            return Err(PatternError::MultipleCaptures {
                pattern: pattern.to_string(),
            });
        }
        Ok(Self {
            raw: pattern.to_string(),
            tokens,
        })
    }

    /// Parses a pattern that must contain exactly one `(*)` capture group.
    ///
    /// # Errors
    ///
    /// Same as [`PackagePattern::parse`], plus [`PatternError::MissingCapture`]
    /// when the pattern has no capture group.
    pub fn parse_capturing(pattern: &str) -> Result<Self, PatternError> {
        let parsed = Self::parse(pattern)?;
        if !parsed.has_capture() {
            return Err(PatternError::MissingCapture {
                pattern: pattern.to_string(),
            });
        }
        Ok(parsed)
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if the pattern contains a `(*)` capture group.
    #[must_use]
    pub fn has_capture(&self) -> bool {
        self.tokens.contains(&Token::Capture)
    }

    /// Matches a package path, returning the match (and capture) if any.
    #[must_use]
    pub fn match_package<'a>(&self, package: &'a str) -> Option<PatternMatch<'a>> {
        let segments: Vec<&'a str> = if package.is_empty() {
            Vec::new()
        } else {
            package.split('.').collect()
        };
        match_tokens(&self.tokens, &segments, None).map(|captured| PatternMatch { captured })
    }

    /// Tests whether a package path matches this pattern.
    #[must_use]
    pub fn matches(&self, package: &str) -> bool {
        self.match_package(package).is_some()
    }

    /// Returns the captured segment for a package, or `None` when the package
    /// does not match or the pattern has no capture group.
    #[must_use]
    pub fn slice_key<'a>(&self, package: &'a str) -> Option<&'a str> {
        self.match_package(package).and_then(|m| m.captured())
    }
}

impl std::fmt::Display for PackagePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parses a list of patterns, failing on the first malformed one.
///
/// # Errors
///
/// Returns the [`PatternError`] of the first pattern that fails to parse.
pub fn parse_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PackagePattern>, PatternError> {
    patterns
        .iter()
        .map(|p| PackagePattern::parse(p.as_ref()))
        .collect()
}

fn tokenize(pattern: &str) -> Result<Vec<Token>, PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    let misplaced = || PatternError::MisplacedSeparator {
        pattern: pattern.to_string(),
    };

    let mut tokens = Vec::new();
    let mut rest = pattern;
    loop {
        if let Some(after) = rest.strip_prefix("..") {
            if after.starts_with('.') {
                return Err(misplaced());
            }
            tokens.push(Token::AnyDepth);
            rest = after;
            if rest.is_empty() {
                break;
            }
            continue;
        }
        if rest.starts_with('.') {
            return Err(misplaced());
        }

        let end = rest.find('.').unwrap_or(rest.len());
        tokens.push(parse_segment(pattern, &rest[..end])?);
        rest = &rest[end..];

        if rest.is_empty() {
            break;
        }
        if rest.starts_with("..") {
            continue;
        }
        rest = &rest[1..];
        if rest.is_empty() {
            return Err(misplaced());
        }
    }
    Ok(tokens)
}

fn parse_segment(pattern: &str, segment: &str) -> Result<Token, PatternError> {
    match segment {
        "*" => Ok(Token::Any),
        "(*)" => Ok(Token::Capture),
        literal
            if literal
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-')) =>
        {
            Ok(Token::Literal(literal.to_string()))
        }
        other => Err(PatternError::InvalidSegment {
            pattern: pattern.to_string(),
            segment: other.to_string(),
        }),
    }
}

/// Returns `Some(capture)` when `tokens` consume all of `segments`.
fn match_tokens<'a>(
    tokens: &[Token],
    segments: &[&'a str],
    captured: Option<&'a str>,
) -> Option<Option<&'a str>> {
    let Some((first, rest)) = tokens.split_first() else {
        return segments.is_empty().then_some(captured);
    };

    match first {
        Token::AnyDepth => {
            // Shortest expansion first keeps the result deterministic
            (0..=segments.len()).find_map(|i| match_tokens(rest, &segments[i..], captured))
        }
        Token::Any => {
            let (_, tail) = segments.split_first()?;
            match_tokens(rest, tail, captured)
        }
        Token::Capture => {
            let (head, tail) = segments.split_first()?;
            match_tokens(rest, tail, Some(*head))
        }
        Token::Literal(literal) => {
            let (head, tail) = segments.split_first()?;
            if *head == literal.as_str() {
                match_tokens(rest, tail, captured)
            } else {
                None
            }
        }
    }
}

/// Errors from parsing a package pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum PatternError {
    /// Pattern is empty.
    #[error("package pattern must not be empty")]
    #[diagnostic(code(arch_conform::pattern::empty))]
    Empty,

    /// A segment is neither a literal, `*` nor `(*)`.
    #[error("invalid segment `{segment}` in pattern `{pattern}`")]
    #[diagnostic(
        code(arch_conform::pattern::invalid_segment),
        help("segments are identifiers, `*`, `(*)` or `..`")
    )]
    InvalidSegment {
        /// The full pattern.
        pattern: String,
        /// The offending segment.
        segment: String,
    },

    /// A `.` appears where no segment can follow or precede it.
    #[error("misplaced `.` separator in pattern `{pattern}`")]
    #[diagnostic(code(arch_conform::pattern::separator))]
    MisplacedSeparator {
        /// The full pattern.
        pattern: String,
    },

    /// More than one `(*)` capture group.
    #[error("pattern `{pattern}` has more than one `(*)` capture group")]
    #[diagnostic(code(arch_conform::pattern::multiple_captures))]
    MultipleCaptures {
        /// The full pattern.
        pattern: String,
    },

    /// A slice pattern without a `(*)` capture group.
    #[error("slice pattern `{pattern}` has no `(*)` capture group")]
    #[diagnostic(
        code(arch_conform::pattern::missing_capture),
        help("mark the segment naming the slice, e.g. `com.example.(*)..`")
    )]
    MissingCapture {
        /// The full pattern.
        pattern: String,
    },
}

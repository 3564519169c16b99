use regex::Regex;

/// A previously-declared logpoint: where it lives and what its message
/// template looks like.
///
/// The `line` is the protocol's 1-based line, exactly as it appeared in the
/// "set breakpoints" request. Conversion to zero-based locations happens when
/// an observed-output fact is emitted.
#[derive(Debug, Clone)]
pub struct LogpointDefinition {
    pub path: String,
    pub line: i64,
    pub template: String,
    pattern: Regex,
}

impl LogpointDefinition {
    /// Build a definition from a message template.
    ///
    /// Returns `None` if the derived pattern does not compile, which with
    /// escaped literals should not happen; the caller skips the definition.
    pub fn new(path: impl Into<String>, line: i64, template: &str) -> Option<Self> {
        let pattern = Regex::new(&template_pattern(template)).ok()?;
        Some(Self {
            path: path.into(),
            line,
            template: template.to_string(),
            pattern,
        })
    }

    /// Whether `output` could have been produced by this logpoint's template.
    pub fn matches(&self, output: &str) -> bool {
        self.pattern.is_match(output)
    }
}

/// Convert a logpoint message template into an unanchored match pattern.
///
/// Each `{...}` placeholder span collapses into a wildcard; everything else
/// is matched literally, so regex metacharacters in the template cannot
/// change the match. An unterminated `{` is literal text.
fn template_pattern(template: &str) -> String {
    let mut pattern = String::with_capacity(template.len() + 8);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        pattern.push_str(&regex::escape(&rest[..open]));
        match rest[open + 1..].find('}') {
            Some(close) => {
                pattern.push_str(".*");
                rest = &rest[open + 1 + close + 1..];
            }
            None => {
                pattern.push_str(&regex::escape(&rest[open..]));
                rest = "";
                break;
            }
        }
    }
    pattern.push_str(&regex::escape(rest));
    pattern
}

/// The ordered collection of logpoint definitions observed during a session.
///
/// Definitions are appended in request order and never deduplicated; a
/// location may carry several templates, in which case the first structural
/// match wins.
#[derive(Debug, Default)]
pub struct LogpointTable {
    definitions: Vec<LogpointDefinition>,
}

impl LogpointTable {
    pub fn record(&mut self, definition: LogpointDefinition) {
        self.definitions.push(definition);
    }

    pub fn clear(&mut self) {
        self.definitions.clear();
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Attribute an anonymous output line to the first recorded definition
    /// whose template matches it, if any.
    pub fn attribute(&self, output: &str) -> Option<&LogpointDefinition> {
        self.definitions.iter().find(|def| def.matches(output))
    }
}

use std::fmt;

/// Incrementally built prompt: tagged data blocks followed by free-form rules
#[derive(Debug, Clone, Default)]
pub struct JobDescription {
    data: String,
    rules: String,
}

impl JobDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `<CONTEXT>` block.
    pub fn add_context(&mut self, context: &str) -> &mut Self {
        self.push_block("CONTEXT", context);
        self
    }

    /// Append an `<INPUT>` block.
    pub fn add_input(&mut self, input: &str) -> &mut Self {
        self.push_block("INPUT", input);
        self
    }

    /// Append rule text verbatim.
    pub fn add_rule(&mut self, rule: &str) -> &mut Self {
        self.rules.push_str(rule);
        self
    }

    fn push_block(&mut self, tag: &str, body: &str) {
        self.data.push_str(&format!("\n<{tag}>\n{body}\n</{tag}>\n"));
    }
}

impl fmt::Display for JobDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.data, self.rules)
    }
}

//! Directive parsing
//!
//! Input is consumed line by line. A query runs until an unquoted `;` and
//! may span several lines. A line starting with `:` while no query is
//! pending is a shell command and is complete on its own.
//!
//! Outside quotes, `//` comments run to the end of the line and `/* */`
//! comments may span lines. Comment text is dropped before it can open a
//! quote or end a statement.

/// One unit of work read from an input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Statement sent to the database, without its terminating `;`
    Query(String),
    /// Shell command such as `:source FILE`
    Command { name: String, argument: Option<String> },
}

/// Incremental splitter from lines into directives
#[derive(Debug, Default)]
pub struct DirectiveParser {
    buffer: String,
    start_line: usize,
    quote: Option<char>,
    escaped: bool,
    in_comment: bool,
}

impl DirectiveParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a query or block comment has been started but not terminated
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.has_text() || self.in_comment
    }

    fn has_text(&self) -> bool {
        !self.buffer.trim().is_empty()
    }

    /// Drop any partially read query
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.quote = None;
        self.escaped = false;
        self.in_comment = false;
    }

    /// Consume one input line, returning the directives it completes
    ///
    /// Each directive is paired with the line it started on.
    pub fn feed(&mut self, line_no: usize, line: &str) -> Vec<(usize, Directive)> {
        if !self.is_pending() {
            let trimmed = line.trim();
            if let Some(command) = trimmed.strip_prefix(':') {
                self.reset();
                return vec![(line_no, parse_command(command))];
            }
        }

        let mut complete = Vec::new();
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if self.in_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_comment = false;
                }
                continue;
            }
            if self.quote.is_none() && c == '/' {
                match chars.peek() {
                    Some('/') => break,
                    Some('*') => {
                        chars.next();
                        self.in_comment = true;
                        // keep the tokens on either side apart
                        if self.has_text() {
                            self.buffer.push(' ');
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            if !self.has_text() && c.is_whitespace() && self.quote.is_none() {
                continue;
            }
            if self.buffer.is_empty() {
                self.start_line = line_no;
            }

            match self.quote {
                Some(_) if self.escaped => self.escaped = false,
                Some(_) if c == '\\' => self.escaped = true,
                Some(q) if c == q => self.quote = None,
                Some(_) => {}
                None if matches!(c, '\'' | '"' | '`') => self.quote = Some(c),
                None if c == ';' => {
                    let statement = self.buffer.trim().to_string();
                    self.buffer.clear();
                    if !statement.is_empty() {
                        complete.push((self.start_line, Directive::Query(statement)));
                    }
                    continue;
                }
                None => {}
            }
            self.buffer.push(c);
        }

        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        complete
    }

    /// End of input: a trailing statement without `;` still runs
    pub fn finish(&mut self) -> Option<(usize, Directive)> {
        let statement = self.buffer.trim().to_string();
        self.reset();
        (!statement.is_empty()).then(|| (self.start_line, Directive::Query(statement)))
    }
}

fn parse_command(command: &str) -> Directive {
    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, Some(rest.trim())),
        None => (command, None),
    };
    Directive::Command {
        name: name.to_ascii_lowercase(),
        argument: argument.filter(|a| !a.is_empty()).map(str::to_string),
    }
}

//! Two-level layout tokenizer.
//!
//! The top level splits the layout into commands: each `{ ... }` group is
//! one command, and so is any bare word found outside braces. A NUL outside
//! braces ends the layout and is reported as a `"\0"` command.
//!
//! The command level splits one command into parameters on spaces and
//! commas. `@...@` is a literal: separators inside it do not split, and the
//! `@` markers stay in the token.

/// Command reported for a NUL terminator.
pub const TERMINATOR: &str = "\0";

/// Reusable tokenizer. Output vectors are cleared and refilled on each call,
/// so one instance can serve many layouts without reallocating.
#[derive(Debug, Default)]
pub struct Tokenizer {
    current: String,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `layout` into commands.
    pub fn commands(&mut self, layout: &str, out: &mut Vec<String>) {
        out.clear();
        self.current.clear();
        let mut in_group = false;

        for ch in layout.chars() {
            if in_group {
                if ch == '}' {
                    in_group = false;
                    self.flush(out);
                } else {
                    self.current.push(ch);
                }
                continue;
            }
            match ch {
                '{' => {
                    self.flush(out);
                    in_group = true;
                }
                '}' => self.flush(out),
                '\0' => {
                    self.flush(out);
                    out.push(TERMINATOR.to_string());
                    return;
                }
                c if c.is_whitespace() => self.flush(out),
                c => self.current.push(c),
            }
        }
        self.flush(out);
    }

    /// Split one command into parameters.
    pub fn params(&mut self, command: &str, out: &mut Vec<String>) {
        out.clear();
        self.current.clear();
        let mut in_literal = false;

        for ch in command.chars() {
            if ch == '@' {
                in_literal = !in_literal;
                self.current.push(ch);
                continue;
            }
            if !in_literal && (ch == ',' || ch.is_whitespace()) {
                self.flush(out);
                continue;
            }
            self.current.push(ch);
        }
        self.flush(out);
    }

    fn flush(&mut self, out: &mut Vec<String>) {
        let token = self.current.trim();
        if !token.is_empty() {
            out.push(token.to_string());
        }
        self.current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(layout: &str) -> Vec<String> {
        let mut out = Vec::new();
        Tokenizer::new().commands(layout, &mut out);
        out
    }

    fn params(command: &str) -> Vec<String> {
        let mut out = Vec::new();
        Tokenizer::new().params(command, &mut out);
        out
    }

    #[test]
    fn splits_groups() {
        assert_eq!(
            commands("{ page 0 }{ text 10 20 0 0 }"),
            vec!["page 0", "text 10 20 0 0"]
        );
    }

    #[test]
    fn bare_words_between_groups() {
        assert_eq!(
            commands("noclose { page 1 } nomove"),
            vec!["noclose", "page 1", "nomove"]
        );
    }

    #[test]
    fn nul_terminates() {
        assert_eq!(
            commands("{ page 0 }\0{ text 1 1 1 1 }"),
            vec!["page 0", TERMINATOR]
        );
    }

    #[test]
    fn nul_inside_group_is_kept() {
        assert_eq!(commands("{ a\0b }"), vec!["a\0b"]);
    }

    #[test]
    fn params_split_on_space_and_comma() {
        assert_eq!(params("button 10,20  1 2"), vec!["button", "10", "20", "1", "2"]);
    }

    #[test]
    fn at_literal_keeps_separators() {
        assert_eq!(
            params("tooltip 1042971 @a b, c@"),
            vec!["tooltip", "1042971", "@a b, c@"]
        );
    }

    #[test]
    fn reuse_clears_output() {
        let mut tokenizer = Tokenizer::new();
        let mut out = Vec::new();
        tokenizer.params("a b c", &mut out);
        tokenizer.params("d", &mut out);
        assert_eq!(out, vec!["d"]);
    }
}

//! Quote-aware splitting of one delimited line into fields.
//!
//! The tokenizer is deliberately lenient: malformed quoting never fails, it is flushed as-is and
//! reported through [`Tokenized::anomaly`] by the checked variant.
//!
//! ```
//! use tabular_ingest::tokenizer::{tokenize, Tokenizer};
//!
//! assert_eq!(tokenize("10,AU,Australia"), vec!["10", "AU", "Australia"]);
//! assert_eq!(tokenize(r#""10","AU","Aus""tralia""#), vec!["10", "AU", "Aus\"tralia"]);
//!
//! let tsv = Tokenizer::new('\t', '"');
//! assert_eq!(tsv.tokenize("a\tb"), vec!["a", "b"]);
//! ```

use std::fmt;

/// Separator/quote pair used to split lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    separator: char,
    quote: char,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            separator: ',',
            quote: '"',
        }
    }
}

/// Recoverable quoting problem found while tokenizing a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeAnomaly {
    /// The line ended inside a quoted section; the accumulated text was kept as the last field.
    UnbalancedQuote {
        /// 1-based position of the field holding the open quote.
        field: usize,
    },
}

impl fmt::Display for TokenizeAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizeAnomaly::UnbalancedQuote { field } => {
                write!(f, "unbalanced quote in field {field}; kept accumulated text")
            }
        }
    }
}

/// Fields of one line plus the anomaly met while splitting it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokenized {
    pub fields: Vec<String>,
    pub anomaly: Option<TokenizeAnomaly>,
}

impl Tokenizer {
    pub fn new(separator: char, quote: char) -> Self {
        Self { separator, quote }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn quote(&self) -> char {
        self.quote
    }

    /// Split `line` into fields. Empty input yields no fields.
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        self.tokenize_checked(line).fields
    }

    /// Split `line` into fields and report an unbalanced quote instead of silently flushing it.
    pub fn tokenize_checked(&self, line: &str) -> Tokenized {
        if line.is_empty() {
            return Tokenized::default();
        }

        let custom_quote = self.quote != '"';
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut field_open = false;
        let mut just_closed = false;
        // Custom quote only: after a `"` is appended, the next `"` in the same quoted section is
        // dropped. The guard resets when the section closes or reopens.
        let mut double_quote_guard = false;

        for ch in line.chars() {
            if in_quotes {
                if ch == self.quote {
                    in_quotes = false;
                    just_closed = true;
                    double_quote_guard = false;
                } else if custom_quote && ch == '"' {
                    if double_quote_guard {
                        double_quote_guard = false;
                    } else {
                        current.push('"');
                        double_quote_guard = true;
                    }
                } else {
                    current.push(ch);
                }
                continue;
            }

            if ch == self.quote {
                if just_closed || field_open {
                    // Escaped quote after a closing quote, or a stray quote inside unquoted text.
                    current.push(self.quote);
                }
                in_quotes = true;
                field_open = true;
                double_quote_guard = false;
            } else if ch == self.separator {
                fields.push(std::mem::take(&mut current));
                field_open = false;
            } else if ch == '\r' {
                // ignored outside quotes
            } else if ch == '\n' {
                break;
            } else {
                current.push(ch);
                field_open = true;
            }
            just_closed = false;
        }

        fields.push(current);
        let anomaly = in_quotes.then(|| TokenizeAnomaly::UnbalancedQuote {
            field: fields.len(),
        });
        Tokenized { fields, anomaly }
    }
}

/// Tokenize with the default `,` separator and `"` quote.
pub fn tokenize(line: &str) -> Vec<String> {
    Tokenizer::default().tokenize(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_fields() {
        assert_eq!(tokenize("10,AU,Australia"), vec!["10", "AU", "Australia"]);
    }

    #[test]
    fn empty_input_yields_no_fields() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn decodes_doubled_quotes_inside_quoted_field() {
        assert_eq!(
            tokenize(r#""10","AU","Aus""tralia""#),
            vec!["10", "AU", "Aus\"tralia"]
        );
    }

    #[test]
    fn keeps_separator_inside_quotes() {
        let fields = tokenize(r#""10","AU","Aus,tralia""#);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[2], "Aus,tralia");
    }

    #[test]
    fn stray_quote_in_unquoted_text_is_literal() {
        assert_eq!(tokenize(r#"10,AU,Aus""tralia"#), vec!["10", "AU", "Aus\"tralia"]);
    }

    #[test]
    fn empty_fields_and_empty_quoted_fields() {
        assert_eq!(tokenize(r#"a,,"",b"#), vec!["a", "", "", "b"]);
        assert_eq!(tokenize(","), vec!["", ""]);
        assert_eq!(tokenize(r#""""#), vec![""]);
    }

    #[test]
    fn fields_are_not_trimmed() {
        assert_eq!(tokenize(" a , b "), vec![" a ", " b "]);
    }

    #[test]
    fn carriage_return_is_ignored_and_newline_stops() {
        assert_eq!(tokenize("a,b\r\n"), vec!["a", "b"]);
        assert_eq!(tokenize("a,b\nc,d"), vec!["a", "b"]);
    }

    #[test]
    fn single_quoted_field_is_flushed() {
        assert_eq!(tokenize(r#""only""#), vec!["only"]);
    }

    #[test]
    fn unbalanced_quote_is_flushed_and_reported() {
        let out = Tokenizer::default().tokenize_checked(r#"10,"AU,Australia"#);
        assert_eq!(out.fields, vec!["10", "AU,Australia"]);
        assert_eq!(out.anomaly, Some(TokenizeAnomaly::UnbalancedQuote { field: 2 }));
    }

    #[test]
    fn custom_separator_and_quote() {
        let t = Tokenizer::new(';', '\'');
        assert_eq!(t.tokenize("'a;b';c"), vec!["a;b", "c"]);
        assert_eq!(t.tokenize("'it''s'"), vec!["it's"]);
    }

    #[test]
    fn custom_quote_collapses_doubled_double_quotes() {
        let t = Tokenizer::new(',', '\'');
        assert_eq!(t.tokenize(r#"'say ""hi""',x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(t.tokenize(r#"'a"b'"#), vec![r#"a"b"#]);
    }

    #[test]
    fn custom_quote_guard_spans_the_quoted_section() {
        let t = Tokenizer::new(',', '\'');
        assert_eq!(t.tokenize(r#"'a"b"c'"#), vec![r#"a"bc"#]);
        assert_eq!(t.tokenize(r#"'a"b''"c'"#), vec![r#"a"b'"c"#]);
    }
}

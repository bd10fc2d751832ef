use crate::Result;
use crate::diagnostics;

use anyhow::bail;
use regex::Regex;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Ident(String),
    Number(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Equals,
}

impl Tok {
    /// Short form used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            Tok::Ident(s) => format!("identifier '{}'", s),
            Tok::Number(n) => format!("number {}", n),
            Tok::Str(s) => format!("string {:?}", s),
            Tok::LParen => "'('".to_string(),
            Tok::RParen => "')'".to_string(),
            Tok::LBracket => "'['".to_string(),
            Tok::RBracket => "']'".to_string(),
            Tok::Comma => "','".to_string(),
            Tok::Equals => "'='".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub pos: Pos,
}

/// Split descriptor text into tokens.
///
/// `origin` is only used to locate errors (usually the file path).
pub fn tokenize(text: &str, origin: &str) -> Result<Vec<Token>> {
    // Alternatives, tried at the current offset:
    // 1) whitespace
    // 2) comment: # to end of line
    // 3) identifier
    // 4) number: optional sign, integer part, optional fraction
    // 5) string: single or double quoted, no escapes
    // 6) punctuation
    const TOKEN_RE: &str = r#"^(?:(\s+)|(#[^\n]*)|([A-Za-z_][A-Za-z0-9_]*)|([+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))|'([^'\n]*)'|"([^"\n]*)"|([()\[\],=]))"#;
    let re = Regex::new(TOKEN_RE)?;

    let mut out = Vec::new();
    let mut offset = 0;
    let mut line = 1;
    let mut line_start = 0;

    while offset < text.len() {
        let rest = &text[offset..];
        let pos = Pos {
            line,
            col: text[line_start..offset].chars().count() + 1,
        };

        let caps = match re.captures(rest) {
            Some(c) => c,
            None => {
                let ch = rest.chars().next().unwrap_or('?');
                if ch == '\'' || ch == '"' {
                    bail!(
                        "{}",
                        diagnostics::error_message(format!(
                            "{}:{}:{}: unterminated string",
                            origin, pos.line, pos.col
                        ))
                    );
                }
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "{}:{}:{}: unexpected character {:?}",
                        origin, pos.line, pos.col, ch
                    ))
                );
            }
        };

        let whole = caps.get(0).map_or("", |m| m.as_str());
        let tok = if caps.get(1).is_some() || caps.get(2).is_some() {
            None
        } else if let Some(m) = caps.get(3) {
            Some(Tok::Ident(m.as_str().to_string()))
        } else if let Some(m) = caps.get(4) {
            Some(Tok::Number(m.as_str().parse()?))
        } else if let Some(m) = caps.get(5).or_else(|| caps.get(6)) {
            Some(Tok::Str(m.as_str().to_string()))
        } else {
            match whole {
                "(" => Some(Tok::LParen),
                ")" => Some(Tok::RParen),
                "[" => Some(Tok::LBracket),
                "]" => Some(Tok::RBracket),
                "," => Some(Tok::Comma),
                _ => Some(Tok::Equals),
            }
        };

        if let Some(tok) = tok {
            out.push(Token { tok, pos });
        }

        // Track line starts for column numbers.
        for (i, b) in whole.bytes().enumerate() {
            if b == b'\n' {
                line += 1;
                line_start = offset + i + 1;
            }
        }
        offset += whole.len();
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn toks(text: &str) -> Vec<Tok> {
        tokenize(text, "t").unwrap().into_iter().map(|t| t.tok).collect()
    }

    #[test]
    fn tokenizes_seed_call() {
        assert_eq!(
            toks("hand=floodfill((0.6, 4.4), scale=16),"),
            vec![
                Tok::Ident("hand".into()),
                Tok::Equals,
                Tok::Ident("floodfill".into()),
                Tok::LParen,
                Tok::LParen,
                Tok::Number(0.6),
                Tok::Comma,
                Tok::Number(4.4),
                Tok::RParen,
                Tok::Comma,
                Tok::Ident("scale".into()),
                Tok::Equals,
                Tok::Number(16.0),
                Tok::RParen,
                Tok::Comma,
            ]
        );
    }

    #[test]
    fn strings_comments_and_signs() {
        assert_eq!(
            toks("image(\"a b.xcf\") # trailing\nscale(-2) grid('x')"),
            vec![
                Tok::Ident("image".into()),
                Tok::LParen,
                Tok::Str("a b.xcf".into()),
                Tok::RParen,
                Tok::Ident("scale".into()),
                Tok::LParen,
                Tok::Number(-2.0),
                Tok::RParen,
                Tok::Ident("grid".into()),
                Tok::LParen,
                Tok::Str("x".into()),
                Tok::RParen,
            ]
        );
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("grid(8, 8)\n  scale(8)", "t").unwrap();
        assert_eq!(tokens[0].pos, Pos { line: 1, col: 1 });
        assert_eq!(tokens[4].pos, Pos { line: 1, col: 9 });
        assert_eq!(tokens[6].pos, Pos { line: 2, col: 3 });
    }

    #[test]
    fn reports_bad_input_with_location() {
        let err = tokenize("grid(8, 8)\nscale(8);", "atlas.sprites.py").unwrap_err();
        assert_eq!(
            err.to_string(),
            "error: atlas.sprites.py:2:9: unexpected character ';'"
        );

        let err = tokenize("image('atlas.xcf)", "d").unwrap_err();
        assert_eq!(err.to_string(), "error: d:1:7: unterminated string");
    }
}

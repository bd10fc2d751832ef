use crate::Result;
use crate::descriptor::lexer::{Pos, Tok, Token, tokenize};
use crate::diagnostics;
use crate::spec::{RawAtlas, RawExplicitSeed, RawGrid, RawSeed, RawSprite};

use anyhow::{anyhow, bail};
use std::collections::BTreeMap;

/// Parse `.sprites.py` descriptor text into a raw atlas.
///
/// Expected shape:
/// image('atlas.xcf')
/// grid(8, 8)
/// scale(8)
///
/// sprites(
///     screen=floodfill((3, 1)),
///     hand=floodfill((0.6, 4.4), scale=16),
///     marbles=[floodfill((1, 3)), floodfill((3, 3))],
/// )
pub fn parse_descriptor(text: &str, origin: &str) -> Result<RawAtlas> {
    let tokens = tokenize(text, origin)?;
    let mut p = Parser {
        tokens,
        idx: 0,
        origin,
    };

    let mut image: Option<String> = None;
    let mut grid: Option<RawGrid> = None;
    let mut scale: Option<f64> = None;
    let mut sprites: Option<Vec<RawSprite>> = None;

    while let Some(tok) = p.peek().cloned() {
        let name = match tok.tok {
            Tok::Ident(name) => name,
            other => {
                return Err(p.error_at(
                    tok.pos,
                    format!("expected directive, found {}", other.describe()),
                ));
            }
        };
        p.advance();

        let seen = match name.as_str() {
            "image" => {
                p.expect(Tok::LParen)?;
                let v = p.string()?;
                p.close_call()?;
                image.replace(v).is_some()
            }
            "grid" => {
                p.expect(Tok::LParen)?;
                let rows = p.integer()?;
                p.expect(Tok::Comma)?;
                let cols = p.integer()?;
                p.close_call()?;
                grid.replace(RawGrid(rows, cols)).is_some()
            }
            "scale" => {
                p.expect(Tok::LParen)?;
                let v = p.number()?;
                p.close_call()?;
                scale.replace(v).is_some()
            }
            "sprites" => {
                p.expect(Tok::LParen)?;
                let v = p.sprite_table()?;
                sprites.replace(v).is_some()
            }
            _ => return Err(p.error_at(tok.pos, format!("unknown directive '{}'", name))),
        };
        if seen {
            return Err(p.error_at(
                tok.pos,
                format!("directive '{}' given more than once", name),
            ));
        }
    }

    let missing = |what: &str| {
        anyhow!(diagnostics::error_message(format!(
            "{}: missing {}(...) directive",
            origin, what
        )))
    };
    let atlas = RawAtlas {
        image: image.ok_or_else(|| missing("image"))?,
        grid: grid.ok_or_else(|| missing("grid"))?,
        scale: scale.ok_or_else(|| missing("scale"))?,
        sprites: sprites.ok_or_else(|| missing("sprites"))?,
    };
    log::debug!("{}: parsed {} sprite(s)", origin, atlas.sprites.len());
    Ok(atlas)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    idx: usize,
    origin: &'a str,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.idx)
    }

    fn advance(&mut self) {
        self.idx += 1;
    }

    fn eof_pos(&self) -> Pos {
        self.tokens.last().map_or(Pos { line: 1, col: 1 }, |t| t.pos)
    }

    fn error_at(&self, pos: Pos, msg: impl std::fmt::Display) -> anyhow::Error {
        anyhow!(diagnostics::error_message(format!(
            "{}:{}:{}: {}",
            self.origin, pos.line, pos.col, msg
        )))
    }

    /// Take the next token, failing at end of input.
    fn next(&mut self, expected: &str) -> Result<Token> {
        match self.tokens.get(self.idx).cloned() {
            Some(t) => {
                self.idx += 1;
                Ok(t)
            }
            None => Err(self.error_at(
                self.eof_pos(),
                format!("expected {}, found end of input", expected),
            )),
        }
    }

    fn expect(&mut self, want: Tok) -> Result<Pos> {
        let t = self.next(&want.describe())?;
        if t.tok != want {
            return Err(self.error_at(
                t.pos,
                format!("expected {}, found {}", want.describe(), t.tok.describe()),
            ));
        }
        Ok(t.pos)
    }

    /// Consume `tok` if it is next.
    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek().is_some_and(|t| &t.tok == tok) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// `)` with an optional trailing comma before it.
    fn close_call(&mut self) -> Result<()> {
        self.eat(&Tok::Comma);
        self.expect(Tok::RParen)?;
        Ok(())
    }

    fn string(&mut self) -> Result<String> {
        let t = self.next("string")?;
        match t.tok {
            Tok::Str(s) => Ok(s),
            other => Err(self.error_at(
                t.pos,
                format!("expected string, found {}", other.describe()),
            )),
        }
    }

    fn number(&mut self) -> Result<f64> {
        let t = self.next("number")?;
        match t.tok {
            Tok::Number(n) => Ok(n),
            other => Err(self.error_at(
                t.pos,
                format!("expected number, found {}", other.describe()),
            )),
        }
    }

    fn integer(&mut self) -> Result<i64> {
        let pos = self.peek().map_or(self.eof_pos(), |t| t.pos);
        let n = self.number()?;
        if n.fract() != 0.0 || n.abs() > i64::MAX as f64 {
            return Err(self.error_at(pos, format!("expected integer, found {}", n)));
        }
        Ok(n as i64)
    }

    /// Body of `sprites(...)`, after the opening paren.
    fn sprite_table(&mut self) -> Result<Vec<RawSprite>> {
        let mut out = Vec::new();
        let mut seen: BTreeMap<String, Pos> = BTreeMap::new();

        loop {
            if self.eat(&Tok::RParen) {
                break;
            }

            let t = self.next("sprite name")?;
            let name = match t.tok {
                Tok::Ident(name) => name,
                other => {
                    return Err(self.error_at(
                        t.pos,
                        format!("expected sprite name, found {}", other.describe()),
                    ));
                }
            };
            if let Some(first) = seen.insert(name.clone(), t.pos) {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "{}:{}:{}: duplicate sprite name '{}' (first defined at {}:{})",
                        self.origin, t.pos.line, t.pos.col, name, first.line, first.col
                    ))
                );
            }
            self.expect(Tok::Equals)?;

            let sprite = if self.eat(&Tok::LBracket) {
                let mut frames = Vec::new();
                loop {
                    if self.eat(&Tok::RBracket) {
                        break;
                    }
                    frames.push(self.seed_call()?);
                    if !self.eat(&Tok::Comma) {
                        self.expect(Tok::RBracket)?;
                        break;
                    }
                }
                RawSprite {
                    name,
                    seed: None,
                    frames: Some(frames),
                }
            } else {
                RawSprite {
                    name,
                    seed: Some(self.seed_call()?),
                    frames: None,
                }
            };
            out.push(sprite);

            if !self.eat(&Tok::Comma) {
                self.expect(Tok::RParen)?;
                break;
            }
        }

        Ok(out)
    }

    /// `floodfill((x, y)[, scale=n])`
    fn seed_call(&mut self) -> Result<RawSeed> {
        let t = self.next("floodfill(...)")?;
        match &t.tok {
            Tok::Ident(f) if f == "floodfill" => {}
            Tok::Ident(f) => {
                return Err(self.error_at(t.pos, format!("unknown seed function '{}'", f)));
            }
            other => {
                return Err(self.error_at(
                    t.pos,
                    format!("expected floodfill(...), found {}", other.describe()),
                ));
            }
        }
        self.expect(Tok::LParen)?;
        let at = self.coordinate()?;

        let mut scale = None;
        while self.eat(&Tok::Comma) {
            if self.peek().is_some_and(|t| t.tok == Tok::RParen) {
                break;
            }
            let t = self.next("keyword argument")?;
            match t.tok {
                Tok::Ident(k) if k == "scale" => {
                    if scale.is_some() {
                        return Err(self.error_at(t.pos, "scale given more than once"));
                    }
                    self.expect(Tok::Equals)?;
                    scale = Some(self.number()?);
                }
                Tok::Ident(k) => {
                    return Err(
                        self.error_at(t.pos, format!("unknown floodfill argument '{}'", k))
                    );
                }
                other => {
                    return Err(self.error_at(
                        t.pos,
                        format!("expected keyword argument, found {}", other.describe()),
                    ));
                }
            }
        }
        self.expect(Tok::RParen)?;

        Ok(match scale {
            None => RawSeed::Point(at),
            Some(scale) => RawSeed::Explicit(RawExplicitSeed {
                at,
                scale: Some(scale),
            }),
        })
    }

    /// `(x, y)` with exactly two numeric components.
    fn coordinate(&mut self) -> Result<[f64; 2]> {
        let open = self.expect(Tok::LParen)?;
        let mut parts = Vec::new();
        loop {
            if self.eat(&Tok::RParen) {
                break;
            }
            parts.push(self.number()?);
            if !self.eat(&Tok::Comma) {
                self.expect(Tok::RParen)?;
                break;
            }
        }
        match parts.as_slice() {
            [x, y] => Ok([*x, *y]),
            _ => Err(self.error_at(
                open,
                format!("coordinate must have exactly two components (found {})", parts.len()),
            )),
        }
    }
}

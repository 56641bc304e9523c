//! # Transaction Code Decoder
//!
//! Decodes the compact play description carried in `event_tx` into
//! [`DerivedFields`].
//!
//! ```text
//! code     := basic ( '/' modifier )* ( '.' advance ( ';' advance )* )?
//! basic    := primary ( '+' runner ( ';' runner )* )?
//!           | runner ( ';' runner )*
//! advance  := [B123] ( '-' | 'X' ) [123H] ( '(' ... ')' )*
//! ```
//!
//! `!`, `#` and `?` are annotations and are ignored.
//!
//! ## Token precedence
//!
//! Primary tokens are matched longest-first, so that a shorter token
//! never claims the prefix of a longer one:
//!
//! | tried first | then        |
//! |-------------|-------------|
//! | `HP`        | `HR`, `H`   |
//! | `SB`        | `S`         |
//! | `CS`        | `C`         |
//! | `DGR`, `DI` | `D`         |
//! | `POCS`      | `PO`, `PB`  |
//! | `IW`        | `I`         |
//! | `WP`        | `W`         |
//! | `FLE`       | `FC`        |
//!
//! Modifiers and advances never produce counts, with one exception:
//! the `BINT` modifier marks batter interference.

use super::derived::DerivedFields;
use crate::error::{DecodeError, DecodeErrorKind, EventDecodeError};

/// Modifier keywords; a modifier is a keyword optionally followed by a
/// hit location or fielder (`G6`, `L9LS`, `E4`, `TH2`).
const MODIFIER_KEYWORDS: &[&str] = &[
    "AP", "BG", "BGDP", "BINT", "BL", "BOOT", "BP", "BPDP", "BR", "C", "COUB", "COUF", "COUR",
    "DP", "E", "F", "FDP", "FINT", "FL", "FO", "G", "GDP", "GTP", "IF", "INT", "IPHR", "L",
    "LDP", "LTP", "MREV", "NDP", "OBS", "P", "PASS", "R", "RINT", "SF", "SH", "TH", "TP",
    "UINT", "UREV",
];

/// Decode a transaction code.
///
/// Plays with nothing countable (fielded outs, errors, wild pitches)
/// decode to an all-zero record.
pub fn decode(code: &str) -> Result<DerivedFields, DecodeError> {
    Decoder { code }.run()
}

/// Decode the code of one play, attaching the play's identity to any
/// failure.
pub fn decode_event(
    game_id: &str,
    event_id: &str,
    code: &str,
) -> Result<DerivedFields, EventDecodeError> {
    decode(code).map_err(|source| EventDecodeError {
        game_id: game_id.to_string(),
        event_id: event_id.to_string(),
        source,
    })
}

/// Outcome of a primary token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Primary {
    /// Countable batter outcome; `compound` is whether `+` may follow.
    Batter { compound: bool },
    /// A runner event that may be followed by further `;` runner events.
    Runner,
    /// Nothing countable and nothing may follow.
    Plain,
}

struct Decoder<'a> {
    code: &'a str,
}

impl<'a> Decoder<'a> {
    fn fail(&self, position: usize, kind: DecodeErrorKind) -> DecodeError {
        DecodeError::new(self.code, position, kind)
    }

    fn run(&self) -> Result<DerivedFields, DecodeError> {
        let normalized: String = self
            .code
            .trim()
            .chars()
            .filter(|c| !matches!(c, '!' | '#' | '?'))
            .collect();
        if normalized.is_empty() {
            return Err(self.fail(0, DecodeErrorKind::Empty));
        }

        let mut fields = DerivedFields::default();

        let sections = self.split_top_level(&normalized, 0, '.')?;
        let (head_at, head) = sections[0];
        if sections.len() > 2 {
            return Err(self.fail(sections[2].0, DecodeErrorKind::InvalidAdvance(".".into())));
        }
        if let Some(&(adv_at, advances)) = sections.get(1) {
            for (at, adv) in self.split_top_level(advances, adv_at, ';')? {
                self.advance(adv, at)?;
            }
        }

        let mut parts = self.split_top_level(head, head_at, '/')?.into_iter();
        let (basic_at, basic) = parts.next().unwrap_or((head_at, head));
        for (at, modifier) in parts {
            self.modifier(modifier, at, &mut fields)?;
        }

        self.basic(basic, basic_at, &mut fields)?;
        Ok(fields)
    }

    /// Split on `sep` outside parentheses; each piece keeps its offset.
    fn split_top_level<'s>(
        &self,
        s: &'s str,
        base: usize,
        sep: char,
    ) -> Result<Vec<(usize, &'s str)>, DecodeError> {
        let mut pieces = Vec::new();
        let mut depth = 0i32;
        let mut start = 0;
        for (i, c) in s.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(self.fail(base + i, DecodeErrorKind::UnbalancedParens));
                    }
                }
                c if c == sep && depth == 0 => {
                    pieces.push((base + start, &s[start..i]));
                    start = i + c.len_utf8();
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(self.fail(base + s.len(), DecodeErrorKind::UnbalancedParens));
        }
        pieces.push((base + start, &s[start..]));
        Ok(pieces)
    }

    fn basic(&self, basic: &str, at: usize, fields: &mut DerivedFields) -> Result<(), DecodeError> {
        let (primary_tok, extra) = match basic.find('+') {
            Some(i) => (&basic[..i], Some((at + i + 1, &basic[i + 1..]))),
            None => (basic, None),
        };

        let mut runners = self.split_top_level(primary_tok, at, ';')?.into_iter();
        let (first_at, first) = runners.next().unwrap_or((at, primary_tok));
        let primary = self.primary(first, first_at, fields)?;
        let chained: Vec<_> = runners.collect();

        match primary {
            Primary::Runner => {
                for (r_at, tok) in chained {
                    self.runner(tok, r_at, fields)?;
                }
            }
            _ if !chained.is_empty() => {
                return Err(self.fail(
                    chained[0].0,
                    DecodeErrorKind::CompoundNotAllowed(first.to_string()),
                ));
            }
            _ => {}
        }

        if let Some((extra_at, extra)) = extra {
            if primary != (Primary::Batter { compound: true }) {
                return Err(self.fail(
                    extra_at,
                    DecodeErrorKind::CompoundNotAllowed(first.to_string()),
                ));
            }
            for (r_at, tok) in self.split_top_level(extra, extra_at, ';')? {
                self.runner(tok, r_at, fields)?;
            }
        }
        Ok(())
    }

    fn primary(&self, tok: &str, at: usize, f: &mut DerivedFields) -> Result<Primary, DecodeError> {
        let unknown = || self.fail(at, DecodeErrorKind::UnknownEvent(tok.to_string()));

        if tok.starts_with(|c: char| c.is_ascii_digit()) {
            self.fielded_out(tok, at)?;
            return Ok(Primary::Plain);
        }

        let (consumed, primary) = if tok == "HP" {
            f.hbp = 1;
            (2, Primary::Batter { compound: false })
        } else if let Some(rest) = tok.strip_prefix("HR").or_else(|| tok.strip_prefix('H')) {
            f.hr = 1;
            (tok.len() - rest.len(), Primary::Batter { compound: false })
        } else if tok.starts_with("SB")
            || tok.starts_with("CS")
            || tok.starts_with("PO")
            || matches!(tok, "WP" | "PB" | "DI" | "OA")
        {
            self.runner(tok, at, f)?;
            return Ok(Primary::Runner);
        } else if tok.starts_with('S') {
            f.single = 1;
            (1, Primary::Batter { compound: false })
        } else if tok.starts_with("DGR") {
            f.double = 1;
            (3, Primary::Batter { compound: false })
        } else if tok.starts_with('D') {
            f.double = 1;
            (1, Primary::Batter { compound: false })
        } else if tok.starts_with('T') {
            f.triple = 1;
            (1, Primary::Batter { compound: false })
        } else if tok == "IW" || tok == "I" {
            f.bb = 1;
            f.ibb = 1;
            (tok.len(), Primary::Batter { compound: true })
        } else if tok == "W" {
            f.bb = 1;
            (1, Primary::Batter { compound: true })
        } else if tok.starts_with('K') {
            f.so = 1;
            (1, Primary::Batter { compound: true })
        } else if tok == "C" {
            f.xi = 1;
            (1, Primary::Batter { compound: false })
        } else if tok == "BK" {
            f.bk = 1;
            (2, Primary::Plain)
        } else if tok == "NP" {
            (2, Primary::Plain)
        } else if tok.starts_with("FLE") {
            (3, Primary::Plain)
        } else if tok.starts_with("FC") {
            (2, Primary::Plain)
        } else if tok.starts_with('E') && tok.len() > 1 {
            (1, Primary::Plain)
        } else {
            return Err(unknown());
        };

        // Whatever follows the token is a fielder list.
        let rest = &tok[consumed..];
        if !rest.chars().all(|c| c.is_ascii_digit()) {
            return Err(unknown());
        }
        Ok(primary)
    }

    /// `54(1)3`, `8`, `1(B)16(2)63(1)`; digits with runner parentheticals.
    fn fielded_out(&self, tok: &str, at: usize) -> Result<(), DecodeError> {
        let mut in_paren = false;
        for (i, c) in tok.char_indices() {
            match (in_paren, c) {
                (false, '(') => in_paren = true,
                (true, ')') => in_paren = false,
                (true, 'B' | '1' | '2' | '3') => {}
                (true, other) => return Err(self.fail(at + i, DecodeErrorKind::InvalidBase(other))),
                (false, d) if d.is_ascii_digit() => {}
                _ => return Err(self.fail(at, DecodeErrorKind::UnknownEvent(tok.to_string()))),
            }
        }
        Ok(())
    }

    fn runner(&self, tok: &str, at: usize, f: &mut DerivedFields) -> Result<(), DecodeError> {
        let unknown = || self.fail(at, DecodeErrorKind::UnknownRunnerEvent(tok.to_string()));

        if matches!(tok, "WP" | "PB" | "DI" | "OA") {
            return Ok(());
        }
        if let Some(rest) = tok.strip_prefix("SB") {
            self.base(rest, at + 2, &['2', '3', 'H'])?;
            if rest.len() != 1 {
                return Err(unknown());
            }
            f.sb += 1;
            return Ok(());
        }
        let (caught, rest, prefix_len) = if let Some(rest) = tok.strip_prefix("POCS") {
            (true, rest, 4)
        } else if let Some(rest) = tok.strip_prefix("CS") {
            (true, rest, 2)
        } else if let Some(rest) = tok.strip_prefix("PO") {
            (false, rest, 2)
        } else if tok.len() == 2 && tok.starts_with('E') {
            return match tok.as_bytes()[1] {
                b'1'..=b'9' => Ok(()),
                _ => Err(unknown()),
            };
        } else {
            return Err(unknown());
        };

        let bases: &[char] = if caught { &['2', '3', 'H'] } else { &['1', '2', '3'] };
        self.base(rest, at + prefix_len, bases)?;
        let fielding = &rest[1..];
        if !fielding.is_empty() && !(fielding.starts_with('(') && fielding.ends_with(')')) {
            return Err(unknown());
        }
        // An error in the fielding sequence means the runner was safe.
        if caught && !fielding.contains('E') {
            f.cs += 1;
        }
        Ok(())
    }

    fn base(&self, rest: &str, at: usize, allowed: &[char]) -> Result<(), DecodeError> {
        match rest.chars().next() {
            Some(c) if allowed.contains(&c) => Ok(()),
            Some(c) => Err(self.fail(at, DecodeErrorKind::InvalidBase(c))),
            None => Err(self.fail(at, DecodeErrorKind::InvalidBase(' '))),
        }
    }

    fn modifier(&self, tok: &str, at: usize, f: &mut DerivedFields) -> Result<(), DecodeError> {
        let unknown = || self.fail(at, DecodeErrorKind::UnknownModifier(tok.to_string()));
        if tok.is_empty() {
            return Err(unknown());
        }

        // Bare hit location, e.g. `78XD` or `9LS`.
        if tok.starts_with(|c: char| c.is_ascii_digit()) {
            return if is_location(tok) { Ok(()) } else { Err(unknown()) };
        }

        let split = tok
            .find(|c: char| c.is_ascii_digit() || c == '+' || c == '-')
            .unwrap_or(tok.len());
        let (keyword, location) = tok.split_at(split);
        let known = MODIFIER_KEYWORDS.contains(&keyword)
            // throw to home: `THH`
            || keyword == "THH";
        if !known || !(location.is_empty() || is_location(location)) {
            return Err(unknown());
        }

        if keyword == "BINT" {
            f.xi = 1;
        }
        Ok(())
    }

    fn advance(&self, tok: &str, at: usize) -> Result<(), DecodeError> {
        let invalid = || self.fail(at, DecodeErrorKind::InvalidAdvance(tok.to_string()));
        let bytes = tok.as_bytes();
        if bytes.len() < 3 {
            return Err(invalid());
        }
        if !matches!(bytes[0], b'B' | b'1' | b'2' | b'3')
            || !matches!(bytes[1], b'-' | b'X')
            || !matches!(bytes[2], b'1' | b'2' | b'3' | b'H')
        {
            return Err(invalid());
        }
        let mut rest = &tok[3..];
        while !rest.is_empty() {
            if !rest.starts_with('(') {
                return Err(invalid());
            }
            match rest.find(')') {
                Some(end) => rest = &rest[end + 1..],
                None => return Err(self.fail(at, DecodeErrorKind::UnbalancedParens)),
            }
        }
        Ok(())
    }
}

/// Hit location / fielder suffix: digits, then trajectory letters and
/// `+`/`-` intensity marks.
fn is_location(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase() || c == '+' || c == '-')
}

//! The UTF-8 tokenizer FSM: turns an arbitrarily-chunked byte stream into
//! tokens, without ever requiring the whole input to be resident at once.

mod number;

pub use number::{Number, NumberState};

use crate::error::Error;
use crate::unicode::{classify, GlyphClass};
use crate::util::{Log, Position};

/// One lexical unit, with its own value already resolved (numbers and
/// escapes are decoded as the tokenizer goes, not deferred to the parser).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    ObjOpen,
    ObjClose,
    ArrOpen,
    ArrClose,
    Comma,
    Colon,
    String(Vec<u8>),
    /// An unquoted identifier, valid only as an object key.
    Name(String),
    Number(Number),
    True,
    False,
    Null,
    NaN,
    /// `sign` is `+1` or `-1`.
    Infinity(i8),
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::ObjOpen => "'{'",
            TokenKind::ObjClose => "'}'",
            TokenKind::ArrOpen => "'['",
            TokenKind::ArrClose => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::String(_) => "string",
            TokenKind::Name(_) => "identifier",
            TokenKind::Number(_) => "number",
            TokenKind::True | TokenKind::False => "boolean",
            TokenKind::Null => "null",
            TokenKind::NaN => "NaN",
            TokenKind::Infinity(_) => "Infinity",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub at: Position,
}

#[derive(Debug, Clone, PartialEq)]
enum State {
    None,
    Str,
    StrEscape,
    StrEscapeCr,
    StrHex,
    NumSign,
    Num,
    NumFrac,
    NumExp,
    NumExpSign,
    NumHex,
    Name,
    CommentStart,
    CommentLine,
    CommentBlock,
    CommentBlockStar,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErr {
    Invalid,
}

/// Decode the UTF-8 character starting at `bytes[0]`.
///
/// Returns `Ok(None)` when `bytes` holds a valid-so-far but truncated
/// sequence (the caller should carry it over to the next chunk), and
/// `Err` only for bytes that can never lead to a valid sequence.
pub fn decode_one(bytes: &[u8]) -> Result<Option<(char, usize)>, DecodeErr> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let b0 = bytes[0];
    if b0 < 0x80 {
        return Ok(Some((b0 as char, 1)));
    }
    let (len, mut cp): (usize, u32) = if b0 & 0xE0 == 0xC0 {
        (2, (b0 & 0x1F) as u32)
    } else if b0 & 0xF0 == 0xE0 {
        (3, (b0 & 0x0F) as u32)
    } else if b0 & 0xF8 == 0xF0 {
        (4, (b0 & 0x07) as u32)
    } else {
        return Err(DecodeErr::Invalid);
    };

    if bytes.len() < len {
        for &b in &bytes[1..] {
            if b & 0xC0 != 0x80 {
                return Err(DecodeErr::Invalid);
            }
        }
        return Ok(None);
    }

    for &b in &bytes[1..len] {
        if b & 0xC0 != 0x80 {
            return Err(DecodeErr::Invalid);
        }
        cp = (cp << 6) | (b & 0x3F) as u32;
    }

    let min = match len {
        2 => 0x80,
        3 => 0x800,
        _ => 0x10000,
    };
    if cp < min || cp > 0x10FFFF || (0xD800..=0xDFFF).contains(&cp) {
        return Err(DecodeErr::Invalid);
    }

    match char::from_u32(cp) {
        Some(c) => Ok(Some((c, len))),
        None => Err(DecodeErr::Invalid),
    }
}

#[derive(Debug, Clone, Copy)]
struct HexEscape {
    short: bool,
    needed: u8,
    seen: u8,
    value: u32,
}

impl HexEscape {
    fn short() -> Self {
        Self {
            short: true,
            needed: 2,
            seen: 0,
            value: 0,
        }
    }

    fn unicode() -> Self {
        Self {
            short: false,
            needed: 4,
            seen: 0,
            value: 0,
        }
    }
}

/// The tokenizer FSM. Feed it bytes as they arrive; call [`Tokenizer::finish`]
/// once with no further input to flush whatever token the last bytes left
/// in flight.
pub struct Tokenizer {
    state: State,
    pos: Position,
    pending: Vec<u8>,
    buffer: Vec<u8>,
    token_start: Position,
    quote: u8,
    num: NumberState,
    hex: HexEscape,
    pending_high_surrogate: Option<u16>,
    name_sign: Option<i8>,
    log: Log<&'static str>,
}

type OnToken<'a> = dyn FnMut(Token) -> Result<(), Error> + 'a;

impl Tokenizer {
    pub fn new() -> Self {
        Self::with_log(Log::None)
    }

    pub fn with_log(log: Log<&'static str>) -> Self {
        Self {
            state: State::None,
            pos: Position::start(),
            pending: Vec::new(),
            buffer: Vec::new(),
            token_start: Position::start(),
            quote: b'"',
            num: NumberState::new(),
            hex: HexEscape::short(),
            pending_high_surrogate: None,
            name_sign: None,
            log,
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn feed(&mut self, bytes: &[u8], on_token: &mut OnToken<'_>) -> Result<(), Error> {
        if self.state == State::Error {
            return Ok(());
        }

        let combined;
        let chunk: &[u8] = if self.pending.is_empty() {
            bytes
        } else {
            self.pending.extend_from_slice(bytes);
            combined = std::mem::take(&mut self.pending);
            &combined
        };

        let mut i = 0usize;
        while i < chunk.len() {
            match decode_one(&chunk[i..]) {
                Ok(Some((c, len))) => {
                    let at = self.pos;
                    self.pos.advance(c);
                    i += len;
                    self.accept_char(c, at, on_token)?;
                }
                Ok(None) => {
                    self.pending.extend_from_slice(&chunk[i..]);
                    break;
                }
                Err(DecodeErr::Invalid) => {
                    let at = self.pos;
                    return self.fail(Error::InvalidByte {
                        at,
                        byte: chunk[i],
                    });
                }
            }
        }
        Ok(())
    }

    /// Signal end of input. Finalizes whatever token was in flight, or
    /// errors if the input ended mid-token.
    pub fn finish(&mut self, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        if self.state == State::Error {
            return Ok(());
        }
        if !self.pending.is_empty() {
            let at = self.pos;
            let byte = self.pending[0];
            return self.fail(Error::InvalidByte { at, byte });
        }

        let at = self.pos;
        match self.state {
            State::None | State::CommentLine => Ok(()),
            State::Str | State::StrEscape | State::StrEscapeCr | State::StrHex => {
                self.fail(Error::PrematureEnd { at })
            }
            State::NumSign | State::NumExpSign => self.fail(Error::PrematureEnd { at }),
            State::Num => self.emit_number(on_token),
            State::NumFrac | State::NumHex => {
                if self.num.has_digits() {
                    self.emit_number(on_token)
                } else {
                    self.fail(Error::PrematureEnd { at })
                }
            }
            State::NumExp => {
                if self.num.has_exp_digits() {
                    self.emit_number(on_token)
                } else {
                    self.fail(Error::PrematureEnd { at })
                }
            }
            State::Name => self.emit_name(on_token),
            State::CommentStart | State::CommentBlock | State::CommentBlockStar => {
                self.fail(Error::PrematureEnd { at })
            }
            State::Error => Ok(()),
        }
    }

    fn fail(&mut self, e: Error) -> Result<(), Error> {
        self.state = State::Error;
        self.log.trace_error(self.pos, &e);
        Err(e)
    }

    fn accept_char(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        match self.state {
            State::None => self.accept_none(c, at, on_token),
            State::Str => self.accept_str(c, at, on_token),
            State::StrEscape => self.accept_str_escape(c, at),
            State::StrEscapeCr => self.accept_str_escape_cr(c, at, on_token),
            State::StrHex => self.accept_str_hex(c, at),
            State::NumSign => self.accept_num_sign(c, at),
            State::Num => self.accept_num(c, at, on_token),
            State::NumFrac => self.accept_num_frac(c, at, on_token),
            State::NumExp => self.accept_num_exp(c, at, on_token),
            State::NumExpSign => self.accept_num_exp_sign(c, at),
            State::NumHex => self.accept_num_hex(c, at, on_token),
            State::Name => self.accept_name(c, at, on_token),
            State::CommentStart => self.accept_comment_start(c, at),
            State::CommentLine => self.accept_comment_line(c),
            State::CommentBlock => self.accept_comment_block(c),
            State::CommentBlockStar => self.accept_comment_block_star(c),
            State::Error => Ok(()),
        }
    }

    fn accept_none(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        match c {
            ' ' | '\t' | '\u{0B}' | '\u{0C}' | '\r' | '\n' => Ok(()),
            '{' => self.emit_simple(TokenKind::ObjOpen, at, on_token),
            '}' => self.emit_simple(TokenKind::ObjClose, at, on_token),
            '[' => self.emit_simple(TokenKind::ArrOpen, at, on_token),
            ']' => self.emit_simple(TokenKind::ArrClose, at, on_token),
            ',' => self.emit_simple(TokenKind::Comma, at, on_token),
            ':' => self.emit_simple(TokenKind::Colon, at, on_token),
            '"' | '\'' => {
                self.state = State::Str;
                self.quote = c as u8;
                self.token_start = at;
                self.buffer.clear();
                Ok(())
            }
            '+' | '-' => {
                self.state = State::NumSign;
                self.token_start = at;
                self.num = NumberState::new();
                self.num.set_sign(if c == '-' { -1 } else { 1 });
                Ok(())
            }
            '.' => {
                self.state = State::NumFrac;
                self.token_start = at;
                self.num = NumberState::new();
                self.num.enter_frac();
                Ok(())
            }
            '0'..='9' => {
                self.state = State::Num;
                self.token_start = at;
                self.num = NumberState::new();
                self.num.push_digit(c as u8 - b'0');
                Ok(())
            }
            '/' => {
                self.state = State::CommentStart;
                Ok(())
            }
            '_' | '$' => self.begin_name(c, at),
            _ if c.is_ascii_alphabetic() => self.begin_name(c, at),
            _ if (c as u32) >= 128 => match classify(c) {
                GlyphClass::Name => self.begin_name(c, at),
                GlyphClass::Linebreak | GlyphClass::Space => Ok(()),
                _ => self.fail(Error::UnexpectedChar { at, found: c }),
            },
            _ => self.fail(Error::UnexpectedChar { at, found: c }),
        }
    }

    fn emit_simple(&mut self, kind: TokenKind, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        self.log.trace_token(at, &kind);
        on_token(Token { kind, at })
    }

    fn push_byte(&mut self, b: u8) {
        self.buffer.push(b);
    }

    fn push_char_to_buffer(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.buffer.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }

    // -- strings --------------------------------------------------------

    fn accept_str(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        if c as u32 == self.quote as u32 {
            return self.emit_string(on_token);
        }
        match c {
            '\\' => {
                self.state = State::StrEscape;
                Ok(())
            }
            '\n' | '\r' | '\u{2028}' | '\u{2029}' => self.fail(Error::UnexpectedLinebreak { at }),
            _ if c.is_control() => self.fail(Error::UnexpectedChar { at, found: c }),
            _ => {
                self.push_char_to_buffer(c);
                Ok(())
            }
        }
    }

    fn emit_string(&mut self, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        if self.pending_high_surrogate.take().is_some() {
            let at = self.pos;
            return self.fail(Error::ExpectedLowSurrogate { at });
        }
        let at = self.token_start;
        let bytes = std::mem::take(&mut self.buffer);
        self.state = State::None;
        let kind = TokenKind::String(bytes);
        self.log.trace_token(at, &kind);
        on_token(Token { kind, at })
    }

    fn accept_str_escape(&mut self, c: char, at: Position) -> Result<(), Error> {
        match c {
            '"' => {
                self.push_byte(b'"');
                self.state = State::Str;
            }
            '\'' => {
                self.push_byte(b'\'');
                self.state = State::Str;
            }
            '\\' => {
                self.push_byte(b'\\');
                self.state = State::Str;
            }
            '/' => {
                self.push_byte(b'/');
                self.state = State::Str;
            }
            'b' => {
                self.push_byte(0x08);
                self.state = State::Str;
            }
            'f' => {
                self.push_byte(0x0C);
                self.state = State::Str;
            }
            'n' => {
                self.push_byte(b'\n');
                self.state = State::Str;
            }
            'r' => {
                self.push_byte(b'\r');
                self.state = State::Str;
            }
            't' => {
                self.push_byte(b'\t');
                self.state = State::Str;
            }
            'v' => {
                self.push_byte(0x0B);
                self.state = State::Str;
            }
            '0' => {
                self.push_byte(0);
                self.state = State::Str;
            }
            'x' => {
                self.hex = HexEscape::short();
                self.state = State::StrHex;
            }
            'u' => {
                self.hex = HexEscape::unicode();
                self.state = State::StrHex;
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                self.state = State::Str;
            }
            '\r' => {
                self.state = State::StrEscapeCr;
            }
            _ if c.is_ascii() => {
                self.push_char_to_buffer(c);
                self.state = State::Str;
            }
            _ => return self.fail(Error::UnexpectedChar { at, found: c }),
        }
        Ok(())
    }

    fn accept_str_escape_cr(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        self.state = State::Str;
        if c == '\n' {
            Ok(())
        } else {
            self.accept_str(c, at, on_token)
        }
    }

    fn accept_str_hex(&mut self, c: char, at: Position) -> Result<(), Error> {
        let d = match c.to_digit(16) {
            Some(d) => d,
            None => {
                let byte = if c.is_ascii() { c as u8 } else { 0 };
                return self.fail(Error::InvalidHexChar { at, byte });
            }
        };
        self.hex.value = (self.hex.value << 4) | d;
        self.hex.seen += 1;
        if self.hex.seen < self.hex.needed {
            return Ok(());
        }
        self.finish_hex_escape(at)
    }

    fn finish_hex_escape(&mut self, at: Position) -> Result<(), Error> {
        self.state = State::Str;
        if self.hex.short {
            self.push_byte(self.hex.value as u8);
            return Ok(());
        }
        let unit = self.hex.value as u16;
        if let Some(high) = self.pending_high_surrogate.take() {
            return if (0xDC00..=0xDFFF).contains(&unit) {
                let c = Self::combine_surrogates(high, unit);
                self.push_char_to_buffer(c);
                Ok(())
            } else {
                self.fail(Error::ExpectedLowSurrogate { at })
            };
        }
        if (0xD800..=0xDBFF).contains(&unit) {
            self.pending_high_surrogate = Some(unit);
            return Ok(());
        }
        if (0xDC00..=0xDFFF).contains(&unit) {
            return self.fail(Error::ExpectedLowSurrogate { at });
        }
        match char::from_u32(unit as u32) {
            Some(c) => {
                self.push_char_to_buffer(c);
                Ok(())
            }
            None => self.fail(Error::InvalidHexChar { at, byte: 0 }),
        }
    }

    fn combine_surrogates(high: u16, low: u16) -> char {
        let cp = 0x10000 + ((high as u32 - 0xD800) << 10) + (low as u32 - 0xDC00);
        char::from_u32(cp).unwrap_or('\u{FFFD}')
    }

    // -- numbers ----------------------------------------------------------

    fn accept_num_sign(&mut self, c: char, at: Position) -> Result<(), Error> {
        match c {
            '0'..='9' => {
                self.num.push_digit(c as u8 - b'0');
                self.state = State::Num;
                Ok(())
            }
            '.' => {
                self.num.enter_frac();
                self.state = State::NumFrac;
                Ok(())
            }
            _ if c.is_ascii_alphabetic() => {
                self.name_sign = Some(self.num.sign());
                self.begin_name(c, at)
            }
            _ => self.fail(Error::UnexpectedChar { at, found: c }),
        }
    }

    fn accept_num(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        match c {
            '0'..='9' => {
                self.num.push_digit(c as u8 - b'0');
                Ok(())
            }
            '.' => {
                self.num.enter_frac();
                self.state = State::NumFrac;
                Ok(())
            }
            'e' | 'E' => {
                self.state = State::NumExp;
                Ok(())
            }
            'x' | 'X' if self.num.is_lone_zero() => {
                self.num.enter_hex();
                self.state = State::NumHex;
                Ok(())
            }
            _ => {
                self.emit_number(on_token)?;
                self.state = State::None;
                self.accept_none(c, at, on_token)
            }
        }
    }

    fn accept_num_frac(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        match c {
            '0'..='9' => {
                self.num.push_digit(c as u8 - b'0');
                Ok(())
            }
            'e' | 'E' => {
                self.state = State::NumExp;
                Ok(())
            }
            _ if self.num.has_digits() => {
                self.emit_number(on_token)?;
                self.state = State::None;
                self.accept_none(c, at, on_token)
            }
            _ => self.fail(Error::UnexpectedChar { at, found: c }),
        }
    }

    fn accept_num_exp(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        match c {
            '+' => {
                self.num.enter_exp(1);
                self.state = State::NumExpSign;
                Ok(())
            }
            '-' => {
                self.num.enter_exp(-1);
                self.state = State::NumExpSign;
                Ok(())
            }
            '0'..='9' => {
                if !self.num.has_exp_digits() {
                    self.num.enter_exp(1);
                }
                self.num.push_exp_digit(c as u8 - b'0');
                Ok(())
            }
            _ if self.num.has_exp_digits() => {
                self.emit_number(on_token)?;
                self.state = State::None;
                self.accept_none(c, at, on_token)
            }
            _ => self.fail(Error::UnexpectedChar { at, found: c }),
        }
    }

    fn accept_num_exp_sign(&mut self, c: char, at: Position) -> Result<(), Error> {
        match c {
            '0'..='9' => {
                self.num.push_exp_digit(c as u8 - b'0');
                self.state = State::NumExp;
                Ok(())
            }
            _ => self.fail(Error::UnexpectedChar { at, found: c }),
        }
    }

    fn accept_num_hex(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        match c.to_digit(16) {
            Some(d) => {
                self.num.push_digit(d as u8);
                Ok(())
            }
            None if self.num.has_digits() => {
                self.emit_number(on_token)?;
                self.state = State::None;
                self.accept_none(c, at, on_token)
            }
            None => self.fail(Error::UnexpectedChar { at, found: c }),
        }
    }

    fn emit_number(&mut self, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        let at = self.token_start;
        let number = self.num.finalize();
        self.num = NumberState::new();
        let kind = TokenKind::Number(number);
        self.log.trace_token(at, &kind);
        on_token(Token { kind, at })
    }

    // -- names / keywords ---------------------------------------------------

    fn begin_name(&mut self, c: char, at: Position) -> Result<(), Error> {
        self.state = State::Name;
        self.token_start = at;
        self.buffer.clear();
        self.push_char_to_buffer(c);
        Ok(())
    }

    fn is_name_continue(c: char) -> bool {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            return true;
        }
        if (c as u32) >= 128 {
            matches!(classify(c), GlyphClass::Name | GlyphClass::NameOther)
        } else {
            false
        }
    }

    fn accept_name(&mut self, c: char, at: Position, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        if Self::is_name_continue(c) {
            self.push_char_to_buffer(c);
            return Ok(());
        }
        self.emit_name(on_token)?;
        self.state = State::None;
        self.accept_none(c, at, on_token)
    }

    fn emit_name(&mut self, on_token: &mut OnToken<'_>) -> Result<(), Error> {
        let at = self.token_start;
        let text = std::mem::take(&mut self.buffer);
        let sign = self.name_sign.take();
        let kind = match (text.as_slice(), sign) {
            (b"true", None) => TokenKind::True,
            (b"false", None) => TokenKind::False,
            (b"null", _) => TokenKind::Null,
            (b"NaN", _) => TokenKind::NaN,
            (b"Infinity", s) => TokenKind::Infinity(s.unwrap_or(1)),
            (_, None) => TokenKind::Name(
                String::from_utf8(text).expect("name buffer holds only decoded UTF-8"),
            ),
            (_, Some(_)) => {
                let text = String::from_utf8_lossy(&text).into_owned();
                return self.fail(Error::InvalidToken { at, text });
            }
        };
        self.state = State::None;
        self.log.trace_token(at, &kind);
        on_token(Token { kind, at })
    }

    // -- comments -------------------------------------------------------

    fn accept_comment_start(&mut self, c: char, at: Position) -> Result<(), Error> {
        match c {
            '/' => {
                self.state = State::CommentLine;
                Ok(())
            }
            '*' => {
                self.state = State::CommentBlock;
                Ok(())
            }
            _ => self.fail(Error::UnexpectedChar { at, found: c }),
        }
    }

    fn accept_comment_line(&mut self, c: char) -> Result<(), Error> {
        if matches!(c, '\n' | '\u{2028}' | '\u{2029}') {
            self.state = State::None;
        }
        Ok(())
    }

    fn accept_comment_block(&mut self, c: char) -> Result<(), Error> {
        if c == '*' {
            self.state = State::CommentBlockStar;
        }
        Ok(())
    }

    fn accept_comment_block_star(&mut self, c: char) -> Result<(), Error> {
        match c {
            '/' => self.state = State::None,
            '*' => {}
            _ => self.state = State::CommentBlock,
        }
        Ok(())
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

use crate::util::Position;
use std::fmt::{Display, Formatter};

/// A token kind name used only for error messages; kept independent of
/// [`crate::tokenizer::TokenKind`] so this module has no dependency on the
/// tokenizer's internals.
pub type TokenKindName = &'static str;

/// Every way the tokenizer, parser, or writer can fail.
///
/// No error is recovered locally: the first error moves the owning state
/// machine to `Error` and every later push is a no-op, so callers always see
/// the error that first occurred rather than a confusing successor.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Alloc,
    InvalidByte { at: Position, byte: u8 },
    InvalidHexChar { at: Position, byte: u8 },
    ExpectedLowSurrogate { at: Position },
    UnexpectedChar { at: Position, found: char },
    UnexpectedLinebreak { at: Position },
    PrematureEnd { at: Position },
    InvalidToken { at: Position, text: String },
    UnexpectedToken { at: Position, kind: TokenKindName },
    UserError(i32),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Alloc => write!(f, "allocation failed"),
            Error::InvalidByte { at, byte } => {
                write!(f, "invalid byte 0x{:02x} at {}", byte, at)
            }
            Error::InvalidHexChar { at, byte } => {
                write!(f, "invalid hex digit 0x{:02x} at {}", byte, at)
            }
            Error::ExpectedLowSurrogate { at } => {
                write!(f, "expected low surrogate at {}", at)
            }
            Error::UnexpectedChar { at, found } => {
                write!(f, "unexpected character {:?} at {}", found, at)
            }
            Error::UnexpectedLinebreak { at } => {
                write!(f, "unexpected linebreak at {}", at)
            }
            Error::PrematureEnd { at } => {
                write!(f, "premature end of file at {}", at)
            }
            Error::InvalidToken { at, text } => {
                write!(f, "invalid token {:?} at {}", text, at)
            }
            Error::UnexpectedToken { at, kind } => {
                write!(f, "unexpected token {} at {}", kind, at)
            }
            Error::UserError(n) => write!(f, "user error: {}", n),
        }
    }
}

impl std::error::Error for Error {}

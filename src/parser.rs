//! The grammar FSM: consumes tokens and assembles a [`Value`] tree.
//!
//! Containers are addressed through a path of indices rather than a live
//! reference, since a reference into the tree can't be held across two
//! separate [`Parser::accept_token`] calls without the borrow checker's
//! blessing. Each open container remembers the path from the root down to
//! its own slot; resolving a path walks from the root each time a token
//! needs to reach into the tree.

use crate::error::Error;
use crate::tokenizer::{Token, TokenKind};
use crate::util::{Log, Position};
use crate::value::{Array, Object, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathStep {
    Index(usize),
    Prop(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Array,
    Object,
}

struct Frame {
    kind: ContainerKind,
    path: Vec<PathStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing consumed yet; the next token must start the document's root
    /// value.
    Start,
    /// Just opened `[` or consumed `,` inside an array: a value or `]`
    /// (trailing comma / empty array) is acceptable.
    ArrValue,
    /// Just closed an array element: expect `,` or `]`.
    ArrSep,
    /// Expect an object key, or `}` (empty object / trailing comma).
    ObjKey,
    /// Just staged a key: expect `:`.
    ObjColon,
    /// Just consumed `:`: expect a value, strictly (no early close).
    ObjValue,
    /// Just closed an object value: expect `,` or `}`.
    ObjSep,
    /// The root value is complete; no further tokens are legal.
    End,
    Error,
}

fn resolve_mut<'a>(mut v: &'a mut Value, path: &[PathStep]) -> &'a mut Value {
    for step in path {
        v = match step {
            PathStep::Index(i) => match v {
                Value::Array(a) => a.get_mut(*i).expect("path index out of bounds"),
                _ => unreachable!("path step expected an array"),
            },
            PathStep::Prop(i) => match v {
                Value::Object(o) => o.slot_value_mut(*i),
                _ => unreachable!("path step expected an object"),
            },
        };
    }
    v
}

/// Builds a single [`Value`] tree from a token stream. Feed it one token at
/// a time via [`Parser::accept_token`]; call [`Parser::finish`] once the
/// token source is exhausted.
pub struct Parser {
    state: State,
    stack: Vec<Frame>,
    root: Value,
    pending_obj_slot: Option<usize>,
    last_pos: Position,
    last_error: Option<Error>,
    log: Log<&'static str>,
}

impl Parser {
    pub fn new() -> Self {
        Self::with_log(Log::None)
    }

    pub fn with_log(log: Log<&'static str>) -> Self {
        Self {
            state: State::Start,
            stack: Vec::new(),
            root: Value::Null,
            pending_obj_slot: None,
            last_pos: Position::start(),
            last_error: None,
            log,
        }
    }

    pub fn accept_token(&mut self, token: Token) -> Result<(), Error> {
        if self.state == State::Error {
            return Ok(());
        }
        let at = token.at;
        self.last_pos = at;
        let result = match self.state {
            State::Start => self.accept_value(token, None),
            State::ArrValue => self.accept_value(token, Some(ContainerKind::Array)),
            State::ObjValue => self.accept_value(token, None),
            State::ObjKey => self.accept_obj_key(token),
            State::ObjColon => self.accept_obj_colon(token),
            State::ArrSep => self.accept_arr_sep(token),
            State::ObjSep => self.accept_obj_sep(token),
            State::End => Err(Error::UnexpectedToken {
                at,
                kind: token.kind.name(),
            }),
            State::Error => Ok(()),
        };
        if let Err(e) = &result {
            self.log.trace_error(at, e);
            self.last_error = Some(e.clone());
            self.state = State::Error;
        }
        result
    }

    /// Signal end of input. Returns the assembled root value, or the error
    /// that stopped parsing (including a truncated document).
    pub fn finish(&mut self) -> Result<Value, Error> {
        match self.state {
            State::End => Ok(std::mem::replace(&mut self.root, Value::Null)),
            State::Error => Err(self
                .last_error
                .clone()
                .expect("error state always records the error that caused it")),
            _ => Err(Error::PrematureEnd { at: self.last_pos }),
        }
    }

    fn accept_value(&mut self, token: Token, allow_close: Option<ContainerKind>) -> Result<(), Error> {
        let at = token.at;
        match token.kind {
            TokenKind::ObjClose if allow_close == Some(ContainerKind::Object) => {
                self.close_container()
            }
            TokenKind::ArrClose if allow_close == Some(ContainerKind::Array) => {
                self.close_container()
            }
            TokenKind::ObjOpen => self.open_container(ContainerKind::Object),
            TokenKind::ArrOpen => self.open_container(ContainerKind::Array),
            TokenKind::String(s) => self.finish_scalar(Value::String(s)),
            TokenKind::Number(n) => self.finish_scalar(n.into_value()),
            TokenKind::True => self.finish_scalar(Value::Bool(true)),
            TokenKind::False => self.finish_scalar(Value::Bool(false)),
            TokenKind::Null => self.finish_scalar(Value::Null),
            TokenKind::NaN => self.finish_scalar(Value::NaN),
            TokenKind::Infinity(sign) => self.finish_scalar(Value::Infinity(sign)),
            other => Err(Error::UnexpectedToken {
                at,
                kind: other.name(),
            }),
        }
    }

    fn accept_obj_key(&mut self, token: Token) -> Result<(), Error> {
        let at = token.at;
        match token.kind {
            TokenKind::ObjClose => self.close_container(),
            TokenKind::String(key) => self.stage_key(key),
            TokenKind::Name(key) => self.stage_key(key.into_bytes()),
            // `null`/`NaN`/unsigned `Infinity` are valid unquoted keys, keyed
            // by their original textual form. A negative-signed `Infinity`
            // is the one case our tokenizer still distinguishes from its
            // unsigned form, so it alone is rejected as a signed key.
            TokenKind::Null => self.stage_key(b"null".to_vec()),
            TokenKind::NaN => self.stage_key(b"NaN".to_vec()),
            TokenKind::Infinity(sign) if sign >= 0 => self.stage_key(b"Infinity".to_vec()),
            other => Err(Error::UnexpectedToken {
                at,
                kind: other.name(),
            }),
        }
    }

    fn accept_obj_colon(&mut self, token: Token) -> Result<(), Error> {
        match token.kind {
            TokenKind::Colon => {
                self.state = State::ObjValue;
                Ok(())
            }
            other => Err(Error::UnexpectedToken {
                at: token.at,
                kind: other.name(),
            }),
        }
    }

    fn accept_arr_sep(&mut self, token: Token) -> Result<(), Error> {
        match token.kind {
            TokenKind::Comma => {
                self.state = State::ArrValue;
                Ok(())
            }
            TokenKind::ArrClose => self.close_container(),
            other => Err(Error::UnexpectedToken {
                at: token.at,
                kind: other.name(),
            }),
        }
    }

    fn accept_obj_sep(&mut self, token: Token) -> Result<(), Error> {
        match token.kind {
            TokenKind::Comma => {
                self.state = State::ObjKey;
                Ok(())
            }
            TokenKind::ObjClose => self.close_container(),
            other => Err(Error::UnexpectedToken {
                at: token.at,
                kind: other.name(),
            }),
        }
    }

    fn current_path(&self) -> &[PathStep] {
        self.stack.last().map(|f| f.path.as_slice()).unwrap_or(&[])
    }

    fn stage_key(&mut self, key: Vec<u8>) -> Result<(), Error> {
        let path = self.current_path().to_vec();
        let container = resolve_mut(&mut self.root, &path);
        let obj = match container {
            Value::Object(o) => o,
            _ => unreachable!("object key staged outside an object frame"),
        };
        let idx = obj
            .set_indexed(&key, true, &self.log)?
            .expect("replace=true always yields a slot");
        self.pending_obj_slot = Some(idx);
        self.state = State::ObjColon;
        Ok(())
    }

    fn finish_scalar(&mut self, value: Value) -> Result<(), Error> {
        self.write_current(value)?;
        self.after_value()
    }

    fn write_current(&mut self, value: Value) -> Result<(), Error> {
        if self.stack.is_empty() {
            self.root = value;
            return Ok(());
        }
        let path = self.current_path().to_vec();
        let container = resolve_mut(&mut self.root, &path);
        match container {
            Value::Array(a) => {
                let slot = a.append_item()?;
                *slot = value;
            }
            Value::Object(o) => {
                let idx = self
                    .pending_obj_slot
                    .take()
                    .expect("object value written without a staged key");
                *o.slot_value_mut(idx) = value;
            }
            _ => unreachable!("container frame path resolves to a non-container"),
        }
        Ok(())
    }

    fn open_container(&mut self, kind: ContainerKind) -> Result<(), Error> {
        let empty = match kind {
            ContainerKind::Array => Value::Array(Array::new()),
            ContainerKind::Object => Value::Object(Object::new()),
        };
        let new_path = if self.stack.is_empty() {
            self.root = empty;
            Vec::new()
        } else {
            let mut path = self.current_path().to_vec();
            let container = resolve_mut(&mut self.root, &path);
            let step = match container {
                Value::Array(a) => {
                    let slot = a.append_item()?;
                    *slot = empty;
                    PathStep::Index(a.len() - 1)
                }
                Value::Object(o) => {
                    let idx = self
                        .pending_obj_slot
                        .take()
                        .expect("container value written without a staged key");
                    *o.slot_value_mut(idx) = empty;
                    PathStep::Prop(idx)
                }
                _ => unreachable!("container frame path resolves to a non-container"),
            };
            path.push(step);
            path
        };
        self.stack.push(Frame {
            kind,
            path: new_path,
        });
        self.state = match kind {
            ContainerKind::Array => State::ArrValue,
            ContainerKind::Object => State::ObjKey,
        };
        Ok(())
    }

    fn close_container(&mut self) -> Result<(), Error> {
        self.stack.pop().expect("close_container with empty stack");
        self.after_value()
    }

    fn after_value(&mut self) -> Result<(), Error> {
        self.state = match self.stack.last().map(|f| f.kind) {
            None => State::End,
            Some(ContainerKind::Array) => State::ArrSep,
            Some(ContainerKind::Object) => State::ObjSep,
        };
        Ok(())
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn parse(input: &str) -> Result<Value, Error> {
        let mut tok = Tokenizer::new();
        let mut parser = Parser::new();
        tok.feed(input.as_bytes(), &mut |t| parser.accept_token(t))?;
        tok.finish(&mut |t| parser.accept_token(t))?;
        parser.finish()
    }

    #[test]
    fn scalar_root() {
        assert_eq!(parse("42").unwrap(), Value::Int(42));
        assert_eq!(parse("true").unwrap(), Value::Bool(true));
        assert_eq!(parse("null").unwrap(), Value::Null);
    }

    #[test]
    fn flat_array() {
        let v = parse("[1, 2, 3]").unwrap();
        let a = v.as_array().unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(0), Some(&Value::Int(1)));
        assert_eq!(a.get(2), Some(&Value::Int(3)));
    }

    #[test]
    fn trailing_comma_in_array() {
        let v = parse("[1, 2,]").unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
    }

    #[test]
    fn empty_array_and_object() {
        assert_eq!(parse("[]").unwrap().as_array().unwrap().len(), 0);
        assert_eq!(parse("{}").unwrap().as_object().unwrap().len(), 0);
    }

    #[test]
    fn flat_object_with_unquoted_key() {
        let v = parse("{a: 1, \"b\": 2}").unwrap();
        let o = v.as_object().unwrap();
        assert_eq!(o.get(b"a"), Some(&Value::Int(1)));
        assert_eq!(o.get(b"b"), Some(&Value::Int(2)));
    }

    #[test]
    fn nested_structures() {
        let v = parse(r#"{a: [1, {b: 2}], c: []}"#).unwrap();
        let o = v.as_object().unwrap();
        let a = o.get(b"a").unwrap().as_array().unwrap();
        assert_eq!(a.get(0), Some(&Value::Int(1)));
        let nested = a.get(1).unwrap().as_object().unwrap();
        assert_eq!(nested.get(b"b"), Some(&Value::Int(2)));
        assert_eq!(o.get(b"c").unwrap().as_array().unwrap().len(), 0);
    }

    #[test]
    fn duplicate_key_last_wins() {
        let v = parse("{a: 1, a: 2}").unwrap();
        assert_eq!(v.as_object().unwrap().get(b"a"), Some(&Value::Int(2)));
    }

    #[test]
    fn colon_does_not_allow_early_close() {
        let err = parse("{a:}").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }

    #[test]
    fn keyword_keys_use_their_textual_form() {
        let v = parse("{null: 1, NaN: 2, Infinity: 3, +Infinity: 4}").unwrap();
        let o = v.as_object().unwrap();
        assert_eq!(o.get(b"null"), Some(&Value::Int(1)));
        assert_eq!(o.get(b"NaN"), Some(&Value::Int(2)));
        assert_eq!(o.get(b"Infinity"), Some(&Value::Int(4)));
    }

    #[test]
    fn negative_infinity_key_is_rejected() {
        let err = parse("{-Infinity: 1}").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }

    #[test]
    fn numeric_key_is_rejected() {
        let err = parse("{1: 2}").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }

    #[test]
    fn trailing_garbage_after_root_value_errors() {
        let err = parse("1 2").unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }

    #[test]
    fn truncated_array_is_premature_end() {
        let err = parse("[1, 2").unwrap_err();
        assert!(matches!(err, Error::PrematureEnd { .. }));
    }
}

//! The crate's front door: one-shot `decode`/`encode` built on the
//! streaming [`crate::tokenizer::Tokenizer`] and [`crate::parser::Parser`].

use crate::error::Error;
use crate::parser::Parser;
use crate::tokenizer::Tokenizer;
use crate::util::Log;
use crate::value::Value;
use crate::writer::{write_value, WriteOptions};

/// Parse a complete JSON5 document held in memory.
///
/// For input arriving in chunks (a socket, a file read in pieces), drive a
/// [`Tokenizer`] and [`Parser`] directly instead: feed each chunk to the
/// tokenizer, routing its tokens into the parser, then call `finish` on
/// both once the source is exhausted.
pub fn decode(bytes: &[u8]) -> Result<Value, Error> {
    decode_with_log(bytes, Log::None)
}

pub fn decode_with_log(bytes: &[u8], log: Log<&'static str>) -> Result<Value, Error> {
    let mut tokenizer = Tokenizer::with_log(log.clone());
    let mut parser = Parser::with_log(log);
    tokenizer.feed(bytes, &mut |token| parser.accept_token(token))?;
    tokenizer.finish(&mut |token| parser.accept_token(token))?;
    parser.finish()
}

/// Serialize `value` with the default escaping policy (non-ASCII escaped
/// as `\uXXXX`).
pub fn encode(value: &Value) -> Result<Vec<u8>, Error> {
    encode_with(value, &WriteOptions::default())
}

pub fn encode_with(value: &Value, options: &WriteOptions) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    write_value(value, options, &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    #[test]
    fn round_trips_a_nested_document() {
        let input = br#"{
            name: 'json5', // trailing comma below
            tags: ["a", "b",],
            version: 1.5,
            stable: true,
            notes: null,
        }"#;
        let value = decode(input).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.get(b"name"), Some(&Value::String(b"json5".to_vec())));
        assert_eq!(obj.get(b"version"), Some(&Value::Float(1.5)));
        assert_eq!(obj.get(b"stable"), Some(&Value::Bool(true)));

        let encoded = encode(&value).unwrap();
        let reparsed = decode(&encoded).unwrap();
        assert_eq!(reparsed, value);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(decode(b"{a: }").is_err());
        assert!(decode(b"[1, 2").is_err());
        assert!(decode(b"+").is_err());
    }

    fn parse(input: &str) -> Value {
        match decode(input.as_bytes()) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse {input:?}: {err}"),
        }
    }

    #[test]
    fn concrete_scenario_mixed_object() {
        let v = parse("{foo:'bar',while:true,hex:0xDEADbeef,half:.5,delta:+10,to:-NaN,oh:[1,2,3,],}");
        let o = v.as_object().unwrap();
        assert_eq!(o.len(), 7);
        assert_eq!(o.get(b"foo"), Some(&Value::String(b"bar".to_vec())));
        assert_eq!(o.get(b"while"), Some(&Value::Bool(true)));
        assert_eq!(o.get(b"hex"), Some(&Value::Int(3_735_928_559)));
        assert_eq!(o.get(b"half"), Some(&Value::Float(0.5)));
        assert_eq!(o.get(b"delta"), Some(&Value::Int(10)));
        assert_eq!(o.get(b"to"), Some(&Value::NaN));
        assert_eq!(o.get(b"oh").unwrap().as_array().unwrap().len(), 3);
    }

    #[test]
    fn concrete_scenario_nested_array_with_negative_hex() {
        let v = parse("[5,[5,-0xEF,{a:4}]]");
        let outer = v.as_array().unwrap();
        assert_eq!(outer.get(0), Some(&Value::Int(5)));
        let inner = outer.get(1).unwrap().as_array().unwrap();
        assert_eq!(inner.get(0), Some(&Value::Int(5)));
        assert_eq!(inner.get(1), Some(&Value::Int(-239)));
        let obj = inner.get(2).unwrap().as_object().unwrap();
        assert_eq!(obj.get(b"a"), Some(&Value::Int(4)));
    }

    #[test]
    fn concrete_scenario_unicode_escapes() {
        assert_eq!(parse("'\\u0041\\u0042'"), Value::String(b"AB".to_vec()));
        assert_eq!(
            parse("'\\uD83D\\uDE00'"),
            Value::String("😀".as_bytes().to_vec())
        );
    }

    #[test]
    fn concrete_scenario_comments_around_a_scalar() {
        assert_eq!(parse("/* block */ 1 // trail\n"), Value::Int(1));
    }

    #[test]
    fn duplicate_key_without_replace_errors_on_second_insert() {
        let mut obj = Object::new();
        assert!(obj.set(b"a", false).unwrap().is_some());
        assert!(obj.set(b"a", false).unwrap().is_none());
        assert_eq!(obj.len(), 1);
    }

    #[test]
    fn duplicate_key_with_replace_keeps_last_value() {
        let mut obj = Object::new();
        obj.set(b"a", true).unwrap().unwrap().set_int(1);
        obj.set(b"a", true).unwrap().unwrap().set_int(2);
        assert_eq!(obj.get(b"a"), Some(&Value::Int(2)));
        assert_eq!(obj.len(), 1);
    }

    #[test]
    fn byte_at_a_time_feed_matches_whole_input_decode() {
        let input = br#"{a: [1, 2, "three"], b: null}"#;
        let whole = decode(input).unwrap();

        let mut tokenizer = Tokenizer::new();
        let mut parser = Parser::new();
        for byte in input {
            tokenizer
                .feed(std::slice::from_ref(byte), &mut |t| parser.accept_token(t))
                .unwrap();
        }
        tokenizer.finish(&mut |t| parser.accept_token(t)).unwrap();
        let piecewise = parser.finish().unwrap();

        assert_eq!(whole, piecewise);
    }

    #[test]
    fn chunk_split_mid_surrogate_pair_escape_still_decodes() {
        let input = br#"'😀'"#;
        let mid = 3; // splits inside the emoji's 4-byte UTF-8 encoding
        let (first, second) = input.split_at(mid);

        let mut tokenizer = Tokenizer::new();
        let mut parser = Parser::new();
        tokenizer.feed(first, &mut |t| parser.accept_token(t)).unwrap();
        tokenizer.feed(second, &mut |t| parser.accept_token(t)).unwrap();
        tokenizer.finish(&mut |t| parser.accept_token(t)).unwrap();
        let v = parser.finish().unwrap();

        assert_eq!(v, Value::String("😀".as_bytes().to_vec()));
    }

    #[test]
    fn no_escape_roundtrips_non_ascii_as_utf8() {
        let v = decode("'héllo wörld'".as_bytes()).unwrap();
        let bytes = encode_with(&v, &WriteOptions { no_escape: true }).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "\"héllo wörld\"");
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn overflowing_integer_literal_promotes_to_float() {
        let v = parse("99999999999999999999");
        match v {
            Value::Float(f) => assert!((f - 1e20).abs() / 1e20 < 1e-9),
            other => panic!("expected float, got {other:?}"),
        }
    }
}

//! `crypto` module: digests, base64, and random bytes.

use base64::Engine;
use md5::Digest as _;

use crate::interp::Interpreter;
use crate::signal::Exec;
use crate::support::{arg_error, check_arity, int_arg, text_arg};
use crate::value::{Value, ValueMap};

pub(crate) fn module() -> ValueMap {
    super::functions(&[
        ("md5", crypto_md5),
        ("sha1", crypto_sha1),
        ("sha256", crypto_sha256),
        ("sha512", crypto_sha512),
        ("hash", crypto_sha256),
        ("base64Encode", crypto_base64_encode),
        ("base64Decode", crypto_base64_decode),
        ("randomHex", crypto_random_hex),
    ])
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn crypto_md5(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("md5", &args, 1, Some(1))?;
    let text = text_arg("md5", &args, 0)?;
    Ok(Value::text(hex(&md5::Md5::digest(text.as_bytes()))))
}

fn crypto_sha1(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sha1", &args, 1, Some(1))?;
    let text = text_arg("sha1", &args, 0)?;
    Ok(Value::text(hex(&sha1::Sha1::digest(text.as_bytes()))))
}

fn crypto_sha256(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sha256", &args, 1, Some(1))?;
    let text = text_arg("sha256", &args, 0)?;
    Ok(Value::text(hex(&sha2::Sha256::digest(text.as_bytes()))))
}

fn crypto_sha512(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("sha512", &args, 1, Some(1))?;
    let text = text_arg("sha512", &args, 0)?;
    Ok(Value::text(hex(&sha2::Sha512::digest(text.as_bytes()))))
}

fn crypto_base64_encode(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("base64Encode", &args, 1, Some(1))?;
    let text = text_arg("base64Encode", &args, 0)?;
    Ok(Value::text(
        base64::engine::general_purpose::STANDARD.encode(text.as_bytes()),
    ))
}

fn crypto_base64_decode(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("base64Decode", &args, 1, Some(1))?;
    let text = text_arg("base64Decode", &args, 0)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(text.as_bytes())
        .map_err(|e| arg_error(format!("base64Decode() failed: {e}")))?;
    String::from_utf8(bytes)
        .map(Value::text)
        .map_err(|_| arg_error("base64Decode() produced non-text bytes"))
}

fn crypto_random_hex(_: &mut Interpreter, _: Option<&Value>, args: Vec<Value>) -> Exec<Value> {
    check_arity("randomHex", &args, 1, Some(1))?;
    let count = int_arg("randomHex", &args, 0)?;
    if count < 0 {
        return Err(arg_error("randomHex() expects a non-negative count"));
    }
    let bytes: Vec<u8> = (0..count).map(|_| rand::random::<u8>()).collect();
    Ok(Value::text(hex(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Interpreter;

    #[test]
    fn digests_match_known_vectors() {
        let mut interp = Interpreter::new();
        let out = crypto_sha256(&mut interp, None, vec![Value::text("abc")]).unwrap();
        assert_eq!(
            out.to_text(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let out = crypto_md5(&mut interp, None, vec![Value::text("abc")]).unwrap();
        assert_eq!(out.to_text(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn base64_round_trip() {
        let mut interp = Interpreter::new();
        let encoded =
            crypto_base64_encode(&mut interp, None, vec![Value::text("rill")]).unwrap();
        assert_eq!(encoded.to_text(), "cmlsbA==");
        let decoded = crypto_base64_decode(&mut interp, None, vec![encoded]).unwrap();
        assert_eq!(decoded.to_text(), "rill");
    }
}

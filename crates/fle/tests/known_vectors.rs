//! Decryption of envelopes produced by other client implementations.

mod support;

use std::sync::Arc;

use fle::{CryptoManager, CryptoProvider, ErrorKind, JsonCryptoTranscoder};
use serde::Deserialize;
use serde_json::{json, Value};

use support::{aes_store, AES_256_KEY};

fn envelope(iv: &str, ciphertext: &str, sig: &str) -> Value {
    json!({
        "alg": "AES-256-HMAC-SHA256",
        "kid": "mypublickey",
        "iv": iv,
        "ciphertext": ciphertext,
        "sig": sig,
    })
}

fn stored_document() -> Vec<u8> {
    let doc = json!({
        "__crypt_myString": envelope(
            "Cfq84/46Qjet3EEQ1HUwSg==",
            "sR6AFEIGWS5Fy9QObNOhbCgfg3vXH4NHVRK1qkhKLQqjkByg2n69lot89qFEJuBsVNTXR77PZR6RjN4h4M9evg==",
            "rT89aCj1WosYjWHHu0mf92S195vYnEGA/reDnYelQsM=",
        ),
        "__crypt_myInt": envelope(
            "wAg/Z+c81em+to/rR9T3PA==",
            "bvfUk9qkfCYKS2S5CCJPpg==",
            "LAcwxznVSED4zQbuy+UjacQlvtVYvpVmiiAU5gJJASc=",
        ),
        "__crypt_myNumString": envelope(
            "jdqfaa9Hjpd5rTi2BaEWWg==",
            "r6rK6mO0KQ1p9ws/8Feqyg==",
            "NdvUTdR6XhRZQnQBWVzZjv9MxNIbzmwslQqP6onNdVk=",
        ),
        "__crypt_myList": envelope(
            "A4OSMlz95cvn6ZDypm58jA==",
            "9aTRYMmbNf6tvVFpbedSsS5Hdhk/OjUIz2mEqp5L5EcVNGoKJBhnuaAu35fNVM2YW/7TscXdiUBaeZZv7Zxg1Zve+A1u1/7dmgbkvAilNSo=",
            "PQ25q0k271CpZ9quOg2m3oAIZVa6Mh9S0mo15nN/hlk=",
        ),
        "__crypt_myObject": envelope(
            "kKz59c/ObctWVBVen7VqHw==",
            "LIoZ3qPbEAmNbUUsJeRngN2tDo8/gU1AQ+yY88sgcdACMz/DjD8+kAzbZHYiWswGSlDaEHXs9c2hIYiD2/AkX/qfaGcAZLt4rjZpbzuNf+Q=",
            "inEyX1OYv2VbO60o16zId8eacwE8E1KrKcfgQVlz4kA=",
        ),
        "plain": "visible",
    });
    serde_json::to_vec(&doc).unwrap()
}

fn transcoder(signed: bool) -> JsonCryptoTranscoder {
    let manager = CryptoManager::new();
    manager
        .register_provider(
            "myprovider",
            Arc::new(CryptoProvider::aes256(aes_store(AES_256_KEY, signed))),
        )
        .unwrap();
    JsonCryptoTranscoder::new(manager)
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct MyObject {
    my_value: String,
    my_int: i64,
}

#[test]
fn decrypts_each_vector_to_its_exact_type() {
    let doc = transcoder(true)
        .decode("vectors", &stored_document(), 0, 0, 0)
        .unwrap();
    let content = doc.content();

    assert_eq!(
        content.get_and_decrypt("myString", "myprovider").unwrap(),
        json!("The old grey goose jumped over the wrickety gate.")
    );

    let int = content.get_and_decrypt("myInt", "myprovider").unwrap();
    assert_eq!(int, json!(10));
    assert!(int.is_i64());

    let num_string = content.get_and_decrypt("myNumString", "myprovider").unwrap();
    assert_eq!(num_string, json!("10"));

    let list: Vec<String> = content.get_and_decrypt_as("myList", "myprovider").unwrap();
    assert_eq!(
        list,
        ["The", "Old", "Grey", "Goose", "Jumped", "over", "the", "wrickety", "gate"]
    );

    let object: MyObject = content.get_and_decrypt_as("myObject", "myprovider").unwrap();
    assert_eq!(
        object,
        MyObject {
            my_value: "The old grey goose jumped over the wrickety gate.".into(),
            my_int: 10,
        }
    );
}

#[test]
fn decrypts_whole_document() {
    let doc = transcoder(true)
        .decode("vectors", &stored_document(), 0, 0, 0)
        .unwrap();
    let restored: Value =
        serde_json::from_str(&doc.content().to_decrypted_string("myprovider").unwrap()).unwrap();

    assert_eq!(restored["plain"], "visible");
    assert_eq!(restored["myInt"], json!(10));
    assert_eq!(restored["myNumString"], json!("10"));
    assert_eq!(restored["myObject"]["myInt"], json!(10));
    assert!(restored.as_object().unwrap().keys().all(|k| !k.starts_with("__crypt_")));
}

#[test]
fn signed_vectors_need_a_signing_key() {
    let doc = transcoder(false)
        .decode("vectors", &stored_document(), 0, 0, 0)
        .unwrap();
    let err = doc
        .content()
        .get_and_decrypt("myInt", "myprovider")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingSigningKey);
}

#[test]
fn wrong_hmac_key_fails_verification() {
    let mut store = fle::KeyStore::new();
    store.store_key("mypublickey", AES_256_KEY);
    store.set_public_key_name("mypublickey");
    store.store_key("HMACsecret", b"not-the-password");
    store.set_signing_key_name("HMACsecret");

    let manager = CryptoManager::new();
    manager
        .register_provider("myprovider", Arc::new(CryptoProvider::aes256(Arc::new(store))))
        .unwrap();
    let doc = JsonCryptoTranscoder::new(manager)
        .decode("vectors", &stored_document(), 0, 0, 0)
        .unwrap();

    let err = doc
        .content()
        .get_and_decrypt("myString", "myprovider")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureVerification);
    assert!(err.to_string().contains("myString"));
}

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::json;
use wick_model::{decode_claims, ClaimsError};

fn claims_json() -> serde_json::Value {
    json!({
        "jti": "abc",
        "iat": 1700000000u64,
        "iss": "issuer",
        "sub": "subject",
        "wascap": {
            "hash": "deadbeef",
            "tags": [],
            "interface": {
                "name": "baseline",
                "format": 1,
                "metadata": { "version": "0.1.0" },
                "operations": [{
                    "name": "add",
                    "config": [],
                    "inputs": [
                        { "name": "left", "type": "u64", "required": true },
                        { "name": "right", "type": "u64", "required": true }
                    ],
                    "outputs": [
                        { "name": "output", "type": "u64", "required": true }
                    ]
                }]
            }
        }
    })
}

fn token(encode: impl Fn(&[u8]) -> String) -> Vec<u8> {
    let header = encode(br#"{"typ":"jwt","alg":"Ed25519"}"#);
    let body = encode(claims_json().to_string().as_bytes());
    format!("{header}.{body}.c2lnbmF0dXJl").into_bytes()
}

#[test]
fn decodes_url_safe_token() {
    let claims = decode_claims(&token(|b| URL_SAFE_NO_PAD.encode(b))).unwrap();
    let sig = claims.wascap.interface;
    assert_eq!(sig.name, "baseline");
    assert_eq!(sig.format, 1);
    assert_eq!(sig.metadata.version, "0.1.0");

    let add = sig.operation("add").unwrap();
    assert!(add.input("left").unwrap().required);
    assert_eq!(add.output("output").unwrap().ty, json!("u64"));
}

#[test]
fn decodes_padded_standard_token() {
    let claims = decode_claims(&token(|b| STANDARD.encode(b))).unwrap();
    assert_eq!(claims.iss, "issuer");
    assert_eq!(claims.wascap.interface.operations.len(), 1);
}

#[test]
fn single_segment_is_rejected_as_no_claims() {
    let err = decode_claims(b"eyJ0eXAiOiJqd3QifQ").unwrap_err();
    assert!(matches!(err, ClaimsError::NoClaims));
    assert_eq!(err.to_string(), "invalid module, no claims found");
}

#[test]
fn bad_payloads_surface_distinct_errors() {
    assert!(matches!(
        decode_claims(b"header.!!!").unwrap_err(),
        ClaimsError::Base64(_)
    ));

    let not_json = format!("h.{}", URL_SAFE_NO_PAD.encode("not json"));
    assert!(matches!(
        decode_claims(not_json.as_bytes()).unwrap_err(),
        ClaimsError::Json(_)
    ));

    assert!(matches!(
        decode_claims(&[0xff, 0xfe]).unwrap_err(),
        ClaimsError::Utf8(_)
    ));
}

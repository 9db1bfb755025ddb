#![expect(missing_docs)]
#![expect(clippy::unwrap_used)]

use ::{lz4_flex as _, schemars as _, thiserror as _};

use jdata::ByteCodec;
use jdata_lz4::Lz4Codec;
use serde::Deserialize;
use serde_json::json;

#[test]
fn empty_config() {
    let codec = Lz4Codec::deserialize(json!({})).unwrap();

    assert!(!codec.content_checksum);
}

#[test]
fn content_checksum() {
    let codec = Lz4Codec::deserialize(json!({
        "content_checksum": true,
    }))
    .unwrap();

    assert!(codec.content_checksum);

    let data = vec![7_u8; 1024];
    let encoded = codec.encode(&data).unwrap();
    assert_eq!(codec.decode(&encoded).unwrap(), data);
}

#[test]
#[should_panic(expected = "unknown field `level`")]
fn unknown_field() {
    let _ = Lz4Codec::deserialize(json!({
        "level": 9,
    }))
    .unwrap();
}

use lesion_asset::{AssetData, AssetError, AssetKind, MAGIC, VERSION};
use lesion_core::prelude::ModelSpec;

fn header(kind: u8, metadata: &[u8]) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&[VERSION, kind, 0, 0]);
    out.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
    out.extend_from_slice(metadata);
    out
}

fn format_err(res: Result<AssetData, AssetError>) -> String {
    match res {
        Err(AssetError::Format(msg)) => msg,
        other => panic!("expected a format error, got {:?}", other),
    }
}

#[test]
fn serialized_asset_reads_back() {
    let labels = vec!["nevus".to_owned(), "melanoma".to_owned()];
    let asset = AssetData::new(AssetKind::Nnef, ModelSpec::resized(labels), vec![7u8; 33]);

    let bytes = asset.serialize().unwrap();
    assert_eq!(&bytes[..4], b"LSNA");

    let back = AssetData::deserialize(bytes.as_slice()).unwrap();
    assert_eq!(back.kind(), AssetKind::Nnef);
    assert_eq!(back.spec(), asset.spec());
    assert_eq!(back.data(), asset.data());
}

#[test]
fn zero_bytes_is_not_an_asset() {
    let msg = format_err(AssetData::deserialize(&[][..]));
    assert!(msg.contains("magic"), "{}", msg);
}

#[test]
fn wrong_magic() {
    let mut bytes = header(1, b"{}");
    bytes[0] = b'X';
    let msg = format_err(AssetData::deserialize(bytes.as_slice()));
    assert!(msg.contains("unexpected magic"), "{}", msg);
}

#[test]
fn unknown_kind() {
    let bytes = header(9, b"{}");
    let msg = format_err(AssetData::deserialize(bytes.as_slice()));
    assert!(msg.contains("asset kind"), "{}", msg);
}

#[test]
fn truncated_metadata() {
    let mut bytes = header(1, b"{\"name\": \"x\"}");
    bytes.truncate(bytes.len() - 4);
    let msg = format_err(AssetData::deserialize(bytes.as_slice()));
    assert!(msg.contains("truncated"), "{}", msg);
}

#[test]
fn invalid_metadata() {
    let bytes = header(1, b"not json");
    let res = AssetData::deserialize(bytes.as_slice());
    assert!(matches!(res, Err(AssetError::Metadata(_))), "{:?}", res);
}

#[test]
fn garbage_network_fails_to_load() {
    let asset = AssetData::new(AssetKind::Onnx, ModelSpec::patch_vit(), b"garbage".to_vec());
    let res = asset.load_classifier();
    assert!(matches!(res, Err(AssetError::Model(_))), "{:?}", res);
}

#[test]
fn inconsistent_spec_fails_before_the_network() {
    let mut spec = ModelSpec::patch_vit();
    spec.labels.clear();

    let asset = AssetData::new(AssetKind::Onnx, spec, b"garbage".to_vec());
    let res = asset.load_classifier();
    assert!(matches!(res, Err(AssetError::Spec(_))), "{:?}", res);
}

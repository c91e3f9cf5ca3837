//! Tests for the codec registry and built-in codecs.

use super::*;
use serde_json::json;

fn round_trip(codec: &dyn Codec, value: &Value) -> Value {
    let mut buf = Vec::new();
    codec.encode(value, &mut buf).unwrap();
    codec.decode(&mut buf.as_slice()).unwrap()
}

fn representative_values() -> Vec<Value> {
    vec![
        json!({}),
        json!({"name": "svc", "limits": {"cpu": 2, "mem": "1Gi"}, "tags": ["a", "b"]}),
        json!([1, "two", 3.5, false]),
        json!(42),
        json!("plain scalar"),
    ]
}

#[test]
fn test_json_round_trip() {
    for value in representative_values() {
        assert_eq!(round_trip(&JsonCodec, &value), value);
    }
    assert_eq!(round_trip(&JsonCodec, &Value::Null), Value::Null);
}

#[test]
fn test_json_uses_four_space_indent() {
    let mut buf = Vec::new();
    JsonCodec.encode(&json!({"a": 1}), &mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "{\n    \"a\": 1\n}");
}

#[test]
fn test_yaml_round_trip() {
    for value in representative_values() {
        assert_eq!(round_trip(&YamlCodec, &value), value);
    }
}

#[test]
fn test_yaml_empty_document_is_null() {
    let decoded = YamlCodec.decode(&mut "  \n".as_bytes()).unwrap();
    assert_eq!(decoded, Value::Null);
}

#[test]
fn test_toml_round_trip_tables() {
    let values = [
        json!({}),
        json!({"key": "value", "list": [1, 2, 3], "server": {"port": 8080}}),
    ];
    for value in values {
        assert_eq!(round_trip(&TomlCodec, &value), value);
    }
}

#[test]
fn test_toml_rejects_non_table_top_level() {
    let mut buf = Vec::new();
    assert!(TomlCodec.encode(&json!([1, 2]), &mut buf).is_err());
    assert!(TomlCodec.encode(&json!("scalar"), &mut buf).is_err());
}

#[test]
fn test_toml_rejects_null() {
    let mut buf = Vec::new();
    assert!(TomlCodec.encode(&json!({"missing": null}), &mut buf).is_err());
}

#[test]
fn test_text_round_trip_and_non_string_rendering() {
    let text = json!("Hola texto plano\nsecond line");
    assert_eq!(round_trip(&TextCodec, &text), text);

    let mut buf = Vec::new();
    TextCodec.encode(&json!({"a": 1}), &mut buf).unwrap();
    assert_eq!(buf, b"{\"a\":1}");
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(JsonCodec.decode(&mut "{not json".as_bytes()).is_err());
    assert!(TomlCodec.decode(&mut "= = =".as_bytes()).is_err());
    assert!(YamlCodec.decode(&mut "key: [unclosed".as_bytes()).is_err());
}

#[test]
fn test_normalize_extension() {
    assert_eq!(normalize_extension("json"), ".json");
    assert_eq!(normalize_extension(".JSON"), ".json");
    assert_eq!(normalize_extension("Yml"), ".yml");
}

#[test]
fn test_registry_lookup_is_case_insensitive() {
    let registry = CodecRegistry::with_defaults();
    assert!(registry.get("YAML").is_ok());
    assert!(registry.get(".Json").is_ok());
    assert!(registry.get("toml").is_ok());
}

#[test]
fn test_registry_defaults_are_sorted() {
    let registry = CodecRegistry::with_defaults();
    assert_eq!(
        registry.extensions(),
        vec![".json", ".toml", ".txt", ".yaml", ".yml"]
    );
}

#[test]
fn test_registry_unknown_extension() {
    let registry = CodecRegistry::with_defaults();
    let err = registry.get("noext").err().unwrap();
    assert!(matches!(
        err,
        AtomfileError::UnsupportedFormat { ref extension } if extension == ".noext"
    ));
}

#[test]
fn test_registry_later_registration_overrides() {
    let mut registry = CodecRegistry::new();
    registry.insert("dat", Arc::new(JsonCodec));
    registry.insert(".DAT", Arc::new(TextCodec));

    let codec = registry.get(".dat").unwrap();
    // The text codec keeps input verbatim, unlike JSON which would reject it.
    let decoded = codec.decode(&mut "not json".as_bytes()).unwrap();
    assert_eq!(decoded, json!("not json"));
    assert_eq!(registry.extensions(), vec![".dat"]);
}

#[test]
fn test_register_fn_in_global_registry() {
    register_fn(
        ".dum",
        |_reader: &mut dyn Read| Ok(json!("loaded")),
        |_value: &Value, writer: &mut dyn Write| {
            writer.write_all(b"dumped")?;
            Ok(())
        },
    );

    assert!(supported_formats().contains(&".dum".to_string()));

    let codec = lookup("DUM").unwrap();
    assert_eq!(codec.decode(&mut "data".as_bytes()).unwrap(), json!("loaded"));

    let mut buf = Vec::new();
    codec.encode(&json!(null), &mut buf).unwrap();
    assert_eq!(buf, b"dumped");
}

#[test]
fn test_codec_for_path_uses_extension() {
    assert!(codec_for_path(Path::new("/tmp/config.YAML")).is_ok());
    let err = codec_for_path(Path::new("/tmp/file.unsupported")).err().unwrap();
    assert!(matches!(err, AtomfileError::UnsupportedFormat { .. }));
    let err = codec_for_path(Path::new("/tmp/Makefile")).err().unwrap();
    assert!(matches!(err, AtomfileError::UnsupportedFormat { .. }));
}

//! Built-in codecs: JSON, YAML, TOML, and plain text.

use super::{Codec, Value};
use crate::error::BoxError;
use serde::Serialize;
use std::io::{Read, Write};

type CodecResult<T> = std::result::Result<T, BoxError>;

/// JSON, pretty-printed with four-space indentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, reader: &mut dyn Read) -> CodecResult<Value> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn encode(&self, value: &Value, writer: &mut dyn Write) -> CodecResult<()> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        value.serialize(&mut serializer)?;
        Ok(())
    }
}

/// YAML via serde_yaml. An empty document decodes to `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn decode(&self, reader: &mut dyn Read) -> CodecResult<Value> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        if raw.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_yaml::from_str(&raw)?)
    }

    fn encode(&self, value: &Value, writer: &mut dyn Write) -> CodecResult<()> {
        serde_yaml::to_writer(writer, value)?;
        Ok(())
    }
}

/// TOML. Only tables can be encoded at the top level, and `null` has no
/// TOML representation anywhere in the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl Codec for TomlCodec {
    fn decode(&self, reader: &mut dyn Read) -> CodecResult<Value> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Ok(toml::from_str(&raw)?)
    }

    fn encode(&self, value: &Value, writer: &mut dyn Write) -> CodecResult<()> {
        if !value.is_object() {
            return Err("TOML documents must be tables at the top level".into());
        }
        let raw = toml::to_string(value)?;
        writer.write_all(raw.as_bytes())?;
        Ok(())
    }
}

/// Plain UTF-8 text. Strings are written verbatim; any other value is
/// written as its compact JSON rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl Codec for TextCodec {
    fn decode(&self, reader: &mut dyn Read) -> CodecResult<Value> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        Ok(Value::String(raw))
    }

    fn encode(&self, value: &Value, writer: &mut dyn Write) -> CodecResult<()> {
        match value {
            Value::String(text) => writer.write_all(text.as_bytes())?,
            other => writer.write_all(other.to_string().as_bytes())?,
        }
        Ok(())
    }
}

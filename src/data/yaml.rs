//! YAML rendering.
//!
//! Output goes through the yaml-rust emitter so documents get a `---`
//! header and mapping keys keep their declaration order.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use yaml_rust_davvid::yaml::Hash;
use yaml_rust_davvid::{Yaml, YamlEmitter};

/// Renders `data` as a YAML document.
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String> {
    let value = serde_yaml::to_value(data).context("Failed to serialize to YAML value")?;
    let document = to_document(value);

    let mut output = String::new();
    YamlEmitter::new(&mut output)
        .dump(&document)
        .context("Failed to emit YAML")?;
    output.push('\n');

    Ok(output)
}

/// Parses a YAML document.
pub fn from_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T> {
    serde_yaml::from_str(yaml).context("Failed to deserialize YAML")
}

fn to_document(value: serde_yaml::Value) -> Yaml {
    use serde_yaml::Value;

    match value {
        Value::Null => Yaml::Null,
        Value::Bool(flag) => Yaml::Boolean(flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => Yaml::Integer(int),
            None => Yaml::Real(number.to_string()),
        },
        Value::String(text) => Yaml::String(text),
        Value::Sequence(items) => Yaml::Array(items.into_iter().map(to_document).collect()),
        Value::Mapping(entries) => Yaml::Hash(
            entries
                .into_iter()
                .map(|(key, value)| (to_document(key), to_document(value)))
                .collect::<Hash>(),
        ),
        // Tags carry no meaning in rendered results
        Value::Tagged(tagged) => to_document(tagged.value),
    }
}

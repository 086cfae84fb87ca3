use serde::de::DeserializeOwned;

/// Deserialize a unit file, naming the JSON path of the first bad node.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    with_path(&mut serde_json::Deserializer::from_str(src))
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, String> {
    with_path(&mut serde_json::Deserializer::from_slice(bytes))
}

fn with_path<'de, R, T>(de: &mut serde_json::Deserializer<R>) -> Result<T, String>
where
    R: serde_json::de::Read<'de>,
    T: DeserializeOwned,
{
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at {path} → {}", err.into_inner())
    })
}

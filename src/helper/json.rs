use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

/// Parses any deserializable type straight from a JSON string.
pub trait FromJsonString: Sized {
    fn from_json_string(json_str: &str) -> Result<Self, serde_json::Error>;
}

impl<T> FromJsonString for T
where
    T: serde::de::DeserializeOwned,
{
    fn from_json_string(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }
}

/// Writes `value` as pretty JSON followed by a newline.
pub fn write_json_pretty<T: Serialize>(value: &T, path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}

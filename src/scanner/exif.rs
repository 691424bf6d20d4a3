use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// EXIF の ImageDescription（撮影時・編集時に付けた説明文）
pub fn extract_description(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif_reader = exif::Reader::new();
    let exif = exif_reader.read_from_container(&mut bufreader)?;

    if let Some(field) = exif.get_field(exif::Tag::ImageDescription, exif::In::PRIMARY) {
        if let exif::Value::Ascii(ref parts) = field.value {
            let text = parts
                .iter()
                .map(|p| String::from_utf8_lossy(p).trim().to_string())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }

    Err("No ImageDescription in EXIF".into())
}

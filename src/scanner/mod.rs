//! 商品写真フォルダのスキャン
//!
//! 1フォルダ = 1商品として扱い、写真のファイル名・同名の .txt メモ・
//! EXIF ImageDescription を集めて `ItemInput` を組み立てる。
//! 画素は読まない。

mod exif;

use crate::error::{GarmentAiError, Result};
use garment_ai_common::{ItemInput, PhotoInfo};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
    /// 同名 .txt と EXIF 説明文を連結したもの
    pub text: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];
const NOTE_EXTENSIONS: &[&str] = &["txt", "TXT"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| extensions.iter().any(|&e| e == ext.to_string_lossy()))
        .unwrap_or(false)
}

fn read_note(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.exists() {
        return Err(GarmentAiError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || !has_extension(path, IMAGE_EXTENSIONS) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut parts = Vec::new();
        if let Some(note) = read_note(&path.with_extension("txt")) {
            parts.push(note);
        }
        match exif::extract_description(path) {
            Ok(description) => parts.push(description),
            Err(e) => debug!(file = %file_name, error = %e, "EXIF説明文なし"),
        }

        images.push(ImageInfo {
            path: path.to_path_buf(),
            file_name,
            text: parts.join(" "),
        });
    }

    // ファイル名でソート（最後の写真はラベル判定で特別扱いされる）
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// 写真に対応しない .txt（notes.txt など）を商品メモとして読む
fn scan_item_notes(folder: &Path, images: &[ImageInfo]) -> Vec<String> {
    let mut notes: Vec<(String, String)> = WalkDir::new(folder)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && has_extension(e.path(), NOTE_EXTENSIONS))
        .filter(|e| {
            !images
                .iter()
                .any(|img| img.path.with_extension("txt") == e.path())
        })
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            read_note(e.path()).map(|text| (name, text))
        })
        .collect();
    notes.sort();
    notes.into_iter().map(|(_, text)| text).collect()
}

/// フォルダを1商品の入力に変換する
pub fn scan_item(folder: &Path) -> Result<ItemInput> {
    let images = scan_folder(folder)?;
    if images.is_empty() {
        return Err(GarmentAiError::NoImagesFound(folder.display().to_string()));
    }

    let notes = scan_item_notes(folder, &images);
    let folder_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default();

    let mut text_parts = vec![folder_name];
    text_parts.extend(notes);

    let photos = images
        .into_iter()
        .map(|img| PhotoInfo {
            file_name: img.file_name,
            text: img.text,
        })
        .collect();

    Ok(ItemInput {
        text: text_parts.join(" ").trim().to_string(),
        photos,
        ..Default::default()
    })
}

//! Field rules for the post form.
//!
//! Two rule sets exist: creating a post requires every field including the
//! featured image, updating makes the image optional. Messages follow the
//! "The {field} field ..." wording the form view shows inline.

use std::collections::BTreeMap;

use bytes::Bytes;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

pub const TITLE: &str = "title";
pub const CONTENT: &str = "content";
pub const FEATURED_IMAGE: &str = "featured_image";

const TITLE_MAX_CHARS: usize = 255;

/// Per-field error messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages for one field, empty when the field passed.
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// A file as it arrived in the form submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    /// Total bytes received. May exceed `bytes.len()` when the upload was cut
    /// off at the size limit.
    pub size: usize,
    pub bytes: Bytes,
}

/// Raw post form submission, before any rule ran.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub featured_image: Option<UploadedFile>,
}

/// Which rules apply to a submission.
#[derive(Debug, Clone, Copy)]
pub struct PostRules {
    pub image_required: bool,
    pub max_image_bytes: usize,
}

impl PostRules {
    pub fn for_create(max_image_bytes: usize) -> Self {
        Self {
            image_required: true,
            max_image_bytes,
        }
    }

    pub fn for_update(max_image_bytes: usize) -> Self {
        Self {
            image_required: false,
            max_image_bytes,
        }
    }
}

/// Image formats accepted as featured images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
        }
    }
}

/// An upload that passed the image rules.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub kind: ImageKind,
    pub bytes: Bytes,
}

/// A submission that passed every rule.
#[derive(Debug, Clone)]
pub struct ValidPost {
    pub title: String,
    pub content: String,
    pub featured_image: Option<ImageFile>,
}

impl PostInput {
    /// Run the rule set, trimming text fields on the way.
    pub fn validate(self, rules: &PostRules) -> Result<ValidPost, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = required_text(&mut errors, TITLE, self.title);
        if title.chars().count() > TITLE_MAX_CHARS {
            errors.add(
                TITLE,
                format!(
                    "The title field must not be greater than {TITLE_MAX_CHARS} characters."
                ),
            );
        }

        let content = required_text(&mut errors, CONTENT, self.content);

        // Browsers send an empty part when no file was chosen.
        let upload = self.featured_image.filter(|file| file.size > 0);
        let featured_image = match upload {
            Some(file) => check_image(&mut errors, file, rules.max_image_bytes),
            None => {
                if rules.image_required {
                    errors.add(FEATURED_IMAGE, required_message(FEATURED_IMAGE));
                }
                None
            }
        };

        errors.into_result(ValidPost {
            title,
            content,
            featured_image,
        })
    }
}

fn required_text(errors: &mut FieldErrors, field: &str, value: Option<String>) -> String {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, required_message(field));
    }
    value
}

fn check_image(errors: &mut FieldErrors, file: UploadedFile, max_bytes: usize) -> Option<ImageFile> {
    if file.size > max_bytes {
        errors.add(
            FEATURED_IMAGE,
            format!(
                "The {} field must not be greater than {} kilobytes.",
                display_name(FEATURED_IMAGE),
                max_bytes / 1024
            ),
        );
        return None;
    }

    let kind = match image::guess_format(&file.bytes) {
        Ok(ImageFormat::Png) => ImageKind::Png,
        Ok(ImageFormat::Jpeg) => ImageKind::Jpeg,
        Ok(_) => {
            errors.add(
                FEATURED_IMAGE,
                format!(
                    "The {} field must be a file of type: jpg, jpeg, png.",
                    display_name(FEATURED_IMAGE)
                ),
            );
            return None;
        }
        Err(_) => {
            errors.add(
                FEATURED_IMAGE,
                format!("The {} field must be an image.", display_name(FEATURED_IMAGE)),
            );
            return None;
        }
    };

    Some(ImageFile {
        kind,
        bytes: file.bytes,
    })
}

pub fn required_message(field: &str) -> String {
    format!("The {} field is required.", display_name(field))
}

fn display_name(field: &str) -> String {
    field.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = b"\xff\xd8\xff\xe0\0\x10JFIF\0";
    const GIF: &[u8] = b"GIF89a\x01\0\x01\0";

    fn upload(bytes: &'static [u8], name: &str) -> UploadedFile {
        UploadedFile {
            file_name: Some(name.to_string()),
            content_type: None,
            size: bytes.len(),
            bytes: Bytes::from_static(bytes),
        }
    }

    fn input(title: &str, content: &str, image: Option<UploadedFile>) -> PostInput {
        PostInput {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            featured_image: image,
        }
    }

    #[test]
    fn test_create_requires_every_field() {
        let errors = PostInput::default()
            .validate(&PostRules::for_create(1024))
            .unwrap_err();

        assert_eq!(errors.get(TITLE), ["The title field is required."]);
        assert_eq!(errors.get(CONTENT), ["The content field is required."]);
        assert_eq!(
            errors.get(FEATURED_IMAGE),
            ["The featured image field is required."]
        );
    }

    #[test]
    fn test_whitespace_only_text_is_missing() {
        let errors = input("   ", "\n\t", Some(upload(PNG, "a.png")))
            .validate(&PostRules::for_create(1024))
            .unwrap_err();

        assert!(errors.has(TITLE));
        assert!(errors.has(CONTENT));
        assert!(!errors.has(FEATURED_IMAGE));
    }

    #[test]
    fn test_update_allows_missing_image() {
        let valid = input(" Title ", "Body", None)
            .validate(&PostRules::for_update(1024))
            .unwrap();

        assert_eq!(valid.title, "Title");
        assert!(valid.featured_image.is_none());
    }

    #[test]
    fn test_empty_file_part_counts_as_absent() {
        let empty = UploadedFile {
            file_name: Some(String::new()),
            content_type: Some("application/octet-stream".to_string()),
            size: 0,
            bytes: Bytes::new(),
        };

        let errors = input("T", "C", Some(empty))
            .validate(&PostRules::for_create(1024))
            .unwrap_err();
        assert_eq!(
            errors.get(FEATURED_IMAGE),
            ["The featured image field is required."]
        );
    }

    #[test]
    fn test_image_format_is_sniffed() {
        let png = input("T", "C", Some(upload(PNG, "photo.jpg")))
            .validate(&PostRules::for_create(1024))
            .unwrap();
        assert_eq!(png.featured_image.unwrap().kind, ImageKind::Png);

        let jpeg = input("T", "C", Some(upload(JPEG, "photo")))
            .validate(&PostRules::for_create(1024))
            .unwrap();
        assert_eq!(jpeg.featured_image.unwrap().kind.extension(), "jpg");
    }

    #[test]
    fn test_rejects_other_images_and_non_images() {
        let gif = input("T", "C", Some(upload(GIF, "a.gif")))
            .validate(&PostRules::for_update(1024))
            .unwrap_err();
        assert_eq!(
            gif.get(FEATURED_IMAGE),
            ["The featured image field must be a file of type: jpg, jpeg, png."]
        );

        let text = input("T", "C", Some(upload(b"just some text", "a.png")))
            .validate(&PostRules::for_update(1024))
            .unwrap_err();
        assert_eq!(
            text.get(FEATURED_IMAGE),
            ["The featured image field must be an image."]
        );
    }

    #[test]
    fn test_rejects_oversized_image() {
        let mut big = upload(PNG, "a.png");
        big.size = 4096;

        let errors = input("T", "C", Some(big))
            .validate(&PostRules::for_create(2048))
            .unwrap_err();
        assert_eq!(
            errors.get(FEATURED_IMAGE),
            ["The featured image field must not be greater than 2 kilobytes."]
        );
    }

    #[test]
    fn test_title_length_limit() {
        let errors = input(&"a".repeat(256), "C", None)
            .validate(&PostRules::for_update(1024))
            .unwrap_err();
        assert_eq!(
            errors.get(TITLE),
            ["The title field must not be greater than 255 characters."]
        );
    }
}

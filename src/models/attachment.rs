//! File selections sent as multipart parts

use std::fmt;

/// A file picked by the user, held in memory until submission
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Guess the content type from the file extension
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

// Byte payloads are elided so drafts stay readable in logs
impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_guess() {
        assert_eq!(Attachment::from_bytes("farm.JPG", vec![1]).content_type, "image/jpeg");
        assert_eq!(Attachment::from_bytes("plot.png", vec![]).content_type, "image/png");
        assert_eq!(
            Attachment::from_bytes("notes", vec![]).content_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn test_debug_hides_bytes() {
        let file = Attachment::new("a.png", "image/png", vec![0; 2048]);
        let rendered = format!("{:?}", file);
        assert!(rendered.contains("size: 2048"));
        assert!(!rendered.contains("[0, 0"));
    }
}

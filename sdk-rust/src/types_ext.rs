use crate::{Content, ContentPart, ImageDetail, LLMResult, Message, Role, ToolOutput};
use base64::Engine as _;

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageRef {
            url: url.into(),
            detail: None,
        }
    }

    /// Inline image bytes as a base64 data URL.
    pub fn image_bytes(mime_type: &str, bytes: &[u8], detail: Option<ImageDetail>) -> Self {
        Self::ImageRef {
            url: data_url(mime_type, bytes),
            detail,
        }
    }

    pub fn file_id(file_id: impl Into<String>) -> Self {
        Self::FileRef {
            file_id: file_id.into(),
        }
    }

    /// Inline file bytes as a base64 data URL.
    pub fn file_bytes(mime_type: &str, bytes: &[u8], filename: Option<String>) -> Self {
        Self::FileData {
            data_url: data_url(mime_type, bytes),
            filename,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for ContentPart {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ContentPart {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime_type};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self::System(Content::text(text))
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::User(Content::text(text))
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant(Content::text(text))
    }

    pub fn tool(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Tool(ToolOutput {
            call_id: call_id.into(),
            output: output.into(),
        })
    }

    pub fn system_parts(parts: Vec<ContentPart>) -> LLMResult<Self> {
        Content::new(parts).map(Self::System)
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> LLMResult<Self> {
        Content::new(parts).map(Self::User)
    }

    pub fn assistant_parts(parts: Vec<ContentPart>) -> LLMResult<Self> {
        Content::new(parts).map(Self::Assistant)
    }

    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::System(_) => Role::System,
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
            Self::Tool(_) => Role::Tool,
        }
    }

    /// The content parts, or `None` for tool outputs.
    #[must_use]
    pub fn content(&self) -> Option<&[ContentPart]> {
        match self {
            Self::System(content) | Self::User(content) | Self::Assistant(content) => {
                Some(content.parts())
            }
            Self::Tool(_) => None,
        }
    }

    /// All text parts joined together. Tool outputs return their output.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Tool(output) => output.output.clone(),
            _ => self
                .content()
                .unwrap_or_default()
                .iter()
                .filter_map(ContentPart::as_text)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_data_urls() {
        let part = ContentPart::image_bytes("image/png", b"abc", Some(ImageDetail::High));
        assert_eq!(
            part,
            ContentPart::ImageRef {
                url: "data:image/png;base64,YWJj".to_string(),
                detail: Some(ImageDetail::High),
            }
        );

        let part = ContentPart::file_bytes("application/pdf", b"abc", Some("a.pdf".to_string()));
        assert_eq!(
            part,
            ContentPart::FileData {
                data_url: "data:application/pdf;base64,YWJj".to_string(),
                filename: Some("a.pdf".to_string()),
            }
        );
    }

    #[test]
    fn joins_text_parts() {
        let message = Message::user_parts(vec![
            "Hello, ".into(),
            ContentPart::image_url("https://example.com/a.png"),
            "world".into(),
        ])
        .unwrap();
        assert_eq!(message.text(), "Hello, world");
        assert_eq!(message.role(), Role::User);
        assert_eq!(message.content().map(<[ContentPart]>::len), Some(3));
    }
}

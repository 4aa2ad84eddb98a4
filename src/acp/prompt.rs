//! Flattening of ACP prompt blocks into one worker user message.

use std::path::Path;

use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::acp::types::PromptBlock;

/// Separator between text contributed by consecutive blocks.
const TEXT_SEPARATOR: &str = "\n\n";

/// Params of `droid.add_user_message`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    /// Combined prompt text.
    pub text: String,
    /// Attached files.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// A file attached to a user message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// File name derived from the URI.
    pub name: String,
    /// MIME type, if the editor supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// The resource URI as given.
    pub path: String,
}

/// Flatten prompt blocks into a single [`UserMessage`].
///
/// `text` blocks and the inline text of `resource` blocks are joined with a
/// blank line. `resource` and `resource_link` blocks become attachments.
#[must_use]
pub fn flatten_prompt(blocks: &[PromptBlock]) -> UserMessage {
    let mut texts: Vec<&str> = Vec::new();
    let mut attachments = Vec::new();

    for block in blocks {
        match block {
            PromptBlock::Text { text } => texts.push(text),
            PromptBlock::Resource { resource } => {
                if !resource.text.is_empty() {
                    texts.push(&resource.text);
                }
                attachments.push(Attachment {
                    name: file_name_from_uri(&resource.uri),
                    mime_type: resource.mime_type.clone(),
                    path: resource.uri.clone(),
                });
            }
            PromptBlock::ResourceLink {
                uri,
                name,
                mime_type,
            } => {
                let name = if name.is_empty() {
                    file_name_from_uri(uri)
                } else {
                    name.clone()
                };
                attachments.push(Attachment {
                    name,
                    mime_type: mime_type.clone(),
                    path: uri.clone(),
                });
            }
            PromptBlock::Unsupported => {
                debug!("prompt: skipping unsupported content block");
            }
        }
    }

    UserMessage {
        text: texts.join(TEXT_SEPARATOR),
        attachments,
    }
}

/// Last path segment of `uri`; falls back to treating `uri` as a plain path.
#[must_use]
pub fn file_name_from_uri(uri: &str) -> String {
    let from_url = Url::parse(uri).ok().and_then(|url| {
        url.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_owned))
    });

    from_url
        .filter(|name| !name.is_empty())
        .or_else(|| {
            Path::new(uri)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_default()
}

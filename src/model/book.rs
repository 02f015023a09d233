use std::collections::BTreeMap;

use super::chapter::ChapterTree;
use super::content::Body;

/// Root entity: metadata, chapter tree, content body and image index.
///
/// A book is assembled once by whatever decodes the source documents and is
/// read-only from then on. [`sanitize`](crate::sanitize) produces a new,
/// independent book rather than cleaning one in place.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Book {
    pub id: String,
    pub title: String,
    pub description: String,
    pub chapters: ChapterTree,
    /// Document body. `None` when the source had no content document.
    pub body: Option<Body>,
    /// Inline-object id → image.
    pub images: BTreeMap<String, Image>,
}

/// An image referenced by [`InlineObject`](super::InlineObject) runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Image {
    pub object_id: String,
    pub url: String,
    pub mime_type: Option<String>,
}

impl Book {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_chapters(mut self, chapters: ChapterTree) -> Self {
        self.chapters = chapters;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.add_image(image);
        self
    }

    /// Register an image under its object id, replacing any previous entry.
    pub fn add_image(&mut self, image: Image) {
        self.images.insert(image.object_id.clone(), image);
    }

    /// Look up the image an inline object refers to.
    pub fn resolve_image(&self, object_id: &str) -> Option<&Image> {
        self.images.get(object_id)
    }
}

impl Image {
    pub fn new(object_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            url: url.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

//! Document rendering: the engine interface, zoom rules and the page cache.

mod cache;
#[cfg(feature = "pdf")]
mod pdf;
mod zoom;

pub use cache::PageCache;
#[cfg(feature = "pdf")]
pub use pdf::MupdfEngine;
pub use zoom::Zoom;

/// A rendered page as packed RGB rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl PageImage {
    /// A page filled with a single colour.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut rgb = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            rgb.extend_from_slice(&color);
        }
        Self { width, height, rgb }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        let px = self.rgb.get(offset..offset + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

/// Where an outline entry points to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Page index inside the document (0-based)
    Page(usize),
    /// Link outside the document
    Uri(String),
}

/// One entry of the document outline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineItem {
    pub title: String,
    pub destination: Option<Destination>,
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    pub fn new(title: impl Into<String>, destination: Option<Destination>) -> Self {
        Self {
            title: title.into(),
            destination,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineItem>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("page {0} is out of range")]
    PageOutOfRange(u32),

    #[error("destination points outside the document: {0}")]
    ExternalDestination(String),

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("{detail}")]
    Generic { detail: String },
}

impl EngineError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// The rendering engine behind the page surface.
///
/// Page numbers are 1-based, page indices (as used by destinations) are
/// 0-based.
pub trait DocumentEngine {
    fn page_count(&self) -> usize;

    /// Renders `page` with one surface pixel per document unit times `scale`.
    fn render_page(&self, page: u32, scale: f64) -> Result<PageImage, EngineError>;

    /// The structural outline; empty when the document has none.
    fn outline(&self) -> Result<Vec<OutlineItem>, EngineError>;

    /// Resolves an outline destination to a page index.
    fn page_index(&self, destination: &Destination) -> Result<usize, EngineError> {
        match destination {
            Destination::Page(index) if *index < self.page_count() => Ok(*index),
            Destination::Page(index) => Err(EngineError::PageOutOfRange(*index as u32 + 1)),
            Destination::Uri(uri) => Err(EngineError::ExternalDestination(uri.clone())),
        }
    }
}

impl<T: DocumentEngine + ?Sized> DocumentEngine for Box<T> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn render_page(&self, page: u32, scale: f64) -> Result<PageImage, EngineError> {
        (**self).render_page(page, scale)
    }

    fn outline(&self) -> Result<Vec<OutlineItem>, EngineError> {
        (**self).outline()
    }

    fn page_index(&self, destination: &Destination) -> Result<usize, EngineError> {
        (**self).page_index(destination)
    }
}

use log::{debug, warn};
use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::{Destination, DocumentEngine, EngineError, OutlineItem, PageImage};

/// [`DocumentEngine`] backed by MuPDF, loaded from in-memory bytes.
pub struct MupdfEngine {
    doc: Document,
    page_count: usize,
}

impl MupdfEngine {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let doc = Document::from_bytes(bytes, "application/pdf")?;
        let page_count = doc.page_count()? as usize;
        debug!("Loaded PDF with {page_count} pages");
        Ok(Self { doc, page_count })
    }
}

impl DocumentEngine for MupdfEngine {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn render_page(&self, page: u32, scale: f64) -> Result<PageImage, EngineError> {
        if page == 0 || page as usize > self.page_count {
            return Err(EngineError::PageOutOfRange(page));
        }
        let page_ref = self.doc.load_page((page - 1) as i32)?;

        let mag = scale as f32;
        let transform = Matrix::new_scale(mag, mag);
        let rgb = Colorspace::device_rgb();
        let pixmap = page_ref.to_pixmap(&transform, &rgb, false, false)?;

        let pixels = pixmap_to_rgb(&pixmap)?;
        Ok(PageImage {
            width: pixmap.width(),
            height: pixmap.height(),
            rgb: pixels,
        })
    }

    fn outline(&self) -> Result<Vec<OutlineItem>, EngineError> {
        let outlines = self.doc.outlines()?;
        Ok(convert_outlines(&outlines))
    }
}

fn convert_outlines(outlines: &[mupdf::Outline]) -> Vec<OutlineItem> {
    outlines
        .iter()
        .map(|outline| {
            let destination = if let Some(dest) = outline.dest {
                Some(Destination::Page(dest.loc.page_number as usize))
            } else {
                outline.uri.as_ref().map(|uri| Destination::Uri(uri.clone()))
            };
            OutlineItem::new(outline.title.trim(), destination)
                .with_children(convert_outlines(&outline.down))
        })
        .collect()
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, EngineError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(EngineError::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        warn!("Pixmap buffer is {} bytes for {width}x{height}", samples.len());
        return Err(EngineError::generic("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }
    Ok(out)
}

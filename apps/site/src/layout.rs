//! Fixed page geometry supplied on the command line.

use std::sync::Mutex;

use anyhow::{bail, Context};
use site_core::{PageLayout, SectionBounds};
use site_shared::domain::SectionId;

pub struct StaticLayout {
    offset: Mutex<f64>,
    viewport: f64,
    sections: Vec<(SectionId, SectionBounds)>,
}

impl StaticLayout {
    pub fn new(offset: f64, viewport: f64, sections: Vec<(SectionId, SectionBounds)>) -> Self {
        Self {
            offset: Mutex::new(offset),
            viewport,
            sections,
        }
    }

}

impl PageLayout for StaticLayout {
    fn scroll_offset(&self) -> f64 {
        self.offset.lock().map(|guard| *guard).unwrap_or_default()
    }

    fn viewport_height(&self) -> f64 {
        self.viewport
    }

    fn section_bounds(&self, section: &SectionId) -> Option<SectionBounds> {
        self.sections
            .iter()
            .find(|(id, _)| id == section)
            .map(|(_, bounds)| *bounds)
    }

    fn scroll_into_view(&self, section: &SectionId) -> bool {
        match self.section_bounds(section) {
            Some(bounds) => {
                self.scroll_to_offset(bounds.top);
                true
            }
            None => false,
        }
    }

    fn scroll_to_offset(&self, offset: f64) {
        if let Ok(mut guard) = self.offset.lock() {
            *guard = offset;
        }
    }
}

/// Parses `id:top:height`, e.g. `about:800:800`.
pub fn parse_section_spec(raw: &str) -> anyhow::Result<(SectionId, SectionBounds)> {
    let parts: Vec<&str> = raw.split(':').collect();
    let [id, top, height] = parts.as_slice() else {
        bail!("section '{raw}' must look like id:top:height");
    };
    if id.trim().is_empty() {
        bail!("section '{raw}' has an empty id");
    }
    let top: f64 = top
        .trim()
        .parse()
        .with_context(|| format!("invalid top offset in section '{raw}'"))?;
    let height: f64 = height
        .trim()
        .parse()
        .with_context(|| format!("invalid height in section '{raw}'"))?;
    if height < 0.0 {
        bail!("section '{raw}' has a negative height");
    }
    Ok((SectionId::new(id.trim()), SectionBounds::new(top, height)))
}

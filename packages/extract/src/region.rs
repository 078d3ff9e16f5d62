//! Region location.
//!
//! Narrows a bulletin's text to the span holding the station table, from
//! the table's introductory phrase up to the next known section header.

use serde::Deserialize;

/// Phrases bounding the station table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionConfig {
    /// Introductory phrase. `None` starts the region at the top of the text.
    pub start: Option<String>,
    /// Headers of the sections that follow the table.
    pub end_markers: Vec<String>,
}

/// A located span of document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region<'a> {
    /// The span itself.
    pub text: &'a str,
    /// Whether the introductory phrase was found. `false` means the region
    /// fell back to the whole document.
    pub anchored: bool,
}

/// Finds the station-table region in document text.
#[derive(Debug, Clone, Default)]
pub struct RegionLocator {
    start: Option<String>,
    end_markers: Vec<String>,
}

impl RegionLocator {
    /// Creates a locator. Matching is ASCII case-insensitive.
    #[must_use]
    pub fn new(config: &RegionConfig) -> Self {
        Self {
            start: config
                .start
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_ascii_lowercase),
            end_markers: config
                .end_markers
                .iter()
                .map(|m| m.trim().to_ascii_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Locates the region. Without a start phrase the region begins at the
    /// top of the text but is still cut at the first end marker; with a
    /// start phrase that does not occur, the whole text is returned.
    #[must_use]
    pub fn locate<'a>(&self, text: &'a str) -> Region<'a> {
        // ASCII lowercasing keeps byte offsets aligned with `text`.
        let lower = text.to_ascii_lowercase();

        let begin = match &self.start {
            None => 0,
            Some(start) => {
                if let Some(pos) = lower.find(start.as_str()) {
                    pos
                } else {
                    log::debug!("Region start '{start}' not found; using whole text");
                    return Region {
                        text,
                        anchored: false,
                    };
                }
            }
        };

        let search_from = begin + self.start.as_ref().map_or(0, String::len);
        let end = self
            .end_markers
            .iter()
            .filter_map(|marker| lower[search_from..].find(marker.as_str()))
            .min()
            .map_or(text.len(), |offset| search_from + offset);

        Region {
            text: &text[begin..end],
            anchored: self.start.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydro_locator() -> RegionLocator {
        RegionLocator::new(&RegionConfig {
            start: Some("Hydro Catchment".to_owned()),
            end_markers: vec![
                "Meteorological Stations".to_owned(),
                "Rainfall Stations".to_owned(),
                "Appendix".to_owned(),
            ],
        })
    }

    #[test]
    fn spans_from_start_to_first_end_marker() {
        let text = "Intro\nHYDRO CATCHMENT AREAS\nNorton 12.5\nAPPENDIX\nRainfall Stations\nX 1";
        let region = hydro_locator().locate(text);
        assert_eq!(region.text, "HYDRO CATCHMENT AREAS\nNorton 12.5\n");
        assert!(region.anchored);
    }

    #[test]
    fn runs_to_end_without_end_marker() {
        let text = "hydro catchment\nNorton 12.5";
        assert_eq!(hydro_locator().locate(text).text, text);
    }

    #[test]
    fn missing_start_returns_whole_text() {
        let text = "Colombo 32.1 24.5 TR\nAppendix";
        let region = hydro_locator().locate(text);
        assert_eq!(region.text, text);
        assert!(!region.anchored);
    }

    #[test]
    fn end_markers_before_start_are_ignored() {
        let text = "Appendix list\nHydro catchment\nNorton 1.0\nappendix";
        assert_eq!(
            hydro_locator().locate(text).text,
            "Hydro catchment\nNorton 1.0\n"
        );
    }

    #[test]
    fn no_start_still_cuts_at_end_marker() {
        let locator = RegionLocator::new(&RegionConfig {
            start: None,
            end_markers: vec!["Reservoir".to_owned()],
        });
        assert_eq!(locator.locate("Colombo 1 2 3\nRESERVOIR levels").text, "Colombo 1 2 3\n");
    }
}

use pagemill::{RasterizationResult, RenderSettings, Result, rasterize};
use pagemill_tests::{SyntheticEngine, SyntheticPage, sample};

mod errors;

pub(crate) fn render(
    engine: &SyntheticEngine,
    page: &SyntheticPage,
    settings: &RenderSettings,
) -> Result<RasterizationResult> {
    rasterize(engine, page, page.media_box, settings)
}

/// The rows the engine draws, without any padding.
pub(crate) fn expected_rows(height: u32, row_len: usize) -> Vec<u8> {
    (0..height)
        .flat_map(|row| (0..row_len).map(move |i| sample(row, i)))
        .collect()
}

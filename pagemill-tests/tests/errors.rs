use crate::render;
use pagemill::{ColorModel, EngineError, GeometryError, RenderError, RenderSettings};
use pagemill_tests::{SyntheticEngine, SyntheticPage};

const LETTER_BYTES: usize = 612 * 792;

#[test]
fn failed_size_query() {
    let engine = SyntheticEngine::new().failing_size_query();

    assert_eq!(
        render(&engine, &SyntheticPage::letter(), &RenderSettings::default()).unwrap_err(),
        RenderError::SizeQuery(Some(EngineError::new("cannot measure page")))
    );
    assert_eq!(engine.calls().len(), 1);
}

#[test]
fn zero_size_is_a_failed_size_query() {
    let engine = SyntheticEngine::new().reporting_size(0);

    assert_eq!(
        render(&engine, &SyntheticPage::letter(), &RenderSettings::default()).unwrap_err(),
        RenderError::SizeQuery(None)
    );
    assert_eq!(engine.calls().len(), 1);
}

#[test]
fn size_below_the_grid_is_rejected() {
    let engine = SyntheticEngine::new().reporting_size(10);

    assert_eq!(
        render(&engine, &SyntheticPage::letter(), &RenderSettings::default()).unwrap_err(),
        RenderError::BufferSize {
            expected: LETTER_BYTES,
            actual: 10
        }
    );
    assert_eq!(engine.calls().len(), 1);
}

#[test]
fn allocation_failure() {
    let engine = SyntheticEngine::new().reporting_size(usize::MAX);

    assert_eq!(
        render(&engine, &SyntheticPage::letter(), &RenderSettings::default()).unwrap_err(),
        RenderError::OutOfMemory {
            requested: usize::MAX
        }
    );
    assert_eq!(engine.calls().len(), 1);
}

#[test]
fn oversized_buffer_is_rejected_before_querying() {
    let engine = SyntheticEngine::new();
    let settings = RenderSettings::default()
        .with_color_model(ColorModel::Rgb)
        .with_resolution(72.0 * 5.0e6);

    assert_eq!(
        render(&engine, &SyntheticPage::letter(), &settings).unwrap_err(),
        RenderError::InvalidGeometry(GeometryError::TooLarge {
            width: 3_060_000_000,
            height: 3_960_000_000
        })
    );
    assert!(engine.calls().is_empty());
}

#[test]
fn failed_fill() {
    let engine = SyntheticEngine::new().failing_fill();

    assert_eq!(
        render(&engine, &SyntheticPage::letter(), &RenderSettings::default()).unwrap_err(),
        RenderError::Fill(EngineError::new("cannot draw page"))
    );
    assert_eq!(engine.calls().len(), 2);
}

#[test]
fn errors_have_messages() {
    let error = RenderError::Fill(EngineError::new("cannot draw page"));

    assert_eq!(
        error.to_string(),
        "failed to fill pixel buffer: cannot draw page"
    );
    assert!(core::error::Error::source(&error).is_some());
}

//! End-to-end editing workflow through the public API.
//!
//! Decodes real PNG files from a temp dir, edits them, saves and reloads,
//! so the codec, pipeline, cache and history are exercised together.

use retouch::adjustments::{Adjustment, Knob, ResizeMethod};
use retouch::buffer::PixelBuffer;
use retouch::imaging::Effect;
use retouch::imaging::effects::{ColorMatchParams, IntensityParams, PosterizeParams};
use retouch::recipe::Recipe;
use retouch::session::{ImageSession, SessionError};
use std::path::Path;
use tempfile::TempDir;

// ===========================================================================
// Fixtures
// ===========================================================================

fn gradient(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        [
            (x * 255 / (width - 1)) as u8,
            (y * 255 / (height - 1)) as u8,
            96,
        ]
    })
    .unwrap()
}

fn write_png(dir: &Path, name: &str, buffer: &PixelBuffer) -> std::path::PathBuf {
    let path = dir.join(name);
    buffer.as_image().save(&path).unwrap();
    path
}

fn loaded(dir: &Path, name: &str, buffer: &PixelBuffer) -> ImageSession {
    let path = write_png(dir, name, buffer);
    let mut session = ImageSession::new();
    session.load_image(&path).unwrap();
    session
}

// ===========================================================================
// Workflow
// ===========================================================================

#[test]
fn load_adjust_effect_undo_save_reload() {
    let tmp = TempDir::new().unwrap();
    let source = gradient(48, 32);
    let mut session = loaded(tmp.path(), "in.png", &source);
    assert_eq!(session.working().unwrap(), &source);

    session
        .set_adjustment(Adjustment::Tonal(Knob::Brightness, 0.3))
        .unwrap();
    let brightened = session.processed(false).unwrap();
    assert_ne!(brightened, source);
    // Adjustments never touch the working buffer
    assert_eq!(session.working().unwrap(), &source);

    session
        .apply_effect(&Effect::Invert(IntensityParams::new(1.0)))
        .unwrap();
    let inverted = session.working().unwrap().clone();
    assert_eq!(inverted.pixel(0, 0), [255, 255, 159]);

    session
        .apply_effect(&Effect::Posterize(PosterizeParams::default()))
        .unwrap();
    assert_eq!(session.history().len(), 3);

    assert!(session.undo());
    assert_eq!(session.working().unwrap(), &inverted);
    // Undo leaves adjustments alone
    assert_eq!(session.adjustments().unwrap().get(Knob::Brightness), 0.3);

    let out = tmp.path().join("out.png");
    session.save_image(&out).unwrap();

    let mut reloaded = ImageSession::new();
    reloaded.load_image(&out).unwrap();
    assert_eq!(
        reloaded.working().unwrap(),
        &session.processed(false).unwrap()
    );
}

#[test]
fn geometry_applies_on_save() {
    let tmp = TempDir::new().unwrap();
    let mut session = loaded(tmp.path(), "in.png", &gradient(40, 20));
    session.set_adjustment(Adjustment::Width(20)).unwrap();
    session.set_adjustment(Adjustment::Height(20)).unwrap();
    session
        .set_adjustment(Adjustment::ResizeMethod(ResizeMethod::Crop))
        .unwrap();

    let out = tmp.path().join("square.png");
    session.save_image(&out).unwrap();
    let saved = image::open(&out).unwrap();
    assert_eq!((saved.width(), saved.height()), (20, 20));
}

#[test]
fn fast_renders_hit_the_cache_until_an_edit() {
    let tmp = TempDir::new().unwrap();
    let mut session = loaded(tmp.path(), "in.png", &gradient(16, 16));

    let first = session.processed(true).unwrap();
    let second = session.processed(true).unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(session.cache_stats().hits, 1);

    session
        .set_adjustment(Adjustment::Tonal(Knob::Contrast, 0.5))
        .unwrap();
    assert!(!session.is_cache_fresh());
    let third = session.processed(true).unwrap();
    assert!(!third.ptr_eq(&second));
}

#[test]
fn history_is_bounded_at_ten_snapshots() {
    let tmp = TempDir::new().unwrap();
    let mut session = loaded(tmp.path(), "in.png", &gradient(8, 8));
    for _ in 0..14 {
        session
            .apply_effect(&Effect::Invert(IntensityParams::new(1.0)))
            .unwrap();
    }
    assert_eq!(session.history().len(), 10);
    let mut undos = 0;
    while session.undo() {
        undos += 1;
    }
    assert_eq!(undos, 9);
}

#[test]
fn color_match_with_reference_file() {
    let tmp = TempDir::new().unwrap();
    let reference = PixelBuffer::from_fn(8, 8, |x, y| [200, (x * 8) as u8, (y * 8) as u8]).unwrap();
    let ref_path = write_png(tmp.path(), "ref.png", &reference);
    let mut session = loaded(tmp.path(), "in.png", &gradient(8, 8));

    let effect = Effect::ColorMatch(ColorMatchParams::default());
    assert!(matches!(
        session.apply_effect(&effect),
        Err(SessionError::ReferenceMissing)
    ));
    // Failed effects leave history untouched
    assert_eq!(session.history().len(), 1);

    session.load_reference(&ref_path).unwrap();
    session.apply_effect(&effect).unwrap();
    assert_eq!(session.history().len(), 2);
}

#[test]
fn missing_file_is_a_decode_error() {
    let mut session = ImageSession::new();
    let err = session.load_image(Path::new("/nonexistent/in.png")).unwrap_err();
    assert!(matches!(err, SessionError::Decode(_)));
    assert!(!session.is_loaded());
}

#[test]
fn operations_before_load_fail() {
    let mut session = ImageSession::new();
    assert!(matches!(
        session.processed(false),
        Err(SessionError::NoImageLoaded)
    ));
    assert!(matches!(
        session.apply_effect(&Effect::Invert(IntensityParams::new(1.0))),
        Err(SessionError::NoImageLoaded)
    ));
    assert!(!session.undo());
}

#[test]
fn recipe_runs_against_a_decoded_image() {
    let tmp = TempDir::new().unwrap();
    let mut session = loaded(tmp.path(), "in.png", &gradient(24, 24));
    let recipe = Recipe::parse(
        r#"
        [adjustments]
        saturation = -1.0
        width = 12
        height = 12

        [[effects]]
        kind = "sepia"

        [[effects]]
        kind = "vignette"
        intensity = 0.5
        "#,
    )
    .unwrap();
    recipe.apply_to(&mut session).unwrap();

    assert_eq!(session.history().len(), 3);
    let out = session.processed(false).unwrap();
    assert_eq!(out.dimensions(), (12, 12));
    // Full desaturation leaves grey pixels
    let [r, g, b] = out.pixel(6, 6);
    assert!(r == g && g == b, "got {r},{g},{b}");
}

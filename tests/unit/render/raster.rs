use super::*;
use crate::{
    config::ContentFit,
    render::pool::{PixelBufferPool, PixelBufferPoolOpts},
};

fn config(w: u32, h: u32, fit: ContentFit) -> RenderConfig {
    RenderConfig {
        size: RenderSize::new(w, h),
        content_fit: fit,
        background: Rgba8::opaque(0, 0, 255),
        ..RenderConfig::default()
    }
}

#[test]
fn fit_letterboxes_onto_the_background() {
    let synth = RasterSynthesizer::new(&config(80, 40, ContentFit::Fit));
    let canvas = synth
        .render_still(&StillImage::solid(20, 20, [255, 0, 0, 255]))
        .unwrap();

    assert_eq!(canvas.dimensions(), (80, 40));
    assert_eq!(canvas.get_pixel(40, 20).0, [255, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(2, 20).0, [0, 0, 255, 255]);
    assert_eq!(canvas.get_pixel(77, 20).0, [0, 0, 255, 255]);
}

#[test]
fn fill_covers_the_whole_frame() {
    let synth = RasterSynthesizer::new(&config(80, 40, ContentFit::Fill));
    let canvas = synth
        .render_still(&StillImage::solid(20, 20, [0, 255, 0, 255]))
        .unwrap();
    assert!(canvas.pixels().all(|p| p.0 == [0, 255, 0, 255]));
}

#[test]
fn transparency_never_leaks_into_the_frame() {
    let synth = RasterSynthesizer::new(&config(16, 16, ContentFit::Fit));
    let canvas = synth
        .render_still(&StillImage::solid(8, 8, [255, 255, 255, 0]))
        .unwrap();
    assert!(canvas.pixels().all(|p| p.0[3] == 255));
    assert_eq!(canvas.get_pixel(8, 8).0, [0, 0, 255, 255]);
}

#[test]
fn portrait_tag_is_uprighted_before_fitting() {
    // Stored 40x20 with a quarter turn: displays as 20x40.
    let still = StillImage::solid(40, 20, [255, 0, 0, 255]).with_orientation(Orientation::Right);
    let synth = RasterSynthesizer::new(&config(40, 40, ContentFit::Fit));
    let canvas = synth.render_still(&still).unwrap();
    assert_eq!(canvas.get_pixel(20, 2).0, [255, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(2, 20).0, [0, 0, 255, 255]);
}

#[test]
fn clip_frames_use_the_segment_transform() {
    let cfg = config(32, 16, ContentFit::Fill);
    let synth = RasterSynthesizer::new(&cfg);
    let fitted = crate::transform::orientation::resolve_transform(
        Size::new(64.0, 32.0),
        crate::foundation::core::Affine::IDENTITY,
        cfg.size,
    );
    let rgba: Vec<u8> = std::iter::repeat_n([9u8, 9, 9, 255], 64 * 32)
        .flatten()
        .collect();
    let canvas = synth.render_clip_frame(&rgba, (64, 32), &fitted).unwrap();
    assert_eq!(canvas.dimensions(), (32, 16));
    assert!(canvas.pixels().all(|p| p.0 == [9, 9, 9, 255]));

    assert!(synth.render_clip_frame(&rgba[..8], (64, 32), &fitted).is_err());
}

#[test]
fn write_into_checks_dimensions() {
    let synth = RasterSynthesizer::new(&config(8, 4, ContentFit::Fit));
    let canvas = synth
        .render_still(&StillImage::solid(8, 4, [1, 2, 3, 255]))
        .unwrap();
    let mut pool = PixelBufferPool::new(RenderSize::new(8, 4), PixelBufferPoolOpts::default()).unwrap();
    let mut buf = pool.checkout();
    synth.write_into(&canvas, &mut buf).unwrap();
    assert_eq!(&buf.data()[..4], &[1, 2, 3, 255]);
    drop(buf);

    let mut other = PixelBufferPool::new(RenderSize::new(4, 4), PixelBufferPoolOpts::default()).unwrap();
    let mut buf = other.checkout();
    assert!(synth.write_into(&canvas, &mut buf).is_err());
}

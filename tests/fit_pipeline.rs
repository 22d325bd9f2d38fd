//! End-to-end tests for the detect → fit → verify pipeline at the library
//! level, the same sequence the gateway runs per upload.

use std::io::Cursor;

use pretty_assertions::assert_eq;

use formfit::detector::{detect, normalize_text};
use formfit::fitter::{fit, output_filename, verify, FitError, FitRequest, OutputEncoding};

/// Deterministic high-entropy raster fixture.
fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        let v = (x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17)) % 251) as u8;
        image::Rgb([v, v.wrapping_add(97), v.wrapping_mul(3)])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[test]
fn detect_then_fit_then_verify() {
    let page_text = normalize_text(
        "Upload  your photograph.\n  Width should be 160 pixels and height \
         should be 200 to 212 pixels. File size should be between 20 kb and 50 kb.",
    );
    let requirement = detect(&page_text).expect("requirements should be detected");
    assert_eq!(requirement.width, Some(160));
    assert_eq!(requirement.height, Some(212));
    assert_eq!(requirement.max_size_kb, Some(50));

    let request = FitRequest {
        image: noisy_png(640, 480),
        width: requirement.width.unwrap(),
        height: requirement.height.unwrap(),
        max_size_kb: requirement.max_size_kb,
        encoding: OutputEncoding::Jpeg,
    };
    let result = fit(&request).expect("fit should satisfy a 50KB budget");
    assert!(result.size_bytes() <= 50 * 1024);

    let report = verify(&result.bytes, &requirement).expect("output should verify");
    assert_eq!(report.width, 160);
    assert_eq!(report.height, 212);
    assert_eq!(report.format, "jpeg");
}

#[test]
fn size_only_requirement_still_constrains_fit() {
    let requirement = detect("keep the attachment under 30 kb please").unwrap();
    assert_eq!(requirement.width, None);
    assert_eq!(requirement.max_size_kb, Some(30));

    // Caller picks its own dimensions when the page names none.
    let request = FitRequest {
        image: noisy_png(256, 256),
        width: 128,
        height: 128,
        max_size_kb: requirement.max_size_kb,
        encoding: OutputEncoding::Jpeg,
    };
    let result = fit(&request).unwrap();
    assert!(result.size_bytes() <= 30 * 1024);
    verify(&result.bytes, &requirement).unwrap();
}

#[test]
fn impossible_budget_surfaces_as_error_not_oversized_output() {
    let request = FitRequest {
        image: noisy_png(512, 512),
        width: 512,
        height: 512,
        max_size_kb: Some(1),
        encoding: OutputEncoding::Jpeg,
    };
    match fit(&request) {
        Err(FitError::BudgetUnsatisfiable { achieved_bytes, .. }) => {
            assert!(achieved_bytes > 1024);
        }
        Ok(result) => panic!(
            "fit must not return an over-budget buffer ({} bytes)",
            result.size_bytes()
        ),
        Err(other) => panic!("expected BudgetUnsatisfiable, got {other:?}"),
    }
}

#[test]
fn verify_catches_wrong_dimensions() {
    let requirement = detect("200 x 200 pixels").unwrap();

    let request = FitRequest {
        image: noisy_png(100, 100),
        width: 64,
        height: 64,
        max_size_kb: None,
        encoding: OutputEncoding::Jpeg,
    };
    let result = fit(&request).unwrap();

    let err = verify(&result.bytes, &requirement).unwrap_err();
    assert!(matches!(err, FitError::Verification(_)));
}

#[test]
fn filenames_follow_the_requested_encoding() {
    assert_eq!(output_filename("passport.png", OutputEncoding::Jpeg), "passport.jpg");
    assert_eq!(output_filename("passport.jpg", OutputEncoding::Png), "passport.png");
}

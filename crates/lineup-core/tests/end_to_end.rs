//! End-to-end pipeline test: real artifact files on disk, real decode,
//! mock detectors for deterministic face/eye placement.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{GrayImage, Rgb, RgbImage};
use lineup_core::features::FEATURE_LEN;
use lineup_core::{
    Detector, FaceLocator, ImageInput, LabelRegistry, LinearClassifier, Pipeline, Region,
};
use std::io::Cursor;
use std::io::Write;

struct FixedDetector(Vec<Region>);

impl Detector for FixedDetector {
    fn detect(&self, _gray: &GrayImage) -> Vec<Region> {
        self.0.clone()
    }
}

fn write_artifacts(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let labels_path = dir.join("class_dictionary.json");
    let model_path = dir.join("classifier.json");

    let mut labels = std::fs::File::create(&labels_path).unwrap();
    write!(labels, r#"{{"ada_lovelace": 0, "grace_hopper": 1}}"#).unwrap();

    // An intercept-only model that always favors class 1.
    let artifact = serde_json::json!({
        "weights": [vec![0.0; FEATURE_LEN], vec![0.0; FEATURE_LEN]],
        "intercepts": [0.0, 2.0],
    });
    let mut model = std::fs::File::create(&model_path).unwrap();
    write!(model, "{artifact}").unwrap();

    (labels_path, model_path)
}

fn portrait_payload() -> ImageInput {
    let img = RgbImage::from_fn(120, 120, |x, y| Rgb([x as u8, y as u8, 60]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    ImageInput::Payload(BASE64.encode(&bytes))
}

#[test]
fn classifies_one_clear_face() {
    let dir = tempfile::tempdir().unwrap();
    let (labels_path, model_path) = write_artifacts(dir.path());

    let labels = LabelRegistry::load(&labels_path).unwrap();
    let classifier = LinearClassifier::load(&model_path).unwrap();

    let locator = FaceLocator::new(
        Box::new(FixedDetector(vec![Region::new(20, 20, 64, 64)])),
        Box::new(FixedDetector(vec![
            Region::new(10, 15, 12, 12),
            Region::new(40, 15, 12, 12),
        ])),
    );

    let pipeline = Pipeline::new(locator, Box::new(classifier), labels).unwrap();
    let results = pipeline.classify(&portrait_payload()).unwrap();

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.class, "grace_hopper");
    assert_eq!(result.class_probability.len(), 2);
    let total: f64 = result.class_probability.iter().sum();
    assert!((total - 100.0).abs() <= 0.1, "sum was {total}");
    assert_eq!(result.class_dictionary["grace_hopper"], 1);
    assert_eq!(result.class_dictionary["ada_lovelace"], 0);
}

#[test]
fn file_input_matches_payload_input() {
    let dir = tempfile::tempdir().unwrap();
    let (labels_path, model_path) = write_artifacts(dir.path());

    let img = RgbImage::from_fn(90, 90, |x, y| Rgb([y as u8, x as u8, 12]));
    let img_path = dir.path().join("probe.png");
    img.save(&img_path).unwrap();

    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();

    let make_pipeline = || {
        let labels = LabelRegistry::load(&labels_path).unwrap();
        let classifier = LinearClassifier::load(&model_path).unwrap();
        let locator = FaceLocator::new(
            Box::new(FixedDetector(vec![Region::new(5, 5, 48, 48)])),
            Box::new(FixedDetector(vec![
                Region::new(8, 10, 10, 10),
                Region::new(30, 10, 10, 10),
            ])),
        );
        Pipeline::new(locator, Box::new(classifier), labels).unwrap()
    };

    let from_payload = make_pipeline()
        .classify(&ImageInput::Payload(BASE64.encode(&bytes)))
        .unwrap();
    let from_file = make_pipeline()
        .classify(&ImageInput::Path(img_path))
        .unwrap();

    assert_eq!(from_payload.len(), 1);
    assert_eq!(from_payload[0].class, from_file[0].class);
    assert_eq!(
        from_payload[0].class_probability,
        from_file[0].class_probability
    );
}

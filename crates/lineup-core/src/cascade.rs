//! Viola–Jones cascade detector.
//!
//! Loads OpenCV "new-format" cascade definitions (stageType BOOST,
//! featureType HAAR, stump weak classifiers) and runs multi-scale sliding
//! window detection with per-window variance normalization and
//! minimum-neighbor grouping of raw hits.
//!
//! Cascade files are static external resources; any problem loading one is a
//! [`DetectorInitError`] and fatal at startup, never a per-request failure.

use crate::types::Region;
use image::GrayImage;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rectangle-similarity tolerance used when clustering raw hits
/// (fraction of the mean window side).
const GROUP_EPS: f64 = 0.2;

#[derive(Error, Debug)]
pub enum DetectorInitError {
    #[error("cascade file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read cascade file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cascade XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed cascade definition: {0}")]
    Malformed(String),
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
}

/// Multi-scale scan parameters.
///
/// Defaults match the library defaults of the reference implementation:
/// scale factor 1.1, three minimum neighbors, no size floor.
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// Window growth per pyramid step. Lower = finer multi-scale search.
    pub scale_factor: f64,
    /// A hit cluster must contain strictly more than this many raw
    /// detections to survive grouping. Zero disables grouping entirely.
    pub min_neighbors: u32,
    /// Smallest window size (width, height) to scan.
    pub min_size: (u32, u32),
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 3,
            min_size: (0, 0),
        }
    }
}

/// One weighted rectangle of a haar feature, relative to the base window.
#[derive(Debug, Clone)]
struct FeatureRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    weight: f32,
}

/// A haar feature: a weighted sum of 2–3 rectangle sums.
#[derive(Debug, Clone)]
struct HaarFeature {
    rects: Vec<FeatureRect>,
}

/// A depth-1 boosted tree: compare one feature against a threshold and
/// emit one of two leaf values.
#[derive(Debug, Clone)]
struct Stump {
    feature: usize,
    threshold: f32,
    /// Leaf emitted when the feature value is below the threshold.
    below: f32,
    /// Leaf emitted otherwise.
    above: f32,
}

#[derive(Debug, Clone)]
struct Stage {
    threshold: f32,
    stumps: Vec<Stump>,
}

/// A parsed cascade, ready for detection.
#[derive(Debug, Clone)]
pub struct HaarCascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<HaarFeature>,
}

impl HaarCascade {
    /// Load a cascade from an OpenCV XML file.
    pub fn from_file(path: &Path) -> Result<Self, DetectorInitError> {
        if !path.exists() {
            return Err(DetectorInitError::NotFound(path.to_path_buf()));
        }
        let xml = std::fs::read_to_string(path).map_err(|source| DetectorInitError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cascade = Self::parse(&xml)?;
        tracing::info!(
            path = %path.display(),
            window = ?(cascade.window_width, cascade.window_height),
            stages = cascade.stages.len(),
            features = cascade.features.len(),
            "loaded haar cascade"
        );
        Ok(cascade)
    }

    /// Parse a cascade from XML text.
    pub fn parse(xml: &str) -> Result<Self, DetectorInitError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut path: Vec<String> = Vec::new();
        let mut window_width = 0u32;
        let mut window_height = 0u32;
        let mut stages: Vec<Stage> = Vec::new();
        let mut features: Vec<HaarFeature> = Vec::new();
        // Set by <internalNodes>, consumed by the following <leafValues>.
        let mut pending_stump: Option<(usize, f32)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match (tail(&path), name.as_str()) {
                        (Some("stages"), "_") => stages.push(Stage {
                            threshold: 0.0,
                            stumps: Vec::new(),
                        }),
                        (Some("features"), "_") => features.push(HaarFeature { rects: Vec::new() }),
                        _ => {}
                    }
                    path.push(name);
                }
                Event::End(_) => {
                    path.pop();
                }
                Event::Text(t) => {
                    let text = t.unescape()?;
                    let text = text.trim();
                    match context(&path) {
                        Context::StageType if text != "BOOST" => {
                            return Err(DetectorInitError::Unsupported(format!(
                                "stage type {text:?} (only BOOST is supported)"
                            )));
                        }
                        Context::FeatureType if text != "HAAR" => {
                            return Err(DetectorInitError::Unsupported(format!(
                                "feature type {text:?} (only HAAR is supported)"
                            )));
                        }
                        Context::Width => window_width = parse_num(text, "cascade width")?,
                        Context::Height => window_height = parse_num(text, "cascade height")?,
                        Context::StageThreshold => {
                            last_mut(&mut stages, "stageThreshold outside a stage")?.threshold =
                                parse_num(text, "stage threshold")?;
                        }
                        Context::InternalNodes => {
                            pending_stump = Some(parse_internal_nodes(text)?);
                        }
                        Context::LeafValues => {
                            let (feature, threshold) = pending_stump.take().ok_or_else(|| {
                                DetectorInitError::Malformed(
                                    "leafValues without internalNodes".into(),
                                )
                            })?;
                            let leaves: Vec<f32> = parse_all(text, "leaf values")?;
                            if leaves.len() != 2 {
                                return Err(DetectorInitError::Unsupported(format!(
                                    "{} leaf values per weak classifier (stumps require 2)",
                                    leaves.len()
                                )));
                            }
                            last_mut(&mut stages, "weak classifier outside a stage")?
                                .stumps
                                .push(Stump {
                                    feature,
                                    threshold,
                                    below: leaves[0],
                                    above: leaves[1],
                                });
                        }
                        Context::Rect => {
                            let feature =
                                last_mut(&mut features, "rect outside a feature")?;
                            feature.rects.push(parse_rect(text)?);
                        }
                        Context::Tilted if text != "0" => {
                            return Err(DetectorInitError::Unsupported(
                                "tilted haar features".into(),
                            ));
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        let cascade = Self {
            window_width,
            window_height,
            stages,
            features,
        };
        cascade.validate()?;
        Ok(cascade)
    }

    fn validate(&self) -> Result<(), DetectorInitError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(DetectorInitError::Malformed(
                "cascade window size missing or zero".into(),
            ));
        }
        if self.stages.is_empty() {
            return Err(DetectorInitError::Malformed("cascade has no stages".into()));
        }
        if self.features.is_empty() {
            return Err(DetectorInitError::Malformed(
                "cascade has no features".into(),
            ));
        }
        for (si, stage) in self.stages.iter().enumerate() {
            if stage.stumps.is_empty() {
                return Err(DetectorInitError::Malformed(format!(
                    "stage {si} has no weak classifiers"
                )));
            }
            for stump in &stage.stumps {
                if stump.feature >= self.features.len() {
                    return Err(DetectorInitError::Malformed(format!(
                        "stage {si} references feature {} of {}",
                        stump.feature,
                        self.features.len()
                    )));
                }
            }
        }
        for (fi, feature) in self.features.iter().enumerate() {
            if !(2..=3).contains(&feature.rects.len()) {
                return Err(DetectorInitError::Malformed(format!(
                    "feature {fi} has {} rects (expected 2 or 3)",
                    feature.rects.len()
                )));
            }
            for r in &feature.rects {
                if r.x + r.width > self.window_width || r.y + r.height > self.window_height {
                    return Err(DetectorInitError::Malformed(format!(
                        "feature {fi} rect exceeds the {}x{} window",
                        self.window_width, self.window_height
                    )));
                }
            }
        }
        Ok(())
    }

    /// Base detection window size (width, height).
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Run multi-scale detection over a grayscale image.
    ///
    /// Returns grouped regions; an image smaller than the base window
    /// yields no detections.
    pub fn detect(&self, gray: &GrayImage, opts: &DetectOptions) -> Vec<Region> {
        let (img_w, img_h) = gray.dimensions();
        if img_w < self.window_width || img_h < self.window_height {
            return Vec::new();
        }

        let integral = Integral::compute(gray);
        let mut hits = Vec::new();
        let mut factor = 1.0f64;

        loop {
            let win_w = (self.window_width as f64 * factor).round() as u32;
            let win_h = (self.window_height as f64 * factor).round() as u32;
            if win_w > img_w || win_h > img_h {
                break;
            }
            if win_w >= opts.min_size.0 && win_h >= opts.min_size.1 {
                let scaled = self.scale_features(factor, win_w, win_h);
                let step = (factor.round() as u32).max(1);
                let inv_area = 1.0 / (win_w as f64 * win_h as f64);

                let mut y = 0;
                while y + win_h <= img_h {
                    let mut x = 0;
                    while x + win_w <= img_w {
                        if self.eval_window(&integral, x, y, win_w, win_h, inv_area, &scaled) {
                            hits.push(Region::new(x, y, win_w, win_h));
                        }
                        x += step;
                    }
                    y += step;
                }
            }
            factor *= opts.scale_factor;
        }

        tracing::debug!(
            raw_hits = hits.len(),
            min_neighbors = opts.min_neighbors,
            "cascade scan complete"
        );
        group_regions(hits, opts.min_neighbors)
    }

    /// Scale feature rects to the current window size, rebalancing the
    /// first rect's weight so each feature still sums to zero over a
    /// uniform image after integer rounding.
    fn scale_features(&self, factor: f64, win_w: u32, win_h: u32) -> Vec<Vec<FeatureRect>> {
        self.features
            .iter()
            .map(|feature| {
                let mut rects: Vec<FeatureRect> = feature
                    .rects
                    .iter()
                    .map(|r| {
                        let x = (r.x as f64 * factor).round() as u32;
                        let y = (r.y as f64 * factor).round() as u32;
                        let w = (r.width as f64 * factor).round() as u32;
                        let h = (r.height as f64 * factor).round() as u32;
                        FeatureRect {
                            x: x.min(win_w),
                            y: y.min(win_h),
                            width: w.min(win_w.saturating_sub(x.min(win_w))),
                            height: h.min(win_h.saturating_sub(y.min(win_h))),
                            weight: r.weight,
                        }
                    })
                    .collect();

                let area0 = (rects[0].width * rects[0].height) as f64;
                if area0 == 0.0 {
                    // Degenerate at this scale; the feature contributes nothing.
                    return Vec::new();
                }
                let rest: f64 = rects[1..]
                    .iter()
                    .map(|r| r.weight as f64 * (r.width * r.height) as f64)
                    .sum();
                rects[0].weight = (-rest / area0) as f32;
                rects
            })
            .collect()
    }

    /// Evaluate every stage at one window position. Early-rejects on the
    /// first failing stage.
    #[allow(clippy::too_many_arguments)]
    fn eval_window(
        &self,
        integral: &Integral,
        x: u32,
        y: u32,
        win_w: u32,
        win_h: u32,
        inv_area: f64,
        scaled: &[Vec<FeatureRect>],
    ) -> bool {
        let sum = integral.rect_sum(x, y, win_w, win_h) as f64;
        let sq_sum = integral.rect_sq_sum(x, y, win_w, win_h) as f64;
        let mean = sum * inv_area;
        let variance = sq_sum * inv_area - mean * mean;
        let norm = if variance > 0.0 { variance.sqrt() } else { 1.0 };

        for stage in &self.stages {
            let mut score = 0.0f64;
            for stump in &stage.stumps {
                let rects = &scaled[stump.feature];
                let mut value = 0.0f64;
                for r in rects {
                    value += r.weight as f64
                        * integral.rect_sum(x + r.x, y + r.y, r.width, r.height) as f64;
                }
                value *= inv_area;
                score += if value < stump.threshold as f64 * norm {
                    stump.below as f64
                } else {
                    stump.above as f64
                };
            }
            if score < stage.threshold as f64 {
                return false;
            }
        }
        true
    }
}

/// Summed-area tables for pixel values and squared pixel values.
struct Integral {
    stride: usize,
    sum: Vec<u64>,
    sq_sum: Vec<u64>,
}

impl Integral {
    fn compute(gray: &GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let (w, h) = (w as usize, h as usize);
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut sq_sum = vec![0u64; stride * (h + 1)];

        let data = gray.as_raw();
        for y in 0..h {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let v = data[y * w + x] as u64;
                row += v;
                row_sq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row;
                sq_sum[(y + 1) * stride + x + 1] = sq_sum[y * stride + x + 1] + row_sq;
            }
        }
        Self { stride, sum, sq_sum }
    }

    fn rect_sum(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        lookup(&self.sum, self.stride, x, y, w, h)
    }

    fn rect_sq_sum(&self, x: u32, y: u32, w: u32, h: u32) -> u64 {
        lookup(&self.sq_sum, self.stride, x, y, w, h)
    }
}

fn lookup(table: &[u64], stride: usize, x: u32, y: u32, w: u32, h: u32) -> u64 {
    let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
    let a = table[y * stride + x];
    let b = table[y * stride + x + w];
    let c = table[(y + h) * stride + x];
    let d = table[(y + h) * stride + x + w];
    d + a - b - c
}

/// Cluster raw hits into averaged regions, dropping clusters with at most
/// `min_neighbors` members. `min_neighbors == 0` returns the raw hits.
fn group_regions(hits: Vec<Region>, min_neighbors: u32) -> Vec<Region> {
    if min_neighbors == 0 || hits.is_empty() {
        return hits;
    }

    // Union-find partition over rectangle similarity.
    let mut parent: Vec<usize> = (0..hits.len()).collect();
    fn find(parent: &mut Vec<usize>, mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }
    for i in 0..hits.len() {
        for j in (i + 1)..hits.len() {
            if similar(&hits[i], &hits[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[ri] = rj;
                }
            }
        }
    }

    // Accumulate (count, Σx, Σy, Σw, Σh) per cluster root.
    let mut clusters: std::collections::HashMap<usize, (u64, u64, u64, u64, u64)> =
        std::collections::HashMap::new();
    for i in 0..hits.len() {
        let root = find(&mut parent, i);
        let entry = clusters.entry(root).or_default();
        entry.0 += 1;
        entry.1 += hits[i].x as u64;
        entry.2 += hits[i].y as u64;
        entry.3 += hits[i].width as u64;
        entry.4 += hits[i].height as u64;
    }

    let mut grouped: Vec<Region> = clusters
        .into_values()
        .filter(|(n, ..)| *n > min_neighbors as u64)
        .map(|(n, sx, sy, sw, sh)| {
            let avg = |v: u64| ((v as f64 / n as f64).round()) as u32;
            Region::new(avg(sx), avg(sy), avg(sw), avg(sh))
        })
        .collect();
    // Deterministic output order regardless of hash iteration.
    grouped.sort_by_key(|r| (r.y, r.x, r.width, r.height));
    grouped
}

/// OpenCV `groupRectangles` similarity: all four edges within a tolerance
/// proportional to the smaller of the two windows.
fn similar(a: &Region, b: &Region) -> bool {
    let delta = GROUP_EPS * 0.5 * (a.width.min(b.width) + a.height.min(b.height)) as f64;
    let close = |p: u32, q: u32| (p as f64 - q as f64).abs() <= delta;
    close(a.x, b.x)
        && close(a.y, b.y)
        && close(a.x + a.width, b.x + b.width)
        && close(a.y + a.height, b.y + b.height)
}

fn tail(path: &[String]) -> Option<&str> {
    path.last().map(String::as_str)
}

/// What a text node means, judged by the element path around it.
enum Context {
    StageType,
    FeatureType,
    Width,
    Height,
    StageThreshold,
    InternalNodes,
    LeafValues,
    Rect,
    Tilted,
    Other,
}

fn context(path: &[String]) -> Context {
    let under_cascade = path.len() >= 2 && path[path.len() - 2] == "cascade";
    match tail(path) {
        Some("stageType") => Context::StageType,
        Some("featureType") => Context::FeatureType,
        Some("width") if under_cascade => Context::Width,
        Some("height") if under_cascade => Context::Height,
        Some("stageThreshold") => Context::StageThreshold,
        Some("internalNodes") => Context::InternalNodes,
        Some("leafValues") => Context::LeafValues,
        Some("tilted") => Context::Tilted,
        Some("_") if path.len() >= 2 && path[path.len() - 2] == "rects" => Context::Rect,
        _ => Context::Other,
    }
}

fn last_mut<'a, T>(items: &'a mut [T], what: &str) -> Result<&'a mut T, DetectorInitError> {
    items
        .last_mut()
        .ok_or_else(|| DetectorInitError::Malformed(what.into()))
}

fn parse_num<T: std::str::FromStr>(text: &str, what: &str) -> Result<T, DetectorInitError> {
    text.parse()
        .map_err(|_| DetectorInitError::Malformed(format!("bad {what}: {text:?}")))
}

fn parse_all<T: std::str::FromStr>(text: &str, what: &str) -> Result<Vec<T>, DetectorInitError> {
    text.split_whitespace()
        .map(|tok| parse_num(tok, what))
        .collect()
}

/// `internalNodes` is four tokens for a stump: left child, right child,
/// feature index, threshold. Deeper trees are not supported.
fn parse_internal_nodes(text: &str) -> Result<(usize, f32), DetectorInitError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 4 {
        return Err(DetectorInitError::Unsupported(format!(
            "weak classifier with {} node values (only depth-1 stumps are supported)",
            tokens.len()
        )));
    }
    let left: i32 = parse_num(tokens[0], "internal node")?;
    let right: i32 = parse_num(tokens[1], "internal node")?;
    if left != 0 || right != -1 {
        return Err(DetectorInitError::Unsupported(
            "weak classifier with non-leaf children".into(),
        ));
    }
    Ok((
        parse_num(tokens[2], "feature index")?,
        parse_num(tokens[3], "node threshold")?,
    ))
}

/// A feature rect line: `x y w h weight`.
fn parse_rect(text: &str) -> Result<FeatureRect, DetectorInitError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() != 5 {
        return Err(DetectorInitError::Malformed(format!(
            "bad feature rect: {text:?}"
        )));
    }
    Ok(FeatureRect {
        x: parse_num(tokens[0], "rect x")?,
        y: parse_num(tokens[1], "rect y")?,
        width: parse_num(tokens[2], "rect width")?,
        height: parse_num(tokens[3], "rect height")?,
        weight: parse_num(tokens[4], "rect weight")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// A single-stage cascade over a 4x4 window whose one feature compares
    /// the top half of the window against the bottom half.
    fn mini_cascade_xml() -> String {
        r#"<?xml version="1.0"?>
<opencv_storage>
<cascade>
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>4</height>
  <width>4</width>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>5.0000000000000000e-01</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>0 -1 0 5.0000000000000000e-01</internalNodes>
          <leafValues>-1.0000000000000000e+00 1.0000000000000000e+00</leafValues>
        </_>
      </weakClassifiers>
    </_>
  </stages>
  <features>
    <_>
      <rects>
        <_>0 0 4 4 -1.</_>
        <_>0 0 4 2 2.</_>
      </rects>
      <tilted>0</tilted>
    </_>
  </features>
</cascade>
</opencv_storage>
"#
        .to_string()
    }

    #[test]
    fn test_parse_mini_cascade() {
        let cascade = HaarCascade::parse(&mini_cascade_xml()).unwrap();
        assert_eq!(cascade.window_size(), (4, 4));
        assert_eq!(cascade.stages.len(), 1);
        assert_eq!(cascade.stages[0].stumps.len(), 1);
        assert_eq!(cascade.features.len(), 1);
        assert_eq!(cascade.features[0].rects.len(), 2);
        assert!((cascade.features[0].rects[0].weight + 1.0).abs() < 1e-6);
        assert!((cascade.stages[0].threshold - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_rejects_tilted_features() {
        let xml = mini_cascade_xml().replace("<tilted>0</tilted>", "<tilted>1</tilted>");
        let err = HaarCascade::parse(&xml).unwrap_err();
        assert!(matches!(err, DetectorInitError::Unsupported(_)));
    }

    #[test]
    fn test_parse_rejects_non_stump_trees() {
        let xml = mini_cascade_xml().replace(
            "0 -1 0 5.0000000000000000e-01",
            "1 2 0 5.0e-01 -1 -2 0 1.0e-01",
        );
        let err = HaarCascade::parse(&xml).unwrap_err();
        assert!(matches!(err, DetectorInitError::Unsupported(_)));
    }

    #[test]
    fn test_parse_rejects_lbp_cascade() {
        let xml = mini_cascade_xml().replace("HAAR", "LBP");
        let err = HaarCascade::parse(&xml).unwrap_err();
        assert!(matches!(err, DetectorInitError::Unsupported(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = HaarCascade::parse("<not><a>cascade</a></not>").unwrap_err();
        assert!(matches!(err, DetectorInitError::Malformed(_)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = HaarCascade::from_file(Path::new("/nonexistent/cascade.xml")).unwrap_err();
        assert!(matches!(err, DetectorInitError::NotFound(_)));
    }

    fn raw_options() -> DetectOptions {
        DetectOptions {
            scale_factor: 1.2,
            min_neighbors: 0,
            min_size: (0, 0),
        }
    }

    #[test]
    fn test_detect_fires_on_top_bright_windows() {
        let cascade = HaarCascade::parse(&mini_cascade_xml()).unwrap();
        // Top half bright, bottom half dark: windows straddling the
        // boundary have a strongly positive top-minus-bottom response.
        let img = GrayImage::from_fn(8, 8, |_, y| Luma([if y < 4 { 255 } else { 0 }]));
        let hits = cascade.detect(&img, &raw_options());
        assert!(!hits.is_empty());
        // The straddling window at (0, 2) must be among the hits.
        assert!(hits.contains(&Region::new(0, 2, 4, 4)));
    }

    #[test]
    fn test_detect_quiet_on_uniform_image() {
        let cascade = HaarCascade::parse(&mini_cascade_xml()).unwrap();
        let img = GrayImage::from_pixel(8, 8, Luma([128]));
        let hits = cascade.detect(&img, &raw_options());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_detect_image_smaller_than_window() {
        let cascade = HaarCascade::parse(&mini_cascade_xml()).unwrap();
        let img = GrayImage::from_pixel(3, 3, Luma([255]));
        assert!(cascade.detect(&img, &raw_options()).is_empty());
    }

    #[test]
    fn test_min_size_skips_small_scales() {
        let cascade = HaarCascade::parse(&mini_cascade_xml()).unwrap();
        let img = GrayImage::from_fn(8, 8, |_, y| Luma([if y < 4 { 255 } else { 0 }]));
        let opts = DetectOptions {
            min_size: (6, 6),
            ..raw_options()
        };
        // The only populated scales are 4x4 (skipped) and ~5x5, 6x6, 7x7.
        let hits = cascade.detect(&img, &opts);
        assert!(hits.iter().all(|r| r.width >= 6 && r.height >= 6));
    }

    #[test]
    fn test_integral_rect_sums() {
        let img = GrayImage::from_fn(4, 3, |x, y| Luma([(y * 4 + x) as u8]));
        let integral = Integral::compute(&img);
        assert_eq!(integral.rect_sum(0, 0, 4, 3), (0..12).sum::<u64>());
        assert_eq!(integral.rect_sum(1, 1, 2, 2), 5 + 6 + 9 + 10);
        assert_eq!(integral.rect_sq_sum(1, 1, 2, 1), 25 + 36);
    }

    #[test]
    fn test_group_drops_sparse_clusters() {
        let mut hits = vec![Region::new(10, 10, 20, 20); 4];
        hits.push(Region::new(100, 100, 20, 20)); // lone hit elsewhere
        let grouped = group_regions(hits, 3);
        assert_eq!(grouped, vec![Region::new(10, 10, 20, 20)]);
    }

    #[test]
    fn test_group_requires_strictly_more_than_min_neighbors() {
        let hits = vec![Region::new(10, 10, 20, 20); 3];
        assert!(group_regions(hits.clone(), 3).is_empty());
        assert_eq!(group_regions(hits, 2).len(), 1);
    }

    #[test]
    fn test_group_averages_cluster_members() {
        let hits = vec![
            Region::new(10, 10, 20, 20),
            Region::new(12, 10, 20, 20),
            Region::new(11, 12, 20, 20),
            Region::new(11, 11, 20, 20),
        ];
        let grouped = group_regions(hits, 3);
        assert_eq!(grouped, vec![Region::new(11, 11, 20, 20)]);
    }

    #[test]
    fn test_group_zero_neighbors_returns_raw_hits() {
        let hits = vec![Region::new(1, 1, 4, 4), Region::new(2, 1, 4, 4)];
        assert_eq!(group_regions(hits.clone(), 0), hits);
    }
}

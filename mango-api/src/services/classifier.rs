//! Severity model inference
//!
//! Wraps the frozen ONNX severity model: decodes an uploaded image,
//! normalizes it to the model input (224×224 RGB, NCHW, scaled to
//! [0, 1]), and turns the logits into a ranked class distribution in
//! percent. The confidence-based background override lives here too.

use crate::models::{ImagePrediction, RunnerUp, SeverityClass};
use mango_common::{Error, Result};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;

/// Model input edge size (matches the training transform)
pub const INPUT_SIZE: u32 = 224;

/// Background predictions below this confidence (percent) are discarded
/// and the runner-up class promoted
pub const BACKGROUND_CONFIDENCE_THRESHOLD: f32 = 95.0;

/// One entry of a ranked class distribution, confidence in percent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    pub class: SeverityClass,
    pub confidence: f32,
}

/// Severity model seam
///
/// The orchestrator depends on this trait rather than on the concrete
/// ONNX session so transport-level tests can substitute a stub model.
pub trait SeverityModel: Send + Sync {
    /// Classify one image
    ///
    /// Returns the full (class, confidence) distribution sorted
    /// descending by confidence, percentages summing to 100. At least
    /// the top two entries are present for a 5-class model.
    fn classify(&self, image_bytes: &[u8]) -> Result<Vec<ClassScore>>;
}

/// ONNX-backed severity classifier
///
/// The session is created once at startup and shared read-only for the
/// process lifetime; running it takes `&mut`, so access is serialized
/// behind a mutex.
pub struct OnnxClassifier {
    session: Mutex<Session>,
}

impl OnnxClassifier {
    /// Load and validate the frozen weights
    ///
    /// A failure here is fatal: the service must not accept traffic
    /// without a usable model.
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::Model(format!(
                "model weights not found: {}",
                model_path.display()
            )));
        }

        let _ = ort::init().with_name("mango-api").commit();

        let session = Session::builder()
            .map_err(|e| Error::Model(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Model(format!("failed to set optimization level: {}", e)))?
            .with_intra_threads(4)
            .map_err(|e| Error::Model(format!("failed to set intra threads: {}", e)))?
            .with_execution_providers([
                ort::execution_providers::CPUExecutionProvider::default().build(),
            ])
            .map_err(|e| Error::Model(format!("failed to register execution provider: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| {
                Error::Model(format!(
                    "failed to load ONNX model {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl SeverityModel for OnnxClassifier {
    fn classify(&self, image_bytes: &[u8]) -> Result<Vec<ClassScore>> {
        let tensor = decode_and_preprocess(image_bytes)?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Internal("model session mutex poisoned".to_string()))?;
        run_inference(&mut session, tensor)
    }
}

/// Decode image bytes and normalize to the model input tensor
///
/// Malformed bytes fail with a decode error that surfaces to the caller;
/// they never abort the process.
pub fn decode_and_preprocess(image_bytes: &[u8]) -> Result<Array4<f32>> {
    let img = image::load_from_memory(image_bytes).map_err(|e| Error::Decode(e.to_string()))?;

    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();

    // HWC → CHW, pixels scaled to [0, 1]
    let hw = (INPUT_SIZE * INPUT_SIZE) as usize;
    let raw = rgb.into_raw();
    let mut data = vec![0f32; 3 * hw];
    for (i, pixel) in raw.chunks_exact(3).enumerate() {
        data[i] = pixel[0] as f32 / 255.0;
        data[hw + i] = pixel[1] as f32 / 255.0;
        data[2 * hw + i] = pixel[2] as f32 / 255.0;
    }

    Array4::from_shape_vec((1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize), data)
        .map_err(|e| Error::Internal(format!("failed to create input tensor: {}", e)))
}

fn run_inference(session: &mut Session, input: Array4<f32>) -> Result<Vec<ClassScore>> {
    let input_name = session.inputs()[0].name().to_string();

    let input_tensor = Value::from_array(input)
        .map_err(|e| Error::Model(format!("failed to create tensor value: {}", e)))?;

    let outputs = session
        .run(ort::inputs![input_name.as_str() => input_tensor])
        .map_err(|e| Error::Model(format!("inference failed: {}", e)))?;

    let output_value = outputs
        .values()
        .next()
        .ok_or_else(|| Error::Model("model produced no outputs".to_string()))?;

    let (_, logits) = output_value
        .try_extract_tensor::<f32>()
        .map_err(|e| Error::Model(format!("failed to extract output tensor: {}", e)))?;

    rank_logits(logits)
}

/// Softmax over the logits, paired with the class list and sorted
/// descending; confidences are percentages summing to 100
///
/// A 4-class model variant simply yields no Background entry, which
/// makes the override rule a no-op downstream.
pub fn rank_logits(logits: &[f32]) -> Result<Vec<ClassScore>> {
    if logits.is_empty() || logits.len() > SeverityClass::MODEL_OUTPUT.len() {
        return Err(Error::Model(format!(
            "unexpected model output width: {}",
            logits.len()
        )));
    }

    let max_logit = logits.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();

    let mut scores: Vec<ClassScore> = logits
        .iter()
        .zip(SeverityClass::MODEL_OUTPUT)
        .map(|(&logit, class)| ClassScore {
            class,
            confidence: (logit - max_logit).exp() / exp_sum * 100.0,
        })
        .collect();

    scores.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(scores)
}

/// Apply the background override rule to a ranked distribution
///
/// A Background top-1 below the threshold is discarded and the runner-up
/// promoted with its own confidence; at or above the threshold the
/// Background prediction stands and the batch later short-circuits.
pub fn effective_prediction(index: usize, ranked: &[ClassScore]) -> Result<ImagePrediction> {
    let top = ranked
        .first()
        .ok_or_else(|| Error::Model("empty class distribution".to_string()))?;

    if top.class.is_background() && top.confidence < BACKGROUND_CONFIDENCE_THRESHOLD {
        if let Some(second) = ranked.get(1) {
            return Ok(ImagePrediction {
                index,
                class: second.class,
                confidence: second.confidence,
                runner_up: ranked.get(2).map(|s| RunnerUp {
                    class: s.class,
                    confidence: s.confidence,
                }),
            });
        }
    }

    Ok(ImagePrediction {
        index,
        class: top.class,
        confidence: top.confidence,
        runner_up: ranked.get(1).map(|s| RunnerUp {
            class: s.class,
            confidence: s.confidence,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(class: SeverityClass, confidence: f32) -> ClassScore {
        ClassScore { class, confidence }
    }

    #[test]
    fn preprocess_produces_nchw_tensor() {
        let mut png = Vec::new();
        let img = image::RgbImage::from_pixel(64, 48, image::Rgb([255, 128, 0]));
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let tensor = decode_and_preprocess(&png).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        // Red channel is full scale, green half, blue zero
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 100, 100]] - 128.0 / 255.0).abs() < 1e-2);
        assert!(tensor[[0, 2, 223, 223]].abs() < 1e-6);
    }

    #[test]
    fn malformed_bytes_fail_with_decode_error() {
        let err = decode_and_preprocess(b"not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn ranked_confidences_sum_to_hundred_and_descend() {
        let ranked = rank_logits(&[0.1, 2.5, -1.0, 0.7, 1.3]).unwrap();
        assert_eq!(ranked.len(), 5);
        let total: f32 = ranked.iter().map(|s| s.confidence).sum();
        assert!((total - 100.0).abs() < 1e-3);
        for pair in ranked.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        assert_eq!(ranked[0].class, SeverityClass::Mild);
    }

    #[test]
    fn four_logit_output_has_no_background_entry() {
        let ranked = rank_logits(&[0.2, 0.1, 3.0, 0.4]).unwrap();
        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|s| !s.class.is_background()));
    }

    #[test]
    fn oversized_output_is_rejected() {
        assert!(rank_logits(&[0.0; 6]).is_err());
        assert!(rank_logits(&[]).is_err());
    }

    #[test]
    fn low_confidence_background_promotes_runner_up() {
        let ranked = vec![
            score(SeverityClass::Background, 80.0),
            score(SeverityClass::Mild, 20.0),
        ];
        let prediction = effective_prediction(3, &ranked).unwrap();
        assert_eq!(prediction.index, 3);
        assert_eq!(prediction.class, SeverityClass::Mild);
        assert_eq!(prediction.confidence, 20.0);
    }

    #[test]
    fn confident_background_stands() {
        let ranked = vec![
            score(SeverityClass::Background, 97.0),
            score(SeverityClass::Healthy, 3.0),
        ];
        let prediction = effective_prediction(0, &ranked).unwrap();
        assert_eq!(prediction.class, SeverityClass::Background);
        assert_eq!(prediction.confidence, 97.0);
    }

    #[test]
    fn threshold_is_exclusive_below() {
        // Exactly at the threshold the background prediction stands.
        let ranked = vec![
            score(SeverityClass::Background, BACKGROUND_CONFIDENCE_THRESHOLD),
            score(SeverityClass::Moderate, 5.0),
        ];
        let prediction = effective_prediction(0, &ranked).unwrap();
        assert_eq!(prediction.class, SeverityClass::Background);
    }

    #[test]
    fn non_background_top_is_used_directly() {
        let ranked = vec![
            score(SeverityClass::Severe, 88.0),
            score(SeverityClass::Moderate, 10.0),
            score(SeverityClass::Mild, 2.0),
        ];
        let prediction = effective_prediction(1, &ranked).unwrap();
        assert_eq!(prediction.class, SeverityClass::Severe);
        let runner_up = prediction.runner_up.unwrap();
        assert_eq!(runner_up.class, SeverityClass::Moderate);
        assert!(prediction.confidence >= runner_up.confidence);
    }
}

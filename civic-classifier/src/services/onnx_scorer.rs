//! ONNX Runtime image scorer
//!
//! Loads the exported issue photo model (`[1, 3, H, W]` float input,
//! `[1, 4]` logits output) and runs it on CPU.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::services::image_scorer::{ImageScorer, ScorerError};
use crate::services::preprocessing::ImageTensor;

pub struct OnnxImageScorer {
    // Session::run needs exclusive access
    session: Mutex<Session>,
    model_path: PathBuf,
}

fn open_session(model_path: &Path) -> ort::Result<Session> {
    let session = Session::builder()?.commit_from_file(model_path)?;
    Ok(session)
}

impl OnnxImageScorer {
    pub fn load(model_path: &Path) -> Result<Self, ScorerError> {
        if !model_path.exists() {
            return Err(ScorerError::Load(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        let session = open_session(model_path).map_err(|e| ScorerError::Load(e.to_string()))?;

        info!(model = %model_path.display(), "loaded image classification model");
        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
        })
    }
}

impl ImageScorer for OnnxImageScorer {
    fn logits(&self, input: &ImageTensor) -> Result<Vec<f32>, ScorerError> {
        let [n, c, h, w] = input.shape();
        let shape = [n as i64, c as i64, h as i64, w as i64];
        let tensor = Tensor::from_array((shape, input.data().to_vec().into_boxed_slice()))
            .map_err(|e| ScorerError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ScorerError::Inference("model session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| ScorerError::Inference(e.to_string()))?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ScorerError::Inference(e.to_string()))?;

        Ok(data.to_vec())
    }

    fn describe(&self) -> String {
        format!("onnx:{}", self.model_path.display())
    }
}

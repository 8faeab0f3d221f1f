use std::path::Path;

use candle_core::{DType, Device, Module, Tensor, D};
use candle_nn::Linear;
use tracing::{debug, info};

use crate::emotion::Emotion;
use crate::error::{Error, Result};
use crate::vectorizer::CountVectorizer;

pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

const BATCH_SIZE: usize = 64;

/// Linear emotion head over bag-of-words counts.
pub struct EmotionClassifier {
    vectorizer: CountVectorizer,
    head: Linear,
    device: Device,
}

impl EmotionClassifier {
    /// Loads `vocabulary.json` and `model.safetensors` (tensors `weight` and `bias`) from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let device = Device::Cpu;
        let vectorizer = CountVectorizer::from_json_file(&model_dir.join(VOCABULARY_FILE))?;

        let weights_path = model_dir.join(WEIGHTS_FILE);
        let mut tensors = candle_core::safetensors::load(&weights_path, &device)?;
        let mut take = |name: &str| {
            tensors.remove(name).ok_or_else(|| {
                Error::InvalidModel(format!("{} has no `{}` tensor", weights_path.display(), name))
            })
        };
        let weight = take("weight")?;
        let bias = take("bias")?;

        let classifier = Self::new(vectorizer, weight, bias)?;
        info!(
            model_dir = %model_dir.display(),
            features = classifier.vectorizer.n_features(),
            "loaded emotion classifier"
        );
        Ok(classifier)
    }

    pub fn new(vectorizer: CountVectorizer, weight: Tensor, bias: Tensor) -> Result<Self> {
        let classes = Emotion::ALL.len();
        let features = vectorizer.n_features();

        if weight.dims() != [classes, features] {
            return Err(Error::InvalidModel(format!(
                "weight has shape {:?}, expected [{}, {}]",
                weight.dims(),
                classes,
                features
            )));
        }
        if bias.dims() != [classes] {
            return Err(Error::InvalidModel(format!(
                "bias has shape {:?}, expected [{}]",
                bias.dims(),
                classes
            )));
        }

        let device = weight.device().clone();
        let weight = weight.to_dtype(DType::F32)?;
        let bias = bias.to_dtype(DType::F32)?.to_device(&device)?;

        Ok(Self {
            vectorizer,
            head: Linear::new(weight, Some(bias)),
            device,
        })
    }

    /// One label per review, in input order.
    pub fn predict<S: AsRef<str>>(&self, reviews: &[S]) -> Result<Vec<Emotion>> {
        let mut emotions = Vec::with_capacity(reviews.len());
        let features = self.vectorizer.n_features();

        for batch in reviews.chunks(BATCH_SIZE) {
            let counts = self.vectorizer.transform(batch);
            let input = Tensor::from_vec(counts, (batch.len(), features), &self.device)?;
            let logits = self.head.forward(&input)?;
            let labels = logits.argmax(D::Minus1)?.to_vec1::<u32>()?;
            for label in labels {
                emotions.push(Emotion::from_index(label as usize)?);
            }
        }

        debug!(count = emotions.len(), "classified reviews");
        Ok(emotions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;

    // hate=0, love=1, scared=2, wow=3
    fn toy_head() -> (CountVectorizer, Tensor, Tensor) {
        let vectorizer = CountVectorizer::from_terms(["hate", "love", "scared", "wow"]).unwrap();
        #[rustfmt::skip]
        let weight = Tensor::from_vec(
            vec![
                0.0f32, 0.0, 0.0, 0.0, // sadness
                0.0,    0.5, 0.0, 0.0, // joy
                0.0,    1.0, 0.0, 0.0, // love
                2.0,    0.0, 0.0, 0.0, // anger
                0.0,    0.0, 2.0, 0.0, // fear
                0.0,    0.0, 0.0, 2.0, // surprise
            ],
            (6, 4),
            &Device::Cpu,
        )
        .unwrap();
        let bias = Tensor::from_vec(vec![0.1f32, 0.0, 0.0, 0.0, 0.0, 0.0], 6, &Device::Cpu).unwrap();
        (vectorizer, weight, bias)
    }

    #[test]
    fn picks_highest_scoring_label() {
        let (vectorizer, weight, bias) = toy_head();
        let classifier = EmotionClassifier::new(vectorizer, weight, bias).unwrap();

        let emotions = classifier
            .predict(&[
                "I love love this",
                "I hate the shipping",
                "Scared of the sizing",
                "wow!",
                "nothing recognisable here",
            ])
            .unwrap();
        assert_eq!(
            emotions,
            vec![
                Emotion::Love,
                Emotion::Anger,
                Emotion::Fear,
                Emotion::Surprise,
                Emotion::Sadness,
            ]
        );
    }

    #[test]
    fn empty_input_predicts_nothing() {
        let (vectorizer, weight, bias) = toy_head();
        let classifier = EmotionClassifier::new(vectorizer, weight, bias).unwrap();
        let reviews: Vec<String> = Vec::new();
        assert!(classifier.predict(&reviews).unwrap().is_empty());
    }

    #[test]
    fn predicts_across_batches() {
        let (vectorizer, weight, bias) = toy_head();
        let classifier = EmotionClassifier::new(vectorizer, weight, bias).unwrap();
        let reviews: Vec<String> = (0..150)
            .map(|i| if i % 2 == 0 { "wow".to_string() } else { "hate".to_string() })
            .collect();

        let emotions = classifier.predict(&reviews).unwrap();
        assert_eq!(emotions.len(), 150);
        assert_eq!(emotions[0], Emotion::Surprise);
        assert_eq!(emotions[149], Emotion::Anger);
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let (vectorizer, _, bias) = toy_head();
        let narrow = Tensor::zeros((6, 3), DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            EmotionClassifier::new(vectorizer.clone(), narrow, bias),
            Err(Error::InvalidModel(_))
        ));

        let (_, weight, _) = toy_head();
        let short_bias = Tensor::zeros(5, DType::F32, &Device::Cpu).unwrap();
        assert!(matches!(
            EmotionClassifier::new(vectorizer, weight, short_bias),
            Err(Error::InvalidModel(_))
        ));
    }

    #[test]
    fn loads_model_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(VOCABULARY_FILE),
            r#"{"vocabulary": {"hate": 0, "love": 1, "scared": 2, "wow": 3}}"#,
        )
        .unwrap();

        let (_, weight, bias) = toy_head();
        let tensors = HashMap::from([
            ("weight".to_string(), weight.to_dtype(DType::F64).unwrap()),
            ("bias".to_string(), bias),
        ]);
        candle_core::safetensors::save(&tensors, dir.path().join(WEIGHTS_FILE)).unwrap();

        let classifier = EmotionClassifier::load(dir.path()).unwrap();
        assert_eq!(classifier.predict(&["so scared"]).unwrap(), vec![Emotion::Fear]);
    }

    #[test]
    fn missing_bias_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(VOCABULARY_FILE),
            r#"{"vocabulary": {"hate": 0, "love": 1, "scared": 2, "wow": 3}}"#,
        )
        .unwrap();
        let (_, weight, _) = toy_head();
        let tensors = HashMap::from([("weight".to_string(), weight)]);
        candle_core::safetensors::save(&tensors, dir.path().join(WEIGHTS_FILE)).unwrap();

        assert!(matches!(
            EmotionClassifier::load(dir.path()),
            Err(Error::InvalidModel(_))
        ));
    }
}

//! Provides the evaluation of embeddings against label anchors.
//!
//! An embedding is classified as the label whose word vector is most similar to it
//! (cosine similarity). For zero-shot classes this is the only way to predict them,
//! since the logits layer of the backbone has never seen them.
use std::fmt;

/// Cosine similarity of two vectors. Zero if one of them is the zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0f32, 0f32, 0f32);
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0f32 || norm_b == 0f32 {
        return 0f32;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Returns the index of the anchor that is most similar to `embedding`.
///
/// Ties are resolved in favour of the earlier anchor; `None` if there are no anchors.
pub fn nearest_label(embedding: &[f32], anchors: &[Vec<f32>]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, anchor) in anchors.iter().enumerate() {
        let similarity = cosine_similarity(embedding, anchor);
        match best {
            Some((_, best_similarity)) if best_similarity >= similarity => {}
            _ => best = Some((index, similarity)),
        }
    }
    best.map(|(index, _)| index)
}

/// A [ConfusionMatrix][wiki].
///
/// [wiki]: https://en.wikipedia.org/wiki/Confusion_matrix
#[derive(Debug)]
pub struct ConfusionMatrix {
    num_classes: usize,
    samples: Vec<Sample>,
}

impl ConfusionMatrix {
    /// Create a ConfusionMatrix that analyzes the prediction of `num_classes` classes.
    pub fn new(num_classes: usize) -> ConfusionMatrix {
        ConfusionMatrix {
            num_classes: num_classes,
            samples: Vec::new(),
        }
    }

    /// Add a sample by providing the expected `target` class and the `prediction`.
    pub fn add_sample(&mut self, prediction: usize, target: usize) {
        self.samples.push(Sample { prediction: prediction, target: target });
    }

    /// Returns the matrix of counts, indexed by `[target][prediction]`.
    pub fn matrix(&self) -> Vec<Vec<usize>> {
        let mut matrix = vec![vec![0; self.num_classes]; self.num_classes];
        for sample in &self.samples {
            if sample.target < self.num_classes && sample.prediction < self.num_classes {
                matrix[sample.target][sample.prediction] += 1;
            }
        }
        matrix
    }

    /// The accuracy of every target class, in class order.
    pub fn class_accuracies(&self) -> Vec<Accuracy> {
        self.matrix().iter().enumerate().map(|(target, row)| {
            Accuracy {
                num_samples: row.iter().sum(),
                num_correct: row[target],
            }
        }).collect()
    }

    /// Return the accuracy of the collected predictions.
    pub fn accuracy(&self) -> Accuracy {
        let num_samples = self.samples.len();
        let num_correct = self.samples.iter().filter(|s| s.correct()).count();
        Accuracy { num_samples: num_samples, num_correct: num_correct }
    }
}

/// A single prediction Sample.
#[derive(Debug, Clone, Copy)]
struct Sample {
    prediction: usize,
    target: usize,
}

impl Sample {
    fn correct(&self) -> bool {
        self.prediction == self.target
    }
}

#[derive(Debug, Clone, Copy)]
/// The accuracy of the predictions in a ConfusionMatrix.
///
/// Used to print the accuracy.
pub struct Accuracy {
    num_samples: usize,
    num_correct: usize,
}

impl Accuracy {
    /// Number of predictions.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// The share of correct predictions in percent, zero without samples.
    pub fn ratio(&self) -> f32 {
        if self.num_samples == 0 {
            return 0f32;
        }
        (self.num_correct as f32) / (self.num_samples as f32) * 100f32
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}/{:?} = {:.2?}%", self.num_correct, self.num_samples, self.ratio())
    }
}

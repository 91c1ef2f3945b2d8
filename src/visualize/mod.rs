//! Visualizes what a composite model has learned.
//!
//! A run has three strictly sequential phases:
//!
//! 1. **Inference**: the composite model is restored from a checkpoint and every image of
//!    the selected data is embedded. The embeddings are collected per normalized label
//!    in [EmbeddingPoints][points].
//! 2. **Reduction**: all embeddings, followed by the word vectors of all labels (the
//!    label anchors), are reduced to 2D in a single run of a
//!    [ManifoldReducer][reducer]. The result is split back into data points and anchor
//!    points by the [tag][tag] every point carries.
//! 3. **Rendering**: one plot per label, showing all anchors, the label's data points and
//!    its anchor. See [render][render].
//!
//! [points]: ./struct.EmbeddingPoints.html
//! [reducer]: ../manifold/trait.ManifoldReducer.html
//! [tag]: ./enum.PointTag.html
//! [render]: ./render/index.html
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;
use data::{BatchSource, DataSplits, SampleBatches};
use error::Error;
use evaluation::{nearest_label, ConfusionMatrix};
use manifold::{ManifoldReducer, Tsne};
use models::CompositeModel;
use util::{host_data, native_backend};
use weight::ParameterStore;
use word_vectors::{normalize_label, WordVectors};

pub use self::config::VisualizeConfig;
pub use self::render::{render_all, render_class, render_overview, ClassPlot};

pub mod config;
pub mod render;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Tells which kind of point a 2D position belongs to.
pub enum PointTag {
    /// The embedding of an image with the given label.
    Data(String),
    /// The anchor (word vector) of the given label.
    Label(String),
}

impl PointTag {
    /// The label the point belongs to.
    pub fn label(&self) -> &str {
        match *self {
            PointTag::Data(ref label) | PointTag::Label(ref label) => label,
        }
    }

    /// Returns true for label anchors.
    pub fn is_label(&self) -> bool {
        match *self {
            PointTag::Label(_) => true,
            PointTag::Data(_) => false,
        }
    }
}

impl fmt::Display for PointTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PointTag::Data(ref label) => write!(f, "{}", label),
            PointTag::Label(ref label) => write!(f, "LABEL-{}", label),
        }
    }
}

#[derive(Debug, Clone)]
/// Embeddings grouped by normalized label.
///
/// The labels keep the order in which they were given at construction; the points of a
/// label keep the order in which they were added.
pub struct EmbeddingPoints {
    labels: Vec<String>,
    points: HashMap<String, Vec<Vec<f32>>>,
}

impl EmbeddingPoints {
    /// Creates an empty collection for the given labels.
    pub fn new(all_labels: &[String]) -> EmbeddingPoints {
        let mut labels = Vec::new();
        let mut points = HashMap::new();
        for label in all_labels {
            let label = normalize_label(label);
            if !points.contains_key(&label) {
                points.insert(label.clone(), Vec::new());
                labels.push(label);
            }
        }
        EmbeddingPoints {
            labels: labels,
            points: points,
        }
    }

    /// Adds an embedding to its label.
    ///
    /// The label is normalized first; labels that were not given at construction are
    /// rejected.
    pub fn push(&mut self, label: &str, embedding: Vec<f32>) -> Result<(), Error> {
        let label = normalize_label(label);
        match self.points.get_mut(&label) {
            Some(points) => {
                points.push(embedding);
                Ok(())
            }
            None => Err(Error::UnknownLabel(label)),
        }
    }

    /// The normalized labels in construction order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The embeddings of a normalized label.
    pub fn points(&self, label: &str) -> &[Vec<f32>] {
        self.points.get(label).map(|points| &points[..]).unwrap_or(&[])
    }

    /// All embeddings with their tags, grouped by label in label order.
    pub fn tagged(&self) -> Vec<(PointTag, &[f32])> {
        let mut tagged = Vec::with_capacity(self.len());
        for label in &self.labels {
            for point in self.points(label) {
                tagged.push((PointTag::Data(label.clone()), &point[..]));
            }
        }
        tagged
    }

    /// The total number of embeddings.
    pub fn len(&self) -> usize {
        self.points.values().map(|points| points.len()).sum()
    }

    /// Returns true if no embedding was added.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A point of the 2D layout.
pub struct ProjectedPoint {
    /// What the point represents.
    pub tag: PointTag,
    /// The position in the layout.
    pub position: [f64; 2],
}

#[derive(Debug, Clone, Default, PartialEq)]
/// The 2D layout, split into data points and label anchors.
pub struct Projection {
    /// Positions of the embeddings, in the order they were reduced.
    pub data: Vec<ProjectedPoint>,
    /// Positions of the label anchors, in the order they were reduced.
    pub labels: Vec<ProjectedPoint>,
}

impl Projection {
    /// The data points of a label.
    pub fn data_of(&self, label: &str) -> Vec<[f64; 2]> {
        self.data.iter().filter(|point| point.tag.label() == label).map(|point| point.position).collect()
    }

    /// The anchor of a label.
    pub fn anchor_of(&self, label: &str) -> Option<[f64; 2]> {
        self.labels.iter().find(|point| point.tag.label() == label).map(|point| point.position)
    }

    /// The labels that have at least one data point, in order of first appearance.
    pub fn data_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for point in &self.data {
            if !labels.contains(&point.tag.label()) {
                labels.push(point.tag.label());
            }
        }
        labels
    }
}

/// Splits a reduced layout by tag, keeping the order within both parts.
pub fn split_by_tag(tags: Vec<PointTag>, layout: Vec<[f64; 2]>) -> Result<Projection, Error> {
    if tags.len() != layout.len() {
        return Err(Error::Reduction(format!("{} points were reduced to {} positions", tags.len(), layout.len())));
    }
    let mut projection = Projection::default();
    for (tag, position) in tags.into_iter().zip(layout.into_iter()) {
        let point = ProjectedPoint { tag: tag, position: position };
        if point.tag.is_label() {
            projection.labels.push(point);
        } else {
            projection.data.push(point);
        }
    }
    Ok(projection)
}

/// Looks up the anchor of every label, keyed by the normalized label.
pub fn label_anchors<W: WordVectors + ?Sized>(words: &W, all_labels: &[String]) -> Result<Vec<(String, Vec<f32>)>, Error> {
    let mut anchors: Vec<(String, Vec<f32>)> = Vec::new();
    for label in all_labels {
        let label = normalize_label(label);
        if anchors.iter().any(|&(ref known, _)| *known == label) {
            continue;
        }
        let vector = words.label_vector(&label)?;
        anchors.push((label, vector));
    }
    Ok(anchors)
}

/// Inference phase: embeds every image of `batches` and collects the embeddings by label.
pub fn collect_embeddings<S: BatchSource>(model: &CompositeModel, batches: S, all_labels: &[String]) -> Result<EmbeddingPoints, Error> {
    let mut points = EmbeddingPoints::new(all_labels);
    let word2vec_size = model.config().word2vec_size;
    for batch in batches {
        let batch = batch?;
        let embeddings = model.embed(&batch.images)?;
        let values = host_data(&embeddings)?;
        for (label, embedding) in batch.labels.iter().zip(values.chunks(word2vec_size)) {
            points.push(label, embedding.to_vec())?;
        }
        debug!("Embedded {} images", points.len());
    }
    Ok(points)
}

/// Reduction phase: reduces all embeddings followed by all anchors in one run.
pub fn project(points: &EmbeddingPoints, anchors: &[(String, Vec<f32>)], reducer: &dyn ManifoldReducer) -> Result<Projection, Error> {
    let mut tags = Vec::with_capacity(points.len() + anchors.len());
    let mut vectors = Vec::with_capacity(points.len() + anchors.len());
    for (tag, point) in points.tagged() {
        tags.push(tag);
        vectors.push(point.to_vec());
    }
    for &(ref label, ref anchor) in anchors {
        tags.push(PointTag::Label(label.clone()));
        vectors.push(anchor.clone());
    }
    let layout = reducer.reduce(&vectors)?;
    split_by_tag(tags, layout)
}

/// Classifies every embedding as its nearest anchor and collects the results.
pub fn anchor_accuracy(points: &EmbeddingPoints, anchors: &[(String, Vec<f32>)]) -> ConfusionMatrix {
    let anchor_vectors = anchors.iter().map(|&(_, ref vector)| vector.clone()).collect::<Vec<Vec<f32>>>();
    let mut matrix = ConfusionMatrix::new(anchors.len());
    for (tag, point) in points.tagged() {
        let target = anchors.iter().position(|&(ref label, _)| label == tag.label());
        if let (Some(prediction), Some(target)) = (nearest_label(point, &anchor_vectors), target) {
            matrix.add_sample(prediction, target);
        }
    }
    matrix
}

#[derive(Debug)]
/// Runs all phases of a visualization.
pub struct Visualizer {
    config: VisualizeConfig,
}

impl Visualizer {
    /// Creates a Visualizer for a complete configuration.
    pub fn new(config: VisualizeConfig) -> Result<Visualizer, Error> {
        config.validate()?;
        Ok(Visualizer { config: config })
    }

    /// The configuration of the run.
    pub fn config(&self) -> &VisualizeConfig {
        &self.config
    }

    /// Creates the batches over the selected subsets of `splits`.
    pub fn batches(&self, splits: &DataSplits) -> Result<SampleBatches, Error> {
        SampleBatches::new(splits.select(self.config.known_classes, self.config.zero_shot), self.config.batch_size)
    }

    /// Restores the composite model and embeds all images of `batches`.
    pub fn infer<S: BatchSource>(&self, batches: S, all_labels: &[String]) -> Result<EmbeddingPoints, Error> {
        let backend = Rc::new(native_backend());
        let mut store = ParameterStore::new();
        let model = CompositeModel::new(backend, &mut store, &self.config.composite_config())?;
        store.restore(self.config.checkpoint()?)?;
        collect_embeddings(&model, batches, all_labels)
    }

    /// Runs inference, reduction and rendering, and returns the paths of the written plots.
    pub fn run<S: BatchSource, W: WordVectors + ?Sized>(&self, batches: S, words: &W, all_labels: &[String]) -> Result<Vec<PathBuf>, Error> {
        let start = Instant::now();
        info!("Inference phase");
        let points = self.infer(batches, all_labels)?;
        let anchors = label_anchors(words, all_labels)?;
        info!("Embedded {} images in {:?}", points.len(), start.elapsed());
        let matrix = anchor_accuracy(&points, &anchors);
        info!("Nearest label accuracy: {}", matrix.accuracy());
        for (&(ref label, _), accuracy) in anchors.iter().zip(matrix.class_accuracies()) {
            if accuracy.num_samples() > 0 {
                debug!("Nearest label accuracy of {}: {}", label, accuracy);
            }
        }

        let start = Instant::now();
        info!("Reduction phase");
        let tsne = Tsne::from_config(&self.config.tsne);
        let projection = project(&points, &anchors, &tsne)?;
        info!("Reduced {} points in {:?}", projection.data.len() + projection.labels.len(), start.elapsed());

        let start = Instant::now();
        info!("Rendering phase");
        let written = render_all(&projection, self.config.output_folder()?)?;
        info!("Rendered {} plots in {:?}", written.len(), start.elapsed());
        Ok(written)
    }
}

//! Provides the configuration of a visualization run.
use std::path::{Path, PathBuf};
use error::Error;
use manifold::TsneConfig;
use models::{BackboneKind, CompositeConfig};

#[derive(Debug, Clone)]
/// Specifies everything a visualization run needs to know.
///
/// Constructed once at startup and passed to the [Visualizer][1].
/// [1]: ../struct.Visualizer.html
pub struct VisualizeConfig {
    /// Number of images embedded at once.
    ///
    /// Defaults to `128`
    pub batch_size: usize,
    /// The number of classes of the backbone's logits layer.
    ///
    /// Defaults to `60`
    pub num_classes: usize,
    /// The size of the word vectors.
    ///
    /// Defaults to `200`
    pub word2vec_size: usize,
    /// Width and height of the images.
    ///
    /// Defaults to `24`
    pub image_size: usize,
    /// The backbone of the composite model.
    ///
    /// Defaults to `BackboneKind::AlexNet`
    pub backbone: BackboneKind,
    /// The checkpoint of the trained composite model. Required; an empty path counts as
    /// not set.
    pub checkpoint_path: Option<PathBuf>,
    /// The folder the plots are written to. Required.
    pub output_folder: Option<PathBuf>,
    /// The file holding the [DataSplits][1].
    /// [1]: ../../data/struct.DataSplits.html
    pub data_path: Option<PathBuf>,
    /// The pickle file holding all class labels.
    pub labels_path: Option<PathBuf>,
    /// The word vectors in word2vec text format.
    pub word_vectors_path: Option<PathBuf>,
    /// Embed the test images of the classes the model was trained on.
    ///
    /// Defaults to `false`
    pub known_classes: bool,
    /// Embed the training and test images of the zero-shot classes.
    ///
    /// Defaults to `true`
    pub zero_shot: bool,
    /// Parameters of the t-SNE reduction.
    pub tsne: TsneConfig,
}

impl Default for VisualizeConfig {
    fn default() -> VisualizeConfig {
        VisualizeConfig {
            batch_size: 128,
            num_classes: 60,
            word2vec_size: 200,
            image_size: 24,
            backbone: BackboneKind::AlexNet,
            checkpoint_path: None,
            output_folder: None,
            data_path: None,
            labels_path: None,
            word_vectors_path: None,
            known_classes: false,
            zero_shot: true,
            tsne: TsneConfig::default(),
        }
    }
}

impl VisualizeConfig {
    /// Checks that the configuration is complete.
    ///
    /// A run must not start without a checkpoint or an output folder.
    pub fn validate(&self) -> Result<(), Error> {
        self.checkpoint()?;
        self.output_folder()?;
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size has to be positive".to_owned()));
        }
        if !self.known_classes && !self.zero_shot {
            return Err(Error::InvalidConfig("neither known classes nor zero-shot classes are selected".to_owned()));
        }
        Ok(())
    }

    /// The checkpoint path.
    pub fn checkpoint(&self) -> Result<&Path, Error> {
        required(&self.checkpoint_path, "checkpoint_path")
    }

    /// The output folder.
    pub fn output_folder(&self) -> Result<&Path, Error> {
        required(&self.output_folder, "output_folder")
    }

    /// The data splits path.
    pub fn data(&self) -> Result<&Path, Error> {
        required(&self.data_path, "data_path")
    }

    /// The label file path.
    pub fn labels(&self) -> Result<&Path, Error> {
        required(&self.labels_path, "labels_path")
    }

    /// The word vector file path.
    pub fn word_vectors(&self) -> Result<&Path, Error> {
        required(&self.word_vectors_path, "word_vectors_path")
    }

    /// The configuration of the composite model to restore.
    pub fn composite_config(&self) -> CompositeConfig {
        CompositeConfig {
            backbone: self.backbone,
            num_classes: self.num_classes,
            word2vec_size: self.word2vec_size,
            image_size: self.image_size,
        }
    }
}

fn required<'a>(path: &'a Option<PathBuf>, name: &str) -> Result<&'a Path, Error> {
    match *path {
        Some(ref path) if !path.as_os_str().is_empty() => Ok(path.as_path()),
        _ => {
            error!("{} is not set", name);
            Err(Error::InvalidConfig(format!("{} is not set", name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use super::VisualizeConfig;

    #[test]
    fn requires_checkpoint_and_output_folder() {
        let mut config = VisualizeConfig::default();
        assert!(config.validate().is_err());
        config.checkpoint_path = Some(PathBuf::from("model.capnp"));
        assert!(config.validate().is_err());
        config.output_folder = Some(PathBuf::from("plots"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_paths_count_as_unset() {
        let config = VisualizeConfig {
            checkpoint_path: Some(PathBuf::new()),
            output_folder: Some(PathBuf::from("plots")),
            ..VisualizeConfig::default()
        };
        assert!(config.checkpoint().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_select_zero_shot_classes() {
        let config = VisualizeConfig::default();
        assert!(!config.known_classes);
        assert!(config.zero_shot);
    }

    #[test]
    fn requires_a_data_subset() {
        let config = VisualizeConfig {
            checkpoint_path: Some(PathBuf::from("model.capnp")),
            output_folder: Some(PathBuf::from("plots")),
            known_classes: false,
            zero_shot: false,
            ..VisualizeConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

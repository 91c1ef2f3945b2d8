//! Provides the data the models are run on.
//!
//! Images are kept as [Sample][sample]s (a label and a CHW image) and handed to the
//! models in [Batch][batch]es by a [BatchSource][source]. The held-out data of an
//! experiment is stored as [DataSplits][splits]: test data of the classes that were
//! trained on, and data of the zero-shot classes that were never seen during training.
//!
//! [sample]: ./struct.Sample.html
//! [batch]: ./struct.Batch.html
//! [source]: ./trait.BatchSource.html
//! [splits]: ./struct.DataSplits.html
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use co::prelude::*;
use serde_pickle::{self, DeOptions, SerOptions};
use capnp_util::*;
use error::Error;
use lamina_capnp::data_splits as capnp_splits;
use lamina_capnp::sample as capnp_sample;
use util::host_tensor_from;

#[derive(Debug, Clone, PartialEq)]
/// A single labelled image.
pub struct Sample {
    /// The class label as it is stored, not normalized.
    pub label: String,
    /// The shape of the image, `[channels, height, width]`.
    pub shape: Vec<usize>,
    /// The pixel values in CHW order.
    pub pixels: Vec<f32>,
}

impl Sample {
    /// Creates a sample, checking that `pixels` fits `shape`.
    pub fn new(label: &str, shape: &[usize], pixels: Vec<f32>) -> Result<Sample, Error> {
        if shape.len() != 3 || shape.iter().fold(1, |prod, i| prod * i) != pixels.len() {
            return Err(Error::InvalidConfig(format!("{} pixels do not form an image of shape {:?}", pixels.len(), shape)));
        }
        Ok(Sample {
            label: label.to_owned(),
            shape: shape.to_owned(),
            pixels: pixels,
        })
    }
}

impl<'a> CapnpWrite<'a> for Sample {
    type Builder = capnp_sample::Builder<'a>;

    fn write_capnp(&self, builder: &mut Self::Builder) {
        builder.set_label(&self.label);
        TensorRecord::new(&self.shape, &self.pixels).write_capnp(&mut builder.borrow().init_image());
    }
}

impl<'a> CapnpRead<'a> for Sample {
    type Reader = capnp_sample::Reader<'a>;

    fn read_capnp(reader: Self::Reader) -> Result<Self, Error> {
        let image = TensorRecord::read_capnp(reader.get_image()?)?;
        Sample::new(reader.get_label()?, &image.shape, image.data)
    }
}

#[derive(Debug)]
/// A batch of images and their labels.
pub struct Batch {
    /// The images, `[batch, channels, height, width]`.
    pub images: SharedTensor<f32>,
    /// The label of every image, in batch order.
    pub labels: Vec<String>,
}

impl Batch {
    /// Stacks samples of equal shape into a batch.
    pub fn from_samples(samples: &[Sample]) -> Result<Batch, Error> {
        let first = match samples.first() {
            Some(sample) => sample,
            None => return Err(Error::InvalidConfig("cannot build an empty batch".to_owned())),
        };
        let mut pixels = Vec::with_capacity(samples.len() * first.pixels.len());
        for sample in samples {
            if sample.shape != first.shape {
                return Err(Error::InvalidConfig(format!("images of shape {:?} and {:?} in one batch", first.shape, sample.shape)));
            }
            pixels.extend_from_slice(&sample.pixels);
        }
        let mut shape = vec![samples.len()];
        shape.extend_from_slice(&first.shape);
        Ok(Batch {
            images: host_tensor_from(&shape, &pixels)?,
            labels: samples.iter().map(|sample| sample.label.clone()).collect(),
        })
    }

    /// The number of images in the batch.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if the batch holds no images.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A lazy sequence of batches.
///
/// Every source is consumed once; a new pass over the data needs a new source.
pub trait BatchSource: Iterator<Item = Result<Batch, Error>> {}

impl<I: Iterator<Item = Result<Batch, Error>>> BatchSource for I {}

#[derive(Debug, Clone)]
/// Batches over samples held in memory.
///
/// The last batch holds the remaining samples and may be smaller than the batch size.
pub struct SampleBatches {
    samples: Vec<Sample>,
    batch_size: usize,
    position: usize,
}

impl SampleBatches {
    /// Creates batches of `batch_size` samples.
    pub fn new(samples: Vec<Sample>, batch_size: usize) -> Result<SampleBatches, Error> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch size has to be positive".to_owned()));
        }
        Ok(SampleBatches {
            samples: samples,
            batch_size: batch_size,
            position: 0,
        })
    }
}

impl Iterator for SampleBatches {
    type Item = Result<Batch, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.samples.len() {
            return None;
        }
        let end = ::std::cmp::min(self.position + self.batch_size, self.samples.len());
        let batch = Batch::from_samples(&self.samples[self.position..end]);
        self.position = end;
        Some(batch)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// The held-out data of an experiment.
pub struct DataSplits {
    /// Test images of the classes the model was trained on.
    pub known_test: Vec<Sample>,
    /// Training images of the zero-shot classes.
    pub zero_shot_train: Vec<Sample>,
    /// Test images of the zero-shot classes.
    pub zero_shot_test: Vec<Sample>,
}

impl DataSplits {
    /// Returns the samples of the selected subsets.
    ///
    /// Known classes contribute their test data, zero-shot classes both their training
    /// and test data.
    pub fn select(&self, known_classes: bool, zero_shot: bool) -> Vec<Sample> {
        let mut samples = Vec::new();
        if known_classes {
            samples.extend_from_slice(&self.known_test);
        }
        if zero_shot {
            samples.extend_from_slice(&self.zero_shot_train);
            samples.extend_from_slice(&self.zero_shot_test);
        }
        samples
    }

    /// Read the data splits from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataSplits, Error> {
        let message_reader = read_message(path.as_ref())?;
        let splits = DataSplits::read_capnp(message_reader.get_root::<capnp_splits::Reader>()?)?;
        info!("Loaded {} known class and {} zero-shot samples from {:?}",
              splits.known_test.len(), splits.zero_shot_train.len() + splits.zero_shot_test.len(), path.as_ref());
        Ok(splits)
    }

    /// Write the data splits into a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let mut message = ::capnp::message::Builder::new_default();
        {
            let mut splits = message.init_root::<capnp_splits::Builder>();
            self.write_capnp(&mut splits);
        }
        write_message(path, &message)
    }
}

impl<'a> CapnpWrite<'a> for DataSplits {
    type Builder = capnp_splits::Builder<'a>;

    fn write_capnp(&self, builder: &mut Self::Builder) {
        {
            let mut known_test = builder.borrow().init_known_test(self.known_test.len() as u32);
            for (i, sample) in self.known_test.iter().enumerate() {
                sample.write_capnp(&mut known_test.borrow().get(i as u32));
            }
        }
        {
            let mut zero_shot_train = builder.borrow().init_zero_shot_train(self.zero_shot_train.len() as u32);
            for (i, sample) in self.zero_shot_train.iter().enumerate() {
                sample.write_capnp(&mut zero_shot_train.borrow().get(i as u32));
            }
        }
        {
            let mut zero_shot_test = builder.borrow().init_zero_shot_test(self.zero_shot_test.len() as u32);
            for (i, sample) in self.zero_shot_test.iter().enumerate() {
                sample.write_capnp(&mut zero_shot_test.borrow().get(i as u32));
            }
        }
    }
}

impl<'a> CapnpRead<'a> for DataSplits {
    type Reader = capnp_splits::Reader<'a>;

    fn read_capnp(reader: Self::Reader) -> Result<Self, Error> {
        let read_known_test = reader.get_known_test()?;
        let mut known_test = Vec::new();
        for i in 0..read_known_test.len() {
            known_test.push(Sample::read_capnp(read_known_test.get(i))?);
        }
        let read_zero_shot_train = reader.get_zero_shot_train()?;
        let mut zero_shot_train = Vec::new();
        for i in 0..read_zero_shot_train.len() {
            zero_shot_train.push(Sample::read_capnp(read_zero_shot_train.get(i))?);
        }
        let read_zero_shot_test = reader.get_zero_shot_test()?;
        let mut zero_shot_test = Vec::new();
        for i in 0..read_zero_shot_test.len() {
            zero_shot_test.push(Sample::read_capnp(read_zero_shot_test.get(i))?);
        }

        Ok(DataSplits {
            known_test: known_test,
            zero_shot_train: zero_shot_train,
            zero_shot_test: zero_shot_test,
        })
    }
}

/// Read the list of all class labels from a pickle file.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<String>, Error> {
    let file = File::open(path.as_ref())?;
    let labels: Vec<String> = serde_pickle::from_reader(BufReader::new(file), DeOptions::new())?;
    info!("Loaded {} labels from {:?}", labels.len(), path.as_ref());
    Ok(labels)
}

/// Write a list of class labels into a pickle file.
pub fn save_labels<P: AsRef<Path>>(path: P, labels: &[String]) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_pickle::to_writer(&mut writer, &labels, SerOptions::new())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::env;
    use super::*;

    fn sample(label: &str, value: f32) -> Sample {
        Sample::new(label, &[1, 2, 2], vec![value; 4]).unwrap()
    }

    #[test]
    fn batches_keep_sample_order() {
        let samples = vec![sample("cat", 1.0), sample("dog", 2.0), sample("cat", 3.0)];
        let batches = SampleBatches::new(samples, 2).unwrap().collect::<Result<Vec<Batch>, Error>>().unwrap();
        assert_eq!(2, batches.len());
        assert_eq!(vec!["cat".to_owned(), "dog".to_owned()], batches[0].labels);
        assert_eq!(&vec![2, 1, 2, 2], batches[0].images.desc());
        assert_eq!(1, batches[1].len());
    }

    #[test]
    fn rejects_mixed_image_shapes() {
        let other = Sample::new("dog", &[1, 1, 4], vec![0f32; 4]).unwrap();
        assert!(Batch::from_samples(&[sample("cat", 1.0), other]).is_err());
        assert!(Sample::new("cat", &[1, 2, 2], vec![0f32; 3]).is_err());
    }

    #[test]
    fn selects_subsets() {
        let splits = DataSplits {
            known_test: vec![sample("cat", 1.0)],
            zero_shot_train: vec![sample("okapi", 2.0)],
            zero_shot_test: vec![sample("okapi", 3.0)],
        };
        assert_eq!(1, splits.select(true, false).len());
        assert_eq!(2, splits.select(false, true).len());
        assert_eq!(3, splits.select(true, true).len());
    }

    #[test]
    fn splits_survive_a_file() {
        let splits = DataSplits {
            known_test: vec![sample("cat", 1.0)],
            zero_shot_train: vec![],
            zero_shot_test: vec![sample("okapi", 3.0), sample("zebra", 0.5)],
        };
        let path = env::temp_dir().join("lamina_data_splits.capnp");
        splits.save(&path).unwrap();
        assert_eq!(splits, DataSplits::load(&path).unwrap());
    }

    #[test]
    fn labels_survive_a_pickle() {
        let labels = vec!["cat".to_owned(), "ice bear".to_owned()];
        let path = env::temp_dir().join("lamina_labels.pkl");
        save_labels(&path, &labels).unwrap();
        assert_eq!(labels, load_labels(&path).unwrap());
    }
}

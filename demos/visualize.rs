extern crate env_logger;
#[macro_use]
extern crate log;
extern crate lamina;

use std::env;
use std::path::PathBuf;
use std::process;
use lamina::Error;
use lamina::data::{load_labels, DataSplits};
use lamina::models::BackboneKind;
use lamina::visualize::{VisualizeConfig, Visualizer};
use lamina::word_vectors::WordVectorTable;

const USAGE: &'static str = "Usage: visualize checkpoint=<path> output=<folder> data=<path> labels=<path> \
                             word_vectors=<path> [backbone=alexnet|vgg19] [batch_size=<n>] [zero_shot=true|false] \
                             [known_classes=true|false] [iterations=<n>] [perplexity=<x>]";

fn main() {
    env_logger::init().unwrap();

    let config = match parse_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(msg) => {
            println!("{}", msg);
            println!("{}", USAGE);
            process::exit(2);
        }
    };

    match run(config) {
        Ok(written) => println!("Wrote {} plots", written.len()),
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    }
}

fn run(config: VisualizeConfig) -> Result<Vec<PathBuf>, Error> {
    let visualizer = Visualizer::new(config)?;
    let splits = DataSplits::load(visualizer.config().data()?)?;
    let labels = load_labels(visualizer.config().labels()?)?;
    let words = WordVectorTable::load(visualizer.config().word_vectors()?)?;
    let batches = visualizer.batches(&splits)?;
    visualizer.run(batches, &words, &labels)
}

fn parse_args<I: Iterator<Item = String>>(args: I) -> Result<VisualizeConfig, String> {
    let mut config = VisualizeConfig::default();
    for arg in args {
        let mut parts = arg.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = match parts.next() {
            Some(value) => value,
            None => return Err(format!("Argument '{}' is not of the form key=value", arg)),
        };
        match key {
            "checkpoint" => config.checkpoint_path = Some(PathBuf::from(value)),
            "output" => config.output_folder = Some(PathBuf::from(value)),
            "data" => config.data_path = Some(PathBuf::from(value)),
            "labels" => config.labels_path = Some(PathBuf::from(value)),
            "word_vectors" => config.word_vectors_path = Some(PathBuf::from(value)),
            "backbone" => {
                config.backbone = match value {
                    "alexnet" => BackboneKind::AlexNet,
                    "vgg19" => BackboneKind::Vgg19,
                    _ => return Err(format!("Unknown backbone '{}'", value)),
                }
            }
            "batch_size" => config.batch_size = parse(key, value)?,
            "num_classes" => config.num_classes = parse(key, value)?,
            "word2vec_size" => config.word2vec_size = parse(key, value)?,
            "image_size" => config.image_size = parse(key, value)?,
            "known_classes" => config.known_classes = parse(key, value)?,
            "zero_shot" => config.zero_shot = parse(key, value)?,
            "iterations" => config.tsne.iterations = parse(key, value)?,
            "perplexity" => config.tsne.perplexity = parse(key, value)?,
            _ => return Err(format!("Unknown argument '{}'", key)),
        }
    }
    Ok(config)
}

fn parse<T: ::std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value.parse::<T>().map_err(|_| format!("Invalid value '{}' for {}", value, key))
}

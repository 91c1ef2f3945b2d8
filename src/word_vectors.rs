//! Provides the lookup of word vectors for class labels.
//!
//! Labels are compared in their [normalized][normalize] form. A label that has no
//! vector of its own, like `ice_bear`, is represented by the average of the vectors of
//! its parts.
//!
//! [normalize]: ./fn.normalize_label.html
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use error::Error;

/// Normalizes a class label: trimmed, lowercase, with spaces and dashes replaced by `_`.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().replace(|c: char| c == ' ' || c == '-', "_")
}

/// A lookup of word vectors by label.
pub trait WordVectors {
    /// The size of every vector.
    fn dimensions(&self) -> usize;

    /// Returns the vector of a single word, if it is known.
    fn word(&self, word: &str) -> Option<&[f32]>;

    /// Returns the vector representing `label`.
    ///
    /// The normalized label is looked up first. Otherwise the label is split at `_` and
    /// the vectors of all parts are averaged; every part has to be known.
    fn label_vector(&self, label: &str) -> Result<Vec<f32>, Error> {
        let label = normalize_label(label);
        if let Some(vector) = self.word(&label) {
            return Ok(vector.to_vec());
        }

        let parts = label.split('_').filter(|part| !part.is_empty()).collect::<Vec<&str>>();
        if parts.is_empty() {
            return Err(Error::MissingWordVector(label.clone()));
        }
        let mut sum = vec![0f32; self.dimensions()];
        for part in &parts {
            match self.word(part) {
                Some(vector) => {
                    for (s, v) in sum.iter_mut().zip(vector.iter()) {
                        *s += *v;
                    }
                }
                None => return Err(Error::MissingWordVector(label.clone())),
            }
        }
        let count = parts.len() as f32;
        Ok(sum.into_iter().map(|s| s / count).collect())
    }
}

#[derive(Debug, Clone, Default)]
/// Word vectors held in memory.
pub struct WordVectorTable {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl WordVectorTable {
    /// Creates an empty table of vectors with `dimensions` values.
    pub fn new(dimensions: usize) -> WordVectorTable {
        WordVectorTable {
            dimensions: dimensions,
            vectors: HashMap::new(),
        }
    }

    /// Adds or replaces the vector of a word.
    pub fn insert(&mut self, word: &str, vector: Vec<f32>) -> Result<(), Error> {
        if vector.len() != self.dimensions {
            return Err(Error::InvalidConfig(format!("vector for {} has {} values, expected {}", word, vector.len(), self.dimensions)));
        }
        self.vectors.insert(word.to_owned(), vector);
        Ok(())
    }

    /// The number of known words.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Returns true if no word is known.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Reads word vectors in the word2vec text format.
    ///
    /// Every line holds a word followed by its values, separated by whitespace. An
    /// optional first line `<count> <dimensions>` is skipped. The dimensions are taken
    /// from the first vector.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<WordVectorTable, Error> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let mut table: Option<WordVectorTable> = None;
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let word = match fields.next() {
                Some(word) => word.to_owned(),
                None => continue,
            };
            let values = fields.map(|field| field.parse::<f32>())
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| Error::InvalidConfig(format!("line {} of word vectors: {}", number + 1, e)))?;
            if number == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                debug!("Skipping word vector header {}", line);
                continue;
            }
            match table {
                Some(ref mut table) => table.insert(&word, values)?,
                None => {
                    let mut first = WordVectorTable::new(values.len());
                    first.insert(&word, values)?;
                    table = Some(first);
                }
            }
        }
        let table = table.unwrap_or_default();
        info!("Loaded {} word vectors of size {} from {:?}", table.len(), table.dimensions, path.as_ref());
        Ok(table)
    }
}

impl WordVectors for WordVectorTable {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn word(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(|vector| &vector[..])
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs::File;
    use std::io::Write;
    use super::*;

    fn table() -> WordVectorTable {
        let mut table = WordVectorTable::new(2);
        table.insert("ice", vec![1f32, 0f32]).unwrap();
        table.insert("bear", vec![0f32, 1f32]).unwrap();
        table.insert("polar_bear", vec![5f32, 5f32]).unwrap();
        table
    }

    #[test]
    fn normalizes_labels() {
        assert_eq!("polar_bear", normalize_label(" Polar Bear "));
        assert_eq!("t_rex", normalize_label("T-Rex"));
    }

    #[test]
    fn prefers_exact_match() {
        assert_eq!(vec![5f32, 5f32], table().label_vector("Polar Bear").unwrap());
    }

    #[test]
    fn averages_parts() {
        assert_eq!(vec![0.5f32, 0.5f32], table().label_vector("ice bear").unwrap());
        assert!(table().label_vector("grizzly bear").is_err());
    }

    #[test]
    fn loads_text_format_with_header() {
        let path = env::temp_dir().join("lamina_word_vectors.txt");
        {
            let mut file = File::create(&path).unwrap();
            writeln!(file, "2 3").unwrap();
            writeln!(file, "cat 0.1 0.2 0.3").unwrap();
            writeln!(file, "dog 1 2 3").unwrap();
        }
        let table = WordVectorTable::load(&path).unwrap();
        assert_eq!(3, table.dimensions());
        assert_eq!(2, table.len());
        assert_eq!(Some(&[1f32, 2f32, 3f32][..]), table.word("dog"));
    }
}

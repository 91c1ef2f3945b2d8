extern crate lamina;
extern crate env_logger;

#[cfg(test)]
mod visualize_spec {
    use std::cell::RefCell;
    use std::env;
    use std::fs;
    use std::rc::Rc;
    use lamina::Error;
    use lamina::data::{DataSplits, Sample, SampleBatches};
    use lamina::manifold::{ManifoldReducer, TsneConfig};
    use lamina::models::{CompositeConfig, CompositeModel};
    use lamina::util::native_backend;
    use lamina::visualize::*;
    use lamina::weight::ParameterStore;
    use lamina::word_vectors::{WordVectorTable, WordVectors};

    /// Places point `i` at `(i, -i)` and remembers what it was asked to reduce.
    struct IndexReducer {
        seen: RefCell<Vec<Vec<f32>>>,
    }

    impl IndexReducer {
        fn new() -> IndexReducer {
            IndexReducer { seen: RefCell::new(vec![]) }
        }
    }

    impl ManifoldReducer for IndexReducer {
        fn reduce(&self, points: &[Vec<f32>]) -> Result<Vec<[f64; 2]>, Error> {
            *self.seen.borrow_mut() = points.to_vec();
            Ok((0..points.len()).map(|i| [i as f64, -(i as f64)]).collect())
        }
    }

    fn labels() -> Vec<String> {
        vec!["cat".to_owned(), "Ice Bear".to_owned()]
    }

    fn words() -> WordVectorTable {
        let mut words = WordVectorTable::new(2);
        words.insert("cat", vec![1f32, 0f32]).unwrap();
        words.insert("ice", vec![0f32, 1f32]).unwrap();
        words.insert("bear", vec![0f32, 3f32]).unwrap();
        words
    }

    #[test]
    fn one_point_per_class_and_anchors() {
        let mut points = EmbeddingPoints::new(&labels());
        points.push("ice_bear", vec![5f32, 5f32]).unwrap();
        points.push("cat", vec![7f32, 7f32]).unwrap();
        let anchors = label_anchors(&words(), &labels()).unwrap();

        let reducer = IndexReducer::new();
        let projection = project(&points, &anchors, &reducer).unwrap();

        assert_eq!(vec![vec![7f32, 7f32], vec![5f32, 5f32], vec![1f32, 0f32], vec![0f32, 2f32]],
                   *reducer.seen.borrow());
        assert_eq!(vec![PointTag::Data("cat".to_owned()), PointTag::Data("ice_bear".to_owned())],
                   projection.data.iter().map(|p| p.tag.clone()).collect::<Vec<PointTag>>());
        assert_eq!(vec![PointTag::Label("cat".to_owned()), PointTag::Label("ice_bear".to_owned())],
                   projection.labels.iter().map(|p| p.tag.clone()).collect::<Vec<PointTag>>());
        assert_eq!(Some([3f64, -3f64]), projection.anchor_of("ice_bear"));
    }

    #[test]
    fn split_keeps_positions_aligned_with_tags() {
        let tags = vec![PointTag::Data("a".to_owned()),
                        PointTag::Data("b".to_owned()),
                        PointTag::Data("a".to_owned()),
                        PointTag::Label("a".to_owned()),
                        PointTag::Label("b".to_owned())];
        let layout = (0..5).map(|i| [i as f64, 10f64 * i as f64]).collect::<Vec<[f64; 2]>>();
        let projection = split_by_tag(tags, layout).unwrap();

        assert_eq!(3, projection.data.len());
        assert_eq!(2, projection.labels.len());
        assert_eq!(vec![[0f64, 0f64], [2f64, 20f64]], projection.data_of("a"));
        assert_eq!(Some([4f64, 40f64]), projection.anchor_of("b"));
        assert_eq!(vec!["a", "b"], projection.data_labels());
    }

    #[test]
    fn label_anchors_are_keyed_by_normalized_label() {
        let anchors = label_anchors(&words(), &labels()).unwrap();
        assert_eq!("ice_bear", anchors[1].0);
        assert_eq!(words().label_vector("ice bear").unwrap(), anchors[1].1);
        assert!(label_anchors(&words(), &["okapi".to_owned()]).is_err());
    }

    fn sample(label: &str, value: f32) -> Sample {
        Sample::new(label, &[3, 24, 24], vec![value; 3 * 24 * 24]).unwrap()
    }

    #[test]
    fn embeddings_are_collected_by_label() {
        let _ = ::env_logger::init();
        let config = CompositeConfig { word2vec_size: 2, ..CompositeConfig::default() };
        let mut store = ParameterStore::new();
        let model = CompositeModel::new(Rc::new(native_backend()), &mut store, &config).unwrap();

        let samples = vec![sample("cat", 0.1), sample("Ice Bear", 0.2), sample("cat", 0.3)];
        let batches = SampleBatches::new(samples, 2).unwrap();
        let points = collect_embeddings(&model, batches, &labels()).unwrap();

        assert_eq!(3, points.len());
        assert_eq!(2, points.points("cat").len());
        assert_eq!(1, points.points("ice_bear").len());
        assert!(points.points("cat").iter().all(|p| p.len() == 2));
    }

    #[test]
    fn embedding_of_an_unknown_label_fails() {
        let config = CompositeConfig { word2vec_size: 2, ..CompositeConfig::default() };
        let mut store = ParameterStore::new();
        let model = CompositeModel::new(Rc::new(native_backend()), &mut store, &config).unwrap();
        let batches = SampleBatches::new(vec![sample("okapi", 0.5)], 1).unwrap();
        match collect_embeddings(&model, batches, &labels()) {
            Err(Error::UnknownLabel(label)) => assert_eq!("okapi", label),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn visualizer_restores_the_checkpoint() {
        let checkpoint = env::temp_dir().join("lamina_visualizer_checkpoint.capnp");
        let config = VisualizeConfig {
            checkpoint_path: Some(checkpoint.clone()),
            output_folder: Some(env::temp_dir().join("lamina_plots")),
            word2vec_size: 2,
            known_classes: true,
            zero_shot: true,
            ..VisualizeConfig::default()
        };
        let expected = {
            let mut store = ParameterStore::new();
            let model = CompositeModel::new(Rc::new(native_backend()), &mut store, &config.composite_config()).unwrap();
            store.save(&checkpoint).unwrap();
            let batches = SampleBatches::new(vec![sample("cat", 0.1)], 1).unwrap();
            collect_embeddings(&model, batches, &labels()).unwrap()
        };

        let visualizer = Visualizer::new(config).unwrap();
        let splits = DataSplits {
            known_test: vec![sample("cat", 0.1)],
            zero_shot_train: vec![sample("ice bear", 0.2)],
            zero_shot_test: vec![],
        };
        let points = visualizer.infer(visualizer.batches(&splits).unwrap(), &labels()).unwrap();
        assert_eq!(2, points.len());
        assert_eq!(expected.points("cat"), points.points("cat"));
    }

    #[test]
    fn visualizer_requires_a_checkpoint() {
        assert!(Visualizer::new(VisualizeConfig::default()).is_err());
    }

    #[test]
    fn render_all_writes_one_plot_per_data_label() {
        let folder = env::temp_dir().join("lamina_render_all");
        let _ = fs::remove_dir_all(&folder);
        let tags = vec![PointTag::Data("cat".to_owned()),
                        PointTag::Data("ice_bear".to_owned()),
                        PointTag::Data("cat".to_owned()),
                        PointTag::Label("cat".to_owned()),
                        PointTag::Label("ice_bear".to_owned()),
                        PointTag::Label("okapi".to_owned())];
        let layout = (0..6).map(|i| [i as f64, (i * i) as f64]).collect::<Vec<[f64; 2]>>();
        let projection = split_by_tag(tags, layout).unwrap();

        let written = render_all(&projection, &folder).unwrap();
        assert_eq!(vec![folder.join("cat.png"), folder.join("ice_bear.png")], written);
        assert!(written.iter().all(|path| path.is_file()));
        assert!(!folder.join("okapi.png").exists());
    }

    #[test]
    fn visualizer_runs_every_phase() {
        let _ = ::env_logger::init();
        let checkpoint = env::temp_dir().join("lamina_visualizer_run_checkpoint.capnp");
        let folder = env::temp_dir().join("lamina_visualizer_run_plots");
        let _ = fs::remove_dir_all(&folder);
        let config = VisualizeConfig {
            checkpoint_path: Some(checkpoint.clone()),
            output_folder: Some(folder.clone()),
            word2vec_size: 2,
            known_classes: true,
            tsne: TsneConfig { iterations: 10, ..TsneConfig::default() },
            ..VisualizeConfig::default()
        };
        {
            let mut store = ParameterStore::new();
            CompositeModel::new(Rc::new(native_backend()), &mut store, &config.composite_config()).unwrap();
            store.save(&checkpoint).unwrap();
        }

        let visualizer = Visualizer::new(config).unwrap();
        let splits = DataSplits {
            known_test: vec![sample("cat", 0.1), sample("cat", 0.4)],
            zero_shot_train: vec![sample("Ice Bear", 0.2)],
            zero_shot_test: vec![],
        };
        let written = visualizer.run(visualizer.batches(&splits).unwrap(), &words(), &labels()).unwrap();
        assert_eq!(vec![folder.join("cat.png"), folder.join("ice_bear.png")], written);
        assert!(written.iter().all(|path| path.is_file()));
    }
}

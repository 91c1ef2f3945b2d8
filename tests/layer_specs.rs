extern crate lamina;
extern crate collenchyma as co;
extern crate env_logger;

#[cfg(test)]
mod layer_spec {
    use std::rc::Rc;
    use std::sync::Arc;
    use co::prelude::*;
    use lamina::layer::*;
    use lamina::layers::*;
    use lamina::layers::common::WindowAxis;
    use lamina::layers::common::convolution::convolve;
    use lamina::util::{host_data, host_tensor_from};
    use lamina::util;
    use lamina::weight::{FillerType, ParameterStore, WeightConfig};

    fn native_backend() -> Rc<Backend<Native>> {
        let _ = ::env_logger::init();
        Rc::new(util::native_backend())
    }

    fn valid_axis(input: usize, filter: usize) -> WindowAxis {
        WindowAxis { input: input, output: input - filter + 1, filter: filter, stride: 1, offset: 0 }
    }

    #[test]
    fn grouped_convolution_concatenates_group_outputs() {
        let input_shape = [1, 4, 3, 3];
        let input = (0..36).map(|i| (i as f32 * 0.37).sin()).collect::<Vec<f32>>();
        let filter = (0..32).map(|i| (i as f32 * 0.11).cos()).collect::<Vec<f32>>();
        let (rows, cols) = (valid_axis(3, 2), valid_axis(3, 2));

        let mut grouped = vec![0f32; 16];
        convolve(&input, &input_shape, &filter, &[4, 2, 2, 2], 2, &rows, &cols, &mut grouped);

        let mut first = vec![0f32; 8];
        convolve(&input[..18], &[1, 2, 3, 3], &filter[..16], &[2, 2, 2, 2], 1, &rows, &cols, &mut first);
        let mut second = vec![0f32; 8];
        convolve(&input[18..], &[1, 2, 3, 3], &filter[16..], &[2, 2, 2, 2], 1, &rows, &cols, &mut second);

        assert_eq!(&first[..], &grouped[..8]);
        assert_eq!(&second[..], &grouped[8..]);
    }

    #[test]
    fn get_or_create_returns_the_same_weight() {
        let mut store = ParameterStore::new();
        let config = WeightConfig::new("weights", FillerType::Glorot { input_size: 2, output_size: 2 });
        let first = store.get_or_create("fc", &config, &[2, 2]).unwrap();
        let second = store.get_or_create("fc", &config, &[2, 2]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, store.len());

        store.assign("fc/weights", &[2, 2], &[1f32, 2f32, 3f32, 4f32]).unwrap();
        assert_eq!(&[1f32, 2f32, 3f32, 4f32], host_data(&second.read().unwrap()).unwrap());
    }

    #[test]
    fn layers_with_the_same_name_share_weights() {
        let backend = native_backend();
        let mut store = ParameterStore::new();
        let config = LayerConfig::new("fc", LinearConfig::logits(2));
        let mut first = Layer::from_config(backend.clone(), &config);
        let mut second = Layer::from_config(backend, &config);
        first.connect(&[1, 3], &mut store).unwrap();
        second.connect(&[1, 3], &mut store).unwrap();
        assert_eq!(2, store.len());

        let input = host_tensor_from(&[1, 3], &[1f32, -1f32, 2f32]).unwrap();
        let a = first.forward(&input).unwrap();
        let b = second.forward(&input).unwrap();
        assert_eq!(host_data(&a).unwrap(), host_data(&b).unwrap());
    }

    #[test]
    fn standardizes_every_image_on_its_own() {
        let mut store = ParameterStore::new();
        let mut layer = Layer::from_config(native_backend(), &LayerConfig::new("standardize", LayerType::Standardize));
        layer.connect(&[2, 1, 2, 2], &mut store).unwrap();

        let input = host_tensor_from(&[2, 1, 2, 2], &[1f32, 2f32, 3f32, 4f32, 10f32, 10f32, 20f32, 40f32]).unwrap();
        let output = layer.forward(&input).unwrap();
        for image in host_data(&output).unwrap().chunks(4) {
            let mean = image.iter().fold(0f32, |sum, x| sum + x) / 4f32;
            let variance = image.iter().fold(0f32, |sum, x| sum + (x - mean).powi(2)) / 4f32;
            assert!(mean.abs() < 1e-5);
            assert!((variance - 1f32).abs() < 1e-4);
        }
    }

    #[test]
    fn sequential_rejects_mismatching_input() {
        let mut cfg = SequentialConfig::default();
        cfg.add_input(&[1, 4]);
        cfg.add_layer(LayerConfig::new("fc", LinearConfig::new(2)));
        let mut store = ParameterStore::new();
        let network = Sequential::from_config(native_backend(), &cfg, &mut store).unwrap();

        assert!(network.forward(&host_tensor_from(&[3, 4], &[0f32; 12]).unwrap()).is_ok());
        assert!(network.forward(&host_tensor_from(&[1, 3], &[0f32; 3]).unwrap()).is_err());
    }
}

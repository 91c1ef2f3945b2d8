#[macro_use]
extern crate timeit;
extern crate env_logger;
extern crate collenchyma as co;
extern crate lamina;

use std::env;
use std::rc::Rc;
use co::prelude::*;
use lamina::models::{AlexNet, Vgg, VggConfig, VggVariant};
use lamina::util::{host_tensor_from, native_backend};
use lamina::weight::ParameterStore;

const BATCH_SIZE: usize = 16;
const IMAGE_SIZE: usize = 24;
const NUM_CLASSES: usize = 60;

fn main() {
    env_logger::init().unwrap();

    let nets: Vec<String> = vec!("alexnet".to_string(), "vgg11".to_string(), "vgg19".to_string());
    if let Some(net) = env::args().nth(1) {
        if nets.contains(&net) {
            println!("Executing Model: {:?}", net);
            if net == "alexnet" {
                bench_alexnet();
            } else if net == "vgg11" {
                bench_vgg(VggVariant::Vgg11);
            } else if net == "vgg19" {
                bench_vgg(VggVariant::Vgg19);
            }
        } else {
            println!("Sorry, no model found with name '{:?}'. Valid options: {:?}", net, nets);
        }
    } else {
        println!("No `net` argument specified. Default: `alexnet`. Valid options: {:?}", nets);
        bench_alexnet();
    }
}

#[inline(never)]
fn bench_profile<F: FnMut() -> ()>(
    name: &str,
    mut bench_func: F,
    times: usize)
{
    println!("Running benchmark {}", name);
    println!("----------");
    for _ in 0..3 {
        bench_func();
    }
    let average_time = timeit_loops!(times, {
        bench_func();
    });
    println!("----------");
    println!("Average time {}", autoscale_time(average_time));
    println!("");
}

fn autoscale_time(sec: f64) -> String {
    let (div, unit_str) = get_time_scale(sec);
    format!("{:.5} {}", sec / div, unit_str)
}

// get fitting order of magnitude for a time measurement
fn get_time_scale<'a>(sec: f64) -> (f64, &'a str) {
    if sec > 1.0 {
        (1.0, "s")
    } else if sec > 0.001 {
        (0.001, "ms")
    } else if sec > 0.000_001 {
        (0.000_001, "µs")
    } else {
        (0.000_000_001, "ns")
    }
}

fn input_images() -> SharedTensor<f32> {
    let shape = [BATCH_SIZE, 3, IMAGE_SIZE, IMAGE_SIZE];
    let pixels = (0..shape.iter().product::<usize>()).map(|i| (i % 255) as f32).collect::<Vec<f32>>();
    host_tensor_from(&shape, &pixels).unwrap()
}

fn bench_alexnet() {
    let backend = Rc::new(native_backend());
    let mut store = ParameterStore::new();
    let net = AlexNet::new(backend, &mut store, NUM_CLASSES, IMAGE_SIZE).unwrap();
    let images = input_images();

    let func = || {
        let _ = net.logits(&images).unwrap();
    };
    bench_profile("alexnet_forward", func, 10);
}

fn bench_vgg(variant: VggVariant) {
    let backend = Rc::new(native_backend());
    let mut store = ParameterStore::new();
    let config = VggConfig { variant: variant, num_classes: NUM_CLASSES, image_size: IMAGE_SIZE, ..VggConfig::default() };
    let net = Vgg::new(backend, &mut store, &config).unwrap();
    let images = input_images();

    let func = || {
        let _ = net.logits(&images).unwrap();
    };
    bench_profile(&format!("{:?}_forward", variant).to_lowercase(), func, 5);
}

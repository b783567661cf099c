use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    balanced_sampler::example_apps::run_balanced_epoch_demo(std::env::args().skip(1))
}

use midpoint_refine::Refiner;

fn main() {
    let f = |_x: f64| 1.;
    let mut refiner = Refiner::new(f);

    for estimate in refiner.by_ref().take(8) {
        println!(
            "Iteration {}: {} points, estimate {:?}",
            estimate.iteration, estimate.n_points, estimate.value
        );
    }

    #[cfg(feature = "gridplotting")]
    refiner.points().plot(&f, "constant.svg").unwrap();
}

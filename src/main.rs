use midpoint_refine::{quarter_circle, run, Refiner};
use std::io;

fn main() -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    run(&mut Refiner::new(quarter_circle), &mut out, None)
}

use std::time::{Duration, Instant};

use stepmaze::{
    controller::{Controller, ControllerConfig, GenerationAlgorithm, Settings, SolveAlgorithm},
    frame_task::TaskOutcome,
    render::NullRenderer,
};

/// Synthetic frame length, just over the 60 fps cap so every tick runs.
const FRAME: Duration = Duration::from_millis(17);

/// Ticks the controller on a synthetic clock until the current job is done.
fn drive(controller: &mut Controller<NullRenderer>, clock: &mut Instant) -> usize {
    let mut frames = 0;
    while controller.is_busy() {
        controller.tick(*clock);
        *clock += FRAME;
        frames += 1;
    }
    frames
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args();
    args.next(); // Skip executable name
    let num_iters = args.next().and_then(|s| s.parse::<usize>().ok()).unwrap_or(1);

    let settings = Settings {
        rows: u8::MAX as u16,
        cols: u8::MAX as u16,
        generation_algorithm: GenerationAlgorithm::Prims,
        solve_algorithm: SolveAlgorithm::Bfs,
        ..Settings::default()
    };
    settings.validate()?;

    let mut controller = Controller::new(NullRenderer, ControllerConfig::default());
    let mut clock = Instant::now();
    let start = Instant::now();
    for i in 0..num_iters {
        let generated = controller.generate(&settings);
        let generate_frames = drive(&mut controller, &mut clock);
        let solved = controller.solve(&settings)?;
        let solve_frames = drive(&mut controller, &mut clock);
        if generated.outcome() != Some(TaskOutcome::Completed)
            || solved.outcome() != Some(TaskOutcome::Completed)
        {
            return Err(format!("iteration {i} did not complete").into());
        }
        println!("Iteration {i}: {generate_frames} generate frames, {solve_frames} solve frames");
    }
    println!(
        "Ran {num_iters} iteration(s) of {}x{} in {:?}",
        settings.rows,
        settings.cols,
        start.elapsed()
    );
    Ok(())
}

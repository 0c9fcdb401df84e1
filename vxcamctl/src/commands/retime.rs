use anyhow::Context;
use vxcam_core::RetimePlan;

use crate::cli::RetimeArgs;
use crate::config::Config;

pub fn run(config: &Config, args: &RetimeArgs) -> anyhow::Result<()> {
    let plan = RetimePlan::build(args.frames, args.fps, &config.motion)
        .context("cannot build retime plan")?;

    println!("source frames   {}", plan.source_frames());
    println!("output frames   {}", plan.output_frames());
    println!(
        "source duration {:.3}s",
        plan.source_duration().as_secs_f64()
    );
    println!(
        "output duration {:.3}s",
        plan.output_duration().as_secs_f64()
    );

    if args.runs {
        for run in runs(plan.repeats()) {
            println!(
                "frames {:>6}..{:<6} x{}",
                run.start, run.end, run.repeat
            );
        }
    }
    Ok(())
}

/// Consecutive source frames sharing a repeat count. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    start: usize,
    end: usize,
    repeat: u32,
}

fn runs(repeats: &[u32]) -> Vec<Run> {
    let mut out: Vec<Run> = Vec::new();
    for (index, &repeat) in repeats.iter().enumerate() {
        match out.last_mut() {
            Some(run) if run.repeat == repeat => run.end = index + 1,
            _ => out.push(Run {
                start: index,
                end: index + 1,
                repeat,
            }),
        }
    }
    out
}

#![allow(dead_code)]

#[path = "../fps.rs"]
mod fps;

use std::env;
use std::time::Instant;

use anyhow::Context;
use fps::{FpsCounter, FramePacer, FrameTimeSampler, TimeMs};

const DEFAULT_SECONDS: u64 = 5;
const DEFAULT_GOAL_FPS: f64 = 60.0;
const DEFAULT_WINDOW_SECONDS: usize = 5;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() > 4 {
        eprintln!("Usage: fpsbench [seconds] [goal_fps] [window_seconds]");
        std::process::exit(1);
    }

    let seconds: u64 = match args.get(1) {
        Some(arg) => arg.parse().context("seconds must be a positive integer")?,
        None => DEFAULT_SECONDS,
    };
    let goal_fps: f64 = match args.get(2) {
        Some(arg) => arg.parse().context("goal_fps must be a number")?,
        None => DEFAULT_GOAL_FPS,
    };
    let window_seconds: usize = match args.get(3) {
        Some(arg) => arg.parse().context("window_seconds must be a positive integer")?,
        None => DEFAULT_WINDOW_SECONDS,
    };

    let mut counter = FpsCounter::new(window_seconds)?;
    let mut frame_times = FrameTimeSampler::new(100)?;
    let pacer = FramePacer::new(Some(goal_fps));
    let span = window_seconds - 1;

    println!(
        "Benchmark: {}s paced to {:.1} fps ({:.2} ms per frame), {}s window.",
        seconds,
        goal_fps,
        FpsCounter::ms_per_frame_for(goal_fps),
        window_seconds
    );

    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as TimeMs;
    let end_ms = seconds * 1000;
    let mut reported_second = 0;
    let mut frames: u64 = 0;
    let mut frames_in_second: u64 = 0;

    loop {
        let frame_start = now_ms();
        if frame_start >= end_ms {
            break;
        }

        let second = frame_start / 1000;
        if second != reported_second {
            println!(
                "second {:>3}: {:>4} frames (trailing {}s average {:>6.1})",
                reported_second,
                frames_in_second,
                span,
                counter.average(span)
            );
            reported_second = second;
            frames_in_second = 0;
        }

        counter.mark_frame_start(frame_start);
        frames += 1;
        frames_in_second += 1;
        if let Some(mean) = frame_times.record(frame_start) {
            log::debug!("avg time per frame over last 100 frames: {mean:.2} ms");
        }

        pacer.frame_sleep(counter.last_frame_start_time(), now_ms());
    }

    let elapsed = started.elapsed().as_secs_f64();
    println!(
        "Done: {} frames in {:.2}s ({:.1} fps overall, {:.0} in the last active second).",
        frames,
        elapsed,
        frames as f64 / elapsed,
        counter.average_last_second()
    );

    Ok(())
}

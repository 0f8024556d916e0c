//! simc profileset input rendering.
//!
//! The baseline task becomes the main actor; every other task becomes a
//! `profileset."<name>"+=<override>` block simulated as a delta against it.

use racesim_core::Batch;
use std::fmt::Write;

/// Thread options written into the input. Remote backends manage their own
/// threads and leave both unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadOptions {
    pub threads: Option<u32>,
    pub profileset_work_threads: Option<u32>,
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// Render the complete simc input for `batch`.
///
/// Global options come before the profile so `ptr` applies to the actor.
pub fn render_input(batch: &Batch, threads: ThreadOptions) -> String {
    let shared = batch.shared();
    let baseline = batch.baseline();
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# racesim {} {}", batch.spec_id(), shared.fight_style);
    let _ = writeln!(out, "ptr={}", flag(shared.ptr));
    let _ = writeln!(out, "iterations={}", shared.iterations);
    let _ = writeln!(out, "target_error={}", shared.target_error);
    let _ = writeln!(out, "fight_style={}", shared.fight_style);
    let _ = writeln!(out, "default_actions={}", flag(shared.default_actions));
    if let Some(n) = threads.threads {
        let _ = writeln!(out, "threads={}", n);
    }
    if let Some(n) = threads.profileset_work_threads {
        let _ = writeln!(out, "profileset_work_threads={}", n);
    }
    out.push('\n');

    out.push_str(batch.profile().content().trim_end());
    out.push_str("\n\n");

    for line in baseline.overrides() {
        let _ = writeln!(out, "{}", line);
    }
    for script in baseline.scripts() {
        out.push_str(script.trim_end());
        out.push('\n');
    }

    for task in batch.profileset_tasks() {
        out.push('\n');
        for line in task.overrides() {
            let _ = writeln!(out, "profileset.\"{}\"+={}", task.name(), line);
        }
    }
    out
}

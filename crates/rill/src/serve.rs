//! Long-running script harness.
//!
//! Executes a script once and stays resident. In watch mode the script's
//! modification time is polled and the program is re-parsed and
//! re-evaluated on change (a failed reload keeps the previous program
//! running). In worker mode N child processes each run the script and any
//! child that exits is restarted. The harness re-instantiates the
//! interpreter on every (re)load and has no other interaction with the
//! evaluation core.

use std::path::Path;
use std::process::{Child, Command};
use std::time::{Duration, SystemTime};

use rill_common::error::render_diagnostic;
use rill_common::span::LineIndex;
use rill_eval::Interpreter;

const WATCH_INTERVAL: Duration = Duration::from_millis(500);
const WORKER_INTERVAL: Duration = Duration::from_secs(1);

pub(crate) fn serve(path: &Path, watch: bool, workers: u32) -> i32 {
    if workers > 1 {
        return supervise_workers(path, watch, workers);
    }

    if !load_script(path) {
        return 1;
    }

    eprintln!("Rill serve {}", env!("CARGO_PKG_VERSION"));
    eprintln!("Script: {}", path.display());

    if watch {
        eprintln!("Hot reload enabled - watching for changes");
        watch_loop(path)
    } else {
        // Stay resident; interrupt to stop.
        loop {
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

/// Parse and execute the script with a fresh interpreter. Errors print in
/// the standard form; returns whether the run succeeded.
fn load_script(path: &Path) -> bool {
    let file_name = path.display().to_string();
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read '{file_name}': {e}");
            return false;
        }
    };
    let index = LineIndex::new(&source);

    let program = match rill_parser::parse(&source) {
        Ok(program) => program,
        Err(e) => {
            eprintln!(
                "{}",
                render_diagnostic(&file_name, &index, Some(e.span()), &e.to_string())
            );
            return false;
        }
    };

    let mut interp = Interpreter::new();
    if let Some(dir) = path.parent() {
        interp.set_module_base(dir.to_path_buf());
    }
    match interp.run(&program) {
        Ok(_) => true,
        Err(e) => {
            eprintln!(
                "{}",
                render_diagnostic(&file_name, &index, e.span, &e.message)
            );
            false
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll the script's modification time, re-running it on change.
fn watch_loop(path: &Path) -> ! {
    let mut last_modified = modified_time(path);
    loop {
        std::thread::sleep(WATCH_INTERVAL);
        let current = modified_time(path);
        if current.is_some() && current != last_modified {
            last_modified = current;
            eprintln!("File changed, reloading {}...", path.display());
            if load_script(path) {
                eprintln!("Reload successful");
            } else {
                eprintln!("Reload failed, using previous version");
            }
        }
    }
}

/// Spawn N children each serving the script, restarting any that exit.
/// An interrupt reaches the whole foreground process group, taking the
/// children down with the supervisor.
fn supervise_workers(path: &Path, watch: bool, workers: u32) -> i32 {
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            eprintln!("Error: cannot find own executable: {e}");
            return 1;
        }
    };

    eprintln!("Rill serve {}", env!("CARGO_PKG_VERSION"));
    eprintln!("Starting {workers} workers...");

    let spawn = |slot: u32| -> Option<Child> {
        let mut command = Command::new(&exe);
        command.arg("serve").arg(path);
        if watch {
            command.arg("--watch");
        }
        match command.spawn() {
            Ok(child) => {
                eprintln!("  Worker {} started (pid {})", slot + 1, child.id());
                Some(child)
            }
            Err(e) => {
                eprintln!("  Worker {} failed to start: {e}", slot + 1);
                None
            }
        }
    };

    let mut children: Vec<Option<Child>> = (0..workers).map(spawn).collect();
    if children.iter().all(Option::is_none) {
        return 1;
    }

    loop {
        std::thread::sleep(WORKER_INTERVAL);
        for slot in 0..children.len() {
            let exited = match &mut children[slot] {
                Some(child) => matches!(child.try_wait(), Ok(Some(_)) | Err(_)),
                None => true,
            };
            if exited {
                eprintln!("Worker {} died, restarting...", slot + 1);
                children[slot] = spawn(slot as u32);
            }
        }
    }
}

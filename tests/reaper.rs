//! Background children are collected by the SIGCHLD reaper.
//!
//! Lives in its own test binary: it counts every child of this process.
#![cfg(target_os = "linux")]

use arglist_shell::Interpreter;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};

/// Children of this process that are still in the process table, zombies included.
fn children() -> Vec<(i32, char)> {
    let me = std::process::id() as i32;
    let mut found = Vec::new();
    for entry in fs::read_dir("/proc").expect("procfs").flatten() {
        let Ok(stat) = fs::read_to_string(entry.path().join("stat")) else {
            continue;
        };
        // `pid (comm) state ppid ...`; comm may itself contain parentheses
        let Some((head, rest)) = stat.rsplit_once(')') else {
            continue;
        };
        let mut fields = rest.split_whitespace();
        let state = fields.next().and_then(|s| s.chars().next());
        let ppid = fields.next().and_then(|p| p.parse::<i32>().ok());
        let pid = head.split_whitespace().next().and_then(|p| p.parse().ok());
        if let (Some(pid), Some(state), Some(ppid)) = (pid, state, ppid) {
            if ppid == me {
                found.push((pid, state));
            }
        }
    }
    found
}

#[test]
fn background_children_leave_no_zombies() {
    const COUNT: usize = 8;
    let sh = Interpreter::new().expect("install signal dispositions");

    for _ in 0..COUNT {
        sh.execute(&["true", "&"]).unwrap();
    }

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let left = children();
        if left.is_empty() {
            break;
        }
        assert!(
            Instant::now() < deadline,
            "children were never collected: {left:?}"
        );
        thread::sleep(Duration::from_millis(50));
    }

    // foreground dispatch still works after the reaper has been busy
    sh.execute(&["true"]).unwrap();
    assert!(children().iter().all(|&(_, state)| state != 'Z'));
}

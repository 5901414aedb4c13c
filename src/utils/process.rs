use std::fs;

const MAX_DEPTH: usize = 64;

/// Parent lookup for running processes.
pub trait ProcessTree {
    fn parent_of(&self, pid: u32) -> Option<u32>;

    /// Whether `ancestor` is a strict ancestor of `pid`.
    fn is_ancestor(&self, ancestor: u32, pid: u32) -> bool {
        let mut current = pid;
        for _ in 0..MAX_DEPTH {
            match self.parent_of(current) {
                Some(parent) if parent == ancestor => return true,
                Some(parent) if parent > 1 && parent != current => current = parent,
                _ => return false,
            }
        }
        false
    }
}

/// Reads parent ids from `/proc/<pid>/stat`.
pub struct ProcFs;

/// Parent pid field of a `/proc/<pid>/stat` line. The command name may hold
/// spaces and parentheses, so fields are counted after its last `)`.
pub fn parse_stat_ppid(stat: &str) -> Option<u32> {
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().nth(1)?.parse().ok()
}

impl ProcessTree for ProcFs {
    fn parent_of(&self, pid: u32) -> Option<u32> {
        let stat = fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
        parse_stat_ppid(&stat)
    }
}

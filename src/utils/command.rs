use anyhow::{bail, Context, Result};
use log::debug;
use std::{
    os::unix::process::CommandExt,
    process::{Command, Stdio},
};

const PIPE: &str = "|";

/// Splits an argument vector on `|` tokens into the programs of a pipeline.
/// Empty segments are dropped.
pub fn split_pipeline(argv: &[String]) -> Vec<&[String]> {
    argv.split(|arg| arg == PIPE)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Starts a command, or a pipeline of commands, in its own session and
/// returns without waiting for it.
pub fn spawn(argv: &[String]) -> Result<()> {
    let segments = split_pipeline(argv);
    if segments.is_empty() {
        bail!("empty command");
    }

    let last = segments.len() - 1;
    let mut upstream: Option<Stdio> = None;
    for (i, segment) in segments.iter().enumerate() {
        let mut command = Command::new(&segment[0]);
        command.args(&segment[1..]);
        if let Some(stdin) = upstream.take() {
            command.stdin(stdin);
        }
        if i < last {
            command.stdout(Stdio::piped());
        }
        unsafe {
            command.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {}", segment[0]))?;
        debug!("spawned {} (pid {})", segment[0], child.id());
        upstream = child.stdout.take().map(Stdio::from);
    }
    Ok(())
}

/// Lets the kernel reap exited children so spawned programs never linger as
/// zombies.
pub fn ignore_children() {
    unsafe {
        libc::signal(libc::SIGCHLD, libc::SIG_IGN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn pipeline_segments() {
        let args = argv("ls -la | grep foo | wc -l");
        let segments = split_pipeline(&args);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], &argv("ls -la")[..]);
        assert_eq!(segments[2], &argv("wc -l")[..]);
    }

    #[test]
    fn stray_pipes_are_dropped() {
        let args = argv("| st |");
        assert_eq!(split_pipeline(&args), vec![&argv("st")[..]]);
        assert!(spawn(&argv("|")).is_err());
    }
}

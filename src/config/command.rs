use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Internal operations a binding can call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Function {
    CloseWindow,
    DecreaseGaps,
    IncreaseGaps,
    FocusNext,
    FocusPrevious,
    MasterNext,
    MasterPrevious,
    MasterIncrease,
    MasterDecrease,
    StackIncrease,
    StackDecrease,
    Quit,
    ReloadConfig,
    ToggleFloating,
    GlobalFloating,
    Fullscreen,
    Monocle,
    CentreWindow,
    NextWorkspace,
    PrevWorkspace,
    NextMonitor,
    PrevMonitor,
    MoveNextMonitor,
    MovePrevMonitor,
    MoveWindow(Direction),
    ResizeWindow(Direction),
}

impl FromStr for Function {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Direction::*;
        let function = match s {
            "close_window" => Function::CloseWindow,
            "decrease_gaps" => Function::DecreaseGaps,
            "increase_gaps" => Function::IncreaseGaps,
            "focus_next" => Function::FocusNext,
            "focus_previous" | "focus_prev" => Function::FocusPrevious,
            "master_next" => Function::MasterNext,
            "master_previous" | "master_prev" => Function::MasterPrevious,
            "master_increase" => Function::MasterIncrease,
            "master_decrease" => Function::MasterDecrease,
            "stack_increase" => Function::StackIncrease,
            "stack_decrease" => Function::StackDecrease,
            "quit" => Function::Quit,
            "reload_config" => Function::ReloadConfig,
            "toggle_floating" | "floating" => Function::ToggleFloating,
            "global_floating" => Function::GlobalFloating,
            "fullscreen" => Function::Fullscreen,
            "monocle" | "toggle_monocle" => Function::Monocle,
            "centre_window" | "center_window" => Function::CentreWindow,
            "next_workspace" => Function::NextWorkspace,
            "prev_workspace" => Function::PrevWorkspace,
            "next_monitor" => Function::NextMonitor,
            "prev_monitor" => Function::PrevMonitor,
            "move_next_monitor" => Function::MoveNextMonitor,
            "move_prev_monitor" => Function::MovePrevMonitor,
            "move_win_up" => Function::MoveWindow(Up),
            "move_win_down" => Function::MoveWindow(Down),
            "move_win_left" => Function::MoveWindow(Left),
            "move_win_right" => Function::MoveWindow(Right),
            "resize_win_up" => Function::ResizeWindow(Up),
            "resize_win_down" => Function::ResizeWindow(Down),
            "resize_win_left" => Function::ResizeWindow(Left),
            "resize_win_right" => Function::ResizeWindow(Right),
            _ => return Err(format!("unknown function '{}'", s)),
        };
        Ok(function)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScratchpadOp {
    Create,
    Toggle,
    Remove,
}

/// What a key binding does. Plain data; executing it is the window
/// manager's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Spawn(Vec<String>),
    Call(Function),
    ChangeWorkspace(usize),
    MoveToWorkspace(usize),
    Scratchpad(ScratchpadOp, usize),
}

impl Action {
    pub fn spawn(command: &str) -> Self {
        Action::Spawn(split_command(command))
    }
}

/// Splits a command line on whitespace. Double quotes group words and are
/// dropped.
pub fn split_command(command: &str) -> Vec<String> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut started = false;

    for ch in command.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    argv.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        argv.push(current);
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_names_parse() {
        assert_eq!("focus_next".parse(), Ok(Function::FocusNext));
        assert_eq!(
            "resize_win_left".parse(),
            Ok(Function::ResizeWindow(Direction::Left))
        );
        assert!("frobnicate".parse::<Function>().is_err());
    }

    #[test]
    fn split_respects_quotes() {
        assert_eq!(split_command("st -e  htop"), vec!["st", "-e", "htop"]);
        assert_eq!(
            split_command(r#"notify-send "hello world" x"#),
            vec!["notify-send", "hello world", "x"]
        );
        assert_eq!(split_command(r#"echo """#), vec!["echo", ""]);
        assert!(split_command("   ").is_empty());
    }
}

use std::str::FromStr;

use crate::{AudioSink, PlaybackController, RenderSink, SortSoundError};

/// A user action, as a slider, select, button or key press would issue it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Start,
    TogglePause,
    Reset,
    SetSpeed(u32),
    SelectAlgorithm(String),
    SetBarCount(usize),
    Quit,
}

impl InputCommand {
    /// Forwards the command to the controller. Returns `false` for
    /// [`InputCommand::Quit`] so the driver knows to stop.
    pub fn apply<R: RenderSink, A: AudioSink>(
        self,
        controller: &mut PlaybackController<R, A>,
    ) -> bool {
        match self {
            InputCommand::Start => controller.start(),
            InputCommand::TogglePause => controller.toggle_pause(),
            InputCommand::Reset => controller.reset(),
            InputCommand::SetSpeed(level) => controller.set_speed(level),
            InputCommand::SelectAlgorithm(name) => controller.select_algorithm(&name),
            InputCommand::SetBarCount(count) => controller.set_bar_count(count),
            InputCommand::Quit => return false,
        }
        true
    }
}

impl FromStr for InputCommand {
    type Err = SortSoundError;

    /// Parses one line of input. A blank line (space then enter) is the pause
    /// keybinding.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(InputCommand::TogglePause);
        };
        let verb = verb.to_ascii_lowercase();
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(SortSoundError::InvalidCommand(format!(
                "unexpected argument `{extra}`"
            )));
        }

        let command = match (verb.as_str(), argument) {
            ("start" | "s", None) => InputCommand::Start,
            ("pause" | "resume" | "p" | "space", None) => InputCommand::TogglePause,
            ("reset" | "r", None) => InputCommand::Reset,
            ("quit" | "q" | "exit", None) => InputCommand::Quit,
            ("speed", Some(level)) => InputCommand::SetSpeed(parse_number(&verb, level)?),
            ("algo" | "algorithm", Some(name)) => {
                InputCommand::SelectAlgorithm(name.to_string())
            }
            ("bars", Some(count)) => InputCommand::SetBarCount(parse_number(&verb, count)?),
            _ => {
                return Err(SortSoundError::InvalidCommand(format!(
                    "unrecognised input `{}`",
                    line.trim()
                )))
            }
        };
        Ok(command)
    }
}

fn parse_number<T: FromStr>(verb: &str, raw: &str) -> Result<T, SortSoundError> {
    raw.parse().map_err(|_| {
        SortSoundError::InvalidCommand(format!("`{verb}` expects a number, got `{raw}`"))
    })
}

use std::fmt::Display;

use console::{style, StyledObject};

/// Role a piece of terminal output plays, mapped to one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Work still running
    Pending,
    Success,
    Failure,
    /// Tool name in the banner
    Brand,
    Muted,
}

impl Tone {
    /// Success when nothing failed, pending (work left to look at) otherwise.
    pub fn for_failures(failed: usize) -> Self {
        if failed == 0 {
            Self::Success
        } else {
            Self::Pending
        }
    }

    pub fn paint(self, text: impl Display) -> StyledObject<String> {
        let styled = style(text.to_string());
        match self {
            Self::Pending => styled.bright().yellow(),
            Self::Success => styled.bright().green(),
            Self::Failure => styled.bright().red(),
            Self::Brand => styled.magenta().bold(),
            Self::Muted => styled.dim(),
        }
    }
}

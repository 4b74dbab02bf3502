use crate::ansi::AnsiAction::{
    CarriageReturn, CursorToColumn, CursorUp, EraseInDisplay, EraseInLine, LineFeed, Tab, Text,
};
use vte::{Params, Parser, Perform};

/// The semantic actions in a stream of renderer output. Only what the
/// renderer itself emits is recognised; anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiAction {
    Text(char),
    Tab,
    LineFeed,
    CarriageReturn,
    CursorUp(u16),
    /// `ESC[nG`, 1-based like the sequence itself.
    CursorToColumn(u16),
    /// `ESC[nK`, 0 = cursor to end of line.
    EraseInLine(u16),
    /// `ESC[nJ`, 0 = cursor to end of screen.
    EraseInDisplay(u16),
}

/// A wrapper over [Parser] and [Perform] which takes bytes in and exposes the
/// semantic actions they encode. Parser state carries over between calls, so
/// output can be fed in arbitrary chunks.
pub struct AnsiParser {
    parser: Parser,
}

impl AnsiParser {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Vec<AnsiAction> {
        let mut performer = Performer::new();
        for byte in bytes {
            self.parser.advance(&mut performer, *byte)
        }
        performer.actions
    }
}

impl Default for AnsiParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The newline-terminated lines of text in `bytes` with every escape
/// sequence removed. Replaying a session's log file against this gives back
/// exactly the scrolled-out log lines.
pub fn plain_lines(bytes: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for action in AnsiParser::new().parse_bytes(bytes) {
        match action {
            Text(c) => current.push(c),
            Tab => current.push('\t'),
            LineFeed => lines.push(std::mem::take(&mut current)),
            _ => {}
        }
    }
    lines
}

// Private struct to hide this implementation detail
struct Performer {
    actions: Vec<AnsiAction>,
}

impl Performer {
    fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }
}

impl Perform for Performer {
    fn print(&mut self, c: char) {
        self.actions.push(Text(c))
    }

    fn execute(&mut self, byte: u8) {
        let action = match byte {
            9 => Tab,
            10 => LineFeed,
            13 => CarriageReturn,
            _ => return,
        };
        self.actions.push(action);
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, c: char) {
        if intermediates.is_empty() {
            let action = match c {
                'A' => CursorUp(params.first_or(1)),
                'G' => CursorToColumn(params.first_or(1)),
                'K' => EraseInLine(params.first_or(0)),
                'J' => EraseInDisplay(params.first_or(0)),
                _ => return,
            };
            self.actions.push(action);
        }
    }
}

trait ParamsFirst {
    fn first_or(&self, default: u16) -> u16;
}

impl ParamsFirst for Params {
    /// Zero and missing both mean "use the default".
    fn first_or(&self, default: u16) -> u16 {
        self.iter()
            .next()
            .and_then(|x| x.first().copied())
            .filter(|x| *x != 0)
            .unwrap_or(default)
    }
}

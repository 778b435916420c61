//! Scrollback shown to the player.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Echo of what the player typed, prompt included.
    Input,
    /// Command output.
    Output,
    /// Messages from the game itself (phase changes, countdown).
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub text: String,
}

/// Lines kept in scrollback; older ones are dropped from the front.
pub const MAX_LINES: usize = 1_000;

/// Append-only list of lines that can be wiped.
///
/// `generation` increases on every clear so a renderer can tell a wipe
/// apart from a transcript that merely has the same length. Lines are
/// also addressed by a position that keeps counting while old lines are
/// dropped, see [`end`](Self::end) and [`since`](Self::since).
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<Line>,
    generation: u64,
    /// Lines dropped off the front since the last clear.
    dropped: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: LineKind, text: &str) {
        for part in text.lines() {
            self.lines.push(Line {
                kind,
                text: part.to_string(),
            });
        }
        self.trim();
    }

    fn trim(&mut self) {
        if self.lines.len() > MAX_LINES {
            let excess = self.lines.len() - MAX_LINES;
            self.lines.drain(..excess);
            self.dropped += excess as u64;
        }
    }

    pub fn push_input(&mut self, prompt: &str, text: &str) {
        self.lines.push(Line {
            kind: LineKind::Input,
            text: format!("{prompt}{text}"),
        });
        self.trim();
    }

    /// Append output, one line per `\n`-separated part.
    pub fn push_output(&mut self, text: &str) {
        self.push(LineKind::Output, text);
    }

    pub fn push_system(&mut self, text: &str) {
        self.push(LineKind::System, text);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.dropped = 0;
        self.generation += 1;
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Position one past the newest line.
    pub fn end(&self) -> u64 {
        self.dropped + self.lines.len() as u64
    }

    /// Lines at or after position `mark` that are still kept.
    pub fn since(&self, mark: u64) -> &[Line] {
        let skip = mark.saturating_sub(self.dropped);
        let skip = usize::try_from(skip).unwrap_or(usize::MAX).min(self.lines.len());
        &self.lines[skip..]
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// All lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_split_into_lines() {
        let mut t = Transcript::new();
        t.push_output("a\nb");
        assert_eq!(t.len(), 2);
        assert_eq!(t.lines()[1].text, "b");
        assert_eq!(t.lines()[1].kind, LineKind::Output);
    }

    #[test]
    fn input_keeps_prompt() {
        let mut t = Transcript::new();
        t.push_input("guest@archive:~$ ", "ls");
        assert_eq!(t.text(), "guest@archive:~$ ls");
        assert_eq!(t.lines()[0].kind, LineKind::Input);
    }

    #[test]
    fn empty_output_adds_nothing() {
        let mut t = Transcript::new();
        t.push_output("");
        assert!(t.is_empty());
    }

    #[test]
    fn scrollback_is_capped() {
        let mut t = Transcript::new();
        for i in 0..MAX_LINES + 5 {
            t.push_output(&i.to_string());
        }
        assert_eq!(t.len(), MAX_LINES);
        assert_eq!(t.lines()[0].text, "5");
        assert_eq!(t.end(), (MAX_LINES + 5) as u64);

        let mark = t.end();
        t.push_input("$ ", "ls");
        t.push_output("a\nb");
        assert_eq!(t.len(), MAX_LINES);
        let fresh: Vec<_> = t.since(mark).iter().map(|l| l.text.as_str()).collect();
        assert_eq!(fresh, ["$ ls", "a", "b"]);
        // A mark older than the kept lines yields everything kept.
        assert_eq!(t.since(0).len(), MAX_LINES);
    }

    #[test]
    fn clear_restarts_positions() {
        let mut t = Transcript::new();
        for _ in 0..MAX_LINES + 1 {
            t.push_system("x");
        }
        t.clear();
        assert_eq!(t.end(), 0);
        t.push_system("y");
        assert_eq!(t.since(0)[0].text, "y");
    }

    #[test]
    fn clear_bumps_generation() {
        let mut t = Transcript::new();
        t.push_system("x");
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.generation(), 1);
    }
}

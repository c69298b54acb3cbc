//! Markdown report rendering

pub mod gestures;
pub mod sync;
pub mod trace;

/// Small Markdown builder shared by the report renderers
#[derive(Debug, Default)]
pub struct Markdown {
    buf: String,
}

impl Markdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(&mut self, level: usize, text: &str) -> &mut Self {
        self.buf.push_str(&"#".repeat(level.max(1)));
        self.buf.push(' ');
        self.buf.push_str(text);
        self.buf.push_str("\n\n");
        self
    }

    /// A paragraph followed by a blank line
    pub fn paragraph(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(text);
        self.buf.push_str("\n\n");
        self
    }

    /// A single line with no trailing blank line
    pub fn line(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(text);
        self.buf.push('\n');
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.buf.push_str("- ");
        self.line(text)
    }

    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    /// A pipe table; every row should have as many cells as `headers`
    pub fn table<S: AsRef<str>>(&mut self, headers: &[&str], rows: &[Vec<S>]) -> &mut Self {
        self.buf.push_str(&format!("| {} |\n", headers.join(" | ")));
        let rule: Vec<String> = headers.iter().map(|h| "-".repeat(h.len().max(3))).collect();
        self.buf.push_str(&format!("|{}|\n", rule.join("|")));
        for row in rows {
            let cells: Vec<&str> = row.iter().map(|c| c.as_ref()).collect();
            self.buf.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        self.buf.push('\n');
        self
    }

    /// Closing rule with the generator line
    pub fn footer(&mut self, generator: &str, timestamp: &str) -> &mut Self {
        self.buf.push_str("---\n");
        self.line(&format!(
            "*Report generated automatically by theremin-lab {} on {}*",
            generator, timestamp
        ))
    }

    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.buf)
    }
}

/// Format milliseconds with two decimals
pub(crate) fn ms(value: f64) -> String {
    format!("{:.2} ms", value)
}

/// Format a 0..=1 rate as a percentage with one decimal
pub(crate) fn pct(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

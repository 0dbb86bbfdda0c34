//! Line-oriented markdown documents split into `## ` sections.
//!
//! Sections are located by heading, never by line number. Text before the
//! first heading and sections nobody owns survive a parse/render cycle.

/// One `### ` block inside a section: the heading text plus its lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: String,
    /// 1-based line number of the header in the source document.
    pub line: usize,
    pub lines: Vec<String>,
}

impl Block {
    /// Value of a `- **Key**: value` line.
    pub fn field(&self, key: &str) -> Option<&str> {
        let prefix = format!("- **{key}**:");
        self.lines
            .iter()
            .find_map(|l| l.trim().strip_prefix(prefix.as_str()))
            .map(str::trim)
    }

    pub fn render(&self) -> Vec<String> {
        let mut out = vec![format!("### {}", self.header)];
        out.extend(self.lines.iter().cloned());
        out
    }
}

/// Build a block from `(key, value)` field lines.
pub fn block(header: String, fields: &[(&str, String)]) -> Block {
    Block {
        header,
        line: 0,
        lines: fields.iter().map(|(k, v)| format!("- **{k}**: {v}")).collect(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    /// 1-based line number of the first body line.
    pub first_line: usize,
    pub body: Vec<String>,
}

impl Section {
    pub fn new(heading: &str, marker: &str) -> Self {
        Self {
            heading: heading.to_string(),
            first_line: 0,
            body: vec![marker.to_string()],
        }
    }

    /// Body lines before the first `### ` block.
    pub fn intro(&self) -> Vec<String> {
        self.body.iter().take_while(|l| !l.starts_with("### ")).cloned().collect()
    }

    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        for (i, line) in self.body.iter().enumerate() {
            if let Some(header) = line.strip_prefix("### ") {
                blocks.push(Block {
                    header: header.trim().to_string(),
                    line: self.first_line + i,
                    lines: Vec::new(),
                });
            } else if let Some(current) = blocks.last_mut() {
                if !line.trim().is_empty() {
                    current.lines.push(line.clone());
                }
            }
        }
        blocks
    }

    /// Replace the body with `intro`, then the blocks separated by blank lines.
    pub fn set_body(&mut self, intro: Vec<String>, blocks: &[Block]) {
        let mut body = intro;
        trim_blank_edges(&mut body);
        for b in blocks {
            body.push(String::new());
            body.extend(b.render());
        }
        self.body = body;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub preamble: Vec<String>,
    pub sections: Vec<Section>,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        let mut doc = Document::default();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim_end().to_string();
            match section_heading(&line) {
                Some(heading) => doc.sections.push(Section {
                    heading,
                    first_line: i + 2,
                    body: Vec::new(),
                }),
                None => match doc.sections.last_mut() {
                    Some(s) => s.body.push(demote_legacy_entry(line)),
                    None => doc.preamble.push(line),
                },
            }
        }
        doc
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut preamble = self.preamble.clone();
        trim_blank_edges(&mut preamble);
        for l in &preamble {
            out.push_str(l);
            out.push('\n');
        }
        for s in &self.sections {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("## ");
            out.push_str(&s.heading);
            out.push('\n');
            let mut body = s.body.clone();
            trim_blank_edges(&mut body);
            for l in &body {
                out.push_str(l);
                out.push('\n');
            }
        }
        out
    }

    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    /// The section, appended with `marker` as its only line when missing.
    pub fn section_mut(&mut self, heading: &str, marker: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.heading == heading) {
            Some(i) => i,
            None => {
                self.sections.push(Section::new(heading, marker));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }
}

fn section_heading(line: &str) -> Option<String> {
    let heading = line.strip_prefix("## ")?.trim();
    if is_legacy_activity_header(heading) {
        return None;
    }
    Some(heading.to_string())
}

// Older ledgers wrote activity entries as `## <timestamp> - OP`, which would
// otherwise split the activity section apart.
fn is_legacy_activity_header(heading: &str) -> bool {
    let b = heading.as_bytes();
    b.len() >= 10 && b[..4].iter().all(u8::is_ascii_digit) && b[4] == b'-' && b[7] == b'-'
}

fn demote_legacy_entry(line: String) -> String {
    match line.strip_prefix("## ") {
        Some(rest) if is_legacy_activity_header(rest.trim()) => format!("### {}", rest.trim()),
        _ => line,
    }
}

fn trim_blank_edges(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
}

//! Markdown document formats used by the directory backend.
//!
//! ## Chapter files
//!
//! ```text
//! # Chapter Title
//!
//! Chapter body...
//!
//! <!-- scene: Opening -->
//! ## Opening
//!
//! Scene text...
//! <!-- /scene -->
//! ```
//!
//! Scenes are fenced by HTML comments so they survive any markdown viewer
//! and can be located again without guessing at heading levels.
//!
//! ## Escaping
//!
//! Stored text may contain any line. A line that would be read back as
//! structure (a scene fence in chapter text, a section header in a character
//! section) is written with a leading `\`, as is any line that already starts
//! with `\`. Reading strips one leading `\` from every line.
//!
//! ## Character files
//!
//! A `# Name` heading followed by fixed `## Section` blocks. The
//! `Background` section holds the character's description, `Notes` holds
//! free-form notes, and `Basic Info` carries the role and age bullets.

use super::title_from_stem;
use crate::models::{Character, CharacterRole};

pub const SCENE_OPEN_PREFIX: &str = "<!-- scene: ";
pub const SCENE_OPEN_SUFFIX: &str = " -->";
pub const SCENE_CLOSE: &str = "<!-- /scene -->";

pub const BASIC_INFO: &str = "Basic Info";
pub const PERSONALITY: &str = "Personality";
pub const BACKGROUND: &str = "Background";
pub const GOALS: &str = "Goals & Motivations";
pub const CHARACTER_ARC: &str = "Character Arc";
pub const NOTES: &str = "Notes";

/// Character file sections, in file order.
pub const CHARACTER_SECTIONS: [&str; 6] = [
    BASIC_INFO,
    PERSONALITY,
    BACKGROUND,
    GOALS,
    CHARACTER_ARC,
    NOTES,
];

const ROLE_BULLET: &str = "- **Role**:";
const AGE_BULLET: &str = "- **Age**:";

/// One line of a document with its byte offsets.
struct Line<'a> {
    start: usize,
    text: &'a str,
    /// Offset of the line after this one (past the newline).
    next: usize,
}

fn line_spans(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    while start < text.len() {
        match text[start..].find('\n') {
            Some(i) => {
                lines.push(Line {
                    start,
                    text: &text[start..start + i],
                    next: start + i + 1,
                });
                start += i + 1;
            }
            None => {
                lines.push(Line {
                    start,
                    text: &text[start..],
                    next: text.len(),
                });
                start = text.len();
            }
        }
    }
    lines
}

/// End offset of the text that precedes `line`, dropping its newline.
fn end_before(line: &Line<'_>, floor: usize) -> usize {
    if line.start > floor {
        line.start - 1
    } else {
        floor
    }
}

/// Title from a leading `#` heading, if the document has one.
pub fn heading_title(text: &str) -> Option<String> {
    let first = text.lines().next()?;
    if !first.starts_with('#') {
        return None;
    }
    let title = first.trim_start_matches('#').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Title from the leading heading, else the title-cased file stem.
pub fn derive_title(text: &str, stem: &str) -> String {
    heading_title(text).unwrap_or_else(|| title_from_stem(stem))
}

/// Split off a leading heading line and one blank line after it.
///
/// Returns the heading title and the offset where the body starts.
fn split_heading(text: &str) -> (Option<String>, usize) {
    let lines = line_spans(text);
    let Some(first) = lines.first() else {
        return (None, 0);
    };
    if !first.text.starts_with('#') {
        return (None, 0);
    }

    let title = first.text.trim_start_matches('#').trim().to_string();
    let mut offset = first.next;
    if let Some(blank) = lines.get(1) {
        if blank.text.is_empty() {
            offset = blank.next;
        }
    }
    ((!title.is_empty()).then_some(title), offset)
}

fn parse_open_fence(line: &str) -> Option<String> {
    let rest = line.strip_prefix(SCENE_OPEN_PREFIX)?;
    Some(rest.strip_suffix(SCENE_OPEN_SUFFIX).unwrap_or(rest).to_string())
}

fn is_scene_fence(line: &str) -> bool {
    line.starts_with(SCENE_OPEN_PREFIX) || line == SCENE_CLOSE
}

fn is_section_header(line: &str) -> bool {
    line.strip_prefix("## ")
        .is_some_and(|section| CHARACTER_SECTIONS.contains(&section))
}

/// Prefix every reserved line, and every line already starting with `\`, with `\`.
fn escape_lines(text: &str, reserved: fn(&str) -> bool) -> String {
    text.split('\n')
        .map(|line| {
            if line.starts_with('\\') || reserved(line) {
                format!("\\{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip one leading `\` from every line.
fn unescape_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| line.strip_prefix('\\').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A scene fenced inside a chapter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSection {
    pub title: String,
    pub content: String,
}

/// Parsed chapter file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDocument {
    pub title: String,
    /// Chapter text before the first scene
    pub body: String,
    pub scenes: Vec<SceneSection>,
}

impl ChapterDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: String::new(),
            scenes: Vec::new(),
        }
    }

    /// Parse a chapter file. Without a leading heading the title is `fallback_title`.
    ///
    /// Parsing never fails: an unterminated scene runs to the next fence or
    /// the end of the file.
    pub fn parse(text: &str, fallback_title: &str) -> Self {
        let (heading, body_start) = split_heading(text);
        let title = heading.unwrap_or_else(|| fallback_title.to_string());
        let lines = line_spans(text);

        let first_fence = lines
            .iter()
            .position(|l| l.start >= body_start && l.text.starts_with(SCENE_OPEN_PREFIX));

        let body_end = match first_fence {
            Some(idx) => end_before(&lines[idx], body_start),
            None => text.len(),
        };
        let body = unescape_lines(&text[body_start..body_end]);

        let mut scenes = Vec::new();
        let mut i = first_fence.unwrap_or(lines.len());
        while i < lines.len() {
            let Some(scene_title) = parse_open_fence(lines[i].text) else {
                i += 1;
                continue;
            };

            let mut j = i + 1;
            if j < lines.len() && lines[j].text.starts_with("## ") {
                j += 1;
                if j < lines.len() && lines[j].text.is_empty() {
                    j += 1;
                }
            }
            let content_start = lines.get(j).map_or(text.len(), |l| l.start);

            let mut k = j;
            while k < lines.len()
                && lines[k].text != SCENE_CLOSE
                && !lines[k].text.starts_with(SCENE_OPEN_PREFIX)
            {
                k += 1;
            }
            let content_end = match lines.get(k) {
                Some(line) => end_before(line, content_start),
                None => text.len(),
            };

            scenes.push(SceneSection {
                title: scene_title,
                content: unescape_lines(&text[content_start..content_end]),
            });

            i = if lines.get(k).is_some_and(|l| l.text == SCENE_CLOSE) {
                k + 1
            } else {
                k
            };
        }

        Self {
            title,
            body,
            scenes,
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!("# {}\n\n{}", self.title, escape_lines(&self.body, is_scene_fence));
        for scene in &self.scenes {
            out.push('\n');
            out.push_str(SCENE_OPEN_PREFIX);
            out.push_str(&scene.title);
            out.push_str(SCENE_OPEN_SUFFIX);
            out.push_str(&format!(
                "\n## {}\n\n{}\n",
                scene.title,
                escape_lines(&scene.content, is_scene_fence)
            ));
            out.push_str(SCENE_CLOSE);
        }
        out
    }

    pub fn scene(&self, title: &str) -> Option<&SceneSection> {
        self.scenes.iter().find(|s| s.title == title)
    }

    pub fn scene_mut(&mut self, title: &str) -> Option<&mut SceneSection> {
        self.scenes.iter_mut().find(|s| s.title == title)
    }

    pub fn scene_titles(&self) -> Vec<String> {
        self.scenes.iter().map(|s| s.title.clone()).collect()
    }
}

/// Parsed character file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterDocument {
    pub name: String,
    pub role: String,
    pub age: String,
    /// Other `Basic Info` lines (appearance etc.), kept verbatim
    pub basic_extra: String,
    pub personality: String,
    pub background: String,
    pub goals: String,
    pub arc: String,
    pub notes: String,
}

impl CharacterDocument {
    /// A fresh profile for a new character.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: CharacterRole::default().to_string(),
            age: String::new(),
            basic_extra: "- **Appearance**: ".to_string(),
            personality: String::new(),
            background: String::new(),
            goals: String::new(),
            arc: String::new(),
            notes: String::new(),
        }
    }

    pub fn parse(text: &str, fallback_name: &str) -> Self {
        let mut doc = Self {
            name: heading_title(text).unwrap_or_else(|| fallback_name.to_string()),
            role: String::new(),
            age: String::new(),
            basic_extra: String::new(),
            personality: String::new(),
            background: String::new(),
            goals: String::new(),
            arc: String::new(),
            notes: String::new(),
        };

        let lines = line_spans(text);
        let mut headers: Vec<(usize, &str)> = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            if let Some(section) = line.text.strip_prefix("## ") {
                if let Some(known) = CHARACTER_SECTIONS.iter().find(|s| **s == section) {
                    if !headers.iter().any(|(_, s)| s == known) {
                        headers.push((idx, known));
                    }
                }
            }
        }

        for (n, (idx, section)) in headers.iter().enumerate() {
            let start = lines[*idx].next;
            let end = headers
                .get(n + 1)
                .map_or(text.len(), |(next, _)| lines[*next].start);
            let content = unescape_lines(&section_content(&text[start..end]));
            match *section {
                BASIC_INFO => doc.set_basic_info(&content),
                PERSONALITY => doc.personality = content,
                BACKGROUND => doc.background = content,
                GOALS => doc.goals = content,
                CHARACTER_ARC => doc.arc = content,
                NOTES => doc.notes = content,
                _ => {}
            }
        }
        doc
    }

    fn set_basic_info(&mut self, content: &str) {
        let mut extra = Vec::new();
        for line in content.lines() {
            if let Some(role) = line.strip_prefix(ROLE_BULLET) {
                self.role = role.trim().to_string();
            } else if let Some(age) = line.strip_prefix(AGE_BULLET) {
                self.age = age.trim().to_string();
            } else {
                extra.push(line);
            }
        }
        self.basic_extra = extra.join("\n");
    }

    pub fn render(&self) -> String {
        let mut basic = format!("{} {}\n{} {}", ROLE_BULLET, self.role, AGE_BULLET, self.age);
        if !self.basic_extra.is_empty() {
            basic.push('\n');
            basic.push_str(&self.basic_extra);
        }

        let sections = [
            (BASIC_INFO, basic.as_str()),
            (PERSONALITY, self.personality.as_str()),
            (BACKGROUND, self.background.as_str()),
            (GOALS, self.goals.as_str()),
            (CHARACTER_ARC, self.arc.as_str()),
            (NOTES, self.notes.as_str()),
        ];

        let mut out = format!("# {}\n\n", self.name);
        for (header, content) in sections {
            out.push_str(&format!(
                "## {}\n\n{}\n\n",
                header,
                escape_lines(content, is_section_header)
            ));
        }
        out
    }

    pub fn to_character(&self) -> Character {
        let role = if self.role.trim().is_empty() {
            CharacterRole::default()
        } else {
            CharacterRole::parse(&self.role)
        };
        Character {
            name: self.name.clone(),
            role,
            age: self.age.clone(),
            description: self.background.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Copy the model fields into this document, keeping the other sections.
    pub fn update_from(&mut self, character: &Character) {
        self.name = character.name.clone();
        self.role = character.role.to_string();
        self.age = character.age.clone();
        self.background = character.description.clone();
        self.notes = character.notes.clone();
    }
}

/// Trim the framing newlines the renderer puts around a section body.
fn section_content(raw: &str) -> String {
    let raw = raw.strip_prefix('\n').unwrap_or(raw);
    let raw = raw
        .strip_suffix("\n\n")
        .or_else(|| raw.strip_suffix('\n'))
        .unwrap_or(raw);
    raw.to_string()
}

/// Parse a planning note: `# Title` heading, blank line, content.
pub fn parse_note(text: &str, stem: &str) -> (String, String) {
    let (heading, offset) = split_heading(text);
    (
        heading.unwrap_or_else(|| title_from_stem(stem)),
        text[offset..].to_string(),
    )
}

pub fn render_note(title: &str, content: &str) -> String {
    format!("# {}\n\n{}", title, content)
}

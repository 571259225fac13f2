//! Inline markdown: emphasis, strikethrough, code spans and links.
//!
//! Rules run in a fixed precedence order over HTML-escaped text. Markup a
//! rule produces is parked behind a placeholder token so later rules never
//! see (or re-escape) it; only the captured content stays exposed, which is
//! what lets `**a *b* c**` nest. Placeholders are expanded once at the end.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static BOLD_ITALIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*").expect("bold-italic regex"));
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold regex"));
static BOLD_UNDERSCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"__(.+?)__").expect("bold underscore regex"));
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").expect("italic regex"));
static ITALIC_UNDERSCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(.+?)_").expect("italic underscore regex"));
static STRIKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~(.+?)~~").expect("strike regex"));
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("code span regex"));
static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^\)]+)\)").expect("link regex"));
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("placeholder regex"));

const TOKEN_OPEN: char = '\u{E000}';
const TOKEN_CLOSE: char = '\u{E001}';

/// Whether markdown markers survive into the rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerMode {
    /// Final display markup; markers are consumed.
    #[default]
    Hide,
    /// Markers stay visible inside the markup, so the visible text of the
    /// output is exactly the input. Used for the line under the caret.
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    BoldItalic,
    Bold,
    BoldUnderscore,
    Italic,
    ItalicUnderscore,
    Strikethrough,
    Code,
    Link,
}

const RULES: [Rule; 8] = [
    Rule::BoldItalic,
    Rule::Bold,
    Rule::BoldUnderscore,
    Rule::Italic,
    Rule::ItalicUnderscore,
    Rule::Strikethrough,
    Rule::Code,
    Rule::Link,
];

impl Rule {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::BoldItalic => &BOLD_ITALIC_RE,
            Self::Bold => &BOLD_RE,
            Self::BoldUnderscore => &BOLD_UNDERSCORE_RE,
            Self::Italic => &ITALIC_RE,
            Self::ItalicUnderscore => &ITALIC_UNDERSCORE_RE,
            Self::Strikethrough => &STRIKE_RE,
            Self::Code => &CODE_RE,
            Self::Link => &LINK_RE,
        }
    }

    const fn marker(self) -> &'static str {
        match self {
            Self::BoldItalic => "***",
            Self::Bold => "**",
            Self::BoldUnderscore => "__",
            Self::Italic => "*",
            Self::ItalicUnderscore => "_",
            Self::Strikethrough => "~~",
            Self::Code => "`",
            Self::Link => "",
        }
    }

    const fn tags(self) -> (&'static str, &'static str) {
        match self {
            Self::BoldItalic => ("<strong><em>", "</em></strong>"),
            Self::Bold | Self::BoldUnderscore => ("<strong>", "</strong>"),
            Self::Italic | Self::ItalicUnderscore => ("<em>", "</em>"),
            Self::Strikethrough => ("<del>", "</del>"),
            Self::Code => ("<code>", "</code>"),
            Self::Link => ("", ""),
        }
    }

    fn apply(self, text: &str, mode: MarkerMode, parked: &mut Parked) -> String {
        match self {
            Self::Code => self
                .pattern()
                .replace_all(text, |caps: &Captures<'_>| {
                    let content = parked.restore(&caps[1]);
                    let source = format!("`{content}`");
                    let html = match mode {
                        MarkerMode::Hide => format!("<code>{content}</code>"),
                        MarkerMode::Show => format!("<code>{source}</code>"),
                    };
                    parked.park(html, source)
                })
                .into_owned(),
            Self::Link => self
                .pattern()
                .replace_all(text, |caps: &Captures<'_>| {
                    let label = &caps[1];
                    let url = parked.restore(&caps[2]);
                    let href = url.replace('"', "&quot;");
                    let source = format!("[{}]({url})", parked.restore(label));
                    let html = match mode {
                        MarkerMode::Hide => format!("<a href=\"{href}\">{label}</a>"),
                        MarkerMode::Show => format!("<a href=\"{href}\">[{label}]({url})</a>"),
                    };
                    parked.park(html, source)
                })
                .into_owned(),
            _ => {
                let (open, close) = self.tags();
                let marker = self.marker();
                self.pattern()
                    .replace_all(text, |caps: &Captures<'_>| {
                        let (open_html, close_html) = match mode {
                            MarkerMode::Hide => (open.to_string(), close.to_string()),
                            MarkerMode::Show => {
                                (format!("{open}{marker}"), format!("{marker}{close}"))
                            }
                        };
                        let (open_token, close_token) =
                            parked.park_pair(open_html, close_html, marker);
                        format!("{open_token}{}{close_token}", &caps[1])
                    })
                    .into_owned()
            }
        }
    }
}

/// Markup fragments already produced in this call, addressed by token.
#[derive(Debug, Default)]
struct Parked {
    fragments: Vec<Fragment>,
}

#[derive(Debug)]
struct Fragment {
    html: String,
    /// Escaped markdown the fragment was produced from.
    source: String,
    /// The other half of an open/close tag pair.
    partner: Option<usize>,
}

impl Parked {
    fn park(&mut self, html: String, source: String) -> String {
        let index = self.fragments.len();
        self.fragments.push(Fragment {
            html,
            source,
            partner: None,
        });
        format!("{TOKEN_OPEN}{index}{TOKEN_CLOSE}")
    }

    fn park_pair(&mut self, open: String, close: String, marker: &str) -> (String, String) {
        let open_index = self.fragments.len();
        let open_token = self.park(open, marker.to_string());
        let close_token = self.park(close, marker.to_string());
        self.fragments[open_index].partner = Some(open_index + 1);
        self.fragments[open_index + 1].partner = Some(open_index);
        (open_token, close_token)
    }

    /// Put the original markdown back in place of every token.
    ///
    /// A pair split by `text` loses its markup on both halves: the half left
    /// outside falls back to its literal marker so no tag is left unclosed.
    fn restore(&mut self, text: &str) -> String {
        let inside: Vec<usize> = TOKEN_RE
            .captures_iter(text)
            .filter_map(|caps| caps[1].parse().ok())
            .collect();
        for &index in &inside {
            let partner = self.fragments.get(index).and_then(|f| f.partner);
            if let Some(partner) = partner.filter(|p| !inside.contains(p)) {
                self.demote(partner);
            }
        }
        TOKEN_RE
            .replace_all(text, |caps: &Captures<'_>| {
                self.fragment(&caps[1])
                    .map(|f| f.source.clone())
                    .unwrap_or_default()
            })
            .into_owned()
    }

    /// Replace every token with its markup. Fragments only reference
    /// earlier fragments, so the recursion terminates.
    fn expand(&self, text: &str) -> String {
        TOKEN_RE
            .replace_all(text, |caps: &Captures<'_>| {
                self.fragment(&caps[1])
                    .map(|f| self.expand(&f.html))
                    .unwrap_or_default()
            })
            .into_owned()
    }

    fn demote(&mut self, index: usize) {
        if let Some(fragment) = self.fragments.get_mut(index) {
            fragment.html.clone_from(&fragment.source);
            fragment.partner = None;
        }
    }

    /// Park input characters that would otherwise read as token delimiters.
    /// Their source is the token itself, so [`restore`](Self::restore) keeps
    /// them parked and only [`expand`](Self::expand) brings the character back.
    fn shield(&mut self, text: &str) -> String {
        let mut shielded = String::with_capacity(text.len());
        for ch in text.chars() {
            if ch == TOKEN_OPEN || ch == TOKEN_CLOSE {
                let token = format!("{TOKEN_OPEN}{}{TOKEN_CLOSE}", self.fragments.len());
                self.fragments.push(Fragment {
                    html: ch.to_string(),
                    source: token.clone(),
                    partner: None,
                });
                shielded.push_str(&token);
            } else {
                shielded.push(ch);
            }
        }
        shielded
    }

    fn fragment(&self, index: &str) -> Option<&Fragment> {
        index.parse::<usize>().ok().and_then(|i| self.fragments.get(i))
    }
}

/// Escape literal text for HTML element content.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Render inline markdown with `mode` deciding marker visibility.
///
/// Unmatched markers (`**bold` with no closer) are left as literal text.
pub fn render_inline_with(text: &str, mode: MarkerMode) -> String {
    let mut parked = Parked::default();
    let mut work = parked.shield(&escape_html(text));
    for rule in RULES {
        work = rule.apply(&work, mode, &mut parked);
    }
    parked.expand(&work)
}

/// Render inline markdown to final display markup.
pub fn render_inline(text: &str) -> String {
    render_inline_with(text, MarkerMode::Hide)
}

/// Render inline markdown keeping every marker visible (for editing).
pub fn render_inline_with_markers(text: &str) -> String {
    render_inline_with(text, MarkerMode::Show)
}

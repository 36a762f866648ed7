//! The two smartlink forms:
//! - links: `[[ query ]]`, `[[ movie->query | label ]]`
//! - embeds: `{{ query | attribute }}`, `{{ event->query | image | 300 | alt=poster }}`
//!
//! A form preceded by a backslash (`\[[ … ]]`) is left alone.

use crate::content::EmbedOptions;
use crate::error::Result;
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

static LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\[\[\s*(?:(?P<type>\w+)\s*->)?(?P<query>[^\]|]+)(?:\|(?P<verbose>[^\]]+))?\s*\]\]",
    )
    .expect("link regex")
});

static EMBED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{\s*(?:(?P<type>\w+)\s*->)?(?P<query>[^\]|]+)\|\s*(?P<attr>\w+)(?P<options>(?:\s*\|\s*(?:\w+\s*=\s*\w+|\w+))+)?\s*\}\}",
    )
    .expect("embed regex")
});

const ESCAPE: char = '\\';

/// What follows the query of a parsed smartlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkKind {
    /// `[[ query | verbose ]]`
    Link { verbose: Option<String> },
    /// `{{ query | attribute | options… }}`
    Embed {
        attribute: String,
        options: EmbedOptions,
    },
}

/// One matched smartlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLink {
    /// The whole matched text, brackets included.
    pub full_text: String,
    pub type_hint: Option<String>,
    /// Trimmed query text.
    pub query: String,
    pub kind: LinkKind,
}

impl ParsedLink {
    /// Text shown for the link: the verbose text if given, else the query.
    ///
    /// A blank verbose text (`[[ a | ]]`) counts as absent, so the label is
    /// never empty while the query is not.
    pub fn label(&self) -> &str {
        match &self.kind {
            LinkKind::Link { verbose: Some(verbose) } if !verbose.is_empty() => verbose,
            _ => &self.query,
        }
    }

    pub fn is_embed(&self) -> bool {
        matches!(self.kind, LinkKind::Embed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Link,
    Embed,
}

/// Matcher for one smartlink form.
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    form: Form,
}

impl Grammar {
    pub fn link() -> Self {
        Self { form: Form::Link }
    }

    pub fn embed() -> Self {
        Self { form: Form::Embed }
    }

    fn regex(&self) -> &'static Regex {
        match self.form {
            Form::Link => &LINK_REGEX,
            Form::Embed => &EMBED_REGEX,
        }
    }

    /// Parse a smartlink at the very start of `text`. Trailing text is ignored.
    pub fn parse(&self, text: &str) -> Option<ParsedLink> {
        let caps = self.regex().captures(text)?;
        let whole = caps.get(0)?;
        (whole.start() == 0).then(|| self.build(&caps))
    }

    /// Every unescaped smartlink of `text`, leftmost first, non-overlapping.
    pub fn find_all(&self, text: &str) -> Vec<(Range<usize>, ParsedLink)> {
        let mut found = Vec::new();
        let mut at = 0;

        while let Some((range, caps)) = self.next_match(text, at) {
            at = range.end;
            found.push((range, self.build(&caps)));
        }

        found
    }

    /// Replace every unescaped smartlink with the output of `render`.
    /// Escaped smartlinks and the surrounding text are copied unchanged.
    pub fn replace_all<F>(&self, text: &str, mut render: F) -> Result<String>
    where
        F: FnMut(&ParsedLink) -> Result<String>,
    {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for (range, parsed) in self.find_all(text) {
            out.push_str(&text[last..range.start]);
            out.push_str(&render(&parsed)?);
            last = range.end;
        }
        out.push_str(&text[last..]);

        Ok(out)
    }

    /// Next match starting at or after `at` whose opening bracket is not
    /// escaped. A rejected match resumes the search one character later.
    fn next_match<'t>(&self, text: &'t str, mut at: usize) -> Option<(Range<usize>, Captures<'t>)> {
        while at <= text.len() {
            let caps = self.regex().captures_at(text, at)?;
            let whole = caps.get(0)?;

            if text[..whole.start()].ends_with(ESCAPE) {
                at = whole.start()
                    + text[whole.start()..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
                continue;
            }

            return Some((whole.range(), caps));
        }
        None
    }

    fn build(&self, caps: &Captures<'_>) -> ParsedLink {
        let text = |name: &str| caps.name(name).map(|m| m.as_str().trim().to_string());

        let kind = match self.form {
            Form::Link => LinkKind::Link {
                verbose: text("verbose"),
            },
            Form::Embed => LinkKind::Embed {
                attribute: text("attr").unwrap_or_default(),
                options: parse_options(caps.name("options").map_or("", |m| m.as_str())),
            },
        };

        ParsedLink {
            full_text: caps.get(0).map_or_else(String::new, |m| m.as_str().to_string()),
            type_hint: text("type"),
            query: text("query").unwrap_or_default(),
            kind,
        }
    }
}

/// Split `| 300 | alt = poster` into positional and named options.
fn parse_options(raw: &str) -> EmbedOptions {
    let mut options = EmbedOptions::default();

    for option in raw
        .trim_matches(|c: char| c == '|' || c.is_whitespace())
        .split('|')
        .map(str::trim)
        .filter(|option| !option.is_empty())
    {
        match option.split_once('=') {
            Some((key, value)) => {
                options
                    .named
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
            None => options.positional.push(option.to_string()),
        }
    }

    options
}

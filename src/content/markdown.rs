//! Markdown rendering with syntax highlighting

use lazy_static::lazy_static;
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use super::Body;
use crate::config::HighlightConfig;

lazy_static! {
    /// Top-level ESM statements in MDX files
    static ref MDX_MODULE_LINE: Regex =
        Regex::new(r"^(import\s.+\sfrom\s|import\s+['\x22]|export\s+(const|let|var|function|default)\b)")
            .unwrap();
}

/// Table of contents entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    pub id: String,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: config.theme.clone(),
            highlight: config.enable,
            line_numbers: config.line_number,
        }
    }

    /// Render markdown to a document body
    pub fn render(&self, markdown: &str) -> Body {
        // Front-matter is stripped by FrontMatter::parse, so no metadata blocks here
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let highlighted =
                        self.highlight_code(&code_block_content, code_block_lang.as_deref());
                    events.push(Event::Html(CowStr::from(highlighted)));
                    in_code_block = false;
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                _ if in_code_block => {}
                _ => events.push(event),
            }
        }

        let toc = assign_heading_ids(&mut events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Body {
            raw: markdown.to_string(),
            html: html_output,
            toc,
        }
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");

        if !self.highlight {
            return plain_code_block(code, lang);
        }

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let Some(theme) = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .or_else(|| self.theme_set.themes.values().next())
        else {
            return plain_code_block(code, lang);
        };

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) if self.line_numbers => add_line_numbers(&highlighted, lang),
            Ok(highlighted) => format!(r#"<figure class="highlight {}">{}</figure>"#, lang, highlighted),
            Err(e) => {
                tracing::debug!("Highlighting failed for {}: {}", lang, e);
                plain_code_block(code, lang)
            }
        }
    }

    /// Remove top-level `import`/`export` lines from an MDX source.
    /// Lines inside fenced code blocks are left alone.
    pub fn strip_mdx_module_lines(source: &str) -> String {
        let mut output = String::with_capacity(source.len());
        let mut fence: Option<&str> = None;

        for line in source.lines() {
            let trimmed = line.trim_start();
            match fence {
                Some(marker) => {
                    if trimmed.starts_with(marker) {
                        fence = None;
                    }
                }
                None if trimmed.starts_with("```") => fence = Some("```"),
                None if trimmed.starts_with("~~~") => fence = Some("~~~"),
                None if MDX_MODULE_LINE.is_match(line) => continue,
                None => {}
            }
            output.push_str(line);
            output.push('\n');
        }

        output
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Give h2/h3 headings an id and collect them into a table of contents
fn assign_heading_ids(events: &mut [Event]) -> Vec<TocEntry> {
    let mut toc = Vec::new();
    // Explicit `{#id}` attributes are reserved before any id is generated
    let mut seen: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    let mut i = 0;
    while i < events.len() {
        let Event::Start(Tag::Heading { level, id, .. }) = &events[i] else {
            i += 1;
            continue;
        };
        let level = *level;
        let existing_id = id.as_ref().map(|s| s.to_string());

        let mut title = String::new();
        let mut j = i + 1;
        while j < events.len() {
            match &events[j] {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => title.push_str(t),
                _ => {}
            }
            j += 1;
        }

        let toc_level = match level {
            HeadingLevel::H2 => Some(2),
            HeadingLevel::H3 => Some(3),
            _ => None,
        };

        if let Some(toc_level) = toc_level {
            let id = existing_id.unwrap_or_else(|| unique_id(&title, &mut seen));
            if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
                *slot = Some(CowStr::from(id.clone()));
            }
            toc.push(TocEntry {
                level: toc_level,
                title: title.trim().to_string(),
                id,
            });
        }

        i = j + 1;
    }

    toc
}

fn unique_id(title: &str, seen: &mut HashSet<String>) -> String {
    let base = match slug::slugify(title) {
        s if s.is_empty() => "section".to_string(),
        s => s,
    };

    let mut candidate = base.clone();
    let mut n = 1;
    while !seen.insert(candidate.clone()) {
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    candidate
}

fn plain_code_block(code: &str, lang: &str) -> String {
    format!(
        r#"<pre><code class="language-{}">{}</code></pre>"#,
        lang,
        html_escape(code)
    )
}

/// Add line numbers to highlighted code
fn add_line_numbers(code: &str, lang: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();

    let gutter = (1..=lines.len())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
        lang,
        gutter,
        lines.join("\n")
    )
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let body = renderer.render("# Hello World\n\nThis is a test.");
        assert!(body.html.contains("<h1>Hello World</h1>"));
        assert!(body.html.contains("<p>This is a test.</p>"));
        assert_eq!(body.raw, "# Hello World\n\nThis is a test.");
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let body = renderer.render("```ts\nexpect(sum(1, 2)).toBe(3)\n```");
        assert!(body.html.contains("highlight"));
        assert!(!body.html.contains("```"));
    }

    #[test]
    fn test_render_code_block_without_highlighting() {
        let renderer = MarkdownRenderer::with_options(&HighlightConfig {
            enable: false,
            ..Default::default()
        });
        let body = renderer.render("```js\nif (a < b) {}\n```");
        assert!(body
            .html
            .contains(r#"<pre><code class="language-js">if (a &lt; b) {}"#));
    }

    #[test]
    fn test_heading_ids_and_toc() {
        let renderer = MarkdownRenderer::new();
        let body = renderer.render(
            "# Mocks\n\n## Why mock?\n\ntext\n\n### `vi.fn()`\n\n## Why mock?\n\n#### deep\n",
        );

        assert_eq!(
            body.toc,
            vec![
                TocEntry {
                    level: 2,
                    title: "Why mock?".to_string(),
                    id: "why-mock".to_string()
                },
                TocEntry {
                    level: 3,
                    title: "vi.fn()".to_string(),
                    id: "vi-fn".to_string()
                },
                TocEntry {
                    level: 2,
                    title: "Why mock?".to_string(),
                    id: "why-mock-1".to_string()
                },
            ]
        );
        assert!(body.html.contains(r#"<h2 id="why-mock">"#));
        assert!(body.html.contains(r#"<h2 id="why-mock-1">"#));
    }

    #[test]
    fn test_generated_ids_avoid_explicit_ids() {
        let renderer = MarkdownRenderer::new();
        let body = renderer.render("## Why mock?\n\n## Overview {#why-mock}\n\n## Why mock?\n");

        let ids: Vec<_> = body.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["why-mock-1", "why-mock", "why-mock-2"]);
        assert_eq!(body.html.matches(r#"id="why-mock""#).count(), 1);
    }

    #[test]
    fn test_strip_mdx_module_lines() {
        let source = r#"import Callout from '../components/Callout.svelte';
export const meta = { hidden: true };

Some text about imports.

```js
import { describe } from 'vitest';
```
"#;
        let stripped = MarkdownRenderer::strip_mdx_module_lines(source);
        assert!(!stripped.contains("Callout.svelte"));
        assert!(!stripped.contains("export const meta"));
        assert!(stripped.contains("Some text about imports."));
        assert!(stripped.contains("import { describe } from 'vitest';"));
    }
}

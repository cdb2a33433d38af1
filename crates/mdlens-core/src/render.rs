use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::dom::{Markup, markup_to_html};

/// Renders markdown into a serializable node tree.
#[must_use]
pub fn render_markdown(content: &str) -> Vec<Markup> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut builder = TreeBuilder::default();
    for event in Parser::new_ext(content, options) {
        builder.event(event);
    }
    builder.finish()
}

#[must_use]
pub fn render_markdown_html(content: &str) -> String {
    markup_to_html(&render_markdown(content))
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Markup>,
    open: Vec<Markup>,
    in_table_head: bool,
    table_body_open: bool,
}

impl TreeBuilder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text)
            | Event::Html(text)
            | Event::InlineHtml(text)
            | Event::InlineMath(text)
            | Event::DisplayMath(text) => self.push(Markup::text(text.into_string())),
            Event::Code(code) => self.push(Markup::element(
                "code",
                vec![Markup::text(code.into_string())],
            )),
            Event::FootnoteReference(label) => {
                let label = label.into_string();
                self.push(Markup::element(
                    "sup",
                    vec![Markup::Element {
                        tag: "a".to_string(),
                        attrs: vec![("href".to_string(), format!("#{label}"))],
                        children: vec![Markup::text(label)],
                    }],
                ));
            }
            Event::SoftBreak => self.push(Markup::text("\n")),
            Event::HardBreak => self.push(Markup::element("br", Vec::new())),
            Event::Rule => self.push(Markup::element("hr", Vec::new())),
            Event::TaskListMarker(checked) => {
                let mut attrs = vec![
                    ("type".to_string(), "checkbox".to_string()),
                    ("disabled".to_string(), String::new()),
                ];
                if checked {
                    attrs.push(("checked".to_string(), String::new()));
                }
                self.push(Markup::Element {
                    tag: "input".to_string(),
                    attrs,
                    children: Vec::new(),
                });
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::HtmlBlock => self.open("p", Vec::new()),
            Tag::Heading { level, id, .. } => {
                let attrs = id
                    .map(|id| vec![("id".to_string(), id.into_string())])
                    .unwrap_or_default();
                self.open(&format!("h{}", level as usize), attrs);
            }
            Tag::BlockQuote(_) => self.open("blockquote", Vec::new()),
            Tag::CodeBlock(kind) => {
                self.open("pre", Vec::new());
                let attrs = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                        let lang = lang.split_whitespace().next().unwrap_or_default();
                        vec![("class".to_string(), format!("language-{lang}"))]
                    }
                    _ => Vec::new(),
                };
                self.open("code", attrs);
            }
            Tag::List(Some(start)) => {
                let attrs = if start == 1 {
                    Vec::new()
                } else {
                    vec![("start".to_string(), start.to_string())]
                };
                self.open("ol", attrs);
            }
            Tag::List(None) => self.open("ul", Vec::new()),
            Tag::Item => self.open("li", Vec::new()),
            Tag::FootnoteDefinition(label) => self.open(
                "div",
                vec![
                    ("class".to_string(), "footnote-definition".to_string()),
                    ("id".to_string(), label.into_string()),
                ],
            ),
            Tag::Table(_) => self.open("table", Vec::new()),
            Tag::TableHead => {
                self.in_table_head = true;
                self.open("thead", Vec::new());
                self.open("tr", Vec::new());
            }
            Tag::TableRow => self.open("tr", Vec::new()),
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                self.open(tag, Vec::new());
            }
            Tag::Emphasis => self.open("em", Vec::new()),
            Tag::Strong => self.open("strong", Vec::new()),
            Tag::Strikethrough => self.open("del", Vec::new()),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut attrs = vec![(
                    "href".to_string(),
                    sanitize_link_destination(dest_url).into_string(),
                )];
                if !title.is_empty() {
                    attrs.push(("title".to_string(), title.into_string()));
                }
                self.open("a", attrs);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut attrs = vec![(
                    "src".to_string(),
                    sanitize_image_source(dest_url).into_string(),
                )];
                if !title.is_empty() {
                    attrs.push(("title".to_string(), title.into_string()));
                }
                self.open("img", attrs);
            }
            _ => self.open("div", Vec::new()),
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => {
                self.close();
                self.close();
            }
            TagEnd::TableHead => {
                self.close();
                self.close();
                self.in_table_head = false;
                self.open("tbody", Vec::new());
                self.table_body_open = true;
            }
            TagEnd::Table => {
                if self.table_body_open {
                    self.close();
                    self.table_body_open = false;
                }
                self.close();
            }
            TagEnd::Image => {
                if let Some(Markup::Element {
                    tag,
                    mut attrs,
                    children,
                }) = self.open.pop()
                {
                    attrs.push(("alt".to_string(), plain_text(&children)));
                    self.push(Markup::Element {
                        tag,
                        attrs,
                        children: Vec::new(),
                    });
                }
            }
            TagEnd::Link => {
                if let Some(Markup::Element {
                    tag,
                    attrs,
                    children,
                }) = self.open.pop()
                {
                    let children = relabel_self_link(&attrs, children);
                    self.push(Markup::Element {
                        tag,
                        attrs,
                        children,
                    });
                }
            }
            _ => self.close(),
        }
    }

    fn open(&mut self, tag: &str, attrs: Vec<(String, String)>) {
        self.open.push(Markup::Element {
            tag: tag.to_string(),
            attrs,
            children: Vec::new(),
        });
    }

    fn close(&mut self) {
        if let Some(node) = self.open.pop() {
            self.push(node);
        }
    }

    fn push(&mut self, node: Markup) {
        let siblings = match self.open.last_mut() {
            Some(Markup::Element { children, .. }) => children,
            _ => &mut self.roots,
        };
        if let (Markup::Text { text }, Some(Markup::Text { text: previous })) =
            (&node, siblings.last_mut())
        {
            previous.push_str(text);
            return;
        }
        siblings.push(node);
    }

    fn finish(mut self) -> Vec<Markup> {
        while !self.open.is_empty() {
            self.close();
        }
        self.roots
    }
}

fn plain_text(nodes: &[Markup]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Markup::Text { text } => out.push_str(text),
            Markup::Element { children, .. } => out.push_str(&plain_text(children)),
        }
    }
    out
}

/// `<a href="https://host/path">https://host/path</a>` is shown as `host/path`.
fn relabel_self_link(attrs: &[(String, String)], children: Vec<Markup>) -> Vec<Markup> {
    let Some(href) = attrs
        .iter()
        .find(|(name, _)| name == "href")
        .map(|(_, value)| value.as_str())
    else {
        return children;
    };
    let is_self_labelled =
        matches!(children.as_slice(), [Markup::Text { text }] if text.trim() == href);
    match self_link_label(href) {
        Some(label) if is_self_labelled => vec![Markup::text(label)],
        _ => children,
    }
}

fn self_link_label(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

fn sanitize_link_destination(dest_url: CowStr<'_>) -> CowStr<'static> {
    let value = dest_url.into_string();
    if is_safe_destination(&value, true) {
        CowStr::from(value)
    } else {
        CowStr::from("#")
    }
}

fn sanitize_image_source(dest_url: CowStr<'_>) -> CowStr<'static> {
    let value = dest_url.into_string();
    if is_safe_destination(&value, false) {
        CowStr::from(value)
    } else {
        CowStr::from("")
    }
}

fn is_safe_destination(value: &str, allow_mailto: bool) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return true;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("//") {
        return false;
    }
    if lower.starts_with('#')
        || lower.starts_with('/')
        || lower.starts_with("./")
        || lower.starts_with("../")
    {
        return true;
    }
    if lower.starts_with("http://")
        || lower.starts_with("https://")
        || (allow_mailto && lower.starts_with("mailto:"))
    {
        return true;
    }

    !lower.contains(':')
}

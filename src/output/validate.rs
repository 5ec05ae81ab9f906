//! Structural HTML validation for the generated report
//!
//! Stricter than HTML parsing rules: every non-void element must be closed
//! explicitly and in order.

use crate::stats::{StatsError, StatsResult};
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::OnceLock;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

const SINGLETON_ELEMENTS: &[&str] = &["html", "head", "title", "body"];

struct Patterns {
    comment: Regex,
    script: Regex,
    style: Regex,
    tag: Regex,
    stray_lt: Regex,
    id_attr: Regex,
    title: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        comment: Regex::new(r"(?s)()<!--(.*?)-->()").expect("valid comment pattern"),
        script: Regex::new(r"(?is)(<script\b[^>]*>)(.*?)(</script\s*>)").expect("valid script pattern"),
        style: Regex::new(r"(?is)(<style\b[^>]*>)(.*?)(</style\s*>)").expect("valid style pattern"),
        tag: Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)([^<>]*?)(/?)>").expect("valid tag pattern"),
        stray_lt: Regex::new(r"<([^A-Za-z/!]|$)").expect("valid stray pattern"),
        id_attr: Regex::new(r#"(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("valid id pattern"),
        title: Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("valid title pattern"),
    })
}

/// Replace the body of a raw-text region with its newlines only
fn blank_body(caps: &Captures) -> String {
    let newlines = "\n".repeat(caps[2].matches('\n').count());
    format!("{}{}{}", &caps[1], newlines, &caps[3])
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Check that `html` is a structurally sound HTML5 document
pub fn validate_html(html: &str) -> StatsResult<()> {
    let p = patterns();

    if !html.trim_start().to_ascii_lowercase().starts_with("<!doctype html>") {
        return Err(StatsError::validation(1, "document must start with <!DOCTYPE html>"));
    }

    // Comments and script/style bodies are opaque to the tag checks
    let stripped = p.comment.replace_all(html, |caps: &Captures| blank_body(caps));
    let stripped = p.script.replace_all(&stripped, |caps: &Captures| blank_body(caps));
    let stripped = p.style.replace_all(&stripped, |caps: &Captures| blank_body(caps));
    let text: &str = &stripped;

    if let Some(found) = p.stray_lt.find(text) {
        return Err(StatsError::validation(line_of(text, found.start()), "bad character after '<'"));
    }

    let mut open: Vec<(String, usize)> = Vec::new();
    let mut seen_singletons: HashSet<String> = HashSet::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for caps in p.tag.captures_iter(text) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
        let line = line_of(text, whole);
        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        let self_closing = !caps[4].is_empty();
        let is_void = VOID_ELEMENTS.contains(&name.as_str());

        if closing {
            if is_void {
                return Err(StatsError::validation(line, format!("end tag for void element <{}>", name)));
            }
            match open.pop() {
                Some((expected, _)) if expected == name => {}
                Some((expected, opened_at)) => {
                    return Err(StatsError::validation(
                        line,
                        format!("</{}> does not close <{}> opened on line {}", name, expected, opened_at),
                    ));
                }
                None => {
                    return Err(StatsError::validation(line, format!("stray end tag </{}>", name)));
                }
            }
            continue;
        }

        if self_closing && !is_void {
            return Err(StatsError::validation(
                line,
                format!("self-closing syntax on non-void element <{}>", name),
            ));
        }

        if SINGLETON_ELEMENTS.contains(&name.as_str()) && !seen_singletons.insert(name.clone()) {
            return Err(StatsError::validation(line, format!("duplicate <{}> element", name)));
        }

        if let Some(id) = p.id_attr.captures(&caps[3]) {
            let value = id
                .get(1)
                .or_else(|| id.get(2))
                .or_else(|| id.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if value.is_empty() {
                return Err(StatsError::validation(line, "empty id attribute"));
            }
            if !seen_ids.insert(value.to_string()) {
                return Err(StatsError::validation(line, format!("duplicate id '{}'", value)));
            }
        }

        if !is_void {
            open.push((name, line));
        }
    }

    if let Some((name, line)) = open.pop() {
        return Err(StatsError::validation(line, format!("<{}> is never closed", name)));
    }

    for required in SINGLETON_ELEMENTS {
        if !seen_singletons.contains(*required) {
            return Err(StatsError::validation(1, format!("missing <{}> element", required)));
        }
    }

    let title = p
        .title
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    if title.is_empty() {
        return Err(StatsError::validation(1, "<title> must not be empty"));
    }

    Ok(())
}

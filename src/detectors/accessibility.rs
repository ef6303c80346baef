//! Accessibility rules for JSX markup

use crate::detectors::base::{has_attribute, has_spread, tag_extent, FileContext, Hit, LineIndex, Matcher};
use crate::detectors::catalog::{CLICK_WITHOUT_KEYBOARD, IMG_MISSING_ALT};
use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static IMG_TAG: OnceLock<Regex> = OnceLock::new();
static STATIC_TAG: OnceLock<Regex> = OnceLock::new();

fn img_tag() -> &'static Regex {
    IMG_TAG.get_or_init(|| Regex::new(r"<(img|Image)\b").expect("valid regex"))
}

fn static_tag() -> &'static Regex {
    STATIC_TAG
        .get_or_init(|| Regex::new(r"<(div|span|li|p|section|img)\b").expect("valid regex"))
}

fn is_markup_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx" | "jsx" | "js")
    )
}

/// Opening tags matching `re`, as (start offset, tag name, tag text)
fn opening_tags<'a>(masked: &'a str, re: &Regex) -> Vec<(usize, &'a str, &'a str)> {
    re.captures_iter(masked)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            let end = tag_extent(masked, whole.start())?;
            Some((whole.start(), name.as_str(), &masked[whole.start()..end]))
        })
        .collect()
}

pub struct ImgAltMatcher;

impl Matcher for ImgAltMatcher {
    fn rule_id(&self) -> &'static str {
        IMG_MISSING_ALT
    }

    fn applies_to(&self, path: &Path) -> bool {
        is_markup_path(path)
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let index = LineIndex::new(ctx.masked);
        Ok(opening_tags(ctx.masked, img_tag())
            .into_iter()
            .filter(|(_, _, tag)| !has_attribute(tag, "alt") && !has_spread(tag))
            .map(|(start, name, _)| {
                let (line, column) = index.position(start);
                Hit::new(line, column, format!("<{}> has no alt text", name))
                    .with_suggestion("Describe the image in `alt`, or use alt=\"\" if it is purely decorative")
            })
            .collect())
    }
}

pub struct ClickKeyboardMatcher;

const KEY_HANDLERS: &[&str] = &["onKeyDown", "onKeyUp", "onKeyPress"];

impl Matcher for ClickKeyboardMatcher {
    fn rule_id(&self) -> &'static str {
        CLICK_WITHOUT_KEYBOARD
    }

    fn applies_to(&self, path: &Path) -> bool {
        is_markup_path(path)
    }

    fn check(&self, ctx: &FileContext<'_>) -> Result<Vec<Hit>> {
        let index = LineIndex::new(ctx.masked);
        Ok(opening_tags(ctx.masked, static_tag())
            .into_iter()
            .filter(|(_, _, tag)| {
                has_attribute(tag, "onClick")
                    && !has_spread(tag)
                    && !KEY_HANDLERS.iter().any(|h| has_attribute(tag, h))
            })
            .map(|(start, name, _)| {
                let (line, column) = index.position(start);
                Hit::new(
                    line,
                    column,
                    format!("<{}> handles clicks but not keyboard input", name),
                )
                .with_suggestion("Use a <button>, or add onKeyDown together with role and tabIndex")
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::options::RuleOptions;
    use crate::detectors::base::mask_comments_and_strings;

    fn run(matcher: &dyn Matcher, src: &str) -> Vec<Hit> {
        let masked = mask_comments_and_strings(src);
        let options = RuleOptions::default();
        let ctx = FileContext {
            path: Path::new("View.jsx"),
            content: src,
            masked: &masked,
            syntax: None,
            options: &options,
        };
        matcher.check(&ctx).unwrap()
    }

    #[test]
    fn test_img_without_alt() {
        let src = "<div>\n  <img src=\"a.png\" />\n  <img src=\"b.png\" alt=\"b\" />\n  <Image\n    src={hero}\n    alt=\"\"\n  />\n  <img {...props} />\n</div>\n";
        let hits = run(&ImgAltMatcher, src);
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].line, hits[0].column), (2, 3));
    }

    #[test]
    fn test_img_in_comment_ignored() {
        let src = "// <img src=\"x\" />\nconst a = 1;\n";
        assert!(run(&ImgAltMatcher, src).is_empty());
    }

    #[test]
    fn test_click_without_keyboard() {
        let src = "<div onClick={() => go()}>x</div>\n<div onClick={go} onKeyDown={key}>y</div>\n<button onClick={go}>z</button>\n<span className=\"a\">q</span>\n";
        let hits = run(&ClickKeyboardMatcher, src);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].line, 1);
        assert!(hits[0].message.contains("<div>"));
    }

    #[test]
    fn test_only_markup_files() {
        assert!(ImgAltMatcher.applies_to(Path::new("a.tsx")));
        assert!(!ImgAltMatcher.applies_to(Path::new("a.ts")));
    }
}

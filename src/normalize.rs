//! Text normalization applied by the content collectors.
//!
//! Route sources are component files full of imports, markup, and styling
//! noise; only the prose and link structure is worth indexing. The rules:
//!
//! - drop `import` / `export … from` module lines,
//! - drop `className=` / `style=` presentation attributes,
//! - drop raw markup tags,
//! - rewrite absolute links on the site's own domains to relative links,
//! - collapse runs of blank lines and trim.
//!
//! Prose sources (blog frontmatter, summaries) keep their markup and only
//! get the link rewrite and blank-line collapse.

/// Full normalization pipeline for markup-heavy route sources. Links are
/// rewritten before tags are stripped, so a link that only exists inside
/// a removed tag is simply gone rather than half-rewritten.
pub fn normalize_markup(text: &str, own_domains: &[String]) -> String {
    let text = strip_module_lines(text);
    let text = strip_presentation_attrs(&text);
    let text = rewrite_absolute_links(&text, own_domains);
    let text = strip_tags(&text);
    collapse_blank_lines(&text)
}

/// Light normalization for prose sources.
pub fn normalize_prose(text: &str, own_domains: &[String]) -> String {
    let text = rewrite_absolute_links(text, own_domains);
    collapse_blank_lines(&text)
}

/// Remove `import …` lines and `export … from …` re-export lines.
fn strip_module_lines(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            let is_import = trimmed.starts_with("import ") || trimmed.starts_with("import{");
            let is_reexport = trimmed.starts_with("export ") && trimmed.contains(" from ");
            !(is_import || is_reexport)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove `className=` and `style=` attributes, including `{…}` expression
/// values with nested braces.
fn strip_presentation_attrs(text: &str) -> String {
    let mut out = text.to_string();
    for attr in ["className=", "style="] {
        let mut search_from = 0;
        while let Some(rel) = out[search_from..].find(attr) {
            let start = search_from + rel;
            let value_start = start + attr.len();
            match attr_value_end(&out[value_start..]) {
                Some(end) => {
                    // Eat preceding spaces so the tag collapses cleanly.
                    let mut cut_start = start;
                    while cut_start > 0 && out.as_bytes()[cut_start - 1] == b' ' {
                        cut_start -= 1;
                    }
                    out.replace_range(cut_start..value_start + end, "");
                    search_from = cut_start;
                }
                None => {
                    search_from = value_start;
                }
            }
        }
    }
    out
}

/// Length of an attribute value: a quoted string or a balanced `{…}` block.
fn attr_value_end(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    match first {
        '"' | '\'' => {
            for (i, c) in chars {
                if c == first {
                    return Some(i + 1);
                }
            }
            None
        }
        '{' => {
            let mut depth = 1usize;
            for (i, c) in chars {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => Some(0),
    }
}

/// Drop `<…>` tag spans, keeping the text between them.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Rewrite `https://<own-domain>/path` to `/path`; leave every other
/// absolute link untouched.
pub fn rewrite_absolute_links(text: &str, own_domains: &[String]) -> String {
    if own_domains.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(pos) = rest.find("http") else {
            out.push_str(rest);
            break;
        };
        let (before, candidate) = rest.split_at(pos);
        out.push_str(before);

        let after_scheme = candidate
            .strip_prefix("https://")
            .or_else(|| candidate.strip_prefix("http://"));
        let Some(after_scheme) = after_scheme else {
            // "http" that is not a URL scheme; emit it and move on.
            out.push_str(&candidate[..4]);
            rest = &candidate[4..];
            continue;
        };

        let matched = own_domains.iter().find(|d| {
            after_scheme.starts_with(d.as_str())
                && matches!(
                    after_scheme[d.len()..].chars().next(),
                    None | Some('/') | Some('"') | Some('\'') | Some(')') | Some(' ')
                        | Some('\n') | Some('<')
                )
        });

        match matched {
            Some(domain) => {
                let tail = &after_scheme[domain.len()..];
                if tail.starts_with('/') {
                    // Keep the path; the scheme and host are dropped.
                    rest = tail;
                } else {
                    out.push('/');
                    rest = tail;
                }
            }
            None => {
                let scheme_len = candidate.len() - after_scheme.len();
                out.push_str(&candidate[..scheme_len]);
                rest = after_scheme;
            }
        }
    }
    out
}

/// Collapse consecutive blank lines into nothing and trim the result.
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        out.push(line.trim_end());
    }
    out.join("\n").trim().to_string()
}

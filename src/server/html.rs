//! HTML pages: the home/usage page, version listings, and directory
//! listings. Markup is deliberately plain; this gateway is a developer
//! tool, not a storefront.

use std::collections::BTreeMap;

use crate::node_semver;
use crate::pathspec::PathSpec;
use crate::registry::RegistryDocument;

pub fn home_page() -> String {
    PAGE_TEMPLATE
        .replace("{title}", "tinydelivr")
        .replace(
            "{body}",
            r#"This service is similar to jsDelivr. It extracts files from the npm registry.
<hr>
<h2>Usage</h2>

Use package <code>react</code> as an example:

<ul>
    <li><a href="/react@all"><code>/react@all</code></a> - Show all versions.</li>
    <li><a href="/react@dist-tags"><code>/react@dist-tags</code></a> - Show all versions referenced by a distribution tag.</li>
    <li><a href="/react@>=5.0.0 <18.0.0 || 0.14.3"><code>/react@&gt;=5.0.0 &lt;18.0.0 || 0.14.3</code></a> - Show all versions that satisfy a version range.</li>
    <li><a href="/react@19.2.0"><code>/react@19.2.0</code></a> - Show the content of an exact version.</li>
    <li><a href="/react@next"><code>/react@next</code></a> - Show the content behind a distribution tag (here: <code>next</code>).</li>
    <li><a href="/react"><code>/react</code></a> - Show the content behind the <code>latest</code> tag.</li>
</ul>
"#,
        )
}

/// Listing page for a specifier that matched a set of versions. A range
/// that matched exactly one version still lands here: the user asked for a
/// listing, not a designation.
pub fn versions_page(versions: &[String], doc: &RegistryDocument, spec: &PathSpec) -> String {
    let title = format!(
        "All valid version(s) for package \"{}\" with requirement(s) \"{}\"",
        escape(&spec.package_name),
        escape(&spec.version_spec)
    );
    page(&title, &versions_tables_highlighting_tags(versions, doc, spec))
}

/// Fallback page when nothing matched: show every published version so the
/// user can pick one.
pub fn all_versions_page(doc: &RegistryDocument, spec: &PathSpec) -> String {
    let title = format!(
        "No version for package \"{}\" with requirement(s) \"{}\" is found",
        escape(&spec.package_name),
        escape(&spec.version_spec)
    );
    let all: Vec<String> = doc.versions.keys().cloned().collect();
    let body = format!(
        "Showing all versions for package \"{}\".\n<hr>\n{}",
        escape(&spec.package_name),
        versions_tables_highlighting_tags(&all, doc, spec)
    );
    page(&title, &body)
}

pub fn directory_page(local_name: &str, path: &str, entries: &[String]) -> String {
    let title = format!("{} :: {}", escape(local_name), escape(path));
    let links: Vec<String> = entries
        .iter()
        .map(|entry| element_a(entry, entry))
        .collect();
    page(&title, &unordered_list(&links))
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE HTML>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<h1>{title}</h1>
<hr>
{body}
<hr>
</body>
</html>
"#;

fn page(title: &str, body: &str) -> String {
    PAGE_TEMPLATE
        .replace("{title}", title)
        .replace("{body}", body)
}

/// Tagged versions first (unless every listed version is tagged), then the
/// full list.
fn versions_tables_highlighting_tags(
    versions: &[String],
    doc: &RegistryDocument,
    spec: &PathSpec,
) -> String {
    let tagged: Vec<String> = versions
        .iter()
        .filter(|version| doc.dist_tags.values().any(|target| target == *version))
        .cloned()
        .collect();

    let mut out = String::new();
    if tagged.len() == versions.len() {
        out.push_str("(all version(s) have dist-tag(s))<br/>\n");
    } else {
        out.push_str("version(s) with dist-tag(s):<br/>\n");
        out.push_str(&versions_table(&tagged, doc, spec));
    }
    out.push_str("<hr>\nfull list:<br/>\n");
    out.push_str(&versions_table(versions, doc, spec));
    out
}

/// One row per version, newest first, with the version linked back into
/// the gateway (keeping the requested object path) and its tags, if any.
fn versions_table(versions: &[String], doc: &RegistryDocument, spec: &PathSpec) -> String {
    // Several dist-tags may share a version and several list entries may
    // repeat one; dedup for display.
    let mut versions: Vec<String> = versions.to_vec();
    versions.sort_by(|a, b| node_semver::compare(b, a));
    versions.dedup();

    let mut version_tags: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (tag, target) in &doc.dist_tags {
        version_tags.entry(target).or_default().push(tag);
    }

    let object_suffix = spec
        .object_path
        .as_ref()
        .map(|object| object.to_string())
        .unwrap_or_default();

    let rows: Vec<[String; 2]> = versions
        .iter()
        .map(|version| {
            let href = format!("/{}@{}{}", spec.package_name, version, object_suffix);
            let tags = version_tags
                .get(version.as_str())
                .map(|tags| tags.join("; "))
                .unwrap_or_default();
            [element_a(&href, version), escape(&tags)]
        })
        .collect();

    table_with_head(&["version", "dist-tag"], &rows)
}

fn table_with_head(titles: &[&str], rows: &[[String; 2]]) -> String {
    if rows.is_empty() {
        return "(Empty table)".to_string();
    }
    let head: Vec<String> = titles
        .iter()
        .map(|title| format!("<th scope=\"col\">{title}</th>"))
        .collect();
    let body: Vec<String> = rows
        .iter()
        .map(|row| format!("<tr><td>{}</td>\n<td>{}</td></tr>", row[0], row[1]))
        .collect();
    format!(
        "<table>\n  <thead><tr>{}</tr></thead>\n  <tbody>{}</tbody>\n</table>\n{}<br/>\n",
        head.join("\n"),
        body.join("\n"),
        counted(rows.len(), "row")
    )
}

fn unordered_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(Empty list)".to_string();
    }
    let lines: Vec<String> = items.iter().map(|item| format!("<li>{item}</li>")).collect();
    format!(
        "<ul>{}</ul>\n{}<br/>\n",
        lines.join("\n"),
        counted(items.len(), "item")
    )
}

fn element_a(href: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(href), escape(text))
}

/// `(1 item)` / `(3 items)`
fn counted(n: usize, singular: &str) -> String {
    if n == 1 {
        format!("({n} {singular})")
    } else {
        format!("({n} {singular}s)")
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::pathspec::PathSpec;

    use super::*;

    fn doc() -> RegistryDocument {
        serde_json::from_value(serde_json::json!({
            "dist-tags": { "latest": "1.5.0", "lts": "1.5.0", "next": "2.0.0-rc.1" },
            "versions": {
                "0.9.0": { "dist": { "tarball": "t" } },
                "1.0.0": { "dist": { "tarball": "t" } },
                "1.5.0": { "dist": { "tarball": "t" } },
                "2.0.0-rc.1": { "dist": { "tarball": "t" } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn versions_page_links_back_with_object_path() {
        let spec = PathSpec::parse("/pkg@>=1.0.0/lib/").unwrap();
        let page = versions_page(&["1.0.0".to_string(), "1.5.0".to_string()], &doc(), &spec);
        assert!(page.contains("<a href=\"/pkg@1.5.0/lib\">1.5.0</a>"));
        assert!(page.contains("<a href=\"/pkg@1.0.0/lib\">1.0.0</a>"));
    }

    #[test]
    fn versions_sort_newest_first_and_dedup() {
        let spec = PathSpec::parse("/pkg@all").unwrap();
        let versions = vec![
            "1.0.0".to_string(),
            "0.9.0".to_string(),
            "1.5.0".to_string(),
            "1.5.0".to_string(),
        ];
        let page = versions_page(&versions, &doc(), &spec);
        let first = page.find("@1.5.0").unwrap();
        let second = page.find("@1.0.0").unwrap();
        let third = page.find("@0.9.0").unwrap();
        assert!(first < second && second < third);
        assert_eq!(page.matches("@1.5.0").count(), 1, "deduplicated");
        assert!(page.contains("(3 rows)"));
    }

    #[test]
    fn tags_are_joined_per_version() {
        let spec = PathSpec::parse("/pkg@all").unwrap();
        let page = versions_page(&["1.5.0".to_string()], &doc(), &spec);
        assert!(page.contains("latest; lts"));
    }

    #[test]
    fn fully_tagged_listing_skips_the_highlight_table() {
        let spec = PathSpec::parse("/pkg@dist-tags").unwrap();
        let page = versions_page(
            &["1.5.0".to_string(), "2.0.0-rc.1".to_string()],
            &doc(),
            &spec,
        );
        assert!(page.contains("(all version(s) have dist-tag(s))"));
    }

    #[test]
    fn all_versions_page_reports_no_match() {
        let spec = PathSpec::parse("/pkg@9.9.9").unwrap();
        let page = all_versions_page(&doc(), &spec);
        assert!(page.contains("No version for package \"pkg\""));
        assert!(page.contains("@0.9.0"));
        assert!(page.contains("@2.0.0-rc.1"));
    }

    #[test]
    fn directory_page_lists_entries() {
        let page = directory_page("pkg-1.0.0", "/lib", &["a.js".to_string(), "sub/".to_string()]);
        assert!(page.contains("<title>pkg-1.0.0 :: /lib</title>"));
        assert!(page.contains("<a href=\"a.js\">a.js</a>"));
        assert!(page.contains("(2 items)"));
    }

    #[test]
    fn empty_directory_page() {
        let page = directory_page("pkg-1.0.0", "/empty", &[]);
        assert!(page.contains("(Empty list)"));
    }

    #[test]
    fn escapes_markup_in_requirements() {
        let spec = PathSpec::parse("/pkg@<script>").unwrap();
        let page = all_versions_page(&doc(), &spec);
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}

//! HTML pages published next to the job artifacts.

use serde_yaml::Value as YamlValue;

/// A published artifact and its public address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedItem {
    pub name: String,
    pub url: String,
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\nbody {{ font-family: sans-serif; margin: 2em; }}\n\
         pre {{ background: #f6f8fa; padding: 1em; white-space: pre-wrap; word-wrap: break-word; }}\n\
         h2 {{ border-bottom: 1px solid #ddd; }}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape_html(title),
        body = body
    )
}

/// Index of every published item of a job
pub fn render_index(pr_number: u64, items: &[PublishedItem]) -> String {
    let mut body = String::from("<ul>\n");
    for item in items {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(&item.url),
            escape_html(&item.name)
        ));
    }
    body.push_str("</ul>\n");
    page(&format!("Generated Data for PR #{}", pr_number), &body)
}

/// Pretty printed view of a JSON document, or of every record of a JSON lines file
pub fn render_json_viewer(name: &str, content: &str) -> Result<String, serde_json::Error> {
    let pretty = if name.ends_with(".jsonl") {
        let mut records = Vec::new();
        for line in content.lines().filter(|line| !line.trim().is_empty()) {
            let value: serde_json::Value = serde_json::from_str(line)?;
            records.push(serde_json::to_string_pretty(&value)?);
        }
        records.join("\n\n")
    } else {
        let value: serde_json::Value = serde_json::from_str(content)?;
        serde_json::to_string_pretty(&value)?
    };
    Ok(page(name, &format!("<pre>{}</pre>\n", escape_html(&pretty))))
}

/// YAML view of a document. `None` unless the content decodes to a mapping or a sequence.
pub fn render_yaml_viewer(name: &str, content: &str) -> Option<String> {
    let value: YamlValue = serde_yaml::from_str(content).ok()?;
    if !matches!(value, YamlValue::Mapping(_) | YamlValue::Sequence(_)) {
        return None;
    }
    let yaml = serde_yaml::to_string(&value).ok()?;
    Some(page(name, &format!("<pre>{}</pre>\n", escape_html(&yaml))))
}

/// One section per precheck record, titled by the file it came from
pub fn render_combined_chatlogs(entries: &[(String, String)]) -> String {
    let mut body = String::new();
    for (file_name, yaml) in entries {
        body.push_str(&format!("<h2>{}</h2>\n<pre>{}</pre>\n", escape_html(file_name), escape_html(yaml)));
    }
    page("Precheck results", &body)
}

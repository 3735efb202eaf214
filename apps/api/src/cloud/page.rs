//! The upload page. Server-rendered, no client script.

use crate::cloud::pipeline::CloudReport;

/// What the page shows below the form.
pub enum PageContent<'a> {
    Empty,
    Cloud(&'a CloudReport),
    Message(&'a str),
}

pub fn render_index(content: PageContent<'_>) -> String {
    let body = match content {
        PageContent::Empty => String::new(),
        PageContent::Cloud(report) => {
            let note = report
                .omitted_note
                .as_deref()
                .map(|n| format!("<p class=\"note\">{}</p>", escape_html(n)))
                .unwrap_or_default();
            format!(
                "<h2>词云</h2>\n<img src=\"/static/{}?v={}\" alt=\"word cloud\">\n{}",
                escape_html(&report.image_path),
                report.run_id,
                note
            )
        }
        PageContent::Message(msg) => format!("<p class=\"error\">{}</p>", escape_html(msg)),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="zh">
<head>
<meta charset="utf-8">
<title>形容词词云</title>
</head>
<body>
<h1>上传文件生成形容词词云</h1>
<form method="post" action="/" enctype="multipart/form-data">
<input type="file" name="file" accept=".txt,.csv,.tsv,.doc,.docx,.pdf">
<button type="submit">上传</button>
</form>
{body}
</body>
</html>
"#
    )
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

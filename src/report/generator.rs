use chrono::Utc;
use thiserror::Error;

use crate::analysis::{AnalysisResult, DirectoryNode};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render document: {0}")]
    RenderFailure(String),
}

/// Rows shown per table before the remainder is summarised.
const MAX_TABLE_ROWS: usize = 200;

/// Turns an [`AnalysisResult`] into a standalone HTML document.
pub struct DocumentGenerator {
    max_rows: usize,
}

impl Default for DocumentGenerator {
    fn default() -> Self {
        DocumentGenerator {
            max_rows: MAX_TABLE_ROWS,
        }
    }
}

impl DocumentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rows(max_rows: usize) -> Self {
        DocumentGenerator { max_rows }
    }

    pub fn render(&self, result: &AnalysisResult) -> Result<Vec<u8>, RenderError> {
        let html = self.generate_html(result)?;
        Ok(html.into_bytes())
    }

    pub fn generate_html(&self, result: &AnalysisResult) -> Result<String, RenderError> {
        if result.name.is_empty() {
            return Err(RenderError::RenderFailure("project has no name".to_string()));
        }

        let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let mut html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name} - Code Documentation</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            background: #f5f5f5;
            padding: 20px;
        }}
        .container {{
            max-width: 1200px;
            margin: 0 auto;
            background: white;
            padding: 40px;
            border-radius: 8px;
        }}
        h1 {{
            color: #2c3e50;
            border-bottom: 3px solid #3498db;
            padding-bottom: 10px;
        }}
        h2 {{
            color: #34495e;
            margin-top: 40px;
            border-left: 4px solid #3498db;
            padding-left: 15px;
        }}
        table {{
            width: 100%;
            border-collapse: collapse;
            margin: 20px 0;
        }}
        th {{
            background: #34495e;
            color: white;
            padding: 12px;
            text-align: left;
        }}
        td {{
            padding: 10px;
            border-bottom: 1px solid #ddd;
        }}
        .metadata {{
            background: #ecf0f1;
            padding: 20px;
            border-radius: 5px;
        }}
        .advisory {{
            background: #fff8e1;
            border-left: 4px solid #f39c12;
            padding: 10px 15px;
            margin: 10px 0;
        }}
        .tree ul {{
            list-style: none;
            padding-left: 20px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{name} - Code Documentation</h1>

        <div class="section">
            <h2>Project Overview</h2>
            <div class="metadata">
                <p><strong>Project Name:</strong> {name}</p>
                <p><strong>Project Type:</strong> {project_type}</p>
                <p><strong>Total Files:</strong> {total_files}</p>
                <p><strong>Total Size:</strong> {total_size}</p>
                <p><strong>Analysis Date:</strong> {analyzed}</p>
                <p><strong>Document Generated:</strong> {now}</p>
            </div>
            <p>{overview}</p>
        </div>
"#,
            name = escape(&result.name),
            project_type = escape(result.project_type.display_name()),
            total_files = result.files.len(),
            total_size = format_size(result.total_size()),
            analyzed = result.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            now = now,
            overview = escape(&result.overview),
        );

        self.push_tech_stack(&mut html, result);
        self.push_folder_structure(&mut html, result);
        self.push_dependencies(&mut html, result);
        self.push_languages(&mut html, result);
        self.push_files(&mut html, result);
        self.push_tree(&mut html, result);
        self.push_advisories(&mut html, result);

        html.push_str(&format!(
            r#"
        <div class="footer">
            <p>Generated by code-doc-tool v{}</p>
        </div>
    </div>
</body>
</html>
"#,
            env!("CARGO_PKG_VERSION")
        ));

        Ok(html)
    }

    fn push_tech_stack(&self, html: &mut String, result: &AnalysisResult) {
        html.push_str("\n        <div class=\"section\">\n            <h2>Technology Stack</h2>\n");
        if result.tech_stack.is_empty() {
            html.push_str("            <p>No technologies could be identified.</p>\n");
        } else {
            html.push_str("            <ul>\n");
            for item in &result.tech_stack {
                html.push_str(&format!("                <li>{}</li>\n", escape(item)));
            }
            html.push_str("            </ul>\n");
        }
        html.push_str("        </div>\n");
    }

    fn push_folder_structure(&self, html: &mut String, result: &AnalysisResult) {
        html.push_str("\n        <div class=\"section\">\n            <h2>Folder Structure</h2>\n");
        if result.folder_structure.is_empty() {
            html.push_str("            <p>The project has no subdirectories.</p>\n");
        } else {
            html.push_str(
                "            <table>\n                <thead><tr><th>Folder</th><th>Description</th></tr></thead>\n                <tbody>\n",
            );
            let rows: Vec<_> = result.folder_structure.iter().collect();
            for (folder, description) in rows.iter().take(self.max_rows) {
                html.push_str(&format!(
                    "                    <tr><td><code>{}/</code></td><td>{}</td></tr>\n",
                    escape(folder),
                    escape(description)
                ));
            }
            self.push_overflow_row(html, rows.len(), 2);
            html.push_str("                </tbody>\n            </table>\n");
        }
        html.push_str("        </div>\n");
    }

    fn push_dependencies(&self, html: &mut String, result: &AnalysisResult) {
        html.push_str("\n        <div class=\"section\">\n            <h2>Dependencies</h2>\n");
        if result.dependencies.is_empty() {
            html.push_str("            <p>No dependencies found in the project.</p>\n");
            html.push_str("        </div>\n");
            return;
        }

        html.push_str(&format!(
            "            <p>Total dependencies found: <strong>{}</strong></p>\n",
            result.dependencies.len()
        ));
        for (kind, deps) in result.dependencies.iter() {
            if deps.is_empty() {
                continue;
            }
            html.push_str(&format!(
                r#"            <h3>{} ({})</h3>
            <table>
                <thead><tr><th>Package Name</th><th>Version</th></tr></thead>
                <tbody>
"#,
                escape(&capitalize(kind.label())),
                deps.len()
            ));
            for dep in deps.iter().take(self.max_rows) {
                html.push_str(&format!(
                    "                    <tr><td>{}</td><td><code>{}</code></td></tr>\n",
                    escape(&dep.name),
                    escape(&dep.version)
                ));
            }
            self.push_overflow_row(html, deps.len(), 2);
            html.push_str("                </tbody>\n            </table>\n");
        }
        html.push_str("        </div>\n");
    }

    fn push_languages(&self, html: &mut String, result: &AnalysisResult) {
        if result.language_distribution.is_empty() {
            return;
        }
        html.push_str(
            r#"
        <div class="section">
            <h2>Language Distribution</h2>
            <table>
                <thead><tr><th>Language</th><th>Files</th><th>Bytes</th><th>Share</th></tr></thead>
                <tbody>
"#,
        );
        for stat in &result.language_distribution {
            html.push_str(&format!(
                "                    <tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
                escape(&stat.language),
                stat.files,
                stat.bytes,
                stat.percent
            ));
        }
        html.push_str("                </tbody>\n            </table>\n        </div>\n");
    }

    fn push_files(&self, html: &mut String, result: &AnalysisResult) {
        html.push_str("\n        <div class=\"section\">\n            <h2>File Inventory</h2>\n");
        if result.files.is_empty() {
            html.push_str("            <p>No source files were found.</p>\n");
            html.push_str("        </div>\n");
            return;
        }
        html.push_str(
            "            <table>\n                <thead><tr><th>Path</th><th>Language</th><th>Size</th></tr></thead>\n                <tbody>\n",
        );
        for file in result.files.iter().take(self.max_rows) {
            html.push_str(&format!(
                "                    <tr><td><code>{}</code></td><td>{}</td><td>{}</td></tr>\n",
                escape(&file.path),
                escape(&file.language),
                format_size(file.size)
            ));
        }
        self.push_overflow_row(html, result.files.len(), 3);
        html.push_str("                </tbody>\n            </table>\n        </div>\n");
    }

    fn push_tree(&self, html: &mut String, result: &AnalysisResult) {
        html.push_str(
            "\n        <div class=\"section tree\">\n            <h2>Directory Tree</h2>\n",
        );
        html.push_str(&format!(
            "            <p><strong>{}/</strong></p>\n",
            escape(&result.structure.name)
        ));
        push_tree_nodes(html, &result.structure.children);
        html.push_str("        </div>\n");
    }

    fn push_advisories(&self, html: &mut String, result: &AnalysisResult) {
        if result.advisories.is_empty() {
            return;
        }
        html.push_str(
            "\n        <div class=\"section\">\n            <h2>Analysis Notes</h2>\n",
        );
        for advisory in &result.advisories {
            html.push_str(&format!(
                "            <div class=\"advisory\">{}</div>\n",
                escape(&advisory.to_string())
            ));
        }
        html.push_str("        </div>\n");
    }

    fn push_overflow_row(&self, html: &mut String, total: usize, columns: usize) {
        if total > self.max_rows {
            html.push_str(&format!(
                "                    <tr><td colspan=\"{}\"><em>... and {} more</em></td></tr>\n",
                columns,
                total - self.max_rows
            ));
        }
    }
}

fn push_tree_nodes(html: &mut String, nodes: &[DirectoryNode]) {
    if nodes.is_empty() {
        return;
    }
    html.push_str("<ul>\n");
    for node in nodes {
        if node.is_dir {
            html.push_str(&format!("<li>{}/", escape(&node.name)));
            push_tree_nodes(html, &node.children);
            html.push_str("</li>\n");
        } else {
            html.push_str(&format!(
                "<li>{} <small>({})</small></li>\n",
                escape(&node.name),
                format_size(node.size)
            ));
        }
    }
    html.push_str("</ul>\n");
}

/// Escape text for inclusion in HTML element content and attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let value = bytes as f64;
    if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

use super::{Tool, ToolContext, ToolError};
use crate::security::{check_path, check_url};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::io::Read;
use std::sync::OnceLock;

const MAX_FETCH_CHARS: usize = 50_000;
const MAX_DOWNLOAD_BYTES: u64 = 100 * 1024 * 1024;
const MAX_QUERY_CHARS: usize = 500;

/// Shared HTTP client — created once, reused across all calls.
fn http_client() -> &'static reqwest::blocking::Client {
    static CLIENT: OnceLock<reqwest::blocking::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent(concat!("palisade/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new())
    })
}

pub struct FetchUrlTool;

impl Tool for FetchUrlTool {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch the text content of a URL. Private and local addresses are refused."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to fetch"
                }
            },
            "required": ["url"]
        })
    }

    fn execute(&self, args: serde_json::Value, _ctx: &mut ToolContext) -> Result<String, ToolError> {
        let url = args["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'url' argument".to_string()))?;

        let url = check_url(url).map_err(ToolError::Validation)?;

        let response = http_client().get(url.clone()).send().map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to fetch URL '{}': {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed(format!(
                "HTTP error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to read response: {}", e)))?;

        let text = if content_type.contains("text/html") {
            strip_tags(&body)
        } else {
            body
        };

        if text.len() > MAX_FETCH_CHARS {
            let mut end = MAX_FETCH_CHARS;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            Ok(format!(
                "{}\n\n... (truncated, {} total chars)",
                &text[..end],
                text.len()
            ))
        } else {
            Ok(text)
        }
    }
}

pub struct DownloadFileTool;

impl Tool for DownloadFileTool {
    fn name(&self) -> &str {
        "download_file"
    }

    fn description(&self) -> &str {
        "Download a URL to a local file (100 MB limit)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to download"
                },
                "destination": {
                    "type": "string",
                    "description": "The local file path to save to"
                }
            },
            "required": ["url", "destination"]
        })
    }

    fn execute(&self, args: serde_json::Value, ctx: &mut ToolContext) -> Result<String, ToolError> {
        let url = args["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'url' argument".to_string()))?;
        let destination = args["destination"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("missing 'destination' argument".to_string())
        })?;

        let url = check_url(url).map_err(ToolError::Validation)?;
        let destination = check_path(destination, None).map_err(ToolError::Validation)?;

        ctx.confirm(&format!("Download '{}' to '{}'", url, destination.display()))?;

        let response = http_client().get(url.clone()).send().map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to download '{}': {}", url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed(format!(
                "HTTP error {}",
                status.as_u16()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > MAX_DOWNLOAD_BYTES {
                return Err(ToolError::Validation(format!(
                    "Download too large: {} bytes (limit {})",
                    length, MAX_DOWNLOAD_BYTES
                )));
            }
        }

        let mut file = std::fs::File::create(&destination).map_err(|e| {
            ToolError::ExecutionFailed(format!(
                "Failed to create '{}': {}",
                destination.display(),
                e
            ))
        })?;
        // Hard cap even when the server lies about content length.
        let mut limited = response.take(MAX_DOWNLOAD_BYTES + 1);
        let written = std::io::copy(&mut limited, &mut file)
            .map_err(|e| ToolError::ExecutionFailed(format!("Download failed: {}", e)))?;
        if written > MAX_DOWNLOAD_BYTES {
            let _ = std::fs::remove_file(&destination);
            return Err(ToolError::Validation(format!(
                "Download exceeded the {} byte limit",
                MAX_DOWNLOAD_BYTES
            )));
        }

        Ok(format!(
            "Downloaded {} bytes to '{}'",
            written,
            destination.display()
        ))
    }
}

pub struct SearchWebTool;

impl Tool for SearchWebTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web using DuckDuckGo. Returns titles, URLs and snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results (default: 5, max: 10)"
                }
            },
            "required": ["query"]
        })
    }

    fn execute(&self, args: serde_json::Value, _ctx: &mut ToolContext) -> Result<String, ToolError> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'query' argument".to_string()))?;
        let query = query.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("empty query".to_string()));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(ToolError::InvalidArguments(format!(
                "query longer than {} characters",
                MAX_QUERY_CHARS
            )));
        }
        let max_results = args["max_results"].as_u64().unwrap_or(5).min(10) as usize;

        let encoded: String =
            url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let search_url = format!("https://html.duckduckgo.com/html/?q={}", encoded);

        let response = http_client()
            .get(&search_url)
            .send()
            .map_err(|e| ToolError::ExecutionFailed(format!("Search failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ToolError::ExecutionFailed(format!(
                "Search returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body = response
            .text()
            .map_err(|e| ToolError::ExecutionFailed(format!("Failed to read response: {}", e)))?;

        let results = parse_search_results(&body, max_results);
        if results.is_empty() {
            return Ok(format!("No results found for: {}", query));
        }

        let mut output = format!("Search results for: {}\n\n", query);
        for (i, result) in results.iter().enumerate() {
            output.push_str(&format!(
                "{}. {}\n   {}\n   {}\n\n",
                i + 1,
                result.title,
                result.url,
                result.snippet
            ));
        }
        Ok(output)
    }
}

struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

static RESULT_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="result__a"[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#)
        .unwrap_or_else(|e| panic!("result link regex: {}", e))
});

static RESULT_SNIPPET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</a>"#)
        .unwrap_or_else(|e| panic!("result snippet regex: {}", e))
});

/// Scrape the DuckDuckGo HTML results page. Links arrive wrapped in a
/// redirect with the real URL percent-encoded in the `uddg` parameter.
fn parse_search_results(html: &str, max: usize) -> Vec<SearchResult> {
    let snippets: Vec<String> = RESULT_SNIPPET_RE
        .captures_iter(html)
        .map(|c| decode_entities(&strip_tags(&c[1])))
        .collect();

    RESULT_LINK_RE
        .captures_iter(html)
        .take(max)
        .enumerate()
        .filter_map(|(i, caps)| {
            let title = decode_entities(&strip_tags(&caps[2]));
            let url = unwrap_redirect(&caps[1]);
            if title.is_empty() || url.is_empty() {
                return None;
            }
            Some(SearchResult {
                title,
                url,
                snippet: snippets.get(i).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

fn unwrap_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    if let Ok(parsed) = url::Url::parse(&absolute) {
        for (key, value) in parsed.query_pairs() {
            if key == "uddg" {
                return value.into_owned();
            }
        }
    }
    absolute
}

fn strip_tags(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        if ch == '<' {
            in_tag = true;
        } else if ch == '>' {
            in_tag = false;
        } else if !in_tag {
            result.push(ch);
        }
    }
    result.trim().to_string()
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

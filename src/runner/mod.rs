//! Bootstrap sources that wrap a snippet for each supported runtime.
//!
//! A bootstrap turns the snippet into a zero-argument function body, calls it
//! once and prints the framing line plus the result line described in
//! [`crate::protocol`].

use serde_json::Value;

const SOURCE: &str = "#{source}";
const ENCODED_SOURCE: &str = "#{encoded_source}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerSource {
    Node,
    JavaScriptCore,
    SpiderMonkey,
    JScript,
    PhantomJS,
}

impl RunnerSource {
    pub fn template(self) -> &'static str {
        match self {
            RunnerSource::Node => include_str!("js/node.js"),
            RunnerSource::JavaScriptCore => include_str!("js/javascriptcore.js"),
            RunnerSource::SpiderMonkey => include_str!("js/spidermonkey.js"),
            RunnerSource::JScript => include_str!("js/jscript.js"),
            RunnerSource::PhantomJS => include_str!("js/phantomjs.js"),
        }
    }

    /// Render the full program for `source`.
    ///
    /// Placeholders are replaced in one pass over the template; text coming
    /// from `source` is never scanned for placeholders.
    pub fn compile(self, source: &str) -> String {
        let template = self.template();
        let mut out = String::with_capacity(template.len() + source.len() * 2);
        let mut rest = template;

        while let Some(start) = rest.find("#{") {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix(SOURCE) {
                out.push_str(source);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(ENCODED_SOURCE) {
                out.push_str(&encoded_source(source));
                rest = after;
            } else {
                out.push_str("#{");
                rest = &tail[2..];
            }
        }
        out.push_str(rest);
        out
    }
}

/// The snippet as a JSON string literal holding an immediately-invoked
/// function, for runtimes that load it through `eval`.
pub fn encoded_source(source: &str) -> String {
    let wrapped = format!("(function(){{ {} }})()", encode_unicode_codepoints(source));
    Value::String(wrapped).to_string()
}

/// Replace every non-ASCII character with a `\uXXXX` escape. Characters
/// outside the BMP become a surrogate pair.
pub fn encode_unicode_codepoints(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut units = [0u16; 2];
    for ch in s.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        for unit in ch.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}

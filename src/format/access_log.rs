//! Common/Combined Log Format recognition.

use crate::format::ansi::Paint;
use regex::Regex;
use std::sync::LazyLock;

/// `IP - - [timestamp] "METHOD path protocol" status size "referer" "user-agent"`
static ACCESS_LOG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\S+) \S+ \S+ \[([^\]]+)\] "(\S+) ([^"]*) ([^"]*)" (\d+) (\S+) "([^"]*)" "([^"]*)""#)
        .expect("access log regex pattern is valid")
});

/// Fields of one parsed access log line, borrowed from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry<'a> {
    pub ip: &'a str,
    pub timestamp: &'a str,
    pub method: &'a str,
    pub path: &'a str,
    pub protocol: &'a str,
    pub status: &'a str,
    pub size: &'a str,
    pub referer: &'a str,
    pub user_agent: &'a str,
}

pub fn parse(line: &str) -> Option<AccessLogEntry<'_>> {
    let caps = ACCESS_LOG_PATTERN.captures(line)?;
    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    Some(AccessLogEntry {
        ip: field(1),
        timestamp: field(2),
        method: field(3),
        path: field(4),
        protocol: field(5),
        status: field(6),
        size: field(7),
        referer: field(8),
        user_agent: field(9),
    })
}

impl AccessLogEntry<'_> {
    /// Compact single-line form: `IP METHOD path status size`.
    pub fn render(&self, colorize: bool) -> String {
        if !colorize {
            return format!(
                "{} {} {} {} {}",
                self.ip, self.method, self.path, self.status, self.size
            );
        }

        format!(
            "{} {} {} {} {}",
            Paint::fg(6).apply(self.ip),
            method_paint(self.method).apply(self.method),
            Paint::fg(15).apply(self.path),
            status_paint(self.status).apply(self.status),
            Paint::fg(8).apply(self.size),
        )
    }
}

fn status_paint(status: &str) -> Paint {
    match status.as_bytes().first() {
        Some(b'2') => Paint::fg(10).bold(),
        Some(b'3') => Paint::fg(11).bold(),
        Some(b'4') => Paint::fg(9).bold(),
        Some(b'5') => Paint::fg(1).bold(),
        _ => Paint::fg(15),
    }
}

fn method_paint(method: &str) -> Paint {
    match method {
        "GET" => Paint::fg(12).bold(),
        "POST" => Paint::fg(13).bold(),
        "PUT" => Paint::fg(14).bold(),
        "DELETE" => Paint::fg(9).bold(),
        _ => Paint::fg(15),
    }
}

//! HTML for the status page

use std::fmt::Write as _;
use std::time::Instant;

use crate::console::format_uptime;
use crate::constants::console::STATUS_PAGE_REFRESH_SECS;
use crate::session::TunnelSession;

/// Render the status summary as a standalone HTML document
#[must_use]
pub fn render_html(session: &TunnelSession, total_requests: u64, now: Instant) -> String {
    let rows = [
        ("Public URL", session.public_url()),
        ("Forwarding", session.forwarding()),
        ("Total requests", total_requests.to_string()),
        ("Uptime", format_uptime(session.uptime(now))),
    ];

    let mut html = String::with_capacity(1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    let _ = writeln!(
        html,
        "<meta http-equiv=\"refresh\" content=\"{STATUS_PAGE_REFRESH_SECS}\">"
    );
    html.push_str("<title>tunnel-relay status</title>\n");
    html.push_str(
        "<style>body{font-family:monospace;margin:2rem}th{text-align:left;padding-right:2rem}</style>\n",
    );
    html.push_str("</head>\n<body>\n<h1>tunnel-relay</h1>\n<table>\n");
    for (label, value) in rows {
        let _ = writeln!(
            html,
            "<tr><th>{}</th><td>{}</td></tr>",
            label,
            escape_html(&value)
        );
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

/// Escape text for an HTML element body
#[must_use]
pub fn escape_html(text: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamTarget;
    use crate::network::{AddressSource, PublicAddress};
    use crate::types::{HostName, Port};
    use std::time::Duration;

    fn session(start: Instant) -> TunnelSession {
        TunnelSession::started_at(
            start,
            Port::RELAY,
            Port::RELAY_CONSOLE,
            Some(UpstreamTarget::new(HostName::localhost(), Port::UPSTREAM)),
            PublicAddress {
                host: "198.51.100.7".to_string(),
                source: AddressSource::Detected,
            },
        )
    }

    #[test]
    fn test_page_contents() {
        let start = Instant::now();
        let html = render_html(&session(start), 42, start + Duration::from_secs(125));
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"5\">"));
        assert!(html.contains("http://198.51.100.7:3001"));
        assert!(html.contains("http://198.51.100.7:3001 -&gt; http://localhost:8080"));
        assert!(html.contains("<td>42</td>"));
        assert!(html.contains("2m 05s"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }
}

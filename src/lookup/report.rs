//! Report rendering for enriched batches

use crate::lookup::models::{EnrichedEntry, EnrichmentRecord, LookupOutcome, NOT_AVAILABLE};
use std::fmt::Write;

/// Row labels, in display order
const LABELS: [&str; 6] = ["IP", "Origin IP", "ISP", "Country", "City", "Proxy Status"];

/// Output markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// Telegram HTML: blocks in `<pre>`, bold labels, escaped values
    #[default]
    Html,
    /// Plain text for terminals
    Plain,
}

/// Renders enriched entries as fixed-column text blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFormatter {
    style: ReportStyle,
}

impl ReportFormatter {
    pub fn new(style: ReportStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> ReportStyle {
        self.style
    }

    /// Render one block per entry, in order
    pub fn render(&self, entries: &[EnrichedEntry]) -> String {
        let mut out = String::new();
        for entry in entries {
            self.render_outcome(&mut out, &entry.merged());
        }
        out
    }

    /// Render a single outcome block, terminated by a line break
    pub fn render_outcome(&self, out: &mut String, outcome: &LookupOutcome) {
        let body = match outcome {
            LookupOutcome::Success(record) => self.render_record(record),
            LookupOutcome::Failure(reason) => format!("Error: {}", self.escape(reason)),
        };

        match self.style {
            ReportStyle::Html => {
                let _ = writeln!(out, "<pre>{}</pre>", body);
            }
            ReportStyle::Plain => {
                let _ = writeln!(out, "{}", body);
            }
        }
    }

    fn render_record(&self, record: &EnrichmentRecord) -> String {
        let values = [
            record.ip.clone(),
            record.origin_ip.clone(),
            record.isp.clone(),
            record.country_display(),
            record.city.clone(),
            record.proxy_status.clone(),
        ];
        let width = LABELS.iter().map(|label| label.len()).max().unwrap_or(0);

        let mut body = String::new();
        for (label, value) in LABELS.iter().zip(values) {
            let value = value.unwrap_or_else(|| NOT_AVAILABLE.to_string());
            let padded = format!("{:<width$}", label, width = width);
            let _ = match self.style {
                ReportStyle::Html => {
                    writeln!(body, "<b>{}</b> : {}", padded, self.escape(&value))
                }
                ReportStyle::Plain => writeln!(body, "{} : {}", padded, value),
            };
        }
        body
    }

    fn escape(&self, text: &str) -> String {
        match self.style {
            ReportStyle::Html => escape_html(text),
            ReportStyle::Plain => text.to_string(),
        }
    }
}

/// Escape the characters Telegram's HTML parse mode treats as markup
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationPolicy;
    use crate::lookup::models::Address;

    fn entry(ip: &str, primary: LookupOutcome) -> EnrichedEntry {
        EnrichedEntry::new(
            Address::parse(ip, ValidationPolicy::Permissive).unwrap(),
            primary,
            Vec::new(),
        )
    }

    fn cloudflare() -> EnrichmentRecord {
        EnrichmentRecord {
            ip: Some("1.1.1.1".to_string()),
            origin_ip: Some("1.1.1.1".to_string()),
            isp: Some("Cloudflare, Inc.".to_string()),
            country: Some("Australia".to_string()),
            country_code: Some("AU".to_string()),
            city: None,
            proxy_status: Some("ACTIVE".to_string()),
        }
    }

    #[test]
    fn test_render_success_html() {
        let formatter = ReportFormatter::default();
        let report = formatter.render(&[entry("1.1.1.1", LookupOutcome::success(cloudflare()))]);

        let expected = "<pre><b>IP          </b> : 1.1.1.1\n\
                        <b>Origin IP   </b> : 1.1.1.1\n\
                        <b>ISP         </b> : Cloudflare, Inc.\n\
                        <b>Country     </b> : Australia (AU)\n\
                        <b>City        </b> : N/A\n\
                        <b>Proxy Status</b> : ACTIVE\n\
                        </pre>\n";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_render_success_plain() {
        let formatter = ReportFormatter::new(ReportStyle::Plain);
        let report = formatter.render(&[entry(
            "8.8.8.8",
            LookupOutcome::success(EnrichmentRecord::default()),
        )]);

        assert_eq!(report.lines().count(), 6);
        assert!(report.starts_with("IP           : N/A\n"));
        assert!(report.contains("Proxy Status : N/A\n"));
        assert!(!report.contains("<pre>"));
    }

    #[test]
    fn test_render_failure() {
        let formatter = ReportFormatter::default();
        let report = formatter.render(&[entry(
            "2.2.2.2",
            LookupOutcome::failure("Failed to fetch IP information"),
        )]);
        assert_eq!(report, "<pre>Error: Failed to fetch IP information</pre>\n");
    }

    #[test]
    fn test_render_isolates_failures() {
        let formatter = ReportFormatter::default();
        let report = formatter.render(&[
            entry("2.2.2.2", LookupOutcome::failure("Failed to fetch IP information")),
            entry("1.1.1.1", LookupOutcome::success(cloudflare())),
        ]);

        let blocks: Vec<&str> = report.lines().filter(|l| l.starts_with("<pre>")).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], "<pre>Error: Failed to fetch IP information</pre>");
        assert!(blocks[1].contains("1.1.1.1"));
        assert!(report.contains("Cloudflare, Inc."));
    }

    #[test]
    fn test_render_is_deterministic() {
        let formatter = ReportFormatter::default();
        let entries = vec![
            entry("1.1.1.1", LookupOutcome::success(cloudflare())),
            entry("2.2.2.2", LookupOutcome::failure("Failed to fetch IP information")),
        ];
        assert_eq!(formatter.render(&entries), formatter.render(&entries));
    }

    #[test]
    fn test_render_escapes_values() {
        let formatter = ReportFormatter::default();
        let record = EnrichmentRecord {
            isp: Some("AT&T <Mobility>".to_string()),
            ..Default::default()
        };
        let report = formatter.render(&[entry("3.3.3.3", LookupOutcome::success(record))]);
        assert!(report.contains("AT&amp;T &lt;Mobility&gt;"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(ReportFormatter::default().render(&[]), "");
    }
}

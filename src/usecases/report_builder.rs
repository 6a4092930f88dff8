//! Report rendering. Positions + analysis -> e-mail-safe HTML and a plaintext fallback.
//!
//! Inline styles only; mail clients strip `<style>` blocks.

use crate::domain::{AnalysisMap, AnalysisResult, Position, Report, Sentiment};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub const DEFAULT_TITLE: &str = "Daily Portfolio Update";
pub const DEFAULT_SUBTITLE: &str = "Top holdings, headlines, and sentiment";
pub const NO_POSITIONS: &str = "No positions found.";

/// Header text for the HTML report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    pub subtitle: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            subtitle: DEFAULT_SUBTITLE.to_string(),
        }
    }
}

/// "Daily Trading Report - 2024-01-31".
pub fn default_subject(at: DateTime<Utc>) -> String {
    format!("Daily Trading Report - {}", at.format("%Y-%m-%d"))
}

/// Render both bodies and bundle them with the data reporters may need.
pub fn build_report(
    positions: &[Position],
    analysis: &AnalysisMap,
    options: &ReportOptions,
    generated_at: DateTime<Utc>,
) -> Report {
    let tickers: BTreeSet<String> = positions.iter().map(|p| p.ticker.clone()).collect();
    Report {
        subject: default_subject(generated_at),
        html: build_html(positions, analysis, options),
        plaintext: build_plaintext(positions, analysis),
        tickers: tickers.into_iter().collect(),
        positions: positions.to_vec(),
        analysis: analysis.clone(),
        generated_at,
    }
}

pub fn build_html(positions: &[Position], analysis: &AnalysisMap, options: &ReportOptions) -> String {
    let body = if positions.is_empty() {
        format!("<div style='color:#6b7280;'>{}</div>", NO_POSITIONS)
    } else {
        positions
            .iter()
            .map(|p| position_card(p, analysis.get(&p.ticker)))
            .collect::<String>()
    };

    let title = escape(&options.title);
    let subtitle = escape(&options.subtitle);

    format!(
        r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
  </head>
  <body style="margin:0;padding:0;background:#f9fafb;">
    <table role="presentation" width="100%" cellspacing="0" cellpadding="0" style="background:#f9fafb;padding:24px 0;">
      <tr>
        <td>
          <table role="presentation" align="center" width="640" cellpadding="0" cellspacing="0" style="margin:0 auto;background:#f9fafb;">
            <tr>
              <td style="padding:0 16px 16px;">
                <h1 style="font-size:24px;line-height:1.25;margin:0 0 12px 0;color:#111827;">{title}</h1>
                <div style="color:#6b7280;margin:0 0 16px 0;font-size:14px;">{subtitle}</div>
                {body}
                <div style="color:#9ca3af;font-size:12px;margin-top:16px;">Automated report</div>
              </td>
            </tr>
          </table>
        </td>
      </tr>
    </table>
  </body>
</html>
"#
    )
}

pub fn build_plaintext(positions: &[Position], analysis: &AnalysisMap) -> String {
    let mut lines = vec![DEFAULT_TITLE.to_string(), String::new()];
    if positions.is_empty() {
        lines.push(NO_POSITIONS.to_string());
        return lines.join("\n");
    }

    for p in positions {
        lines.push(format!("--- {} ---", p.ticker));
        lines.push(format!("Quantity: {:.6}", p.quantity));
        if let Some(price) = p.last_price {
            lines.push(format!("Last Price: {}", price));
        }
        if let Some(cost) = p.average_cost {
            lines.push(format!("Avg Cost: {}", cost));
        }
        lines.push("News Analysis:".to_string());
        if let Some(result) = analysis.get(&p.ticker) {
            lines.extend(result.summary_bullets.iter().map(|b| format!("- {}", b)));
            if let Some(s) = result.sentiment {
                lines.push(format!("Overall sentiment: {}{}", s, because(result)));
            }
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

fn because(result: &AnalysisResult) -> String {
    if result.reasons.is_empty() {
        String::new()
    } else {
        format!(" (because: {})", result.reasons.join(", "))
    }
}

fn sentiment_badge(sentiment: Option<Sentiment>) -> String {
    let (color, bg) = match sentiment {
        Some(Sentiment::Positive) => ("#16a34a", "#e9fbe9"),
        Some(Sentiment::Negative) => ("#dc2626", "#fdecec"),
        Some(Sentiment::Neutral) | None => ("#6b7280", "#f3f4f6"),
    };
    let label = sentiment.map(|s| s.label()).unwrap_or("N/A");
    format!(
        "<span style=\"display:inline-block;padding:4px 10px;border-radius:999px;\
         background:{bg};color:{color};font-weight:600;font-size:12px;line-height:1;\">{label}</span>"
    )
}

fn metric_row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style='color:#6b7280;'>{}</td>\
         <td style='text-align:right;font-weight:600;color:#111827;'>{}</td></tr>",
        label,
        escape(value)
    )
}

fn position_card(p: &Position, result: Option<&AnalysisResult>) -> String {
    let mut metrics = metric_row("Quantity", &format!("{:.6}", p.quantity));
    if let Some(price) = p.last_price {
        metrics.push_str(&metric_row("Last Price", &price.to_string()));
    }
    if let Some(cost) = p.average_cost {
        metrics.push_str(&metric_row("Avg Cost", &cost.to_string()));
    }

    let sentiment = result.and_then(|r| r.sentiment);
    let bullets = result.map(|r| r.summary_bullets.as_slice()).unwrap_or(&[]);

    let analysis_html = if bullets.is_empty() {
        "<div style='color:#6b7280;'>No analysis</div>".to_string()
    } else {
        let items: String = bullets
            .iter()
            .map(|b| format!("<li style='margin:0 0 6px 0;'>{}</li>", escape(b)))
            .collect();
        format!("<ul style='padding-left:20px;margin:0 0 8px 0;'>{}</ul>", items)
    };

    let overall = match result {
        Some(r) => format!(
            "<div style='color:#374151;font-size:14px;margin-top:6px;'>\
             <strong>Overall sentiment:</strong> {}{}</div>",
            sentiment.map(|s| s.label()).unwrap_or("N/A"),
            escape(&because(r))
        ),
        None => String::new(),
    };

    format!(
        r#"
    <table role="presentation" width="100%" cellpadding="0" cellspacing="0"
           style="border-collapse:separate;background:#ffffff;border:1px solid #e5e7eb;border-radius:12px;padding:16px;margin:0 0 16px 0;">
      <tr>
        <td>
          <div style="display:flex;justify-content:space-between;align-items:center;">
            <h2 style="margin:0 0 4px 0;font-size:20px;line-height:1.2;color:#111827;">{ticker}</h2>
            {badge}
          </div>
          <div style="font-size:12px;color:#6b7280;margin:0 0 12px 0;">News summary &amp; sentiment</div>
          <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="border-collapse:separate;margin:0 0 12px 0;">
            <tbody>{metrics}</tbody>
          </table>
          <div style="font-weight:600;color:#111827;margin:8px 0 6px 0;">News Analysis</div>
          {analysis_html}
          {overall}
        </td>
      </tr>
    </table>
"#,
        ticker = escape(&p.ticker),
        badge = sentiment_badge(sentiment),
    )
}

/// Minimal HTML text escaping.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

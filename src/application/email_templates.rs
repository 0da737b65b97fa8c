use chrono::NaiveDate;

const BRAND_NAME: &str = "gymdesk";

/// Minimal escaping for values typed in by gym staff.
fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render minor units as `$1,234.50`.
pub fn format_amount(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn debt_line(debt_cents: i64) -> String {
    if debt_cents > 0 {
        format!(
            r#"<p style="margin:12px 0 0;color:#b91c1c;">Outstanding balance: <strong>{}</strong></p>"#,
            format_amount(debt_cents)
        )
    } else {
        String::new()
    }
}

pub fn payment_reminder_email(
    gym_name: &str,
    client_name: &str,
    due_date: NaiveDate,
    debt_cents: i64,
) -> (String, String) {
    let gym = escape(gym_name);
    let subject = format!("{}: your membership renews on {}", gym_name, due_date.format("%d/%m/%Y"));
    let lead = format!(
        "Hi {}, your membership at <strong>{}</strong> is due on <strong>{}</strong>.",
        escape(client_name),
        gym,
        due_date.format("%d/%m/%Y")
    );
    let body = format!(
        r#"<p style="margin:12px 0 0;color:#374151;">You can pay at the front desk on your next visit.</p>{}"#,
        debt_line(debt_cents)
    );
    let html = wrap_email(&gym, "Payment reminder", &lead, &body);
    (subject, html)
}

pub fn payment_overdue_email(
    gym_name: &str,
    client_name: &str,
    due_date: NaiveDate,
    debt_cents: i64,
) -> (String, String) {
    let gym = escape(gym_name);
    let subject = format!("{}: your membership payment is overdue", gym_name);
    let lead = format!(
        "Hi {}, your membership at <strong>{}</strong> was due on <strong>{}</strong> and we have not received a payment yet.",
        escape(client_name),
        gym,
        due_date.format("%d/%m/%Y")
    );
    let body = format!(
        r#"<p style="margin:12px 0 0;color:#374151;">Please stop by the front desk to keep your access active.</p>{}"#,
        debt_line(debt_cents)
    );
    let html = wrap_email(&gym, "Payment overdue", &lead, &body);
    (subject, html)
}

fn wrap_email(gym: &str, headline: &str, lead: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <body style="background:#f8fafc;margin:0;padding:24px;font-family:Arial,Helvetica,sans-serif;">
    <div style="max-width:560px;margin:0 auto;background:#ffffff;border:1px solid #e5e7eb;border-radius:12px;padding:24px;">
      <div style="font-size:12px;letter-spacing:0.08em;text-transform:uppercase;color:#6b7280;">{gym}</div>
      <h1 style="margin:12px 0 8px;font-size:22px;color:#111827;">{headline}</h1>
      <p style="margin:0 0 12px;font-size:15px;color:#111827;line-height:1.6;">{lead}</p>
      {body_html}
      <p style="margin:20px 0 0;padding-top:16px;border-top:1px solid #e5e7eb;font-size:12px;color:#9ca3af;">
        You receive this email because you are a member of {gym}. Sent by {brand}.
      </p>
    </div>
  </body>
</html>
"#,
        brand = BRAND_NAME,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "$0.00");
        assert_eq!(format_amount(5), "$0.05");
        assert_eq!(format_amount(123_456), "$1,234.56");
        assert_eq!(format_amount(100_000_000), "$1,000,000.00");
        assert_eq!(format_amount(-2_500), "-$25.00");
    }

    #[test]
    fn test_reminder_mentions_due_date_and_debt() {
        let due = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let (subject, html) = payment_reminder_email("Iron Gym", "Ana", due, 150_000);
        assert!(subject.contains("10/04/2025"));
        assert!(html.contains("Iron Gym"));
        assert!(html.contains("$1,500.00"));
    }

    #[test]
    fn test_overdue_without_debt_omits_balance() {
        let due = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let (_, html) = payment_overdue_email("Iron Gym", "Ana", due, 0);
        assert!(!html.contains("Outstanding balance"));
    }

    #[test]
    fn test_names_are_escaped() {
        let due = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap();
        let (_, html) = payment_reminder_email("Gym", "<script>x</script>", due, 0);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}

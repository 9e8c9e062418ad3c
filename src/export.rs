//! Result exports: Excel-compatible CSV and an ICS deadline calendar.

use crate::domain::models::NormalizedRecord;

const CSV_HEADER: [&str; 4] = ["Intitule", "Lien", "Date_limite", "Nom_Adresse_Acheteur"];

fn csv_cell(value: &str) -> String {
    if value.contains(';') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Semicolon-delimited CSV with a UTF-8 BOM so Excel opens it correctly.
pub fn to_csv(items: &[NormalizedRecord]) -> String {
    let mut lines = vec![CSV_HEADER.join(";")];
    for item in items {
        let address = item
            .buyer_address
            .as_deref()
            .or(item.buyer.as_deref())
            .unwrap_or("");
        let row = [
            item.title.as_str(),
            item.href.as_str(),
            item.deadline.as_deref().unwrap_or(""),
            address,
        ];
        lines.push(row.map(csv_cell).join(";"));
    }
    format!("\u{feff}{}\r\n", lines.join("\r\n"))
}

// "2025-07-01" -> "20250701"; anything else is unusable for an all-day
// event and skipped.
fn ics_date(value: &str) -> Option<String> {
    let compact: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    (compact.len() == 8).then_some(compact)
}

/// ICS calendar with one all-day event per record deadline (falling back
/// to the publication date).
pub fn to_ics(items: &[NormalizedRecord]) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//boampscan//FR".to_string(),
    ];
    for item in items {
        let deadline = item
            .deadline
            .as_deref()
            .or(item.date.as_deref())
            .and_then(ics_date);
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("SUMMARY:{}", item.title));
        if let Some(day) = deadline {
            lines.push(format!("DTSTART;VALUE=DATE:{day}"));
            lines.push(format!("DTEND;VALUE=DATE:{day}"));
        }
        lines.push(format!("URL:{}", item.href));
        if let Some(address) = &item.buyer_address {
            lines.push(format!("DESCRIPTION:{}", address.replace('\n', " ")));
        }
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());
    lines.join("\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> NormalizedRecord {
        NormalizedRecord {
            title: "Formation continue; lot 2".into(),
            href: "https://www.boamp.fr/avis/detail/25-1".into(),
            reference: Some("25-1".into()),
            date: Some("2025-06-01".into()),
            deadline: Some("2025-07-01".into()),
            buyer: Some("Ville de Paris".into()),
            buyer_address: Some("Hôtel de Ville\n75004 Paris".into()),
            departments: vec!["75".into()],
            cpv_codes: vec!["80500000".into()],
            description: None,
            budget: None,
            procedure: None,
            market_type: None,
            place: None,
        }
    }

    #[test]
    fn test_csv_quotes_and_bom() {
        let csv = to_csv(&[record()]);
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.contains("Intitule;Lien;Date_limite;Nom_Adresse_Acheteur"));
        // Semicolon in the title forces quoting.
        assert!(csv.contains("\"Formation continue; lot 2\""));
        // Newline-bearing address is quoted too.
        assert!(csv.contains("\"Hôtel de Ville\n75004 Paris\""));
    }

    #[test]
    fn test_csv_falls_back_to_buyer() {
        let mut item = record();
        item.buyer_address = None;
        let csv = to_csv(&[item]);
        assert!(csv.contains(";Ville de Paris"));
    }

    #[test]
    fn test_ics_all_day_event() {
        let ics = to_ics(&[record()]);
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("DTSTART;VALUE=DATE:20250701"));
        assert!(ics.contains("URL:https://www.boamp.fr/avis/detail/25-1"));
        assert!(ics.contains("DESCRIPTION:Hôtel de Ville 75004 Paris"));
    }

    #[test]
    fn test_ics_skips_unusable_dates() {
        let mut item = record();
        item.deadline = Some("bientôt".into());
        item.date = None;
        let ics = to_ics(&[item]);
        assert!(!ics.contains("DTSTART"));
        assert!(ics.contains("SUMMARY:"));
    }
}

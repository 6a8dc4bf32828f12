//! Tabular report over the customer roster.
//!
//! Maps customers onto the fixed, localized column set the business exports
//! for its spreadsheet, and renders the table as CSV. Workbook formatting is
//! the consumer's concern; this module only produces the rows.

use super::customer::{Customer, GiftStatus};

/// Localized column headers, in export order.
pub const HEADERS: [&str; 6] = [
    "Nombre",
    "Teléfono",
    "Número de referidos",
    "Descuento acumulado (%)",
    "Regalo reclamado",
    "Veces que ha cobrado descuento",
];

/// Gift cell rendering: only a pending gift reads as such; customers outside
/// the programme are reported the same as claimed ones.
fn gift_cell(status: GiftStatus) -> &'static str {
    if status.is_pending() {
        "Pendiente"
    } else {
        "Reclamado"
    }
}

/// One report row for a customer, in [`HEADERS`] order.
pub fn row(customer: &Customer) -> [String; 6] {
    [
        customer.full_name.clone(),
        customer.phone.to_string(),
        customer.referral_count.to_string(),
        customer.discount_percentage.to_string(),
        gift_cell(customer.gift_claimed).to_owned(),
        customer.discount_redemption_count.to_string(),
    ]
}

/// Render the full report as CSV, headers first.
pub fn to_csv(customers: &[Customer]) -> String {
    let mut lines = Vec::with_capacity(customers.len() + 1);
    lines.push(
        HEADERS
            .iter()
            .map(|header| csv_escape(header))
            .collect::<Vec<_>>()
            .join(","),
    );
    for customer in customers {
        lines.push(
            row(customer)
                .iter()
                .map(|cell| csv_escape(cell))
                .collect::<Vec<_>>()
                .join(","),
        );
    }
    lines.join("\n")
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::{CustomerId, Phone};
    use crate::domain::normalize_name;
    use chrono::Utc;
    use rstest::rstest;

    fn customer(name: &str, gift: GiftStatus) -> Customer {
        Customer {
            id: CustomerId::random(),
            full_name: name.to_owned(),
            normalized_name: normalize_name(name),
            phone: Phone::new("3001234567").expect("valid phone"),
            referral_count: 3,
            discount_percentage: 15,
            discount_redemption_count: 1,
            gift_claimed: gift,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(GiftStatus::Pending, "Pendiente")]
    #[case(GiftStatus::Claimed, "Reclamado")]
    #[case(GiftStatus::NotEligible, "Reclamado")]
    fn gift_renders_pending_or_claimed(#[case] status: GiftStatus, #[case] expected: &str) {
        let row = row(&customer("Ana Gómez", status));
        assert_eq!(row[4], expected);
    }

    #[rstest]
    fn csv_starts_with_localized_headers() {
        let csv = to_csv(&[customer("Ana Gómez", GiftStatus::Pending)]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some(
                "Nombre,Teléfono,Número de referidos,Descuento acumulado (%),\
                 Regalo reclamado,Veces que ha cobrado descuento"
            )
        );
        assert_eq!(lines.next(), Some("Ana Gómez,3001234567,3,15,Pendiente,1"));
    }

    #[rstest]
    fn cells_with_separators_are_quoted() {
        assert_eq!(csv_escape("Pérez, José"), "\"Pérez, José\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("plain"), "plain");
    }
}

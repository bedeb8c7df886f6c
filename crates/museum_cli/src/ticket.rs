//! Plain-text confirmation ticket.

use museum_core::Reservation;
use std::fmt::{Display, Formatter};

const RULE: &str = "----------------------------------------";

/// Ticket shown after booking and on lookup by id.
pub struct Ticket<'a>(pub &'a Reservation);

impl Display for Ticket<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let reservation = self.0;
        writeln!(f, "{RULE}")?;
        writeln!(f, "  Life Science Museum - Visit Ticket")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "  Booking no.  {}", reservation.id)?;
        writeln!(f, "  Visitor      {}", reservation.name)?;
        if !reservation.identity.is_empty() {
            writeln!(f, "  Identity     {}", reservation.identity)?;
        }
        writeln!(f, "  Phone        {}", mask_phone(&reservation.phone))?;
        writeln!(
            f,
            "  Visit        {} {}",
            reservation.visit_date, reservation.visit_time
        )?;
        writeln!(f, "  Status       {}", reservation.status)?;
        if !reservation.remarks.is_empty() {
            writeln!(f, "  Remarks      {}", reservation.remarks)?;
        }
        writeln!(
            f,
            "  Submitted    {}",
            reservation.submit_time.format("%Y-%m-%d %H:%M UTC")
        )?;
        writeln!(f, "{RULE}")
    }
}

/// Keeps the first three and last four digits of an 11-digit phone.
fn mask_phone(phone: &str) -> String {
    if phone.len() != 11 || !phone.is_ascii() {
        return phone.to_string();
    }
    format!("{}****{}", &phone[..3], &phone[7..])
}

#[cfg(test)]
mod tests {
    use super::{mask_phone, Ticket};
    use chrono::{NaiveDate, TimeZone, Utc};
    use museum_core::{Reservation, ReservationStatus, VisitTime};

    fn reservation(remarks: &str) -> Reservation {
        Reservation {
            id: "42".to_string(),
            name: "Zhao".to_string(),
            identity: "student".to_string(),
            phone: "13800138000".to_string(),
            visit_date: NaiveDate::from_ymd_opt(2026, 11, 3).unwrap(),
            visit_time: VisitTime::from_hour(14).unwrap(),
            remarks: remarks.to_string(),
            submit_time: Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0).unwrap(),
            status: ReservationStatus::Confirmed,
        }
    }

    #[test]
    fn ticket_shows_booking_details_with_masked_phone() {
        let text = Ticket(&reservation("")).to_string();

        assert!(text.contains("Booking no.  42"));
        assert!(text.contains("Visit        2026-11-03 14:00"));
        assert!(text.contains("Phone        138****8000"));
        assert!(text.contains("Submitted    2026-10-15 08:30 UTC"));
        assert!(!text.contains("Remarks"));
    }

    #[test]
    fn ticket_includes_remarks_when_present() {
        assert!(Ticket(&reservation("wheelchair"))
            .to_string()
            .contains("Remarks      wheelchair"));
    }

    #[test]
    fn unexpected_phone_shapes_are_left_alone() {
        assert_eq!(mask_phone("123"), "123");
    }
}

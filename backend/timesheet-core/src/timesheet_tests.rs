// src/timesheet_tests.rs

#[cfg(test)]
mod tests {
    use crate::timesheet::*;

    // Helper to build a submission with one pay rate already entered
    fn submission_with_rate(rate: &str) -> Submission {
        let mut submission = Submission::default();
        submission.record_account_value(0, AccountField::PayRate, rate);
        submission
    }

    // --- Shift durations ---

    #[test]
    fn shift_duration_formats_to_two_decimals() {
        let mut submission = Submission::default();
        submission.record_clock_time(16, 1, ClockField::In, "08:00");
        submission.record_clock_time(16, 1, ClockField::Out, "12:30");

        let entry = submission.day_entry(16);
        assert_eq!(
            entry.shifts[0].duration, "4.50",
            "08:00 to 12:30 should read as 4.50 hours"
        );
    }

    #[test]
    fn shift_duration_is_empty_when_out_before_in() {
        let mut submission = Submission::default();
        submission.record_clock_time(16, 1, ClockField::In, "12:00");
        submission.record_clock_time(16, 1, ClockField::Out, "08:00");

        let entry = submission.day_entry(16);
        assert_eq!(
            entry.shifts[0].duration, "",
            "out-before-in must read as empty, never negative"
        );
        assert_eq!(entry.daily_total, "");
    }

    #[test]
    fn shift_duration_is_empty_when_out_equals_in() {
        assert_eq!(shift_duration_minutes("09:00", "09:00"), 0);
        assert_eq!(format_minutes_as_hours(0), "");
    }

    #[test]
    fn shift_duration_is_empty_with_incomplete_inputs() {
        let mut submission = Submission::default();
        submission.record_clock_time(20, 1, ClockField::In, "08:00");

        assert_eq!(
            submission.day_entry(20).shifts[0].duration,
            "",
            "a shift with no clock-out has no duration"
        );
    }

    #[test]
    fn unparseable_clock_values_read_as_absent() {
        assert_eq!(shift_duration_minutes("garbage", "12:00"), 0);
        assert_eq!(shift_duration_minutes("08:00", ""), 0);
        assert_eq!(shift_duration_minutes("8", "12"), 0);
    }

    #[test]
    fn editing_a_clock_time_refreshes_the_stored_duration() {
        let mut submission = Submission::default();
        submission.record_clock_time(16, 1, ClockField::In, "08:00");
        submission.record_clock_time(16, 1, ClockField::Out, "12:00");
        assert_eq!(submission.day_entry(16).shifts[0].duration, "4.00");

        submission.record_clock_time(16, 1, ClockField::Out, "12:30");
        assert_eq!(
            submission.day_entry(16).shifts[0].duration, "4.50",
            "re-entering a time must not leave the old duration behind"
        );
    }

    // --- Daily totals ---

    #[test]
    fn daily_total_sums_all_shift_slots() {
        let mut submission = Submission::default();
        submission.record_clock_time(16, 1, ClockField::In, "08:00");
        submission.record_clock_time(16, 1, ClockField::Out, "12:30");
        submission.record_clock_time(16, 2, ClockField::In, "13:00");
        submission.record_clock_time(16, 2, ClockField::Out, "16:00");

        let entry = submission.day_entry(16);
        assert_eq!(entry.shifts[0].duration, "4.50");
        assert_eq!(entry.shifts[1].duration, "3.00");
        assert_eq!(entry.daily_total, "7.50");
    }

    #[test]
    fn daily_total_sums_in_minutes_not_rounded_hours() {
        // Three 20-minute shifts: each rounds to 0.33 on its own, but the day
        // must read exactly 1.00.
        let mut submission = Submission::default();
        for slot in 1..=3 {
            submission.record_clock_time(16, slot, ClockField::In, "08:00");
            submission.record_clock_time(16, slot, ClockField::Out, "08:20");
        }

        let entry = submission.day_entry(16);
        assert_eq!(entry.shifts[0].duration, "0.33");
        assert_eq!(entry.daily_total, "1.00");
    }

    #[test]
    fn daily_total_ignores_slots_from_other_days() {
        let mut submission = Submission::default();
        submission.record_clock_time(16, 1, ClockField::In, "08:00");
        submission.record_clock_time(16, 1, ClockField::Out, "12:00");
        submission.record_clock_time(17, 1, ClockField::In, "09:00");
        submission.record_clock_time(17, 1, ClockField::Out, "10:00");

        assert_eq!(submission.day_entry(16).daily_total, "4.00");
        assert_eq!(submission.day_entry(17).daily_total, "1.00");
    }

    // --- Account rows ---

    #[test]
    fn account_row_total_is_hours_times_rate() {
        let mut submission = Submission::default();
        submission.record_account_value(1, AccountField::Hours, "7.5");
        submission.record_account_value(1, AccountField::PayRate, "20");

        assert_eq!(submission.account_codes[1].total_pay, "150.00");
    }

    #[test]
    fn account_row_total_clears_when_an_input_is_removed() {
        let mut submission = Submission::default();
        submission.record_account_value(1, AccountField::Hours, "7.5");
        submission.record_account_value(1, AccountField::PayRate, "20");
        assert_eq!(submission.account_codes[1].total_pay, "150.00");

        submission.record_account_value(1, AccountField::PayRate, "");
        assert_eq!(
            submission.account_codes[1].total_pay, "",
            "clearing the rate must also clear the stale total"
        );
    }

    #[test]
    fn account_row_total_ignores_non_numeric_inputs() {
        let mut submission = Submission::default();
        submission.record_account_value(2, AccountField::Hours, "seven");
        submission.record_account_value(2, AccountField::PayRate, "20");

        assert_eq!(submission.account_codes[2].total_pay, "");
    }

    #[test]
    fn account_row_total_rounds_to_two_decimals() {
        let mut row = AccountCodeRow {
            hours: "3.333".to_string(),
            pay_rate: "19.99".to_string(),
            ..Default::default()
        };
        recompute_account_row_total(&mut row);
        // 3.333 * 19.99 = 66.62667
        assert_eq!(row.total_pay, "66.63");
    }

    // --- Grand total ---

    #[test]
    fn grand_total_sums_row_totals_treating_blanks_as_zero() {
        let mut submission = Submission::default();
        submission.record_account_value(0, AccountField::Hours, "7.5");
        submission.record_account_value(0, AccountField::PayRate, "20");
        submission.record_account_value(2, AccountField::Hours, "2");
        submission.record_account_value(2, AccountField::PayRate, "25.25");

        assert_eq!(submission.grand_total_pay(), "200.50");
    }

    #[test]
    fn grand_total_is_empty_when_every_row_is_blank() {
        let submission = Submission::default();
        assert_eq!(
            submission.grand_total_pay(),
            "",
            "an untouched grid must not display 0.00 or NaN"
        );
    }

    // --- Auto-populated first row ---

    #[test]
    fn day_grid_edits_feed_account_row_zero_hours() {
        let mut submission = submission_with_rate("20");
        submission.record_clock_time(16, 1, ClockField::In, "08:00");
        submission.record_clock_time(16, 1, ClockField::Out, "12:30");
        submission.record_clock_time(1, 1, ClockField::In, "09:00");
        submission.record_clock_time(1, 1, ClockField::Out, "12:00");

        let row = &submission.account_codes[0];
        assert_eq!(row.hours, "7.50", "row 0 hours track the summed day totals");
        assert_eq!(row.total_pay, "150.00", "row 0 total follows the auto-populated hours");
    }

    #[test]
    fn auto_populate_without_a_rate_leaves_total_cleared() {
        let mut submission = Submission::default();
        submission.record_clock_time(16, 1, ClockField::In, "08:00");
        submission.record_clock_time(16, 1, ClockField::Out, "16:00");

        let row = &submission.account_codes[0];
        assert_eq!(row.hours, "8.00");
        assert_eq!(row.total_pay, "", "no rate means no total, not a stale one");
    }

    #[test]
    fn clearing_all_times_clears_the_auto_populated_hours() {
        let mut submission = submission_with_rate("20");
        submission.record_clock_time(16, 1, ClockField::In, "08:00");
        submission.record_clock_time(16, 1, ClockField::Out, "12:00");
        assert_eq!(submission.account_codes[0].hours, "4.00");

        submission.record_clock_time(16, 1, ClockField::Out, "");
        assert_eq!(submission.account_codes[0].hours, "");
        assert_eq!(submission.account_codes[0].total_pay, "");
    }

    #[test]
    fn account_row_edits_never_feed_back_into_the_day_grid() {
        let mut submission = submission_with_rate("20");
        submission.record_clock_time(16, 1, ClockField::In, "08:00");
        submission.record_clock_time(16, 1, ClockField::Out, "12:00");
        let grid_before = submission.timesheet_data.clone();

        submission.record_account_value(0, AccountField::Hours, "99");
        submission.record_account_value(0, AccountField::PayRate, "1");

        assert_eq!(
            submission.timesheet_data, grid_before,
            "the derivation is one-directional; the grid must be untouched"
        );
        // The manual override stands until the next day-grid edit re-derives it.
        assert_eq!(submission.account_codes[0].total_pay, "99.00");
        submission.record_clock_time(16, 2, ClockField::In, "13:00");
        submission.record_clock_time(16, 2, ClockField::Out, "14:00");
        assert_eq!(submission.account_codes[0].hours, "5.00");
    }

    // --- Signature presence ---

    #[test]
    fn submission_is_signed_only_with_non_empty_signature_data() {
        let mut submission = Submission::default();
        assert!(!submission.is_signed());

        submission.signature_data = Some("   ".to_string());
        assert!(!submission.is_signed(), "whitespace is not a signature");

        submission.signature_data = Some("data:image/png;base64,AAAA".to_string());
        assert!(submission.is_signed());
    }

    // --- Wire format ---

    #[test]
    fn deserializes_the_browser_payload_shape() {
        let payload = serde_json::json!({
            "school": "ANDREW HILL",
            "employeeName": "Jane Doe",
            "employeeId": "123456",
            "fte": "1.0",
            "hoursPerWeek": "40",
            "month1": "March",
            "month2": "April",
            "year": "2025",
            "position": "Counselor",
            "employeeType": "Certificated",
            "email": "jane@example.com",
            "alphaL": "Testing Support",
            "alphaM": "",
            "alphaN": "",
            "dateEmployee": "2025-04-01",
            "datePrincipal": "",
            "dateManager": "",
            "timesheetData": {
                "16-in1": "08:00",
                "16-out1": "12:30",
                "16-total1": "4.50",
                "16-code1": "A",
                "16-dailyTotal": "4.50"
            },
            "accountCodes": [
                {"fund": "010", "hours": "4.50", "payRate": "20", "totalPay": "90.00"},
                {},
                {}
            ],
            "signatureData": "data:image/png;base64,AAAA"
        });

        let submission: Submission = serde_json::from_value(payload).expect("payload should parse");
        assert_eq!(submission.employee_name, "Jane Doe");
        assert_eq!(submission.employee_type, "Certificated");
        assert_eq!(submission.alpha_l, "Testing Support");
        assert_eq!(submission.timesheet_data.get(16, "in1"), "08:00");
        assert_eq!(submission.day_entry(16).shifts[0].code, "A");
        assert_eq!(submission.account_codes.len(), 3);
        assert_eq!(submission.account_codes[0].total_pay, "90.00");
        assert!(submission.is_signed());
    }
}

// src/timesheet.rs

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

// --- Form Constants ---

pub const SCHOOLS: [&str; 5] = [
    "Mt. Pleasant",
    "ANDREW HILL",
    "YERBA BUENA",
    "W.C. Overfelt",
    "JAMES LICK",
];

pub const EMPLOYEE_TYPE_CLASSIFIED: &str = "Classified";
pub const EMPLOYEE_TYPE_CERTIFICATED: &str = "Certificated";

/// Fixed portion of the alpha-code legend. Codes L, M and N are free-text
/// fields on the submission itself.
pub const FIXED_ALPHA_CODES: [(&str, &str); 11] = [
    ("A", "Sub - Personal Necessity 436-1150"),
    ("B", "Sub - Illness 436-1151"),
    ("C", "Sub - School Business 437-1152"),
    ("D", "Sub - Vacant 437-1153"),
    ("E", "Home Teaching 194"),
    ("F", "Home Teaching Handicapped 383"),
    ("G", "Saturday School 176"),
    ("H", "Summer Counselor"),
    ("I", "Extra Class 1113"),
    ("J", "Summer School 187-1110"),
    ("K", "Admin Supervision 1119"),
];

pub const SHIFTS_PER_DAY: usize = 3;
pub const ACCOUNT_ROWS: usize = 3;

/// Days covered by the first half-month window of the pay period.
pub fn window_one_days() -> impl Iterator<Item = u32> {
    16..=31
}

/// Days covered by the second half-month window of the pay period.
pub fn window_two_days() -> impl Iterator<Item = u32> {
    1..=15
}

// --- Core Data Structures ---

/// Sparse per-day/per-shift cell storage, keyed `"{day}-{field}"` to stay
/// wire-compatible with the form payload. Raw fields are `in1..in3`,
/// `out1..out3` and `code1..code3`; derived fields are `total1..total3` and
/// `dailyTotal`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimesheetGrid(pub BTreeMap<String, String>);

impl TimesheetGrid {
    fn key(day: u32, field: &str) -> String {
        format!("{}-{}", day, field)
    }

    pub fn get(&self, day: u32, field: &str) -> &str {
        self.0
            .get(&Self::key(day, field))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, day: u32, field: &str, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            // Keep the map sparse; an empty cell and a missing cell read the same.
            self.0.remove(&Self::key(day, field));
        } else {
            self.0.insert(Self::key(day, field), value);
        }
    }

    /// Typed view of one shift slot (1-based, matching the wire keys).
    pub fn shift(&self, day: u32, slot: usize) -> Shift {
        Shift {
            clock_in: self.get(day, &format!("in{}", slot)).to_string(),
            clock_out: self.get(day, &format!("out{}", slot)).to_string(),
            code: self.get(day, &format!("code{}", slot)).to_string(),
            duration: self.get(day, &format!("total{}", slot)).to_string(),
        }
    }

    /// Typed view of a whole day row.
    pub fn day_entry(&self, day: u32) -> DayEntry {
        DayEntry {
            day,
            shifts: [self.shift(day, 1), self.shift(day, 2), self.shift(day, 3)],
            daily_total: self.get(day, "dailyTotal").to_string(),
        }
    }
}

/// One clock-in/clock-out pair with an optional 2-character activity code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shift {
    pub clock_in: String,
    pub clock_out: String,
    pub code: String,
    pub duration: String,
}

/// One calendar day's up to three shifts plus the derived daily total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayEntry {
    pub day: u32,
    pub shifts: [Shift; SHIFTS_PER_DAY],
    pub daily_total: String,
}

/// One accounting-dimension row with hours, rate and the derived total pay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountCodeRow {
    pub fund: String,
    pub location: String,
    pub program: String,
    pub goal: String,
    pub function: String,
    pub object: String,
    pub resource: String,
    pub year: String,
    pub manager: String,
    pub alpha: String,
    pub hours: String,
    pub pay_rate: String,
    pub total_pay: String,
}

fn default_account_rows() -> Vec<AccountCodeRow> {
    vec![AccountCodeRow::default(); ACCOUNT_ROWS]
}

/// The complete form snapshot sent to the render/upload step. Field names
/// match the browser payload exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Submission {
    pub school: String,
    pub employee_name: String,
    pub employee_id: String,
    pub fte: String,
    pub hours_per_week: String,
    pub month1: String,
    pub month2: String,
    pub year: String,
    pub position: String,
    pub employee_type: String,
    pub email: String,
    pub alpha_l: String,
    pub alpha_m: String,
    pub alpha_n: String,
    pub date_employee: String,
    pub date_principal: String,
    pub date_manager: String,
    pub timesheet_data: TimesheetGrid,
    #[serde(default = "default_account_rows")]
    pub account_codes: Vec<AccountCodeRow>,
    pub signature_data: Option<String>,
}

impl Default for Submission {
    fn default() -> Self {
        Self {
            school: SCHOOLS[0].to_string(),
            employee_name: String::new(),
            employee_id: String::new(),
            fte: String::new(),
            hours_per_week: String::new(),
            month1: String::new(),
            month2: String::new(),
            year: String::new(),
            position: String::new(),
            employee_type: EMPLOYEE_TYPE_CLASSIFIED.to_string(),
            email: String::new(),
            alpha_l: String::new(),
            alpha_m: String::new(),
            alpha_n: String::new(),
            date_employee: String::new(),
            date_principal: String::new(),
            date_manager: String::new(),
            timesheet_data: TimesheetGrid::default(),
            account_codes: default_account_rows(),
            signature_data: None,
        }
    }
}

/// Which clock field of a shift slot is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockField {
    In,
    Out,
}

impl ClockField {
    fn grid_field(&self, slot: usize) -> String {
        match self {
            ClockField::In => format!("in{}", slot),
            ClockField::Out => format!("out{}", slot),
        }
    }
}

/// Editable fields of an account-code row. Total pay is derived only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountField {
    Fund,
    Location,
    Program,
    Goal,
    Function,
    Object,
    Resource,
    Year,
    Manager,
    Alpha,
    Hours,
    PayRate,
}

// --- Derived-Field Calculations ---

/// Parses an "HH:MM" 24-hour wall-clock string into minutes since midnight.
/// Anything unparseable reads as absent, never as an error.
fn parse_clock_minutes(value: &str) -> Option<i64> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: i64 = hours.parse().ok()?;
    let minutes: i64 = minutes.parse().ok()?;
    Some(hours * 60 + minutes)
}

/// Duration of one shift in minutes. Zero unless both times are present and
/// out is strictly after in; out-before-in yields zero, not a wrapped value
/// (overnight shifts are not supported on this form).
pub fn shift_duration_minutes(clock_in: &str, clock_out: &str) -> i64 {
    match (parse_clock_minutes(clock_in), parse_clock_minutes(clock_out)) {
        (Some(start), Some(stop)) => (stop - start).max(0),
        _ => 0,
    }
}

/// Formats a minute count as hours with two decimals; zero renders as the
/// empty string so untouched cells stay blank.
pub fn format_minutes_as_hours(minutes: i64) -> String {
    if minutes > 0 {
        money(Decimal::from(minutes) / dec!(60))
    } else {
        String::new()
    }
}

/// Renders a decimal with exactly two fraction digits.
fn money(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}

/// Recomputes the derived duration of one shift slot from its raw times.
pub fn recompute_shift_duration(grid: &mut TimesheetGrid, day: u32, slot: usize) {
    let minutes = shift_duration_minutes(
        grid.get(day, &format!("in{}", slot)),
        grid.get(day, &format!("out{}", slot)),
    );
    grid.set(day, &format!("total{}", slot), format_minutes_as_hours(minutes));
}

/// Recomputes a day's total from all of its shift slots. Summing is done in
/// minutes so the per-shift rounding cannot drift the daily figure.
pub fn recompute_daily_total(grid: &mut TimesheetGrid, day: u32) {
    let mut total_minutes = 0;
    for slot in 1..=SHIFTS_PER_DAY {
        total_minutes += shift_duration_minutes(
            grid.get(day, &format!("in{}", slot)),
            grid.get(day, &format!("out{}", slot)),
        );
    }
    grid.set(day, "dailyTotal", format_minutes_as_hours(total_minutes));
}

/// Recomputes one account row's total pay. When either input is missing or
/// non-numeric the total is cleared rather than left stale.
pub fn recompute_account_row_total(row: &mut AccountCodeRow) {
    match (parse_decimal(&row.hours), parse_decimal(&row.pay_rate)) {
        (Some(hours), Some(rate)) => row.total_pay = money(hours * rate),
        _ => row.total_pay.clear(),
    }
}

/// Sum of the account rows' total pay, blanks and unparseable values counting
/// as zero. A non-positive sum displays as empty, never as a NaN-ish artifact.
pub fn grand_total(rows: &[AccountCodeRow]) -> String {
    let total: Decimal = rows
        .iter()
        .map(|row| parse_decimal(&row.total_pay).unwrap_or(Decimal::ZERO))
        .sum();
    if total > Decimal::ZERO {
        money(total)
    } else {
        String::new()
    }
}

/// Sum of every day's derived total across both half-month windows, in hours.
pub fn summed_day_totals(grid: &TimesheetGrid) -> Decimal {
    window_one_days()
        .chain(window_two_days())
        .filter_map(|day| parse_decimal(grid.get(day, "dailyTotal")))
        .sum()
}

/// Pushes the summed day totals into account row 0's hours and refreshes its
/// total pay. Strictly one-directional: account-row edits never feed back
/// into the day grid.
pub fn auto_populate_first_row_hours(submission: &mut Submission) {
    let total_hours = summed_day_totals(&submission.timesheet_data);
    if let Some(row) = submission.account_codes.first_mut() {
        row.hours = if total_hours > Decimal::ZERO {
            money(total_hours)
        } else {
            String::new()
        };
        recompute_account_row_total(row);
    }
}

// --- Edit Operations ---

impl Submission {
    /// Records one clock time for a shift slot (1-based) and refreshes every
    /// derived field that depends on it: the slot duration, the daily total
    /// and account row 0's auto-populated hours.
    pub fn record_clock_time(&mut self, day: u32, slot: usize, field: ClockField, value: &str) {
        debug_assert!((1..=SHIFTS_PER_DAY).contains(&slot), "slot is 1-based");
        self.timesheet_data.set(day, &field.grid_field(slot), value);
        recompute_shift_duration(&mut self.timesheet_data, day, slot);
        recompute_daily_total(&mut self.timesheet_data, day);
        auto_populate_first_row_hours(self);
    }

    /// Records the 2-character activity code of a shift slot. Codes carry no
    /// derived state.
    pub fn record_shift_code(&mut self, day: u32, slot: usize, code: &str) {
        debug_assert!((1..=SHIFTS_PER_DAY).contains(&slot), "slot is 1-based");
        self.timesheet_data.set(day, &format!("code{}", slot), code);
    }

    /// Records one account-row field, refreshing that row's total pay when an
    /// hours or rate input changed.
    pub fn record_account_value(&mut self, row_index: usize, field: AccountField, value: &str) {
        let Some(row) = self.account_codes.get_mut(row_index) else {
            return;
        };
        let value = value.trim().to_string();
        match field {
            AccountField::Fund => row.fund = value,
            AccountField::Location => row.location = value,
            AccountField::Program => row.program = value,
            AccountField::Goal => row.goal = value,
            AccountField::Function => row.function = value,
            AccountField::Object => row.object = value,
            AccountField::Resource => row.resource = value,
            AccountField::Year => row.year = value,
            AccountField::Manager => row.manager = value,
            AccountField::Alpha => row.alpha = value,
            AccountField::Hours => {
                row.hours = value;
                recompute_account_row_total(row);
            }
            AccountField::PayRate => {
                row.pay_rate = value;
                recompute_account_row_total(row);
            }
        }
    }

    pub fn grand_total_pay(&self) -> String {
        grand_total(&self.account_codes)
    }

    pub fn day_entry(&self, day: u32) -> DayEntry {
        self.timesheet_data.day_entry(day)
    }

    /// A submission counts as signed only when signature data is present and
    /// non-empty.
    pub fn is_signed(&self) -> bool {
        self.signature_data
            .as_deref()
            .map(str::trim)
            .is_some_and(|data| !data.is_empty())
    }
}

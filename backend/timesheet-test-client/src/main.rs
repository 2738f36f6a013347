// src/main.rs

use reqwest::Client;
use serde::Deserialize;
use std::error::Error;

use timesheet_core::timesheet::{AccountField, ClockField, Submission};

// A valid 1x1 PNG, standing in for the browser's signature-pad capture.
const SIGNATURE_PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR4nGNgYGD4DwABBAEAX+XDSwAAAABJRU5ErkJggg==";

// Response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    success: bool,
    file_id: Option<String>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let base_url = "http://localhost:3000";
    let client = Client::new();

    // Test 1: Status page
    println!("\n🔍 Testing status endpoint...");
    let status_response = client.get(format!("{}/status", base_url)).send().await?;
    println!("Status endpoint status: {}", status_response.status());

    // Test 2: Build a filled form the way the browser does, derived fields
    // recomputed on every edit.
    println!("\n🔍 Building a sample submission...");
    let submission = sample_submission();
    println!(
        "Day 16 total: {}, auto-populated row 0 hours: {}, grand total: {}",
        submission.day_entry(16).daily_total,
        submission.account_codes[0].hours,
        submission.grand_total_pay()
    );

    // Test 3: Unsigned submissions must be rejected without an upload
    println!("\n🔍 Testing unsigned submission rejection...");
    let mut unsigned = submission.clone();
    unsigned.signature_data = None;
    let response = client
        .post(format!("{}/api/timesheet/submit", base_url))
        .json(&unsigned)
        .send()
        .await?;
    println!("Unsigned submit status: {}", response.status());
    let body = response.json::<SubmitResponse>().await?;
    println!("Unsigned submit response: {:?}", body);
    if body.success {
        println!("⚠️ Server accepted an unsigned timesheet!");
    }

    // Test 4: Full signed submission
    println!("\n🔍 Testing signed submission...");
    let response = client
        .post(format!("{}/api/timesheet/submit", base_url))
        .json(&submission)
        .send()
        .await?;
    println!("Signed submit status: {}", response.status());
    let body = response.json::<SubmitResponse>().await?;
    match (body.success, body.file_id, body.error) {
        (true, Some(file_id), _) => {
            println!("✅ Timesheet stored in Drive, file id: {}", file_id);
        }
        (_, _, error) => {
            println!("❌ Submission failed: {}", error.unwrap_or_default());
            println!("(A Drive failure here usually means the GOOGLE_* env vars are not set.)");
        }
    }

    println!("\n✅ Testing complete!");

    Ok(())
}

fn sample_submission() -> Submission {
    let mut submission = Submission::default();
    submission.employee_name = "Jane Doe".to_string();
    submission.employee_id = "123456".to_string();
    submission.fte = "1.0".to_string();
    submission.hours_per_week = "40".to_string();
    submission.month1 = "March".to_string();
    submission.month2 = "April".to_string();
    submission.year = "2025".to_string();
    submission.position = "Counselor".to_string();
    submission.email = "jane.doe@example.com".to_string();
    submission.date_employee = "2025-04-01".to_string();
    submission.alpha_l = "District Testing Support".to_string();

    // A rate first, so the auto-populated hours immediately price out.
    submission.record_account_value(0, AccountField::Fund, "010");
    submission.record_account_value(0, AccountField::Location, "041");
    submission.record_account_value(0, AccountField::Alpha, "A");
    submission.record_account_value(0, AccountField::PayRate, "20");

    // Two days in the first window, one in the second.
    submission.record_clock_time(16, 1, ClockField::In, "08:00");
    submission.record_clock_time(16, 1, ClockField::Out, "12:30");
    submission.record_shift_code(16, 1, "A");
    submission.record_clock_time(16, 2, ClockField::In, "13:00");
    submission.record_clock_time(16, 2, ClockField::Out, "16:00");
    submission.record_clock_time(17, 1, ClockField::In, "08:00");
    submission.record_clock_time(17, 1, ClockField::Out, "12:00");
    submission.record_clock_time(3, 1, ClockField::In, "09:00");
    submission.record_clock_time(3, 1, ClockField::Out, "15:00");

    submission.signature_data = Some(format!("data:image/png;base64,{}", SIGNATURE_PNG_B64));
    submission
}

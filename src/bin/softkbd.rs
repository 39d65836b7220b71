//! Capture one line from the terminal and print what the host would receive.
//!
//! ```text
//! SOFTKBD_GUIDE_TEXT="name?" SOFTKBD_LOG=debug softkbd
//! ```

use std::process::ExitCode;

use softkbd::{CaptureAdapter, CaptureOutcome, CaptureSettings, TerminalKeyboard, logging};

fn main() -> ExitCode {
    // A host may already have a subscriber; ours is optional.
    let _ = logging::init();

    let settings = match CaptureSettings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("softkbd: {err}");
            return ExitCode::from(2);
        }
    };

    let keyboard = TerminalKeyboard::with_max_text_units(settings.max_text_units);
    let outcome = match CaptureAdapter::new(keyboard, settings).capture() {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("softkbd: {err}");
            return ExitCode::FAILURE;
        }
    };

    let status = match &outcome {
        CaptureOutcome::Completed(_) => "completed".to_owned(),
        CaptureOutcome::Canceled(_) => "canceled".to_owned(),
        CaptureOutcome::Failed { failure, .. } => format!("failed ({failure})"),
    };
    let text = outcome.text();
    let hex: Vec<String> = text.as_bytes().iter().map(|b| format!("{b:02X}")).collect();

    println!("status: {status}");
    println!("units:  {}", text.units());
    println!("bytes:  {}", hex.join(" "));
    println!("text:   {}", text.to_string_lossy());

    if outcome.is_completed() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

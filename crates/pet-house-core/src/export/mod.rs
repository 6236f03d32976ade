//! Admin reporting: boarding analytics and the payments ledger.

mod analytics;
mod payments;

pub use analytics::*;
pub use payments::*;

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

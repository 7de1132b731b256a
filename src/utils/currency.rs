// utils/currency.rs
//
// Money is stored as integer fen. Yuan only exists at the HTTP edge.

pub const FEN_PER_YUAN: i64 = 100;

/// Largest yuan amount a client may send in any money field.
pub const MAX_CLIENT_YUAN: f64 = 100_000_000.0;

/// Yuan from a request body to fen, or `None` when the value is not finite,
/// negative, or above `MAX_CLIENT_YUAN`.
pub fn yuan_to_fen(yuan: f64) -> Option<i64> {
    if !yuan.is_finite() || !(0.0..=MAX_CLIENT_YUAN).contains(&yuan) {
        return None;
    }
    Some((yuan * FEN_PER_YUAN as f64).round() as i64)
}

pub fn fen_to_yuan(fen: i64) -> f64 {
    fen as f64 / FEN_PER_YUAN as f64
}

/// `¥12.34`, formatted from the integer so no float rounding leaks into logs.
pub fn format_fen_as_yuan(fen: i64) -> String {
    let sign = if fen < 0 { "-" } else { "" };
    let abs = fen.unsigned_abs();
    let per = FEN_PER_YUAN as u64;
    format!("{}¥{}.{:02}", sign, abs / per, abs % per)
}

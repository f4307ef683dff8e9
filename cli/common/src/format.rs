//! Formatting utilities for CLI output.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a size in bytes with base-1024 units.
///
/// Sizes of 1024 TB and above stay in TB.
///
/// # Examples
///
/// ```
/// use as3_cli_common::human_readable_size;
///
/// assert_eq!(human_readable_size(0, 2), "0.00 B");
/// assert_eq!(human_readable_size(1536, 2), "1.50 KB");
/// assert_eq!(human_readable_size(1536, 0), "2 KB");
/// assert_eq!(human_readable_size(1_099_511_627_776, 2), "1.00 TB");
/// ```
pub fn human_readable_size(bytes: u64, decimal_places: usize) -> String {
    let mut size = bytes as f64;
    let mut unit = UNITS[0];

    for &next in &UNITS[1..] {
        if size < 1024.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }

    format!("{size:.decimal_places$} {unit}")
}

/// Format a large number with commas for readability.
///
/// # Examples
///
/// ```
/// use as3_cli_common::format_number;
///
/// assert_eq!(format_number(0), "0");
/// assert_eq!(format_number(1234), "1,234");
/// assert_eq!(format_number(1234567), "1,234,567");
/// ```
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}

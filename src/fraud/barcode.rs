use serde::{Deserialize, Serialize};

/// Accepted payload lengths: 44-digit bank barcodes plus the 47/48-digit
/// typeable lines.
const ACCEPTED_LENGTHS: [usize; 3] = [44, 47, 48];
/// The encoded amount lives at this fixed digit range, in centavos.
const AMOUNT_RANGE: std::ops::Range<usize> = 37..47;

/// Why a barcode failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "issue")]
pub enum BarcodeIssue {
    InvalidLength { length: usize },
    ParsingError,
    ValueMismatch {
        barcode_cents: i64,
        extracted_cents: i64,
    },
}

/// Outcome of decoding a payment barcode and, when an independently
/// extracted amount is supplied, comparing the two within 1%.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum BarcodeValidation {
    Valid { amount_cents: Option<i64> },
    Invalid { issue: BarcodeIssue },
}

/// Decode the fixed-position numeric payload of a boleto barcode and check
/// it against an independently extracted amount.
///
/// Formatting characters (spaces and dots) are stripped before the length
/// check. A 44-digit payload has no amount field beyond position 37..47 only
/// when shorter than the range end; in that case the barcode is accepted
/// without an amount comparison.
pub fn validate_barcode(barcode: &str, extracted_cents: Option<i64>) -> BarcodeValidation {
    let cleaned: String = barcode
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();

    // Length is counted in characters; OCR output may smuggle in multi-byte
    // garbage that must not distort the count.
    let length = cleaned.chars().count();
    if !ACCEPTED_LENGTHS.contains(&length) {
        return BarcodeValidation::Invalid {
            issue: BarcodeIssue::InvalidLength { length },
        };
    }

    // The 44-digit form truncates the amount field; take what is there,
    // exactly as the typeable-line readers do. Checked slicing: a non-ASCII
    // character near the amount field is a parsing error, not a panic.
    let end = cleaned.len().min(AMOUNT_RANGE.end);
    let Some(payload) = cleaned.get(AMOUNT_RANGE.start..end) else {
        return BarcodeValidation::Invalid {
            issue: BarcodeIssue::ParsingError,
        };
    };
    if payload.is_empty() || !payload.chars().all(|c| c.is_ascii_digit()) {
        return BarcodeValidation::Invalid {
            issue: BarcodeIssue::ParsingError,
        };
    }
    let barcode_cents = match payload.parse::<i64>() {
        Ok(value) => value,
        Err(_) => {
            return BarcodeValidation::Invalid {
                issue: BarcodeIssue::ParsingError,
            }
        }
    };

    if let Some(extracted_cents) = extracted_cents {
        // 1% tolerance, in integer arithmetic: |barcode − extracted| * 100
        // must not exceed the extracted amount.
        let gap = (barcode_cents - extracted_cents).abs();
        if gap.saturating_mul(100) > extracted_cents.abs() {
            return BarcodeValidation::Invalid {
                issue: BarcodeIssue::ValueMismatch {
                    barcode_cents,
                    extracted_cents,
                },
            };
        }
    }

    BarcodeValidation::Valid {
        amount_cents: Some(barcode_cents),
    }
}

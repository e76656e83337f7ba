use super::DocumentFlag;

/// Tool signatures that indicate a generic editor touched the document.
const EDITING_TOOLS: [&str; 9] = [
    "photoshop",
    "gimp",
    "canva",
    "pixlr",
    "paint.net",
    "ilovepdf",
    "smallpdf",
    "pdf24",
    "sejda",
];

/// Authoring signatures of banking apps whose exports we trust more, not
/// less.
const TRUSTED_BANK_TOOLS: [&str; 9] = [
    "itau",
    "bradesco",
    "santander",
    "banco do brasil",
    "caixa",
    "nubank",
    "banco inter",
    "sicoob",
    "sicredi",
];

/// How much of the file head is scanned for metadata text.
const SCAN_WINDOW: usize = 4096;

pub(super) fn inspect_image(bytes: &[u8], score: &mut i32, flags: &mut Vec<DocumentFlag>) {
    if bytes.len() < 16 {
        flags.push(DocumentFlag::UnreadableMetadata);
        *score += 10;
        return;
    }

    let Some(marker) = find_subslice(bytes, b"Exif\x00\x00") else {
        // Genuine camera/app captures embed EXIF; its absence on a bank
        // receipt photo is suspicious on its own.
        flags.push(DocumentFlag::MissingCaptureMetadata);
        *score += 15;
        return;
    };

    let window_end = bytes.len().min(marker + SCAN_WINDOW);
    let text = printable_text(&bytes[marker..window_end]).to_lowercase();

    if let Some(tool) = EDITING_TOOLS.iter().find(|tool| text.contains(*tool)) {
        flags.push(DocumentFlag::EditingSoftware((*tool).to_string()));
        *score += 30;
    }

    if text.contains("screenshot") {
        flags.push(DocumentFlag::ScreenshotIndicator);
        *score += 25;
    }

    // EXIF stores capture and modification times as "YYYY:MM:DD HH:MM:SS".
    // Two distinct stamps mean the file was written again after capture.
    let stamps = exif_datetimes(&text);
    if stamps.len() >= 2 {
        flags.push(DocumentFlag::ModifiedAfterCreation);
        *score += 20;
    }
}

pub(super) fn inspect_pdf(bytes: &[u8], score: &mut i32, flags: &mut Vec<DocumentFlag>) {
    if !bytes.starts_with(b"%PDF") {
        flags.push(DocumentFlag::UnreadableMetadata);
        *score += 5;
        return;
    }

    let head = printable_text(&bytes[..bytes.len().min(SCAN_WINDOW)]);

    match pdf_field(&head, "/Creator") {
        Some(creator) => {
            let creator = creator.to_lowercase();
            if let Some(tool) = EDITING_TOOLS.iter().find(|tool| creator.contains(*tool)) {
                flags.push(DocumentFlag::EditorAuthored((*tool).to_string()));
                *score += 35;
            }
            if TRUSTED_BANK_TOOLS.iter().any(|bank| creator.contains(bank)) {
                *score -= 10;
            }
        }
        None => {
            flags.push(DocumentFlag::MissingAuthorMetadata);
            *score += 15;
        }
    }

    if let (Some(modified), Some(created)) =
        (pdf_field(&head, "/ModDate"), pdf_field(&head, "/CreationDate"))
    {
        if modified != created {
            flags.push(DocumentFlag::ModifiedAfterCreation);
            *score += 20;
        }
    }
}

/// Plausible byte-size envelope for the declared type.
pub(super) fn size_anomaly(size: usize, kind: super::DocumentKind) -> Option<DocumentFlag> {
    let (min, max) = match kind {
        // Bank PDFs run 50KB-500KB in practice.
        super::DocumentKind::Pdf => (10_000, 5_000_000),
        // Phone captures and screenshots run 100KB-2MB.
        super::DocumentKind::Image => (5_000, 10_000_000),
        super::DocumentKind::Other => return None,
    };
    if size < min {
        Some(DocumentFlag::FileTooSmall)
    } else if size > max {
        Some(DocumentFlag::FileTooLarge)
    } else {
        None
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Replace non-printable bytes with spaces so substring scans work on mixed
/// binary/text segments.
fn printable_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if (0x20..0x7f).contains(&b) {
                b as char
            } else {
                ' '
            }
        })
        .collect()
}

/// Read the parenthesized value of a PDF info key, e.g. `/Creator (Foo)`.
fn pdf_field(head: &str, key: &str) -> Option<String> {
    let start = head.find(key)? + key.len();
    let rest = &head[start..];
    let open = rest.find('(')?;
    let close = rest[open + 1..].find(')')?;
    Some(rest[open + 1..open + 1 + close].trim().to_string())
}

/// Collect distinct EXIF-style datetime stamps from scanned text.
fn exif_datetimes(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut found: Vec<&str> = Vec::new();
    if bytes.len() < 19 {
        return found;
    }
    for start in 0..=bytes.len() - 19 {
        let window = &bytes[start..start + 19];
        if is_exif_datetime(window) {
            let stamp = &text[start..start + 19];
            if !found.contains(&stamp) {
                found.push(stamp);
            }
        }
    }
    found
}

fn is_exif_datetime(window: &[u8]) -> bool {
    window.iter().enumerate().all(|(i, &b)| match i {
        4 | 7 => b == b':',
        10 => b == b' ',
        13 | 16 => b == b':',
        _ => b.is_ascii_digit(),
    })
}

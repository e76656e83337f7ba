use std::collections::HashSet;

/// Word-overlap ratio above which two extracted texts count as the same
/// receipt.
const SIMILARITY_THRESHOLD: f64 = 0.9;

/// Decide whether freshly extracted receipt text is a near-copy of a
/// previously seen one.
///
/// Catches resubmissions that defeat the byte hash: the document was edited,
/// but dates and amounts aside the text is almost identical. Numbers are
/// stripped before comparison precisely because they are what a forger
/// changes. Pure over its inputs; the caller supplies the corpus of prior
/// texts.
pub fn is_semantic_duplicate(extracted: &str, known_texts: &[String]) -> bool {
    if extracted.is_empty() || known_texts.is_empty() {
        return false;
    }

    let normalized = normalize_text(extracted);
    known_texts
        .iter()
        .any(|known| text_similarity(&normalized, &normalize_text(known)) >= SIMILARITY_THRESHOLD)
}

/// Jaccard similarity over the word sets of two normalized texts.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = words_a.intersection(&words_b).count();
    intersection as f64 / union as f64
}

/// Drop digits and punctuation, lowercase the rest. Dates and values vary
/// between copies of the same receipt; the surrounding structure does not.
fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_numeric())
        .filter(|c| c.is_alphabetic() || c.is_whitespace() || *c == '_')
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT_TEXT: &str = "Comprovante de pagamento PIX \
         Valor: R$ 1.500,00 Data: 12/08/2025 \
         Favorecido: Condominio Edificio Aurora";

    #[test]
    fn same_receipt_with_changed_numbers_is_a_duplicate() {
        let edited = RECEIPT_TEXT
            .replace("1.500,00", "2.350,00")
            .replace("12/08/2025", "19/08/2025");
        assert!(is_semantic_duplicate(
            &edited,
            &[RECEIPT_TEXT.to_string()]
        ));
    }

    #[test]
    fn unrelated_receipts_are_not_duplicates() {
        let other = "Boleto bancario cedente Imobiliaria Horizonte \
             referente a taxa de administracao mensal";
        assert!(!is_semantic_duplicate(other, &[RECEIPT_TEXT.to_string()]));
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(!is_semantic_duplicate("", &[RECEIPT_TEXT.to_string()]));
        assert!(!is_semantic_duplicate(RECEIPT_TEXT, &[]));
    }

    #[test]
    fn similarity_is_word_overlap_over_union() {
        assert_eq!(text_similarity("a b c d", "a b c d"), 1.0);
        assert_eq!(text_similarity("a b", "c d"), 0.0);
        // 2 shared words over a 4-word union.
        assert!((text_similarity("a b c", "a b d") - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn normalization_ignores_case_and_punctuation() {
        assert!(is_semantic_duplicate(
            "COMPROVANTE, DE PAGAMENTO: PIX!!! favorecido condominio edificio aurora valor data",
            &["comprovante de pagamento pix favorecido condominio edificio aurora valor data"
                .to_string()]
        ));
    }
}

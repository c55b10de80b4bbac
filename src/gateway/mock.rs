//! Local stand-ins used when gateway credentials are absent: development
//! still exercises the full store/attribution pipeline against a
//! syntactically plausible, non-functional PIX payload.

use chrono::Utc;
use rand::Rng;

const PIX_KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Strips everything but ASCII digits from a document number.
pub fn clean_document(document: &str) -> String {
    document.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Assembles an EMV-shaped PIX copy-paste string. Looks like the real
/// thing to a human and to a QR renderer; no bank will accept it.
pub fn mock_pix_code(amount: f64, customer_name: &str) -> String {
    let mut rng = rand::thread_rng();
    let key: String = (0..26)
        .map(|_| PIX_KEY_ALPHABET[rng.gen_range(0..PIX_KEY_ALPHABET.len())] as char)
        .collect();

    let merchant: String = customer_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .take(25)
        .collect();

    format!(
        "00020126580014br.gov.bcb.pix0136{key}520400005303986540{amount:.2}5802BR5913{merchant}6009SAOPAULO62070503***6304"
    )
}

/// Locally minted placeholder charge id.
pub fn mock_transaction_id() -> String {
    format!("mock-{}", Utc::now().timestamp_millis())
}

/// Builds the third-party QR rendering URL for a PIX code.
pub fn qr_image_url(qr_service_url: &str, pix_code: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("size", "300x300")
        .append_pair("data", pix_code)
        .finish();

    format!("{}?{}", qr_service_url.trim_end_matches(&['?', '&'][..]), query)
}

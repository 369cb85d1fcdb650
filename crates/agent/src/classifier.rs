use std::sync::Arc;

use tracing::{debug, warn};

use calorizz_core::domain::intent::IntentDecision;

use crate::llm::{CompletionRequest, LlmClient};

const CLASSIFIER_TEMPLATE: &str = "\
Kamu adalah pengklasifikasi pertanyaan untuk toko makanan Calorizz.
Tentukan apakah pesan pengguna menanyakan produk makanan atau minuman (nama, harga, ketersediaan) sehingga perlu cek database produk.
Balas TEPAT satu baris dengan format YES|kata kunci atau NO|none. Kata kunci hanya nama makanan atau minumannya, huruf kecil, tanpa tanda baca.

Contoh:
Pesan: apakah ada ayam goreng?
Jawaban: YES|ayam goreng
Pesan: berapa harga es teh manis?
Jawaban: YES|es teh manis
Pesan: mau pesan kopi susu dong
Jawaban: YES|kopi susu
Pesan: halo Ri, apa kabar?
Jawaban: NO|none
Pesan: tips makan sehat buat diet apa ya?
Jawaban: NO|none

Pesan: {message}
Jawaban:";

pub fn classifier_prompt(message: &str) -> String {
    CLASSIFIER_TEMPLATE.replace("{message}", message.trim())
}

/// Decides whether a message needs a catalog lookup.
///
/// The classifier is advisory: provider failures of any kind, quota included,
/// are logged and collapse to [`IntentDecision::NoLookup`].
pub struct IntentClassifier {
    llm: Arc<dyn LlmClient>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, message: &str) -> IntentDecision {
        let request = CompletionRequest::single(classifier_prompt(message)).with_temperature(0.0);

        match self.llm.complete(&request).await {
            Ok(raw) => {
                let decision = IntentDecision::parse(&raw);
                debug!(
                    event_name = "agent.classifier.decided",
                    raw_output = %raw.trim(),
                    keyword = decision.keyword().map(|keyword| keyword.as_str()).unwrap_or("none"),
                    "intent classified"
                );
                decision
            }
            Err(error) => {
                warn!(
                    event_name = "agent.classifier.failed",
                    provider = self.llm.provider_name(),
                    quota = error.is_quota(),
                    error = %error,
                    "classifier call failed, continuing without lookup"
                );
                IntentDecision::NoLookup
            }
        }
    }
}

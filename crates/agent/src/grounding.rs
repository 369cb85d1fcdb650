use calorizz_core::domain::product::Product;

use crate::lookup::LookupOutcome;

pub const FOUND_NOTE_HEADER: &str =
    "[Catatan sistem: Ini rekomendasi aku di Calorizz yaa~ Jawab hanya pakai data produk berikut:";
pub const NOT_FOUND_NOTE: &str = "[Catatan sistem: Maaf aku ga nemu produk itu di Calorizz..]";

/// Context attached to the responder prompt.
#[derive(Clone, Debug, PartialEq)]
pub enum Grounding {
    Products(Vec<Product>),
    NotFound,
    None,
}

impl From<LookupOutcome> for Grounding {
    fn from(outcome: LookupOutcome) -> Self {
        match outcome {
            LookupOutcome::Found(products) => Self::Products(products),
            LookupOutcome::NotFound | LookupOutcome::Unavailable(_) => Self::NotFound,
        }
    }
}

impl Grounding {
    pub fn note(&self) -> Option<String> {
        match self {
            Self::Products(products) if !products.is_empty() => {
                let mut note = String::from(FOUND_NOTE_HEADER);
                for product in products {
                    note.push('\n');
                    note.push_str(&product_line(product));
                }
                note.push_str("\n]");
                Some(note)
            }
            Self::Products(_) | Self::NotFound => Some(NOT_FOUND_NOTE.to_string()),
            Self::None => None,
        }
    }
}

fn product_line(product: &Product) -> String {
    let description = product.description.trim();
    if description.is_empty() {
        format!("- {} (Rp {})", product.name, product.display_price())
    } else {
        format!("- {} (Rp {}): {}", product.name, product.display_price(), description)
    }
}

/// User message, then a blank line and the grounding note when there is one.
pub fn compose_prompt(message: &str, grounding: &Grounding) -> String {
    let message = message.trim();
    match grounding.note() {
        Some(note) => format!("{message}\n\n{note}"),
        None => message.to_string(),
    }
}

//! Deterministic candidate name generation from curated name lists.
//!
//! All generation is deterministic (same RNG stream = same names).

use crate::rng::RandomSource;

pub struct NameGenerator;

impl NameGenerator {
    /// Generate a full name (first + last) deterministically
    pub fn generate_full_name(rng: &mut dyn RandomSource) -> String {
        let first_name = Self::generate_first_name(rng);
        let last_name = Self::generate_last_name(rng);
        format!("{} {}", first_name, last_name)
    }

    pub fn generate_first_name(rng: &mut dyn RandomSource) -> &'static str {
        let names = Self::first_names();
        names[rng.next_below(names.len())]
    }

    pub fn generate_last_name(rng: &mut dyn RandomSource) -> &'static str {
        let names = Self::last_names();
        names[rng.next_below(names.len())]
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "Aaliyah", "Adrian", "Aiko", "Alejandro", "Amara", "Andrei", "Anika", "Arjun",
            "Beatriz", "Bilal", "Camille", "Chen", "Dalia", "Dmitri", "Elena", "Emeka",
            "Farah", "Felix", "Grace", "Hamza", "Hana", "Ines", "Isaac", "Jae", "Jonas",
            "Kavya", "Kwame", "Lena", "Luca", "Maya", "Mateo", "Nadia", "Noah", "Olu",
            "Priya", "Rafael", "Rosa", "Sami", "Sofia", "Tariq", "Thea", "Uma", "Victor",
            "Wen", "Yara", "Yusuf", "Zara", "Zoe",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Abebe", "Alvarez", "Andersen", "Bakker", "Banerjee", "Costa", "Dubois",
            "Eriksen", "Fernandes", "Fischer", "Garcia", "Haddad", "Ivanova", "Jensen",
            "Kim", "Kowalski", "Larsen", "Lee", "Mensah", "Moreau", "Nakamura", "Nguyen",
            "Novak", "Okafor", "Oliveira", "Park", "Patel", "Petrov", "Quinn", "Rahman",
            "Rossi", "Sato", "Schmidt", "Silva", "Singh", "Tanaka", "Torres", "Van Dijk",
            "Wang", "Weber", "Yilmaz", "Zhang",
        ]
    }
}

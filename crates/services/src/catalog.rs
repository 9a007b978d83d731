use prelims_core::model::Paper;

//
// ─── SUBJECT CATALOG ──────────────────────────────────────────────────────────
//

/// A selectable subject and the bank file backing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub id: &'static str,
    pub name: &'static str,
    pub file: &'static str,
}

pub const GS1_SUBJECTS: &[Subject] = &[
    Subject { id: "ancient", name: "Ancient History", file: "ancient_history.json" },
    Subject { id: "medieval", name: "Medieval History", file: "medieval_history.json" },
    Subject { id: "modern", name: "Modern History", file: "modern_history.json" },
    Subject { id: "art", name: "Art & Culture", file: "art_culture.json" },
    Subject { id: "polity", name: "Indian Polity", file: "polity.json" },
    Subject { id: "geo_ind", name: "Indian Geography", file: "indian_geo.json" },
    Subject { id: "geo_world", name: "World Geography", file: "world_geo.json" },
    Subject { id: "env", name: "Environment", file: "environment.json" },
    Subject { id: "eco", name: "Indian Economy", file: "economy.json" },
    Subject { id: "sci", name: "Science & Tech", file: "science_tech.json" },
    Subject { id: "ir", name: "Intl. Relations", file: "ir.json" },
];

pub const CSAT_SUBJECTS: &[Subject] = &[
    Subject { id: "quant", name: "Mathematics", file: "csat_math.json" },
    Subject { id: "reasoning", name: "Reasoning", file: "csat_reasoning.json" },
    Subject { id: "rc", name: "Reading Passage", file: "csat_passage.json" },
];

/// Fallback bank for subjects outside the registry, e.g. mixed mock tests.
pub const MIXED_BANK_FILE: &str = "mix_test.json";

/// Subjects selectable for a paper.
#[must_use]
pub fn subjects_for(paper: Paper) -> &'static [Subject] {
    match paper {
        Paper::Gs1 => GS1_SUBJECTS,
        Paper::Csat => CSAT_SUBJECTS,
    }
}

/// Resolve a subject id or display name to its bank file. Unknown
/// subjects fall back to the mixed bank rather than failing.
#[must_use]
pub fn file_name_for(subject: &str) -> &'static str {
    GS1_SUBJECTS
        .iter()
        .chain(CSAT_SUBJECTS)
        .find(|entry| entry.id == subject || entry.name == subject)
        .map_or(MIXED_BANK_FILE, |entry| entry.file)
}

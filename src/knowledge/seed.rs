//! Built-in claims seeded into an empty knowledge base

use super::models::ClaimRecord;
use indexmap::IndexMap;

struct SeedEntry {
    verdict: &'static str,
    summary: &'static str,
    sources: &'static [&'static str],
}

/// Seed claims keyed by question text; order fixes the `id_N` ids
fn seed_entries() -> IndexMap<&'static str, SeedEntry> {
    let mut entries = IndexMap::new();
    entries.insert(
        "is openai partnering with apple?",
        SeedEntry {
            verdict: "Unconfirmed, but widely rumored.",
            summary: "Multiple tech news outlets have reported on ongoing discussions between Apple and OpenAI to integrate generative AI features into iOS. However, neither company has issued an official confirmation. Sources suggest a deal is plausible but not finalized.",
            sources: &["TechCrunch Report", "Bloomberg News"],
        },
    );
    entries.insert(
        "did apple acquire openai?",
        SeedEntry {
            verdict: "False.",
            summary: "There is no credible evidence or official announcement that Apple has acquired OpenAI. This is a false claim.",
            sources: &["Internal Knowledge Base"],
        },
    );
    entries
}

/// The seed claims with their fixed ids (`id_1`, `id_2`, ...)
pub fn seed_records() -> Vec<ClaimRecord> {
    seed_entries()
        .into_iter()
        .enumerate()
        .map(|(i, (question, entry))| ClaimRecord {
            id: format!("id_{}", i + 1),
            question_text: question.to_string(),
            verdict: entry.verdict.to_string(),
            summary: entry.summary.to_string(),
            sources: entry.sources.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_ids_follow_insertion_order() {
        let records = seed_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "id_1");
        assert_eq!(records[0].question_text, "is openai partnering with apple?");
        assert_eq!(records[1].id, "id_2");
        assert_eq!(records[1].verdict, "False.");
        assert_eq!(records[1].sources, vec!["Internal Knowledge Base".to_string()]);
    }
}

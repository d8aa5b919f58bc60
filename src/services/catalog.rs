use crate::services::settings::ProviderKind;

/// Drops non-chat entries (speech, moderation, embeddings) and sorts the rest.
pub fn filter_chat_models(kind: ProviderKind, ids: Vec<String>) -> Vec<String> {
    let markers = kind.non_chat_markers();
    let mut models: Vec<String> = ids
        .into_iter()
        .filter(|id| {
            let lower = id.to_lowercase();
            !markers.iter().any(|m| lower.contains(m))
        })
        .collect();
    models.sort();
    models.dedup();
    models
}

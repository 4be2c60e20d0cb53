const MAX_PLAYER_NAME_LEN: usize = 32;

/// Display names are persisted verbatim on the leaderboard, so keep them
/// non-empty and bounded. Score and hit rate are client-computed and
/// deliberately not sanity-checked.
pub fn sanitize_player_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "Anonymous".to_string()
    } else {
        trimmed.chars().take(MAX_PLAYER_NAME_LEN).collect()
    }
}

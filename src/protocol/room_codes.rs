use rand::RngExt;

/// Characters usable in a room code. Ambiguous glyphs (`0`, `1`, `I`, `O`) are
/// excluded so codes can be read aloud or typed from memory without transcription
/// errors.
const CLEAN_CHARS: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

pub const ROOM_CODE_LENGTH: usize = 6;

/// Generate a single candidate room code. Callers are responsible for re-rolling
/// on collision within their namespace (see `RoomRegistry::unique_code`).
pub fn generate_candidate() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CLEAN_CHARS.len());
            #[allow(clippy::indexing_slicing)]
            let ch = CLEAN_CHARS[idx] as char;
            ch
        })
        .collect()
}

/// Normalize client-submitted room codes: case-insensitive on the wire,
/// canonicalized to uppercase internally.
pub fn canonicalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn is_well_formed(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH
        && code
            .bytes()
            .all(|b| CLEAN_CHARS.contains(&b.to_ascii_uppercase()))
}

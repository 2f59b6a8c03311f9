use super::room_codes;

pub const MAX_PLAYER_NAME_LEN: usize = 24;
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

/// Player names are 1..24 chars after trimming; leading/trailing whitespace is
/// stripped rather than rejected, matching the data model's `name: string
/// (1..24 chars, trimmed)`.
pub fn validate_player_name(raw: &str) -> Result<String, &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("invalid_payload");
    }
    if trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err("invalid_payload");
    }
    Ok(trimmed.to_string())
}

pub fn validate_room_code(raw: &str) -> Result<String, &'static str> {
    let code = room_codes::canonicalize(raw);
    if !room_codes::is_well_formed(&code) {
        return Err("invalid_payload");
    }
    Ok(code)
}

pub fn validate_frame_size(bytes: &[u8]) -> Result<(), &'static str> {
    if bytes.len() > MAX_FRAME_BYTES {
        return Err("invalid_payload");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_name_trims_and_bounds() {
        assert_eq!(validate_player_name("  Aisha  ").unwrap(), "Aisha");
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name(&"x".repeat(25)).is_err());
        assert!(validate_player_name(&"x".repeat(24)).is_ok());
    }

    #[test]
    fn room_code_accepts_case_insensitive_clean_alphabet() {
        assert_eq!(validate_room_code("ab23cd").unwrap(), "AB23CD");
        assert!(validate_room_code("AB23C0").is_err()); // '0' excluded
        assert!(validate_room_code("short").is_err());
    }

    #[test]
    fn frame_size_bound() {
        assert!(validate_frame_size(&vec![0u8; MAX_FRAME_BYTES]).is_ok());
        assert!(validate_frame_size(&vec![0u8; MAX_FRAME_BYTES + 1]).is_err());
    }
}

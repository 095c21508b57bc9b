use anyhow::{Result, bail};

const UUID_HEX_LEN: usize = 32;
const MAX_USER_ID_HEX_LEN: usize = 30;
const PAD_CHAR: char = 'a';

fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_hexdigit())
}

/// Encodes a user id into the formatted UUID Apple accepts as an
/// appAccountToken. Layout: two hex chars of payload length, the lowercase
/// hex payload, then `'a'` padding up to 32 hex chars.
pub fn user_id_to_uuid(user_id: &str) -> Result<String> {
    if user_id.is_empty() {
        bail!("user id is empty");
    }

    let normalized = user_id.to_lowercase();
    if !is_hex(&normalized) {
        bail!("user id is not valid hex");
    }
    if normalized.len() > MAX_USER_ID_HEX_LEN {
        bail!("user id too long: max hex length is {MAX_USER_ID_HEX_LEN}");
    }

    let mut uuid_hex = format!("{:02x}{}", normalized.len(), normalized);
    while uuid_hex.len() < UUID_HEX_LEN {
        uuid_hex.push(PAD_CHAR);
    }

    Ok(format!(
        "{}-{}-{}-{}-{}",
        &uuid_hex[..8],
        &uuid_hex[8..12],
        &uuid_hex[12..16],
        &uuid_hex[16..20],
        &uuid_hex[20..32],
    ))
}

/// Decodes an appAccountToken back into the user id. Rejects any UUID that
/// was not produced by `user_id_to_uuid`.
pub fn uuid_to_user_id(uuid: &str) -> Result<String> {
    let clean = uuid.replace('-', "").to_lowercase();
    if clean.len() != UUID_HEX_LEN || !is_hex(&clean) {
        bail!("invalid uuid format");
    }

    if let Ok(size) = usize::from_str_radix(&clean[..2], 16) {
        if size > 0 && size <= MAX_USER_ID_HEX_LEN {
            let payload = &clean[2..2 + size];
            let padding = &clean[2 + size..];
            if padding.chars().all(|ch| ch == PAD_CHAR) {
                return Ok(payload.to_string());
            }
        }
    }

    bail!("uuid is not encoded by the known user id scheme");
}

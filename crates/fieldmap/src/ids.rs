//! Document id minting.

use uuid::Uuid;

const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const AUTO_ID_LEN: usize = 20;

/// Mints a random 20 character alphanumeric id, the store's native id format.
///
/// Ids are safe to assign before the entity is persisted.
pub fn auto_id() -> String {
    let mut id = String::with_capacity(AUTO_ID_LEN);
    while id.len() < AUTO_ID_LEN {
        let bytes = Uuid::new_v4().into_bytes();
        // Bytes 6 and 8 carry the fixed version and variant bits.
        for (index, byte) in bytes.into_iter().enumerate() {
            if index == 6 || index == 8 {
                continue;
            }
            // 62 * 4 = 248; rejecting the top of the range keeps the draw uniform.
            if byte < 248 {
                id.push(AUTO_ID_ALPHABET[(byte % 62) as usize] as char);
                if id.len() == AUTO_ID_LEN {
                    break;
                }
            }
        }
    }
    id
}

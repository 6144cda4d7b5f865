//! Constructor ids for definitions written without an explicit `#id`.

/// CRC32 of the whitespace-normalised definition, `= Type` included and the
/// trailing `;` excluded, which is how Telegram assigns ids.
pub(crate) fn tl_id(definition: &str) -> u32 {
    let normalised = definition.split_whitespace().collect::<Vec<_>>().join(" ");
    crc32(normalised.as_bytes())
}

/// ISO 3309 CRC-32, reflected, polynomial `0xEDB88320`.
fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(0xFFFF_FFFFu32, |mut crc, &byte| {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
        crc
    })
}

/// Reads the `// LAYER N` marker Telegram puts at the top of `api.tl`.
pub(crate) fn layer_marker(line: &str) -> Option<i32> {
    line.trim().strip_prefix("//")?.trim().strip_prefix("LAYER")?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_id_matches_published() {
        assert_eq!(tl_id("boolFalse = Bool"), 0xbc799737);
        assert_eq!(tl_id("boolFalse   =  Bool"), 0xbc799737);
        assert_eq!(tl_id("message msg_id:long seqno:int bytes:int body:Object = Message"), 0x5bb8e511);
    }

    #[test]
    fn layer_comment() {
        assert_eq!(layer_marker("// LAYER 158"), Some(158));
        assert_eq!(layer_marker("//LAYER 7"), Some(7));
        assert_eq!(layer_marker("// not a layer"), None);
    }
}

use unicode_normalization::UnicodeNormalization;

/// Suffix the collector appends to items already held by the account.
pub const OWNED_MARKER: &str = " MINE";

// First char of every UTF-8 sequence for U+2000..U+2FFF read back as Latin-1
const MOJIBAKE_LEAD: char = 'â';

// Glyphs the listing pages decorate names with. The mangled forms cover
// "™" whose bytes went through a Latin-1 round trip, with and without the
// C1 control that some copies drop.
const DECORATIONS: [&str; 7] = ["â\u{84}¢", "â„¢", "â¢", "™", "®", "©", "\u{FFFD}"];

// Stripping and composition can expose a new mojibake sequence, so cleaning
// repeats until the name settles.
const MAX_PASSES: usize = 8;

pub fn normalize(raw_name: &str) -> String {
    let mut name = clean_pass(raw_name);

    for _ in 0..MAX_PASSES {
        let next = clean_pass(&name);
        if next == name {
            break;
        }
        name = next;
    }

    name
}

fn clean_pass(raw_name: &str) -> String {
    if raw_name.is_empty() {
        return String::new();
    }

    let mut name = repair_encoding(raw_name);

    for glyph in DECORATIONS {
        if name.contains(glyph) {
            name = name.replace(glyph, "");
        }
    }

    let composed: String = name.nfkc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

// Undo UTF-8 bytes that were decoded as Latin-1, as many times as it applies.
// Every successful pass folds a multi-byte sequence, so this terminates.
fn repair_encoding(name: &str) -> String {
    let mut current = name.to_string();

    while current.contains(MOJIBAKE_LEAD) {
        match reinterpret_latin1(&current) {
            Some(fixed) if fixed != current => current = fixed,
            _ => break,
        }
    }

    current
}

fn reinterpret_latin1(text: &str) -> Option<String> {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()?;

    String::from_utf8(bytes).ok()
}

pub fn is_owned_variant(name: &str, marker: &str) -> bool {
    !marker.is_empty() && name.ends_with(marker)
}

/// Name used for grouping: the owned marker and trailing space removed.
pub fn base_identity<'a>(name: &'a str, marker: &str) -> &'a str {
    if is_owned_variant(name, marker) {
        name[..name.len() - marker.len()].trim()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_mojibake_trademark() {
        assert_eq!(
            normalize("StatTrak\u{e2}\u{a2} M249 | Magma"),
            "StatTrak M249 | Magma"
        );
        assert_eq!(
            normalize("StatTrak\u{e2}\u{84}\u{a2} M249 | Magma"),
            "StatTrak M249 | Magma"
        );
        assert_eq!(normalize("StatTrak™ M249 | Magma"), "StatTrak M249 | Magma");
    }

    #[test]
    fn test_repairs_double_encoded_text() {
        // "Café" with its é written as two Latin-1 chars
        assert_eq!(normalize("Caf\u{c3}\u{a9} Crate \u{e2}\u{80}\u{93} Gold"), "Café Crate – Gold");
    }

    #[test]
    fn test_keeps_legit_circumflex() {
        assert_eq!(normalize("Château  Door"), "Château Door");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  Garage\tDoor \n  Blackout  "), "Garage Door Blackout");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_nfkc_compatibility_forms() {
        // fullwidth letters and a no-break space
        assert_eq!(normalize("\u{FF21}K\u{a0}47"), "AK 47");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "StatTrak\u{e2}\u{a2} M249 | Magma",
            "Caf\u{c3}\u{a9}  ®Crate",
            "Château Door MINE",
            "\u{FF21}\u{FF22}  ™ x",
            "â",
            "plain",
            "",
            "Knife \u{e2}\u{2122}\u{80}\u{93} Fade",
            "Knife a\u{302}\u{80}\u{93} Fade",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {:?}", input);
        }
    }

    #[test]
    fn test_mojibake_exposed_by_later_steps() {
        // removing ™ joins â with the bytes after it
        assert_eq!(normalize("Knife \u{e2}\u{2122}\u{80}\u{93} Fade"), "Knife – Fade");
        // NFKC composes a + U+0302 into â
        assert_eq!(normalize("Knife a\u{302}\u{80}\u{93} Fade"), "Knife – Fade");
    }

    #[test]
    fn test_base_identity() {
        assert_eq!(
            base_identity("Sticker | Twistzz (Glitter) | Shanghai 2024 MINE", OWNED_MARKER),
            "Sticker | Twistzz (Glitter) | Shanghai 2024"
        );
        assert_eq!(base_identity("Road Sign Jacket", OWNED_MARKER), "Road Sign Jacket");
        assert_eq!(base_identity("MINEFIELD", OWNED_MARKER), "MINEFIELD");
        assert!(is_owned_variant("Hoodie MINE", OWNED_MARKER));
        assert!(!is_owned_variant("Hoodie MINER", OWNED_MARKER));
        assert!(!is_owned_variant("Hoodie MINE", ""));
    }
}

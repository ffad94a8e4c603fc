use once_cell::sync::Lazy;
use regex::Regex;

// instrument:run:flowcell:lane:tile:x:y[#index/read] [read:filtered:control:barcode]
static READ_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@?(\S+):(\d+):(\d+):(\d+):(\d+)(?:[#/]\S*)?(?:\s+\d+:[YN]:\d+:([A-Za-z+]+))?")
        .expect("Failed to compile read id regex")
});

/// Physical position of a read on the flow cell, parsed from its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadLocation {
    pub lane: u32,
    pub tile: u32,
    pub x: u32,
    pub y: u32,
    pub barcode: Option<String>,
}

impl ReadLocation {
    pub fn parse(id: &str) -> Option<Self> {
        let caps = READ_ID_REGEX.captures(id)?;
        Some(ReadLocation {
            lane: caps.get(2)?.as_str().parse().ok()?,
            tile: caps.get(3)?.as_str().parse().ok()?,
            x: caps.get(4)?.as_str().parse().ok()?,
            y: caps.get(5)?.as_str().parse().ok()?,
            barcode: caps.get(6).map(|m| m.as_str().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_casava_header() {
        let loc = ReadLocation::parse("@M00123:45:000000000-ABCDE:1:1101:15589:1333 1:N:0:ACGT+TTGA")
            .unwrap();
        assert_eq!(loc.lane, 1);
        assert_eq!(loc.tile, 1101);
        assert_eq!(loc.x, 15589);
        assert_eq!(loc.y, 1333);
        assert_eq!(loc.barcode.as_deref(), Some("ACGT+TTGA"));
    }

    #[test]
    fn test_parse_without_comment() {
        let loc = ReadLocation::parse("A00001:12:HXXXXDSXX:4:2278:31204:1000").unwrap();
        assert_eq!((loc.lane, loc.tile, loc.x, loc.y), (4, 2278, 31204, 1000));
        assert!(loc.barcode.is_none());
    }

    #[test]
    fn test_parse_legacy_header() {
        let loc = ReadLocation::parse("HWUSI-EAS100R:6:73:941:1973#0/1").unwrap();
        assert_eq!((loc.lane, loc.tile, loc.x, loc.y), (6, 73, 941, 1973));
    }

    #[test]
    fn test_parse_rejects_plain_ids() {
        assert!(ReadLocation::parse("read_1").is_none());
        assert!(ReadLocation::parse("SRR000001.1").is_none());
    }
}

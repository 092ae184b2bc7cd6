use crate::model::ids::{LevelId, PartId};
use crate::model::level::{Level, LevelError, Part, PartContent};

/// The ordered set of levels a team plays through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelCatalog {
    levels: Vec<Level>,
}

impl LevelCatalog {
    /// Build a catalog from levels numbered 1..=n.
    ///
    /// # Errors
    ///
    /// Returns `LevelError::EmptyCatalog` or `LevelError::LevelOutOfOrder`.
    pub fn new(levels: Vec<Level>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::EmptyCatalog);
        }
        for (index, level) in levels.iter().enumerate() {
            let expected = LevelId::new(u32::try_from(index + 1).unwrap_or(u32::MAX));
            if level.id() != expected {
                return Err(LevelError::LevelOutOfOrder {
                    expected,
                    found: level.id(),
                });
            }
        }
        Ok(Self { levels })
    }

    #[must_use]
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    #[must_use]
    pub fn get(&self, id: LevelId) -> Option<&Level> {
        let index = usize::try_from(id.value()).ok()?.checked_sub(1)?;
        self.levels.get(index)
    }

    #[must_use]
    pub fn final_level(&self) -> LevelId {
        self.levels.last().map_or(LevelId::new(1), Level::id)
    }

    /// The seven-level CICADA hunt.
    ///
    /// # Panics
    ///
    /// Panics if the built-in level table is malformed; covered by tests.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(standard_levels()).expect("built-in catalog is well-formed")
    }
}

fn text(id: u32, title: &str, body: &str) -> Part {
    Part::new(PartId::new(id), title, PartContent::Text(body.to_string()))
}

fn video(id: u32, title: &str, uri: &str) -> Part {
    Part::new(
        PartId::new(id),
        title,
        PartContent::Video {
            uri: uri.to_string(),
        },
    )
}

const CIPHER_LEGEND: [(char, &str); 26] = [
    ('A', "Δ1"),
    ('B', "β0"),
    ('C', "ς3"),
    ('D', "∂7"),
    ('E', "Σ2"),
    ('F', "ƒ5"),
    ('G', "ψ8"),
    ('H', "Ή0"),
    ('I', "Ϊ9"),
    ('J', "ʒ4"),
    ('K', "κ7"),
    ('L', "λ5"),
    ('M', "μ8"),
    ('N', "π#"),
    ('O', "Ω8"),
    ('P', "ρ@"),
    ('Q', "φ4"),
    ('R', "Γ$"),
    ('S', "Ϟ9"),
    ('T', "†6"),
    ('U', "μ1"),
    ('V', "√2"),
    ('W', "ω3"),
    ('X', "χ%"),
    ('Y', "Ψ7"),
    ('Z', "ζ0"),
];

fn standard_levels() -> Vec<Level> {
    let cipher = Part::new(
        PartId::new(1),
        "Cybertronen transmission",
        PartContent::Cipher {
            lines: vec![
                "Ϊ9'μ8 β0Ω8Γ$π# ω3Ή0Σ2Γ$Σ2 ς3Ϊ9Γ$ς3μ1Ϊ9†6Ϟ9 μ8Σ2Σ2†6".to_string(),
                "Ψ7ʒ4ψ8†6ψ8 Ω8κ7ρ@ƒ5μ1 Ψ7κ7†6ψ8 ς3ρ@ƒ5".to_string(),
            ],
            legend: CIPHER_LEGEND
                .iter()
                .map(|(letter, glyph)| (*letter, (*glyph).to_string()))
                .collect(),
        },
    );

    let level = |id: u32, title: &str, parts: Vec<Part>, countdown: u32| {
        Level::new(LevelId::new(id), title, parts, countdown)
    };

    [
        level(1, "The Transmission", vec![cipher], 0),
        level(
            2,
            "Broken Network",
            vec![
                text(
                    1,
                    "Q-1",
                    "Every node works **alone**, yet none of them can reach the others. \
                     What is wrong with the network that joins them?",
                ),
                text(
                    2,
                    "Q-2",
                    "Two frames, one message. The data never arrives and the resource \
                     is reported unavailable. List the possible causes.",
                ),
            ],
            5,
        ),
        level(
            3,
            "Tails of Numbers",
            vec![
                text(1, "Part A", "Study the image. Three numbers hide a book."),
                text(
                    2,
                    "Part B",
                    "| Row | X | Y |\n|-----|---|---|\n| 1C | 11 | 01 |\n| 1D | 09 | 0D |\n| 1E | 0F | 1C |",
                ),
            ],
            0,
        )
        .map(|level| {
            level.with_hint(
                "Three numbers, three tails: num % 10. Join them into an 11-digit ISBN.",
                20,
            )
        }),
        level(
            4,
            "Dots and Dashes",
            vec![text(
                1,
                "Mission briefing",
                "Decode the message using International Morse Code:\n\n`-.-. -.-- - --- -.-- -. - .... .-`",
            )],
            0,
        ),
        level(
            5,
            "Coordinates",
            vec![text(
                1,
                "Two maps",
                "Two coordinate grids, one place. Where do they meet?",
            )],
            5,
        )
        .map(|level| level.with_hint("The Circuit of Fifteen", 20)),
        level(
            6,
            "Six Reels",
            vec![
                video(1, "Part 1: The Beginning", "/videos/vid1.mp4"),
                video(2, "Part 2: The Cipher", "/videos/vid2.mp4"),
                video(3, "Part 3: Hidden Layers", "/videos/vid3.mp4"),
                video(4, "Part 4: The Pattern", "/videos/vid4.mp4"),
                video(5, "Part 5: Cryptographic Truth", "/videos/vid5.mp4"),
                video(6, "Part 6: The Revelation", "/videos/vid6.mp4"),
            ],
            5,
        ),
        level(
            7,
            "The Mind",
            vec![
                text(
                    1,
                    "Part 1: The Prince's Question",
                    "A question lingers, both alive and dead.\nSum the letters of the reply.",
                ),
                text(
                    2,
                    "Part 2: The Mediator",
                    "In Freud's trio it is neither id nor super,\nbut what holds them together.",
                ),
                text(
                    3,
                    "Part 3: The Neural Helm",
                    "Where decisions and morals are cast,\nat the brain's very helm.",
                ),
                text(
                    4,
                    "Part 4: Artificial Cognition",
                    "Layers upon layers, each neuron grown:\nmachines that learn from structures we trace.",
                ),
                text(
                    5,
                    "Part 5: Geometric Harmony",
                    "Seek the shape where six meets six.",
                ),
            ],
            5,
        ),
    ]
    .into_iter()
    .collect::<Result<Vec<_>, _>>()
    .expect("built-in levels are well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_seven_levels() {
        let catalog = LevelCatalog::standard();
        assert_eq!(catalog.levels().len(), 7);
        assert_eq!(catalog.final_level(), LevelId::new(7));
    }

    #[test]
    fn part_counts_match_hunt() {
        let catalog = LevelCatalog::standard();
        let counts: Vec<usize> = catalog.levels().iter().map(|l| l.parts().len()).collect();
        assert_eq!(counts, vec![1, 2, 2, 1, 1, 6, 5]);
    }

    #[test]
    fn level_six_final_subpart_is_f() {
        let catalog = LevelCatalog::standard();
        let level = catalog.get(LevelId::new(6)).unwrap();
        let key = level.subpart_for(level.final_part()).unwrap();
        assert_eq!(key.letter(), 'f');
    }

    #[test]
    fn hints_are_delayed() {
        let catalog = LevelCatalog::standard();
        let hint = catalog.get(LevelId::new(5)).unwrap().hint().unwrap();
        assert_eq!(hint.reveal_after_secs, 20);
        assert!(catalog.get(LevelId::new(1)).unwrap().hint().is_none());
    }

    #[test]
    fn unknown_level_is_none() {
        let catalog = LevelCatalog::standard();
        assert!(catalog.get(LevelId::new(0)).is_none());
        assert!(catalog.get(LevelId::new(8)).is_none());
    }

    #[test]
    fn rejects_misnumbered_catalog() {
        let part = Part::new(PartId::FIRST, "p", PartContent::Text(String::new()));
        let level = Level::new(LevelId::new(2), "L", vec![part], 0).unwrap();
        let err = LevelCatalog::new(vec![level]).unwrap_err();
        assert!(matches!(err, LevelError::LevelOutOfOrder { .. }));
    }
}

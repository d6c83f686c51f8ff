//! Oversized die faces for the last-roll display.

const FACE_HEIGHT: usize = 5;

type Face = [&'static str; FACE_HEIGHT];

const FACES: [Face; 6] = [
    [
        "┌─────────┐",
        "│         │",
        "│    ●    │",
        "│         │",
        "└─────────┘",
    ],
    [
        "┌─────────┐",
        "│ ●       │",
        "│         │",
        "│       ● │",
        "└─────────┘",
    ],
    [
        "┌─────────┐",
        "│ ●       │",
        "│    ●    │",
        "│       ● │",
        "└─────────┘",
    ],
    [
        "┌─────────┐",
        "│ ●     ● │",
        "│         │",
        "│ ●     ● │",
        "└─────────┘",
    ],
    [
        "┌─────────┐",
        "│ ●     ● │",
        "│    ●    │",
        "│ ●     ● │",
        "└─────────┘",
    ],
    [
        "┌─────────┐",
        "│ ●     ● │",
        "│ ●     ● │",
        "│ ●     ● │",
        "└─────────┘",
    ],
];

/// Render the face for a roll in 1..=6. Out-of-range values fall back to
/// the single pip.
pub fn render(roll: u8) -> &'static [&'static str] {
    let idx = usize::from(roll.clamp(1, 6)) - 1;
    &FACES[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_face_shows_its_pip_count() {
        for roll in 1..=6u8 {
            let face = render(roll);
            assert_eq!(face.len(), FACE_HEIGHT);
            let pips: usize = face
                .iter()
                .map(|line| line.chars().filter(|ch| *ch == '●').count())
                .sum();
            assert_eq!(pips, usize::from(roll));
        }
    }

    #[test]
    fn out_of_range_rolls_clamp() {
        assert_eq!(render(0), render(1));
        assert_eq!(render(9), render(6));
    }
}

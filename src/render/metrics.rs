//! Advance widths for the two built-in PDF fonts the invoice uses, so text can
//! be right-aligned and centered without embedding a font program.

/// Helvetica widths in 1/1000 em for ASCII 32..=126.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Helvetica-Bold widths in 1/1000 em for ASCII 32..=126.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Width used for characters outside the table.
const FALLBACK_WIDTH: u16 = 556;

const MM_PER_PT: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

/// Rendered width of `text` in millimetres at `size` points.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let table = match font {
        Font::Regular => &HELVETICA,
        Font::Bold => &HELVETICA_BOLD,
    };
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                u32::from(table[(code - 32) as usize])
            } else {
                u32::from(FALLBACK_WIDTH)
            }
        })
        .sum();
    units as f32 / 1000.0 * size * MM_PER_PT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_share_one_width() {
        let one = text_width("1", Font::Regular, 10.0);
        let many = text_width("1234567890", Font::Regular, 10.0);
        assert!((many - one * 10.0).abs() < 1e-4);
    }

    #[test]
    fn bold_is_wider() {
        assert!(text_width("Invoice", Font::Bold, 10.0) > text_width("Invoice", Font::Regular, 10.0));
    }

    #[test]
    fn width_scales_with_size() {
        let small = text_width("INVOICE", Font::Regular, 10.0);
        let large = text_width("INVOICE", Font::Regular, 20.0);
        assert!((large - small * 2.0).abs() < 1e-4);
        // 'W' is 944/1000 em; 10pt is ~3.53mm.
        assert!((text_width("W", Font::Regular, 10.0) - 3.330).abs() < 0.01);
    }
}

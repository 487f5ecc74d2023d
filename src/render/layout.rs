//! Page geometry for the invoice.
//!
//! [`layout`] turns a record into a flat list of [`Mark`]s positioned in
//! millimetres from the bottom-left corner of an A4 page. Nothing here touches
//! the filesystem; the PDF painter only replays the list.

use crate::error::{AssetKind, Result};
use crate::model::{InvoiceRecord, DATE_FORMAT, format_amount};

use super::metrics::{Font, text_width};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

const MARGIN: f32 = 20.0;
const ROW_HEIGHT: f32 = 10.0;
const FIRST_ROW_OFFSET: f32 = 95.0;
const NOTE_WRAP: usize = 90;

pub const COURTESY_NOTE: &str = "Your business is greatly appreciated.";
pub const CURRENCY: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
pub const MUTED: Rgb = Rgb(0.6, 0.6, 0.6);
pub const NOTE: Rgb = Rgb(0.5, 0.5, 0.5);
pub const ACCENT: Rgb = Rgb(0.0, 0.6, 0.9);
pub const RULE: Rgb = Rgb(0.8, 0.8, 0.8);
pub const BAND: Rgb = Rgb(0.9, 0.9, 0.9);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

/// One drawing operation. Text `x` is already the left edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Text {
        text: String,
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        color: Rgb,
    },
    /// Filled rectangle anchored at its lower-left corner.
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        color: Rgb,
    },
    Image {
        asset: AssetKind,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: f32,
    pub height: f32,
    pub marks: Vec<Mark>,
}

impl Page {
    fn new() -> Self {
        Self {
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            marks: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn text(&mut self, text: impl Into<String>, x: f32, y: f32, align: Align, font: Font, size: f32, color: Rgb) {
        let text = text.into();
        let width = text_width(&text, font, size);
        let x = match align {
            Align::Left => x,
            Align::Right => x - width,
            Align::Center => x - width / 2.0,
        };
        self.marks.push(Mark::Text {
            text,
            x,
            y,
            font,
            size,
            color,
        });
    }

    fn rule(&mut self, x1: f32, x2: f32, y: f32) {
        self.marks.push(Mark::Rule {
            x1,
            x2,
            y,
            color: RULE,
        });
    }

    /// Strings drawn on the page, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.marks.iter().filter_map(|mark| match mark {
            Mark::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Baseline of the 0-based line-item row `index`.
pub fn row_baseline(index: usize) -> f32 {
    PAGE_HEIGHT - FIRST_ROW_OFFSET - ROW_HEIGHT * index as f32
}

/// Odd rows get a light background band.
pub fn is_banded(index: usize) -> bool {
    index % 2 == 1
}

/// Lays out one invoice. Fails only when the rates cannot be totalled.
pub fn layout(record: &InvoiceRecord) -> Result<Page> {
    let subtotal = record.subtotal()?;
    let draft = &record.draft;
    let company = &draft.company;
    let customer = &draft.customer;
    let top = PAGE_HEIGHT;
    let right = PAGE_WIDTH - MARGIN;
    let mut page = Page::new();

    // Header
    page.marks.push(Mark::Image {
        asset: AssetKind::Logo,
        x: MARGIN,
        y: top - 35.0,
        width: 40.0,
        height: 20.0,
    });
    let identity = [
        &company.name,
        &company.email,
        &company.phone,
        &company.address,
        &company.city_st_zip,
    ];
    for (i, line) in identity.into_iter().enumerate() {
        let y = top - 20.0 - 5.0 * i as f32;
        page.text(line.as_str(), right, y, Align::Right, Font::Regular, 10.0, MUTED);
    }

    page.text("INVOICE", PAGE_WIDTH / 2.0, top - 50.0, Align::Center, Font::Regular, 20.0, ACCENT);
    page.text(
        format!("Invoice No.: {}", record.number),
        right,
        top - 50.0,
        Align::Right,
        Font::Bold,
        10.0,
        BLACK,
    );
    page.text(
        draft.issue_date.format(DATE_FORMAT).to_string(),
        right,
        top - 55.0,
        Align::Right,
        Font::Regular,
        10.0,
        BLACK,
    );

    // Bill-to
    page.text("BILL TO:", MARGIN, top - 50.0, Align::Left, Font::Bold, 10.0, BLACK);
    let bill_to = [&customer.name, &customer.email, &customer.address, &customer.city];
    for (i, line) in bill_to.into_iter().enumerate() {
        let y = top - 55.0 - 5.0 * i as f32;
        page.text(line.as_str(), MARGIN, y, Align::Left, Font::Regular, 10.0, BLACK);
    }

    // Items
    page.rule(MARGIN, right, top - 80.0);
    let columns = [(MARGIN, "Date"), (50.0, "Description"), (120.0, "Location"), (170.0, "Rate")];
    for (x, title) in columns {
        page.text(title, x, top - 85.0, Align::Left, Font::Regular, 10.0, BLACK);
    }

    let mut cursor = row_baseline(0);
    for (index, item) in draft.items.iter().enumerate() {
        if is_banded(index) {
            page.marks.push(Mark::Fill {
                x: MARGIN - 2.0,
                y: cursor - 2.0,
                width: 170.0,
                height: 7.0,
                color: BAND,
            });
        }
        page.text(item.date.as_str(), columns[0].0, cursor, Align::Left, Font::Regular, 10.0, BLACK);
        page.text(item.description.as_str(), columns[1].0, cursor, Align::Left, Font::Regular, 10.0, BLACK);
        page.text(item.location.as_str(), columns[2].0, cursor, Align::Left, Font::Regular, 10.0, BLACK);
        page.text(
            format!("{CURRENCY}{}", item.rate.trim()),
            columns[3].0,
            cursor,
            Align::Left,
            Font::Regular,
            10.0,
            BLACK,
        );
        cursor -= ROW_HEIGHT;
    }
    page.rule(MARGIN, right, cursor);

    // Totals
    page.text("Total:", PAGE_WIDTH - 60.0, cursor - 10.0, Align::Right, Font::Regular, 10.0, BLACK);
    page.text(
        format!("{CURRENCY} {}", format_amount(subtotal)),
        PAGE_WIDTH - 30.0,
        cursor - 10.0,
        Align::Right,
        Font::Bold,
        12.0,
        ACCENT,
    );
    page.rule(PAGE_WIDTH - 80.0, right, cursor - 15.0);
    page.text("Due Date:", PAGE_WIDTH - 57.0, cursor - 20.0, Align::Right, Font::Bold, 10.0, BLACK);
    page.text(
        record.due_date().format(DATE_FORMAT).to_string(),
        PAGE_WIDTH - 25.0,
        cursor - 20.0,
        Align::Right,
        Font::Regular,
        10.0,
        BLACK,
    );

    // Footer
    page.text(
        format!("Authorized Signatory: {}", draft.signatory),
        right,
        MARGIN,
        Align::Right,
        Font::Regular,
        10.0,
        BLACK,
    );
    page.marks.push(Mark::Image {
        asset: AssetKind::Signature,
        x: PAGE_WIDTH - 60.0,
        y: 25.0,
        width: 60.0,
        height: 20.0,
    });

    let mut note_y = cursor - 30.0;
    for line in wrap(COURTESY_NOTE, NOTE_WRAP) {
        page.text(line, 30.0, note_y, Align::Left, Font::Regular, 10.0, NOTE);
        note_y -= 5.0;
    }

    Ok(page)
}

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

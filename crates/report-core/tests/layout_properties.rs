//! Property-based tests for wrapping and pagination
//!
//! Run with: cargo test -p report-core --test layout_properties

use proptest::prelude::*;
use report_core::layout::metrics::text_width;
use report_core::layout::{
    wrap_text, FontStyle, ImageContent, KeyValue, LayoutEngine, PageGeometry, ReportBlock,
    SignaturePair,
};

const ROW_HEIGHT: f64 = 7.0;

fn row() -> ReportBlock {
    ReportBlock::KeyValueRow {
        left: Some(KeyValue::new("Voltage:", "230.5 V")),
        right: Some(KeyValue::new("Current:", "15.3 A")),
    }
}

fn style() -> impl Strategy<Value = FontStyle> {
    prop_oneof![
        Just(FontStyle::Regular),
        Just(FontStyle::Bold),
        Just(FontStyle::Italic),
    ]
}

/// Blocks that are placed as a single unit
fn atomic_block() -> impl Strategy<Value = ReportBlock> {
    prop_oneof![
        Just(row()),
        Just(ReportBlock::SectionHeader {
            title: "OTHER NOTES".into()
        }),
        Just(ReportBlock::Image(ImageContent::Missing)),
        Just(ReportBlock::Image(ImageContent::Unavailable)),
        Just(ReportBlock::SignaturePair(SignaturePair::default())),
        (0.0f64..30.0).prop_map(ReportBlock::Spacing),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ============================================================
    // Wrapping
    // ============================================================

    #[test]
    fn wrapped_lines_never_exceed_width(
        text in "[A-Za-z0-9 .,@W]{0,300}",
        width in 10.0f64..180.0,
        size in 8.0f64..14.0,
        style in style(),
    ) {
        for line in wrap_text(&text, width, size, style) {
            prop_assert!(
                text_width(&line, size, style) <= width,
                "line {:?} is wider than {}",
                line,
                width
            );
        }
    }

    #[test]
    fn rejoined_lines_reproduce_normalised_text(
        words in prop::collection::vec("[a-z]{1,8}", 0..60),
        separators in prop::collection::vec(prop_oneof![Just(" "), Just("  "), Just("\n"), Just("\t ")], 60),
        width in 60.0f64..180.0,
    ) {
        let mut text = String::new();
        for (word, sep) in words.iter().zip(separators.iter()) {
            text.push_str(word);
            text.push_str(sep);
        }

        let lines = wrap_text(&text, width, 11.0, FontStyle::Regular);
        prop_assert_eq!(lines.join(" "), words.join(" "));
    }

    #[test]
    fn split_words_keep_every_character(
        word in "[a-zA-Z]{1,120}",
        width in 5.0f64..40.0,
    ) {
        let lines = wrap_text(&word, width, 10.0, FontStyle::Regular);
        prop_assert_eq!(lines.concat(), word);
    }

    // ============================================================
    // Pagination
    // ============================================================

    #[test]
    fn uniform_rows_fill_pages_exactly(
        count in 1usize..200,
        per_page in 1usize..20,
        top in 0u8..30,
    ) {
        let top = top as f64;
        let capacity = ROW_HEIGHT * per_page as f64;
        let geometry = PageGeometry {
            top,
            limit: top + capacity,
            image_limit: top + capacity,
            ..PageGeometry::A4
        };
        let blocks = vec![row(); count];

        let document = LayoutEngine::layout(geometry, &blocks);

        let total_height = ROW_HEIGHT * count as f64;
        let expected = (total_height / capacity).ceil() as usize;
        prop_assert_eq!(document.page_count(), expected);
    }

    #[test]
    fn atomic_blocks_are_never_split(blocks in prop::collection::vec(atomic_block(), 1..80)) {
        let geometry = PageGeometry::A4;
        let mut engine = LayoutEngine::new(geometry);

        for block in &blocks {
            let span = engine.place(block);
            prop_assert_eq!(span.first_page, span.last_page);
            if !matches!(block, ReportBlock::Spacing(_)) {
                prop_assert!(engine.cursor() <= geometry.limit);
            }
        }
    }

    #[test]
    fn page_breaks_only_move_forward(blocks in prop::collection::vec(atomic_block(), 1..80)) {
        let mut engine = LayoutEngine::new(PageGeometry::A4);
        let mut previous = 0;
        for block in &blocks {
            let span = engine.place(block);
            prop_assert!(span.first_page >= previous);
            prop_assert!(span.first_page <= previous + 1);
            previous = span.last_page;
        }
        prop_assert_eq!(engine.page_count(), previous + 1);
    }
}

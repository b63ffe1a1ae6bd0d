//! Integration tests for pattern-nest-layout.

use approx::assert_relative_eq;
use pattern_nest_layout::{
    geometry, Generator, LayoutConfig, LayoutEvent, LayoutPiece, LayoutResult, LayoutState,
    Margins, Rect2D, SelectionCase,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn squares(prefix: &str, n: usize, size: f64) -> Vec<LayoutPiece> {
    (0..n)
        .map(|i| LayoutPiece::rectangle(format!("{prefix}{i}"), size, size))
        .collect()
}

fn garment_set() -> Vec<LayoutPiece> {
    vec![
        LayoutPiece::rectangle("back", 120.0, 160.0).with_seam_allowance(5.0),
        LayoutPiece::rectangle("front", 110.0, 150.0).with_seam_allowance(5.0),
        LayoutPiece::l_shape("yoke", 90.0, 70.0, 40.0, 30.0),
        LayoutPiece::new(
            "sleeve",
            vec![(0.0, 0.0), (80.0, 0.0), (65.0, 120.0), (15.0, 120.0)],
        )
        .with_seam_allowance(3.0),
        LayoutPiece::new("pocket", vec![(0.0, 0.0), (40.0, 0.0), (40.0, 35.0), (20.0, 45.0), (0.0, 35.0)]),
        LayoutPiece::rectangle("cuff", 60.0, 20.0),
    ]
}

fn assert_contained(result: &LayoutResult) {
    for sheet in &result.sheets {
        let bounds = Rect2D::sheet(sheet.width(), sheet.height());
        for piece in sheet.pieces() {
            let rect = piece.bounding_rect().unwrap();
            assert!(
                bounds.contains_rect(&rect, 1e-6),
                "'{}' at {:?} leaves sheet {}",
                piece.id(),
                rect,
                sheet.paper_index()
            );
        }
    }
}

fn assert_no_overlap(result: &LayoutResult) {
    for sheet in &result.sheets {
        let pieces = sheet.pieces();
        for (i, a) in pieces.iter().enumerate() {
            for b in &pieces[i + 1..] {
                assert!(
                    !geometry::overlaps(&a.layout_points(), &b.layout_points()),
                    "'{}' overlaps '{}'",
                    a.id(),
                    b.id()
                );
            }
        }
    }
}

fn assert_conserved(result: &LayoutResult, pieces: &[LayoutPiece]) {
    let mut seen = HashSet::new();
    for (_, piece) in result.placements() {
        assert!(seen.insert(piece.id().to_string()), "'{}' placed twice", piece.id());
    }
    for id in &result.unplaced {
        assert!(seen.insert(id.clone()), "'{}' both placed and unplaced", id);
    }
    let expected: HashSet<String> = pieces.iter().map(|p| p.id().to_string()).collect();
    assert_eq!(seen, expected);
}

mod placement_tests {
    use super::*;

    #[test]
    fn test_two_squares_are_adjacent() {
        let config = LayoutConfig::new().with_paper(400.0, 600.0).with_rotate(false);
        let pieces = squares("sq", 2, 100.0);
        let result = Generator::new(config).generate(&pieces).unwrap();

        assert_eq!(result.state, LayoutState::NoError);
        assert_eq!(result.sheets_used(), 1);
        let rect = result.sheets[0].pieces_bounding_rect().unwrap();
        assert_relative_eq!(rect.area(), 20_000.0, epsilon = 1e-6);
        assert_relative_eq!(rect.min_x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(rect.min_y, 0.0, epsilon = 1e-6);
        assert_no_overlap(&result);
    }

    #[test]
    fn test_long_strip_is_turned_to_fit() {
        let config = LayoutConfig::new().with_paper(400.0, 200.0).with_rotate(false);
        let pieces = vec![LayoutPiece::rectangle("strip", 50.0, 300.0)];
        let result = Generator::new(config).generate(&pieces).unwrap();

        assert!(result.all_placed());
        let rect = result.sheets[0].pieces_bounding_rect().unwrap();
        assert_relative_eq!(rect.width(), 300.0, epsilon = 1e-6);
        assert_relative_eq!(rect.height(), 50.0, epsilon = 1e-6);
        assert_contained(&result);
    }

    #[test]
    fn test_garment_set_is_valid() {
        init_logger();
        let pieces = garment_set();
        let config = LayoutConfig::new()
            .with_paper(400.0, 600.0)
            .with_layout_gap(2.0)
            .with_rotation_increment(90);
        let result = Generator::new(config).generate(&pieces).unwrap();

        assert!(result.is_successful());
        assert!(result.all_placed());
        assert_contained(&result);
        assert_no_overlap(&result);
        assert_conserved(&result, &pieces);
        assert!(result.utilization() > 0.0 && result.utilization() <= 1.0);
    }

    #[test]
    fn test_layout_gap_separates_main_outlines() {
        let config = LayoutConfig::new()
            .with_paper(400.0, 600.0)
            .with_rotate(false)
            .with_layout_gap(10.0);
        let result = Generator::new(config).generate(&squares("g", 2, 100.0)).unwrap();
        assert!(result.all_placed());

        let pieces = result.sheets[0].pieces();
        let a = pieces[0].main_bounding_rect().unwrap();
        let b = pieces[1].main_bounding_rect().unwrap();
        let separation = (b.min_x - a.max_x)
            .max(a.min_x - b.max_x)
            .max(b.min_y - a.max_y)
            .max(a.min_y - b.max_y);
        assert!(separation >= 10.0 - 1e-6, "separation {}", separation);
    }

    #[test]
    fn test_forbid_flip_is_never_mirrored() {
        let pieces: Vec<LayoutPiece> = (0..6)
            .map(|i| {
                LayoutPiece::l_shape(format!("l{i}"), 80.0, 60.0, 30.0, 25.0)
                    .with_forbid_flip(true)
            })
            .collect();
        let config = LayoutConfig::new()
            .with_paper(200.0, 200.0)
            .with_rotate(false);
        let result = Generator::new(config).generate(&pieces).unwrap();

        assert!(result.is_successful());
        for (_, piece) in result.placements() {
            assert!(!piece.is_mirrored(), "'{}' was mirrored", piece.id());
        }
        assert_no_overlap(&result);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let pieces = garment_set();
        let config = LayoutConfig::new()
            .with_paper(400.0, 600.0)
            .with_rotation_increment(45);
        let generator = Generator::new(config);

        let first = generator.generate(&pieces).unwrap();
        let second = generator.generate(&pieces).unwrap();

        let a: Vec<_> = first.placements().map(|(i, p)| (i, p.id().to_string(), *p.transform())).collect();
        let b: Vec<_> = second.placements().map(|(i, p)| (i, p.id().to_string(), *p.transform())).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_increment_is_coerced() {
        let config = LayoutConfig::new()
            .with_paper(300.0, 300.0)
            .with_rotation_increment(7);
        assert_eq!(config.effective_rotation_increment(), 180);

        let mut raw = LayoutConfig::new().with_paper(300.0, 300.0);
        raw.rotation_increment = 0;
        let result = Generator::new(raw).generate(&squares("c", 3, 50.0)).unwrap();
        assert!(result.all_placed());
    }
}

mod run_state_tests {
    use super::*;

    #[test]
    fn test_piece_larger_than_page() {
        init_logger();
        let config = LayoutConfig::new().with_paper(400.0, 400.0);
        let pieces = vec![LayoutPiece::rectangle("huge", 500.0, 500.0)];
        let result = Generator::new(config).generate(&pieces).unwrap();

        assert_eq!(result.state, LayoutState::EmptyPaperError);
        assert!(result.sheets.is_empty());
        assert_eq!(result.unplaced, vec!["huge".to_string()]);
        assert!(!result.summary().is_complete());
    }

    #[test]
    fn test_prepare_error_places_nothing() {
        let config = LayoutConfig::new().with_paper(400.0, 400.0);
        let pieces = vec![
            LayoutPiece::rectangle("ok", 10.0, 10.0),
            LayoutPiece::new("line", vec![(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]),
        ];
        let result = Generator::new(config).generate(&pieces).unwrap();

        assert_eq!(result.state, LayoutState::PrepareLayoutError);
        assert!(result.sheets.is_empty());
        assert_eq!(result.unplaced.len(), 2);
    }

    #[test]
    fn test_abort_keeps_committed_pieces_only() {
        let generator = Generator::new(LayoutConfig::new().with_paper(120.0, 120.0));
        let handle = generator.abort_handle();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let pieces = squares("a", 12, 50.0);
        let result = generator
            .generate_with_events(
                &pieces,
                Box::new(move |event| {
                    if event == (LayoutEvent::Arranged { count: 3 }) {
                        handle.abort();
                    }
                    sink.lock().unwrap().push(event);
                }),
            )
            .unwrap();

        assert_eq!(result.state, LayoutState::ProcessStopped);
        assert_eq!(result.arranged, 3);
        assert_eq!(result.placed_count(), 3);
        assert_conserved(&result, &pieces);
        assert_no_overlap(&result);

        let events = events.lock().unwrap();
        assert_eq!(events.first(), Some(&LayoutEvent::Started { total: 12 }));
        assert_eq!(
            events.last(),
            Some(&LayoutEvent::Error(LayoutState::ProcessStopped))
        );
        assert!(!events.contains(&LayoutEvent::Finished));
    }

    #[test]
    fn test_generator_is_reusable_after_abort() {
        let generator = Generator::new(LayoutConfig::new().with_paper(200.0, 200.0));
        generator.abort();
        // An abort with no run in progress has no effect on later runs.
        let result = generator.generate(&squares("r", 2, 50.0)).unwrap();
        assert!(result.is_successful());
        assert!(result.all_placed());
    }
}

mod page_tests {
    use super::*;

    #[test]
    fn test_margins_shrink_page() {
        let config = LayoutConfig::new()
            .with_paper(220.0, 320.0)
            .with_margins(Margins::uniform(10.0));
        let result = Generator::new(config.clone()).generate(&squares("m", 1, 50.0)).unwrap();
        assert_eq!(result.sheets[0].width(), 200.0);
        assert_eq!(result.sheets[0].height(), 300.0);

        let result = Generator::new(config.with_printer_fields(false))
            .generate(&squares("m", 1, 50.0))
            .unwrap();
        assert_eq!(result.sheets[0].width(), 220.0);
        assert_eq!(result.sheets[0].height(), 320.0);
    }

    #[test]
    fn test_unite_pages_with_auto_crop() {
        let config = LayoutConfig::new()
            .with_paper(100.0, 150.0)
            .with_layout_gap(0.0)
            .with_unite_pages(true)
            .with_auto_crop(true);
        let pieces = squares("u", 2, 100.0);
        let result = Generator::new(config).generate(&pieces).unwrap();

        // Each sheet is cropped to its 100 long piece before stacking.
        assert!(result.is_successful());
        assert_eq!(result.sheets_used(), 1);
        assert_eq!(result.sheets[0].height(), 200.0);
        assert_contained(&result);
        assert_no_overlap(&result);
    }

    #[test]
    fn test_strip_optimization_keeps_pieces_on_page() {
        let pieces = squares("s", 12, 20.0);
        let config = LayoutConfig::new()
            .with_paper(60.0, 200.0)
            .with_layout_gap(2.0)
            .with_strip_optimization(true, 1);
        let result = Generator::new(config).generate(&pieces).unwrap();

        assert!(result.is_successful());
        assert!(result.all_placed());
        for sheet in &result.sheets {
            assert_eq!(sheet.height(), 200.0);
        }
        assert_contained(&result);
        assert_no_overlap(&result);
        assert_conserved(&result, &pieces);
    }

    #[test]
    fn test_save_length_and_case() {
        let pieces = garment_set();
        for case in [SelectionCase::ThreeGroups, SelectionCase::TwoGroups, SelectionCase::Desc] {
            let config = LayoutConfig::new()
                .with_paper(400.0, 600.0)
                .with_save_length(true)
                .with_case(case);
            let result = Generator::new(config).generate(&pieces).unwrap();
            assert!(result.all_placed(), "{:?}", case);
            assert_no_overlap(&result);
        }
    }
}

mod stress_tests {
    use super::*;

    #[test]
    fn test_many_small_pieces() {
        let pieces = squares("tiny", 40, 25.0);
        let config = LayoutConfig::new()
            .with_paper(200.0, 200.0)
            .with_rotate(false)
            .with_threads(2);
        let result = Generator::new(config).generate(&pieces).unwrap();

        assert!(result.is_successful());
        assert_eq!(result.placed_count(), 40);
        assert_conserved(&result, &pieces);
        assert_no_overlap(&result);
    }
}

mod common;

use common::{FIVE, FakeSource, draw_lasso, load, mounted, page, settle};
use pretty_assertions::assert_eq;
use scene::CellId;
use streaming::Query;
use viewer::{PageHub, Rect};

fn ids(v: &[u32]) -> Vec<CellId> {
    v.iter().copied().map(CellId).collect()
}

#[test]
fn unit_square_lasso_selects_all_five_points() {
    let mut hub = PageHub::new();
    let mut source = FakeSource::new().with_dataset("pbmc", 0, &FIVE);
    let mut a = mounted(&mut hub, "A", Rect::new(20.0, 30.0, 100.0, 100.0));
    load(&mut hub, &mut a, &mut source, "pbmc");
    assert_eq!(a.store().len(), 5);

    let id = draw_lasso(&mut hub, &mut a, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
        .expect("selection");
    let selections = hub.selections(&page());
    assert_eq!(selections.len(), 1);
    assert_eq!(selections[0].id, id);
    assert_eq!(selections[0].points, ids(&[0, 1, 2, 3, 4]));
    assert!(selections[0].selected);
    assert_eq!(selections[0].source_viewer, "A");
    assert_eq!(selections[0].source_dataset, "pbmc");
}

#[test]
fn triangle_lasso_selects_exactly_three_points() {
    let mut hub = PageHub::new();
    let mut source = FakeSource::new().with_dataset("pbmc", 0, &FIVE);
    let mut a = mounted(&mut hub, "A", Rect::new(0.0, 0.0, 100.0, 100.0));
    load(&mut hub, &mut a, &mut source, "pbmc");

    draw_lasso(&mut hub, &mut a, &[(0.0, 0.0), (1.0, 0.0), (0.5, 0.5)]).expect("selection");
    assert_eq!(hub.selections(&page())[0].points, ids(&[0, 1, 4]));
}

#[test]
fn committed_selection_is_highlighted_and_gets_overlaps() {
    let mut hub = PageHub::new();
    let mut source = FakeSource::new().with_dataset("pbmc", 0, &FIVE);
    let mut a = mounted(&mut hub, "A", Rect::new(0.0, 0.0, 100.0, 100.0));
    load(&mut hub, &mut a, &mut source, "pbmc");

    let id = draw_lasso(&mut hub, &mut a, &[(0.0, 0.0), (1.0, 0.0), (0.5, 0.5)]).expect("selection");
    assert!(hub.selections(&page())[0].overlaps.is_none());
    settle(&mut hub, &mut [&mut a], &mut source);

    assert_eq!(source.count(|q| matches!(q, Query::ClusterOverlaps { .. })), 1);
    let overlaps = hub.selections(&page())[0].overlaps.clone().expect("overlaps");
    assert_eq!(overlaps[0].count, 3);

    let frame = a.renderer().build_frame();
    let highlighted: Vec<_> = frame
        .layer(layers::LayerKind::Highlights)
        .filter_map(|c| match c {
            gpu::RenderCommand::Highlight { selection, positions, .. } => Some((*selection, positions.len())),
            _ => None,
        })
        .collect();
    assert_eq!(highlighted, vec![(id, 3)]);
}

#[test]
fn empty_lasso_creates_no_selection() {
    let mut hub = PageHub::new();
    let mut source = FakeSource::new().with_dataset("pbmc", 0, &FIVE);
    let mut a = mounted(&mut hub, "A", Rect::new(0.0, 0.0, 100.0, 100.0));
    load(&mut hub, &mut a, &mut source, "pbmc");

    assert!(draw_lasso(&mut hub, &mut a, &[(0.1, 0.1), (0.2, 0.1), (0.15, 0.2)]).is_none());
    assert!(hub.selections(&page()).is_empty());
}

#[test]
fn one_vertex_lasso_is_not_hit_tested() {
    let mut hub = PageHub::new();
    let mut source = FakeSource::new().with_dataset("pbmc", 0, &FIVE);
    let mut a = mounted(&mut hub, "A", Rect::new(0.0, 0.0, 100.0, 100.0));
    load(&mut hub, &mut a, &mut source, "pbmc");

    assert!(draw_lasso(&mut hub, &mut a, &[(0.5, 0.5)]).is_none());
    assert!(hub.selections(&page()).is_empty());
}

#[test]
fn selection_ids_are_sequential_and_toggle_hides_highlight() {
    let mut hub = PageHub::new();
    let mut source = FakeSource::new().with_dataset("pbmc", 0, &FIVE);
    let mut a = mounted(&mut hub, "A", Rect::new(0.0, 0.0, 100.0, 100.0));
    load(&mut hub, &mut a, &mut source, "pbmc");

    let first = draw_lasso(&mut hub, &mut a, &[(0.0, 0.0), (1.0, 0.0), (0.5, 0.5)]).expect("first");
    let second = draw_lasso(&mut hub, &mut a, &[(0.0, 1.0), (1.0, 1.0), (0.5, 0.5)]).expect("second");
    assert_eq!(second.0, first.0 + 1);

    assert_eq!(hub.toggle_selection(&page(), first), Some(false));
    settle(&mut hub, &mut [&mut a], &mut source);
    let frame = a.renderer().build_frame();
    assert_eq!(frame.layer(layers::LayerKind::Highlights).count(), 1);

    assert!(hub.remove_selection(&page(), second));
    settle(&mut hub, &mut [&mut a], &mut source);
    assert_eq!(a.renderer().build_frame().layer(layers::LayerKind::Highlights).count(), 0);
}

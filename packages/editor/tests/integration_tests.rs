//! End-to-end editing sessions over the public API

use slidedeck_common::SlideId;
use slidedeck_editor::{
    slides_from_json, slides_to_json, EditSession, FieldKey, MoveDirection, Mutation,
    MutationError, Slide, SlideDocument, StylePatch,
};

fn single_slide_session() -> EditSession {
    let doc = SlideDocument::with_slides(vec![Slide::new(SlideId::new("slide-1"), 1)]);
    EditSession::new("integration", doc)
}

#[test]
fn test_edit_add_delete_sequence() {
    let mut session = single_slide_session();
    let first = SlideId::new("slide-1");

    assert!(session.update_field(&first, FieldKey::Title, "Q3 Plan"));
    let added = session.add_slide();
    assert!(session.delete_slide(&first));

    let doc = session.document();
    assert_eq!(doc.len(), 1);
    assert_ne!(doc.slides()[0].id, first);
    assert_eq!(doc.selected_id(), &added);
    assert_eq!(doc.slides()[0].order, 1);

    // Loaded state plus one entry per content-changing call
    assert_eq!(session.history().len(), 4);
    assert_eq!(session.history().cursor(), Some(3));

    assert!(session.undo());
    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.undo());
    assert_eq!(session.document().len(), 1);
    assert_eq!(session.document().slides()[0].id, first);
    assert_eq!(session.document().slides()[0].title, "");
}

#[test]
fn test_delete_last_slide_leaves_everything_untouched() {
    let mut session = single_slide_session();
    let before = session.document().clone();

    assert!(!session.delete_slide(&SlideId::new("slide-1")));
    assert_eq!(session.document(), &before);
    assert_eq!(session.history().len(), 1);

    let err = session
        .apply(Mutation::DeleteSlide {
            slide_id: SlideId::new("slide-1"),
        })
        .unwrap_err();
    assert_eq!(err, MutationError::LastSlide);
}

#[test]
fn test_undo_then_redo_restores_state() -> anyhow::Result<()> {
    let mut session = single_slide_session();
    let first = SlideId::new("slide-1");

    session.update_field(&first, FieldKey::Title, "Draft");
    session.update_style(
        &first,
        FieldKey::Title,
        StylePatch {
            italic: Some(true),
            ..Default::default()
        },
    );
    let after_style = session.document().clone();

    assert!(session.undo());
    assert!(!session.document().selected_slide().style_for(&FieldKey::Title).italic);
    assert_eq!(session.document().selected_slide().title, "Draft");
    assert!(session.redo());
    assert_eq!(session.document(), &after_style);

    // A new edit after undo discards the redo branch
    session.undo();
    session.update_field(&first, FieldKey::Notes, "branch");
    assert!(!session.history().can_redo());
    assert!(!session.redo());

    let json = slides_to_json(session.document().slides())?;
    let reloaded = slides_from_json(&json)?;
    assert_eq!(reloaded[0].notes, "branch");
    Ok(())
}

#[test]
fn test_history_is_bounded() {
    let mut session = single_slide_session();
    let first = SlideId::new("slide-1");

    for i in 0..75 {
        session.update_field(&first, FieldKey::Title, format!("rev {}", i));
    }
    assert_eq!(session.history().len(), 50);

    let mut steps = 0;
    while session.undo() {
        steps += 1;
    }
    assert_eq!(steps, 49);
    assert_eq!(session.document().selected_slide().title, "rev 25");
}

#[test]
fn test_reorder_keeps_orders_dense() {
    let mut session = single_slide_session();
    let second = session.add_slide();
    let third = session.add_slide();

    session.select_slide(&third);
    session.move_slide(MoveDirection::Up);
    session.move_slide(MoveDirection::Up);

    let ids: Vec<SlideId> = session
        .document()
        .slides()
        .iter()
        .map(|s| s.id.clone())
        .collect();
    assert_eq!(ids, vec![third.clone(), SlideId::new("slide-1"), second]);

    let orders: Vec<u32> = session.document().slides().iter().map(|s| s.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);

    // Already dense: nothing to commit
    assert!(!session.reorder_commit());
}

#[test]
fn test_hydrate_resets_history_and_repairs_slides() {
    let mut session = single_slide_session();
    session.update_field(&SlideId::new("slide-1"), FieldKey::Title, "local");

    let mut incoming = Slide::new(SlideId::new("remote-1"), 1);
    incoming.formatting.clear();
    session.hydrate(vec![incoming]);

    assert_eq!(session.history().len(), 1);
    assert!(!session.undo());
    let slide = session.document().selected_slide();
    assert_eq!(slide.id.as_str(), "remote-1");
    assert!(slide.formatting.contains_key(&FieldKey::Title));
    assert!(slide.formatting.contains_key(&FieldKey::Subtitle));
}
